use crate::session::{resolve_ref, Target};
use clap::Subcommand;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum LabelCmd {
    /// Bind a label to an entry (rebinding moves it)
    Set {
        /// Label name
        name: String,
        /// Entry id or existing label
        entry: String,
    },
    /// Print the entry a label points at
    Get {
        /// Label name
        name: String,
    },
    /// List all labels
    List,
    /// Remove a label
    Rm {
        /// Label name
        name: String,
    },
}

// ── Dispatch ──

pub fn run(cmd: LabelCmd, target: &Target) -> anyhow::Result<()> {
    match cmd {
        LabelCmd::Set { name, entry } => set(target, &name, &entry),
        LabelCmd::Get { name } => get(target, &name),
        LabelCmd::List => list(target),
        LabelCmd::Rm { name } => rm(target, &name),
    }
}

// ── Command Implementations ──

/// `skein label set <name> <entry>`
pub fn set(target: &Target, name: &str, entry: &str) -> anyhow::Result<()> {
    let mut log = target.open()?;
    let id = resolve_ref(&log, entry)?;
    log.set_label(name, &id)?;
    println!("{name} -> {id}");
    Ok(())
}

/// `skein label get <name>`
pub fn get(target: &Target, name: &str) -> anyhow::Result<()> {
    let log = target.open()?;
    match log.get_label(name) {
        Some(id) => println!("{id}"),
        None => anyhow::bail!("Label '{name}' is not set"),
    }
    Ok(())
}

/// `skein label list`
pub fn list(target: &Target) -> anyhow::Result<()> {
    let log = target.open()?;
    let labels = log.labels().all();
    if labels.is_empty() {
        println!("(no labels)");
    } else {
        for (name, id) in labels {
            println!("{name} -> {id}");
        }
    }
    Ok(())
}

/// `skein label rm <name>`
pub fn rm(target: &Target, name: &str) -> anyhow::Result<()> {
    let mut log = target.open()?;
    match log.remove_label(name)? {
        Some(id) => println!("removed {name} (was {id})"),
        None => println!("(not set)"),
    }
    Ok(())
}
