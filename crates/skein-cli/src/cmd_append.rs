use crate::session::{resolve_or_latest, Target};
use skein_core::Role;

/// `skein append <content> [--role] [--parent | --root]`
pub fn message(
    target: &Target,
    content: &str,
    role: &str,
    parent: Option<&str>,
    root: bool,
) -> anyhow::Result<()> {
    let role: Role = role.parse().map_err(anyhow::Error::msg)?;
    let mut log = target.open()?;
    let parent = if root {
        None
    } else {
        resolve_or_latest(&log, parent)?
    };
    let id = log.append_message(role, content, parent.as_deref())?;
    println!("{id}");
    Ok(())
}

/// `skein model <new_model> [--old] [--parent]`
pub fn model(
    target: &Target,
    new_model: &str,
    old: Option<&str>,
    parent: Option<&str>,
) -> anyhow::Result<()> {
    let mut log = target.open()?;
    let parent = resolve_or_latest(&log, parent)?;
    let id = log.append_model_change(old, new_model, parent.as_deref())?;
    println!("{id}");
    Ok(())
}

/// `skein thinking <new_level> [--old] [--parent]`
pub fn thinking(
    target: &Target,
    new_level: &str,
    old: Option<&str>,
    parent: Option<&str>,
) -> anyhow::Result<()> {
    let mut log = target.open()?;
    let parent = resolve_or_latest(&log, parent)?;
    let id = log.append_thinking_level_change(old, new_level, parent.as_deref())?;
    println!("{id}");
    Ok(())
}
