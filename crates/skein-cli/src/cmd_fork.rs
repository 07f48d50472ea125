use crate::session::{resolve_ref, Target};
use skein_log::LogError;

/// `skein fork <from> [--label]`
///
/// When only the label write fails, the new checkpoint id is still printed
/// before the error so it can be labelled without forking again.
pub fn execute(target: &Target, from: &str, label: Option<&str>) -> anyhow::Result<()> {
    let mut log = target.open()?;
    let from = resolve_ref(&log, from)?;
    let id = match log.fork(&from, label) {
        Ok(id) => id,
        Err(LogError::ForkLabel { id, label, source }) => {
            println!("{id}");
            anyhow::bail!(
                "Fork {id} was created but label '{label}' was not saved: {source}. \
                 Retry with `skein label set {label} {id}`."
            );
        }
        Err(e) => return Err(e.into()),
    };
    match label {
        Some(name) => println!("{id} ({name})"),
        None => println!("{id}"),
    }
    Ok(())
}
