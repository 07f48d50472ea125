use crate::session::Target;

/// `skein config`: the effective config after file and `SKEIN_*` overrides.
pub fn execute(target: &Target) -> anyhow::Result<()> {
    let config = target.config()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    match target.log_path() {
        Ok(path) => println!("log: {}", path.display()),
        Err(_) => println!("log: (not set)"),
    }
    Ok(())
}
