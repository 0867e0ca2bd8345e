//! `credvault add`: store a credential, replacing any existing entry.

use crate::cli::output;
use crate::cli::{confirm, read_secret, read_text, unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `add` command.
pub fn execute(cli: &Cli, service: &str, username: Option<&str>, force: bool) -> Result<()> {
    let mut store = unlock_vault(cli)?;

    let existed = store.contains(service);
    if existed && !force && !confirm(&format!("'{service}' already exists. Overwrite?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    let username = match username {
        Some(u) => u.to_string(),
        None => read_text("Username/Email", true)?,
    };
    let password = read_secret("Password")?;

    store.add_or_replace(service, &username, &password)?;

    let verb = if existed { "updated" } else { "saved" };
    output::success(&format!(
        "Credential for '{service}' {verb} ({} total)",
        store.len()
    ));

    Ok(())
}
