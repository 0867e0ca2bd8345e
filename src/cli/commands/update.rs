//! `credvault update`: change the password (and optionally the username) of an entry.

use crate::cli::output;
use crate::cli::{read_secret, read_text, unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `update` command.
pub fn execute(cli: &Cli, service: &str, username: Option<&str>) -> Result<()> {
    let mut store = unlock_vault(cli)?;

    // Fail early, before prompting for anything.
    let current = store.get(service)?.username().to_string();

    let new_username = match username {
        Some(u) => u.to_string(),
        None => {
            output::info(&format!("Current username: {current}"));
            read_text("New username (press enter to keep current)", true)?
        }
    };
    let new_password = read_secret("New password")?;

    store.update(service, Some(new_username.as_str()), &new_password)?;
    output::success(&format!("Credential for '{service}' updated"));

    Ok(())
}
