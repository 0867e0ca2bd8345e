//! `credvault delete`: remove a credential from the vault.

use crate::cli::output;
use crate::cli::{confirm, unlock_vault, Cli};
use crate::errors::{CredVaultError, Result};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, service: &str, force: bool) -> Result<()> {
    let mut store = unlock_vault(cli)?;

    if !store.contains(service) {
        return Err(CredVaultError::CredentialNotFound(service.to_string()));
    }

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete the credential for '{service}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    store.delete(service)?;
    output::success(&format!("Deleted credential for '{service}'"));

    Ok(())
}
