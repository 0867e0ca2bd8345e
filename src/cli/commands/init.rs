//! `credvault init`: create a new vault protected by a master password.

use crate::cli::output;
use crate::cli::{load_settings, prompt_new_master_password, vault_path, Cli, PASSWORD_ENV};
use crate::errors::{CredVaultError, Result};
use crate::vault::{UninitializedVault, VaultState};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;

    // 1. Refuse to overwrite an existing vault.
    let vault = match VaultState::detect(&path, settings.argon2_params()) {
        VaultState::Uninitialized(vault) => vault,
        VaultState::Locked(_) => {
            output::tip("Use `credvault add` to store credentials in the existing vault.");
            return Err(CredVaultError::VaultAlreadyExists(path));
        }
    };

    // 2. Make sure the parent directory exists.
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            output::info(&format!("Created directory: {}", parent.display()));
        }
    }

    // 3. Prompt until the confirmation matches.
    setup_with_retry(&vault)?;

    output::success(&format!("Vault created at {}", path.display()));
    output::tip("Run `credvault add <SERVICE>` to store a credential.");
    output::tip("Run `credvault list` to see all services.");

    Ok(())
}

fn setup_with_retry(vault: &UninitializedVault) -> Result<()> {
    loop {
        let (password, confirm) = prompt_new_master_password()?;
        match vault.setup(&password, &confirm) {
            Ok(_) => return Ok(()),
            // Non-interactive input cannot change, so retrying would spin.
            Err(CredVaultError::PasswordMismatch) if std::env::var_os(PASSWORD_ENV).is_none() => {
                output::warning("Passwords don't match. Try again.");
            }
            Err(e) => return Err(e),
        }
    }
}
