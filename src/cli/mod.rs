//! CLI module: argument parser, prompting helpers and the command implementations.

pub mod commands;
pub mod output;

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{CredVaultError, Result};
use crate::vault::{LockedVault, VaultStore};

/// Minimum password length when choosing a new master password.
const MIN_PASSWORD_LEN: usize = 8;

/// Unlock attempts allowed at an interactive prompt.
const MAX_UNLOCK_ATTEMPTS: usize = 3;

/// Environment variable that supplies the master password non-interactively.
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// CredVault CLI: encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Local encrypted password manager",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the vault file (default: from .credvault.toml, else ./credentials.vault)
    #[arg(long, env = "CREDVAULT_VAULT", global = true)]
    pub vault: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault protected by a master password
    Init,

    /// Add a credential (or replace an existing one)
    Add {
        /// Service name (e.g. github)
        service: String,
        /// Username or email (prompted if omitted)
        #[arg(short, long)]
        username: Option<String>,
        /// Overwrite an existing entry without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Change the password (and optionally the username) of a credential
    Update {
        /// Service name
        service: String,
        /// New username (prompted if omitted; empty keeps the current one)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Show a stored credential
    Get {
        /// Service name
        service: String,
        /// Print the password as well as the username
        #[arg(long)]
        show: bool,
    },

    /// List all stored services
    List,

    /// Delete a credential
    Delete {
        /// Service name
        service: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the vault file: `--vault` wins, then `.credvault.toml`, then the default.
pub fn vault_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    if let Some(path) = &cli.vault {
        return Ok(path.clone());
    }
    let cwd = std::env::current_dir()?;
    Ok(settings.vault_path(&cwd))
}

/// Load settings from the working directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Read the master password from `CREDVAULT_PASSWORD`, if set.
fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Open and unlock the vault, prompting for the master password.
///
/// With `CREDVAULT_PASSWORD` set there is exactly one attempt; at an
/// interactive prompt a wrong password may be retried a few times.
pub fn unlock_vault(cli: &Cli) -> Result<VaultStore> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let locked = match LockedVault::open(&path) {
        Ok(locked) => locked,
        Err(e) => {
            output::tip("Run `credvault init` to create a vault first.");
            return Err(e);
        }
    };

    if let Some(password) = password_from_env() {
        return locked.unlock(&password);
    }

    let mut attempt = 1;
    loop {
        let password = prompt_hidden("Master password")?;
        match locked.unlock(&password) {
            Err(CredVaultError::AuthenticationFailed) if attempt < MAX_UNLOCK_ATTEMPTS => {
                output::warning("Wrong master password, try again.");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Prompt for a new master password and its confirmation.
///
/// Both values are returned as typed so the vault can reject a mismatch.
/// With `CREDVAULT_PASSWORD` set the same value is used for both.
/// Enforces a minimum password length.
pub fn prompt_new_master_password() -> Result<(Zeroizing<String>, Zeroizing<String>)> {
    if let Some(pw) = password_from_env() {
        check_password_length(&pw)?;
        let confirm = pw.clone();
        return Ok((pw, confirm));
    }

    loop {
        let password = prompt_hidden("Create a master password")?;
        if check_password_length(&password).is_err() {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }
        let confirm = prompt_hidden("Confirm master password")?;
        return Ok((password, confirm));
    }
}

fn check_password_length(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredVaultError::CommandFailed(format!(
            "master password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Read a secret: hidden prompt on a terminal, next stdin line otherwise.
pub fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
    if io::stdin().is_terminal() {
        prompt_hidden(prompt)
    } else {
        read_stdin_line().map(Zeroizing::new)
    }
}

/// Read plain text: visible prompt on a terminal, next stdin line otherwise.
pub fn read_text(prompt: &str, allow_empty: bool) -> Result<String> {
    if !io::stdin().is_terminal() {
        return read_stdin_line();
    }
    dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))
}

/// Ask a yes/no question; non-interactive sessions cannot confirm.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Err(CredVaultError::CommandFailed(
            "confirmation required but stdin is not a terminal (use --force)".into(),
        ));
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))
}

fn prompt_hidden(prompt: &str) -> Result<Zeroizing<String>> {
    dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))
}

fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(CredVaultError::CommandFailed(
            "unexpected end of input on stdin".into(),
        ));
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
    zeroize::Zeroize::zeroize(&mut line);
    Ok(trimmed)
}
