//! `credvault list`: display all stored services in a table.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = unlock_vault(cli)?;
    let credentials = store.list();

    output::info(&format!("{} credential(s)", credentials.len()));
    output::print_credentials_table(&credentials);

    Ok(())
}
