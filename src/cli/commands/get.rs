//! `credvault get`: show one stored credential.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `get` command.
///
/// The password is only printed when `--show` is passed.
pub fn execute(cli: &Cli, service: &str, show: bool) -> Result<()> {
    let store = unlock_vault(cli)?;
    let credential = store.get(service)?;

    println!("Service:  {service}");
    println!("Username: {}", credential.username());
    if show {
        println!("Password: {}", credential.password());
    } else {
        output::tip("Pass --show to print the password.");
    }

    Ok(())
}
