//! Styled terminal output for the commands.
//!
//! Results and hints go to stdout; errors and warnings go to stderr so
//! scripts piping `credvault get` only see credential data.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::CredentialMetadata;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Kind of status line, which picks the marker, color and stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Error,
    Warning,
    Info,
}

impl Status {
    fn to_stderr(self) -> bool {
        matches!(self, Self::Error | Self::Warning)
    }
}

/// Render one status line: a colored marker followed by the message.
fn render(status: Status, msg: &str) -> String {
    let marker = match status {
        Status::Success => style("\u{2713}").green(),
        Status::Error => style("\u{2717}").red(),
        Status::Warning => style("!").yellow(),
        Status::Info => style("\u{2022}").cyan(),
    };
    format!("{} {msg}", marker.bold())
}

fn emit(status: Status, msg: &str) {
    let line = render(status, msg);
    if status.to_stderr() {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn success(msg: &str) {
    emit(Status::Success, msg);
}

pub fn error(msg: &str) {
    emit(Status::Error, msg);
}

pub fn warning(msg: &str) {
    emit(Status::Warning, msg);
}

pub fn info(msg: &str) {
    emit(Status::Info, msg);
}

/// A dimmed follow-up hint, e.g. which command to run next.
pub fn tip(msg: &str) {
    println!("  {}", style(msg).dim().italic());
}

/// Build the listing table. Passwords are never part of it.
fn credentials_table(credentials: &[CredentialMetadata]) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Service", "Username", "Updated"]);

    for c in credentials {
        let username = if c.username.is_empty() {
            "-".to_string()
        } else {
            c.username.clone()
        };
        table.add_row(vec![
            c.service.clone(),
            username,
            c.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ]);
    }
    table
}

/// Print stored credentials as a table, or a hint when there are none.
pub fn print_credentials_table(credentials: &[CredentialMetadata]) {
    if credentials.is_empty() {
        info("The vault is empty.");
        tip("Store one with `credvault add <SERVICE>`.");
        return;
    }
    println!("{}", credentials_table(credentials));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(service: &str, username: &str) -> CredentialMetadata {
        CredentialMetadata {
            service: service.to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn render_keeps_message() {
        console::set_colors_enabled(false);
        assert_eq!(render(Status::Success, "saved"), "\u{2713} saved");
        assert_eq!(render(Status::Warning, "careful"), "! careful");
    }

    #[test]
    fn only_errors_and_warnings_go_to_stderr() {
        assert!(Status::Error.to_stderr());
        assert!(Status::Warning.to_stderr());
        assert!(!Status::Success.to_stderr());
        assert!(!Status::Info.to_stderr());
    }

    #[test]
    fn table_lists_services_and_marks_blank_usernames() {
        let rendered = credentials_table(&[meta("github", "alice"), meta("wifi", "")]).to_string();
        assert!(rendered.contains("github"));
        assert!(rendered.contains("alice"));
        assert!(rendered.contains("wifi"));
        assert!(rendered.contains(" - "));
    }
}
