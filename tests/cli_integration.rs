//! Integration tests for the CredVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! The master password comes from `CREDVAULT_PASSWORD` and other input
//! is piped through stdin, so no interactive prompt is ever shown.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER: &str = "Tr0ub4dor";

/// Cheapest accepted KDF settings, so each unlock stays fast.
const FAST_CONFIG: &str = "argon2_memory_kib = 19456\nargon2_iterations = 2\nargon2_parallelism = 1\n";

/// Helper: get a Command pointing at the credvault binary.
fn credvault() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("credvault").expect("binary should exist");
    cmd.env_remove("CREDVAULT_VAULT")
        .env_remove("CREDVAULT_PASSWORD")
        .env_remove("CREDVAULT_LOG");
    cmd
}

/// Helper: a temp project dir with fast settings.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".credvault.toml").write_str(FAST_CONFIG).unwrap();
    tmp
}

/// Helper: a credvault command running in `dir` with the master password set.
fn in_vault(dir: &TempDir, password: &str) -> Command {
    let mut cmd = credvault();
    cmd.current_dir(dir.path()).env("CREDVAULT_PASSWORD", password);
    cmd
}

fn init(dir: &TempDir) {
    in_vault(dir, MASTER)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));
}

fn add(dir: &TempDir, service: &str, username: &str, password: &str) {
    in_vault(dir, MASTER)
        .args(["add", service, "-u", username, "--force"])
        .write_stdin(format!("{password}\n"))
        .assert()
        .success();
}

#[test]
fn help_flag_shows_usage() {
    credvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local encrypted password manager"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn version_flag_shows_version() {
    credvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("credvault"));
}

#[test]
fn no_args_shows_help() {
    credvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn completions_bash_outputs_script() {
    credvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("credvault"));
}

#[test]
fn init_creates_vault_file() {
    let tmp = project();
    init(&tmp);
    tmp.child("credentials.vault")
        .assert(predicate::path::exists());
}

#[test]
fn init_twice_fails() {
    let tmp = project();
    init(&tmp);

    in_vault(&tmp, MASTER)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_master_password() {
    let tmp = project();

    in_vault(&tmp, "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));
    tmp.child("credentials.vault")
        .assert(predicate::path::missing());
}

#[test]
fn vault_flag_picks_the_file() {
    let tmp = project();
    let custom = tmp.child("nested").child("personal.vault");

    in_vault(&tmp, MASTER)
        .args(["--vault", custom.path().to_str().unwrap(), "init"])
        .assert()
        .success();

    custom.assert(predicate::path::exists());
    tmp.child("credentials.vault")
        .assert(predicate::path::missing());
}

#[test]
fn add_then_get_shows_credential() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");

    in_vault(&tmp, MASTER)
        .args(["get", "github", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("p@ss1"));
}

#[test]
fn get_hides_password_without_show() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");

    in_vault(&tmp, MASTER)
        .args(["get", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("p@ss1").not());
}

#[test]
fn get_with_wrong_password_fails() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");

    in_vault(&tmp, "not-the-password")
        .args(["get", "github", "--show"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("p@ss1").not())
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn get_on_missing_vault_fails() {
    let tmp = project();

    in_vault(&tmp, MASTER)
        .args(["get", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn get_unknown_service_fails() {
    let tmp = project();
    init(&tmp);

    in_vault(&tmp, MASTER)
        .args(["get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn add_existing_without_force_needs_a_terminal() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");

    in_vault(&tmp, MASTER)
        .args(["add", "github", "-u", "bob"])
        .write_stdin("other\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    in_vault(&tmp, MASTER)
        .args(["get", "github", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn update_with_empty_username_keeps_it() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");

    // Empty username line, then the new password.
    in_vault(&tmp, MASTER)
        .args(["update", "github"])
        .write_stdin("\nnewpass\n")
        .assert()
        .success();

    in_vault(&tmp, MASTER)
        .args(["get", "github", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("newpass"));
}

#[test]
fn list_shows_services_but_not_passwords() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");
    add(&tmp, "bank", "bob", "s3cret");

    in_vault(&tmp, MASTER)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("github"))
        .stdout(predicate::str::contains("bank"))
        .stdout(predicate::str::contains("bob"))
        .stdout(predicate::str::contains("p@ss1").not())
        .stdout(predicate::str::contains("s3cret").not());
}

#[test]
fn delete_with_force_removes_entry() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");

    in_vault(&tmp, MASTER)
        .args(["delete", "github", "--force"])
        .assert()
        .success();

    in_vault(&tmp, MASTER)
        .args(["get", "github"])
        .assert()
        .failure();
}

#[test]
fn delete_unknown_service_fails() {
    let tmp = project();
    init(&tmp);

    in_vault(&tmp, MASTER)
        .args(["delete", "nope", "--force"])
        .assert()
        .failure();
}

#[test]
fn corrupted_vault_is_reported() {
    let tmp = project();
    init(&tmp);
    add(&tmp, "github", "alice", "p@ss1");

    let vault = tmp.child("credentials.vault");
    let mut data = std::fs::read(vault.path()).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xFF;
    std::fs::write(vault.path(), &data).unwrap();

    in_vault(&tmp, MASTER)
        .args(["get", "github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupted"));
}
