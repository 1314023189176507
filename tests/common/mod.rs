#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use std::path::Path;

/// Fixed identity injected into every command so commit and tag hashes are
/// deterministic across runs
pub const AUTHOR_NAME: &str = "A U Thor";
pub const AUTHOR_EMAIL: &str = "a@u";
pub const AUTHOR_DATE: &str = "0 +0000";

/// Well-known hash of the empty blob
pub const EMPTY_BLOB_OID: &str = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";

/// Well-known hash of the blob holding `hello\n`
pub const HELLO_BLOB_OID: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

/// Build a `ves` command running in `dir`, with the identity pinned and the
/// home directory redirected into the sandbox so no user-level
/// configuration leaks in
pub fn ves_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("ves").expect("failed to find ves binary");
    cmd.current_dir(dir)
        .env("VES_AUTHOR_NAME", AUTHOR_NAME)
        .env("VES_AUTHOR_EMAIL", AUTHOR_EMAIL)
        .env("VES_AUTHOR_DATE", AUTHOR_DATE)
        .env("HOME", dir)
        .env_remove("XDG_CONFIG_HOME");
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

/// A `ves` command with no identity in the environment
pub fn ves_command_without_identity(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = ves_command(dir, args);
    cmd.env_remove("VES_AUTHOR_NAME")
        .env_remove("VES_AUTHOR_EMAIL")
        .env_remove("VES_AUTHOR_DATE");
    cmd
}

/// Fresh temp dir with an initialized repository
pub fn init_repository() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    ves_command(dir.path(), &["init"]).assert().success();
    dir
}

/// Write a file relative to `dir`, creating parent directories
pub fn write_file(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent directories");
    }
    std::fs::write(path, content).expect("failed to write file");
}

/// Run a command and return its stdout as UTF-8
pub fn stdout_of(mut cmd: Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).expect("stdout is not UTF-8")
}

/// Resolve a token to a full object id through `rev-parse`
pub fn rev_parse(dir: &Path, token: &str) -> String {
    stdout_of(ves_command(dir, &["rev-parse", token]))
        .trim()
        .to_string()
}

/// Initialized repository with `hello.txt` staged and committed
pub fn committed_repository() -> TempDir {
    let dir = init_repository();
    write_file(dir.path(), "hello.txt", "hello\n");
    ves_command(dir.path(), &["add", "hello.txt"])
        .assert()
        .success();
    ves_command(dir.path(), &["commit", "-m", "first"])
        .assert()
        .success();
    dir
}
