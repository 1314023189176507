use predicates::prelude::predicate;
use pretty_assertions::assert_eq;

mod common;

#[test]
fn add_single_file_to_index() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "hello.txt", "hello\n");

    common::ves_command(dir.path(), &["add", "hello.txt"])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(dir.path(), &["ls-files"]));
    assert_eq!(output, "hello.txt\n");

    // the staged blob reached the object store
    let sharded = dir
        .path()
        .join(".ves/objects")
        .join(&common::HELLO_BLOB_OID[..2])
        .join(&common::HELLO_BLOB_OID[2..]);
    assert!(sharded.is_file());

    Ok(())
}

#[test]
fn add_directory_stages_nested_files_in_name_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "b.txt", "b");
    common::write_file(dir.path(), "a/1.txt", "one");
    common::write_file(dir.path(), "a/c/2.txt", "two");

    common::ves_command(dir.path(), &["add", "."])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(dir.path(), &["ls-files"]));
    assert_eq!(output, "a/1.txt\na/c/2.txt\nb.txt\n");

    Ok(())
}

#[test]
fn index_survives_a_reload_byte_for_byte() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "one.txt", "one");
    common::write_file(dir.path(), "two.txt", "two");

    common::ves_command(dir.path(), &["add", "one.txt", "two.txt"])
        .assert()
        .success();
    let before = std::fs::read(dir.path().join(".ves/index"))?;

    // a no-op ls-files reads and validates the index without rewriting it
    common::ves_command(dir.path(), &["ls-files"])
        .assert()
        .success();
    let after = std::fs::read(dir.path().join(".ves/index"))?;
    assert_eq!(before, after);

    // the file ends with a 20-byte trailer over everything before it
    assert!(before.len() > 20);
    assert_eq!(&before[..4], b"DIRC");

    Ok(())
}

#[test]
fn adding_a_missing_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();

    common::ves_command(dir.path(), &["add", "absent.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not match any files"));

    Ok(())
}

#[test]
fn adding_a_path_outside_the_worktree_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();

    common::ves_command(dir.path(), &["add", "../outside.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the worktree"));

    Ok(())
}

#[test]
fn rm_removes_the_entry_and_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "doomed.txt", "bye");
    common::ves_command(dir.path(), &["add", "doomed.txt"])
        .assert()
        .success();

    common::ves_command(dir.path(), &["rm", "doomed.txt"])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(dir.path(), &["ls-files"]));
    assert_eq!(output, "");
    assert!(!dir.path().join("doomed.txt").exists());

    Ok(())
}

#[test]
fn rm_cached_keeps_the_worktree_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "kept.txt", "stay");
    common::ves_command(dir.path(), &["add", "kept.txt"])
        .assert()
        .success();

    common::ves_command(dir.path(), &["rm", "--cached", "kept.txt"])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(dir.path(), &["ls-files"]));
    assert_eq!(output, "");
    assert!(dir.path().join("kept.txt").is_file());

    Ok(())
}

#[test]
fn rm_of_an_untracked_path_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "untracked.txt", "hi");

    common::ves_command(dir.path(), &["rm", "untracked.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the index"));

    Ok(())
}

#[test]
fn re_adding_a_changed_file_replaces_its_entry() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "note.txt", "v1");
    common::ves_command(dir.path(), &["add", "note.txt"])
        .assert()
        .success();

    common::write_file(dir.path(), "note.txt", "v2 with more text");
    common::ves_command(dir.path(), &["add", "note.txt"])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(dir.path(), &["ls-files"]));
    assert_eq!(output, "note.txt\n");

    // nothing left unstaged after the re-add
    let status = common::stdout_of(common::ves_command(dir.path(), &["status", "--porcelain"]));
    assert_eq!(status, "A  note.txt\n");

    Ok(())
}

#[test]
fn replacing_a_directory_with_a_file_updates_the_index() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "thing/inner.txt", "nested");
    common::ves_command(dir.path(), &["add", "."])
        .assert()
        .success();

    std::fs::remove_dir_all(dir.path().join("thing"))?;
    common::write_file(dir.path(), "thing", "now a file");
    common::ves_command(dir.path(), &["add", "thing"])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(dir.path(), &["ls-files"]));
    assert_eq!(output, "thing\n");

    Ok(())
}
