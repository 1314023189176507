use predicates::prelude::predicate;
use pretty_assertions::assert_eq;

mod common;

#[test]
fn initial_commit_creates_the_branch_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "hello.txt", "hello\n");
    common::ves_command(dir.path(), &["add", "hello.txt"])
        .assert()
        .success();

    common::ves_command(dir.path(), &["commit", "-m", "first"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(root-commit)"))
        .stdout(predicate::str::contains("first"));

    // the staged blob has the well-known hash
    let blob_path = dir
        .path()
        .join(".ves/objects")
        .join(&common::HELLO_BLOB_OID[..2])
        .join(&common::HELLO_BLOB_OID[2..]);
    assert!(blob_path.is_file());

    // HEAD is still symbolic; the branch file now holds the commit hash
    let head = std::fs::read_to_string(dir.path().join(".ves/HEAD"))?;
    assert_eq!(head, "ref: refs/heads/master\n");

    let master = std::fs::read_to_string(dir.path().join(".ves/refs/heads/master"))?;
    assert_eq!(master.len(), 41);
    assert!(master.ends_with('\n'));
    assert!(master.trim().chars().all(|c| c.is_ascii_hexdigit()));

    Ok(())
}

#[test]
fn commit_contents_carry_tree_author_and_message() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();
    let commit_oid = common::rev_parse(dir.path(), "HEAD");

    let output = common::stdout_of(common::ves_command(dir.path(), &["cat-file", &commit_oid]));
    assert!(output.starts_with("tree "));
    assert!(output.contains("author A U Thor <a@u> 0 +0000"));
    assert!(output.contains("committer A U Thor <a@u> 0 +0000"));
    assert!(output.ends_with("first\n\n") || output.ends_with("first\n"));
    assert!(!output.contains("parent "));

    Ok(())
}

#[test]
fn commit_hashes_are_deterministic_for_a_pinned_clock() -> Result<(), Box<dyn std::error::Error>> {
    let first = common::committed_repository();
    let second = common::committed_repository();

    assert_eq!(
        common::rev_parse(first.path(), "HEAD"),
        common::rev_parse(second.path(), "HEAD")
    );

    Ok(())
}

#[test]
fn second_commit_records_its_parent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();
    let first_oid = common::rev_parse(dir.path(), "HEAD");

    common::write_file(dir.path(), "second.txt", "more\n");
    common::ves_command(dir.path(), &["add", "second.txt"])
        .assert()
        .success();
    common::ves_command(dir.path(), &["commit", "-m", "second"])
        .assert()
        .success();

    let second_oid = common::rev_parse(dir.path(), "HEAD");
    assert_ne!(first_oid, second_oid);

    let output = common::stdout_of(common::ves_command(dir.path(), &["cat-file", &second_oid]));
    assert!(output.contains(&format!("parent {first_oid}")));

    Ok(())
}

#[test]
fn commit_on_detached_head_rewrites_head_only() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();
    let first_oid = common::rev_parse(dir.path(), "HEAD");

    // detach HEAD onto the commit itself
    std::fs::write(
        dir.path().join(".ves/HEAD"),
        format!("{first_oid}\n"),
    )?;

    common::write_file(dir.path(), "detached.txt", "off-branch\n");
    common::ves_command(dir.path(), &["add", "detached.txt"])
        .assert()
        .success();
    common::ves_command(dir.path(), &["commit", "-m", "detached work"])
        .assert()
        .success();

    // HEAD itself moved; the branch file did not
    let head = std::fs::read_to_string(dir.path().join(".ves/HEAD"))?;
    assert_ne!(head.trim(), first_oid);
    assert!(head.trim().chars().all(|c| c.is_ascii_hexdigit()));

    let master = std::fs::read_to_string(dir.path().join(".ves/refs/heads/master"))?;
    assert_eq!(master.trim(), first_oid);

    Ok(())
}

#[test]
fn commit_without_identity_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "hello.txt", "hello\n");
    common::ves_command(dir.path(), &["add", "hello.txt"])
        .assert()
        .success();

    common::ves_command_without_identity(dir.path(), &["commit", "-m", "anonymous"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user identity not configured"));

    Ok(())
}

#[test]
fn identity_falls_back_to_the_user_configuration() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(
        dir.path(),
        ".vesconfig",
        "[user]\nname = \"Config User\"\nemail = \"cfg@example.com\"\n",
    );
    common::write_file(dir.path(), "hello.txt", "hello\n");
    common::ves_command(dir.path(), &["add", "hello.txt"])
        .assert()
        .success();

    // HOME points at the repo dir, so ~/.vesconfig is found there
    common::ves_command_without_identity(dir.path(), &["commit", "-m", "via config"])
        .assert()
        .success();

    let commit_oid = common::rev_parse(dir.path(), "HEAD");
    let output = common::stdout_of(common::ves_command(dir.path(), &["cat-file", &commit_oid]));
    assert!(output.contains("author Config User <cfg@example.com>"));

    Ok(())
}

#[test]
fn nested_directories_become_subtrees() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "top.txt", "top\n");
    common::write_file(dir.path(), "a/b/deep.txt", "deep\n");
    common::ves_command(dir.path(), &["add", "."])
        .assert()
        .success();
    common::ves_command(dir.path(), &["commit", "-m", "nested"])
        .assert()
        .success();

    let listing = common::stdout_of(common::ves_command(dir.path(), &["ls-tree", "HEAD"]));
    assert!(listing.contains("040000 tree"));
    assert!(listing.contains("\ta\n"));
    assert!(listing.contains("100644 blob"));
    assert!(listing.contains("\ttop.txt\n"));

    let recursive = common::stdout_of(common::ves_command(dir.path(), &["ls-tree", "-r", "HEAD"]));
    assert!(recursive.contains("\ta/b/deep.txt\n"));
    assert!(recursive.contains("\ttop.txt\n"));

    Ok(())
}
