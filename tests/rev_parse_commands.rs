use predicates::prelude::predicate;
use pretty_assertions::assert_eq;

mod common;

#[test]
fn head_resolves_to_the_current_commit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();

    let resolved = common::rev_parse(dir.path(), "HEAD");
    let master = std::fs::read_to_string(dir.path().join(".ves/refs/heads/master"))?;
    assert_eq!(resolved, master.trim());

    Ok(())
}

#[test]
fn short_hash_resolves_to_the_unique_match() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();

    let resolved = common::rev_parse(dir.path(), &common::HELLO_BLOB_OID[..4]);
    assert_eq!(resolved, common::HELLO_BLOB_OID);

    Ok(())
}

#[test]
fn uppercase_prefixes_are_folded_to_lowercase() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();

    let prefix = common::HELLO_BLOB_OID[..6].to_ascii_uppercase();
    let resolved = common::rev_parse(dir.path(), &prefix);
    assert_eq!(resolved, common::HELLO_BLOB_OID);

    Ok(())
}

#[test]
fn a_shared_prefix_is_ambiguous() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();

    // plant two object files sharing the abcd prefix; resolution only
    // enumerates file names, so placeholder contents suffice
    let shard = dir.path().join(".ves/objects/ab");
    std::fs::create_dir_all(&shard)?;
    std::fs::write(shard.join("cd0000000000000000000000000000000000aa"), b"")?;
    std::fs::write(shard.join("cd0000000000000000000000000000000000bb"), b"")?;

    common::ves_command(dir.path(), &["rev-parse", "abcd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ambiguous object name abcd"));

    Ok(())
}

#[test]
fn a_planted_object_resolves_until_a_rival_appears() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    let shard = dir.path().join(".ves/objects/ab");
    std::fs::create_dir_all(&shard)?;
    std::fs::write(shard.join("cd0000000000000000000000000000000000aa"), b"")?;

    let resolved = common::rev_parse(dir.path(), "abcd");
    assert_eq!(resolved, "abcd0000000000000000000000000000000000aa");

    std::fs::write(shard.join("cd0000000000000000000000000000000000bb"), b"")?;
    common::ves_command(dir.path(), &["rev-parse", "abcd"])
        .assert()
        .failure();

    Ok(())
}

#[test]
fn branch_and_tag_names_resolve_through_refs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();
    let commit_oid = common::rev_parse(dir.path(), "HEAD");

    assert_eq!(common::rev_parse(dir.path(), "master"), commit_oid);

    common::ves_command(dir.path(), &["tag", "v1.0"])
        .assert()
        .success();
    assert_eq!(common::rev_parse(dir.path(), "v1.0"), commit_oid);

    Ok(())
}

#[test]
fn unknown_names_fail_with_object_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();

    common::ves_command(dir.path(), &["rev-parse", "no-such-branch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("object not found"));

    Ok(())
}

#[test]
fn type_follow_reaches_the_tree_behind_head() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();

    let tree_oid = common::stdout_of(common::ves_command(
        dir.path(),
        &["rev-parse", "-t", "tree", "HEAD"],
    ));
    let tree_oid = tree_oid.trim();

    let listing = common::stdout_of(common::ves_command(dir.path(), &["ls-tree", tree_oid]));
    assert!(listing.contains("hello.txt"));

    Ok(())
}

#[test]
fn type_mismatch_without_follow_target_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();

    // a blob can never be followed to a commit
    common::ves_command(
        dir.path(),
        &["rev-parse", "-t", "commit", common::HELLO_BLOB_OID],
    )
    .assert()
    .failure();

    Ok(())
}
