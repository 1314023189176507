use pretty_assertions::assert_eq;

mod common;

#[test]
fn layered_rules_combine_scoped_and_exclude_sources() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();

    // scoped rules live in a staged .vesignore; the exclude file is local
    common::write_file(dir.path(), ".vesignore", "*.log\n!keep.log\n");
    common::ves_command(dir.path(), &["add", ".vesignore"])
        .assert()
        .success();
    common::write_file(dir.path(), ".ves/info/exclude", "build/\n");

    let output = common::stdout_of(common::ves_command(
        dir.path(),
        &["check-ignore", "build/out.log", "keep.log", "debug.log"],
    ));
    assert_eq!(output, "build/out.log\ndebug.log\n");

    Ok(())
}

#[test]
fn negation_wins_within_the_scoped_list() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), ".vesignore", "*.tmp\n!precious.tmp\n");
    common::ves_command(dir.path(), &["add", ".vesignore"])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(
        dir.path(),
        &["check-ignore", "junk.tmp", "precious.tmp"],
    ));
    assert_eq!(output, "junk.tmp\n");

    Ok(())
}

#[test]
fn unstaged_vesignore_edits_have_no_effect() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), ".vesignore", "*.log\n");

    // rules come from the staged blob, so nothing is ignored yet
    let output = common::stdout_of(common::ves_command(
        dir.path(),
        &["check-ignore", "debug.log"],
    ));
    assert_eq!(output, "");

    common::ves_command(dir.path(), &["add", ".vesignore"])
        .assert()
        .success();
    let output = common::stdout_of(common::ves_command(
        dir.path(),
        &["check-ignore", "debug.log"],
    ));
    assert_eq!(output, "debug.log\n");

    Ok(())
}

#[test]
fn nested_vesignore_scopes_to_its_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    common::write_file(dir.path(), "sub/.vesignore", "**/*.gen\n");
    common::ves_command(dir.path(), &["add", "sub/.vesignore"])
        .assert()
        .success();

    let output = common::stdout_of(common::ves_command(
        dir.path(),
        &["check-ignore", "sub/code.gen", "sub/deep/code.gen", "code.gen"],
    ));
    assert_eq!(output, "sub/code.gen\nsub/deep/code.gen\n");

    Ok(())
}

#[test]
fn ignored_files_are_hidden_from_status() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::committed_repository();
    common::write_file(dir.path(), ".ves/info/exclude", "*.swp\n");
    common::write_file(dir.path(), "editor.swp", "scratch");
    common::write_file(dir.path(), "visible.txt", "shown");

    let output = common::stdout_of(common::ves_command(dir.path(), &["status", "--porcelain"]));
    assert_eq!(output, "?? visible.txt\n");

    Ok(())
}
