use assert_fs::TempDir;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;

mod common;

#[test]
fn init_writes_the_repository_skeleton() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;

    common::ves_command(dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized empty Ves repository in"));

    let ves_dir = dir.path().join(".ves");
    assert!(ves_dir.join("objects").is_dir());
    assert!(ves_dir.join("refs").join("heads").is_dir());
    assert!(ves_dir.join("refs").join("tags").is_dir());
    assert!(ves_dir.join("branches").is_dir());
    assert!(ves_dir.join("description").is_file());
    assert!(ves_dir.join("config").is_file());

    let head = std::fs::read_to_string(ves_dir.join("HEAD"))?;
    assert_eq!(head, "ref: refs/heads/master\n");

    let config = std::fs::read_to_string(ves_dir.join("config"))?;
    assert!(config.contains("repositoryformatversion = 0"));

    Ok(())
}

#[test]
fn init_at_an_explicit_path_creates_the_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let target = dir.path().join("project");

    common::ves_command(dir.path(), &["init", target.to_str().unwrap()])
        .assert()
        .success();

    assert!(target.join(".ves").join("HEAD").is_file());

    Ok(())
}

#[test]
fn init_refuses_an_existing_repository() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();

    common::ves_command(dir.path(), &["init"]).assert().failure();

    Ok(())
}

#[test]
fn commands_fail_outside_a_repository() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;

    common::ves_command(dir.path(), &["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a ves repository"));

    Ok(())
}

#[test]
fn unsupported_format_version_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::init_repository();
    std::fs::write(
        dir.path().join(".ves").join("config"),
        "[core]\nrepositoryformatversion = 2\nfilemode = false\nbare = false\n",
    )?;

    common::ves_command(dir.path(), &["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported repositoryformatversion"));

    Ok(())
}
