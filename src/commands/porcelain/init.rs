use crate::areas::repository::Repository;
use std::io::Write;
use std::path::Path;

/// Initialize a new repository at `path`
pub fn init(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<()> {
    let repository = Repository::create(path, writer)?;

    writeln!(
        repository.writer(),
        "Initialized empty Ves repository in {}",
        repository.ves_dir().display()
    )?;

    Ok(())
}
