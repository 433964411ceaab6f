//! Jailed working directories holding packaged defaults documents.
//!
//! Plugin types read defaults files relative to the working directory, so
//! tests write them inside a `figment::Jail` that is torn down afterwards.

use anyhow::{Result, anyhow};
use figment::Jail;

/// Write each `(file, contents)` pair into a fresh jail and run `check` there.
///
/// # Errors
///
/// Returns an error when a document cannot be written or `check` fails.
pub fn with_documents<F, T>(documents: &[(&str, &str)], check: F) -> Result<T>
where
    F: FnOnce(&Jail) -> Result<T>,
{
    let mut outcome = None;
    Jail::try_with(|jail| {
        for &(file, contents) in documents {
            jail.create_file(file, contents)?;
        }
        outcome = Some(check(jail));
        Ok(())
    })
    .map_err(|err| anyhow!("jailed documents could not be written: {err}"))?;
    outcome.ok_or_else(|| anyhow!("jailed check did not run"))?
}

/// Replace the contents of `file`, as an operator editing a defaults document.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn rewrite_document(jail: &Jail, file: &str, contents: &str) -> Result<()> {
    jail.create_file(file, contents)
        .map(drop)
        .map_err(|err| anyhow!("{file} could not be rewritten: {err}"))
}
