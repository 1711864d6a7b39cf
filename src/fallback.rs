use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Create a visible file with a unique, random name inside `dir`.
///
/// Name collisions are retried by `tempfile`. Nothing removes the file afterwards.
pub fn create(dir: &Path) -> io::Result<(fs::File, PathBuf)> {
    let named = tempfile::Builder::new().prefix(".tmp").tempfile_in(dir)?;
    named.keep().map_err(|persist_error| persist_error.error)
}
