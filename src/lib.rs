//! Temporary files which don't need a name until you give them one.
//!
//! On Linux, files are created with `O_TMPFILE`: they have no directory entry, so there is
//! nothing to clean up if the program dies, and nobody can see them half-written. When the work
//! is done, [`link`] gives the file its permanent name with `linkat`.
//!
//! Where that isn't available (other platforms, old kernels, some filesystems), a normal,
//! randomly named temporary file is used instead, and [`link`] renames it. This is remembered
//! for the rest of the process, so the doomed `open` isn't retried every time.
//!
//! # Example
//!
//! ```rust
//! # use std::io::Write;
//! let dir = tempfile::TempDir::new().unwrap();
//! let mut temp = tempfile_link::tempfile_in(dir.path()).unwrap();
//! temp.write_all(b"hello").unwrap();
//! tempfile_link::link(&mut temp, dir.path().join("hello.txt")).unwrap();
//! ```

use std::path::Path;

mod capability;
mod errno;
mod error;
mod fallback;
mod persistable;
mod strategy;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod linux {
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::path::PathBuf;

    pub const AVAILABLE: bool = false;

    pub fn create(_dir: &Path) -> io::Result<fs::File> {
        Err(io::ErrorKind::Unsupported.into())
    }

    pub fn fd_path(_file: &fs::File) -> PathBuf {
        PathBuf::new()
    }

    pub fn is_anonymous(_file: &fs::File) -> io::Result<bool> {
        Ok(false)
    }

    pub fn link_at<P: AsRef<Path>>(_what: &fs::File, _dest: P) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

pub use crate::capability::Capability;
pub use crate::error::Error;
pub use crate::persistable::PersistableTempFile;
pub use crate::strategy::Strategy;
pub use crate::strategy::TempFiles;

/// Create a temporary file in the default temporary directory.
///
/// See [`TempFiles::create_in`].
pub fn tempfile() -> Result<PersistableTempFile, Error> {
    TempFiles::new().create()
}

/// Create a temporary file in `dir`, or the default temporary directory if `dir` is empty.
///
/// If [`must_remove`](PersistableTempFile::must_remove) is set on the result, it is the
/// caller's job to remove [`path`](PersistableTempFile::path) unless the file is [`link`]ed.
///
/// See [`TempFiles::create_in`].
pub fn tempfile_in<P: AsRef<Path>>(dir: P) -> Result<PersistableTempFile, Error> {
    TempFiles::new().create_in(dir)
}

/// Make `file` permanent at `dest`. See [`TempFiles::link`].
pub fn link<P: AsRef<Path>>(file: &mut PersistableTempFile, dest: P) -> Result<(), Error> {
    TempFiles::new().link(file, dest)
}

/// Make `file` permanent at `dest`, replacing anything already there. See [`TempFiles::replace`].
pub fn replace<P: AsRef<Path>>(file: &mut PersistableTempFile, dest: P) -> Result<(), Error> {
    TempFiles::new().replace(file, dest)
}
