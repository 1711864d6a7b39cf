use std::error;
use std::fmt;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::errno;

/// Why creating or linking a temporary file failed.
///
/// Every variant names the operation which failed, the path(s) involved, and the underlying
/// OS error.
#[derive(Debug)]
pub enum Error {
    /// The target directory is missing, isn't a directory, or we aren't allowed in.
    Directory {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// Anything else that went wrong creating the file: a full disc, quota, etc.
    Allocate {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// The file couldn't be given its permanent name.
    ///
    /// An anonymous file stays anonymous, and a named file stays where it was.
    Link {
        op: &'static str,
        old: PathBuf,
        new: PathBuf,
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn create<P: Into<PathBuf>>(op: &'static str, path: P, source: io::Error) -> Error {
        let path = path.into();
        if errno::is_directory_error(&source) {
            Error::Directory { op, path, source }
        } else {
            Error::Allocate { op, path, source }
        }
    }

    pub(crate) fn link<P: AsRef<Path>, Q: AsRef<Path>>(
        op: &'static str,
        old: P,
        new: Q,
        source: io::Error,
    ) -> Error {
        Error::Link {
            op,
            old: old.as_ref().to_path_buf(),
            new: new.as_ref().to_path_buf(),
            source,
        }
    }

    /// The name of the failed operation, e.g. `open`, `rename` or `link`.
    pub fn op(&self) -> &'static str {
        match *self {
            Error::Directory { op, .. } | Error::Allocate { op, .. } | Error::Link { op, .. } => op,
        }
    }

    /// The directory for creation errors, or the source path for link errors.
    pub fn path(&self) -> &Path {
        match *self {
            Error::Directory { ref path, .. } | Error::Allocate { ref path, .. } => path,
            Error::Link { ref old, .. } => old,
        }
    }

    pub fn io_error(&self) -> &io::Error {
        match *self {
            Error::Directory { ref source, .. }
            | Error::Allocate { ref source, .. }
            | Error::Link { ref source, .. } => source,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.io_error().kind()
    }

    pub fn raw_os_error(&self) -> Option<i32> {
        errno::raw_os_error(self.io_error())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Directory {
                op,
                ref path,
                ref source,
            }
            | Error::Allocate {
                op,
                ref path,
                ref source,
            } => write!(f, "{} {}: {}", op, path.display(), source),
            Error::Link {
                op,
                ref old,
                ref new,
                ref source,
            } => write!(f, "{} {} {}: {}", op, old.display(), new.display(), source),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.io_error())
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        io::Error::new(e.kind(), e)
    }
}
