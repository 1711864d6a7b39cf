//! Translation from raw OS errors to the outcomes the allocator acts on.
//!
//! Porting to a new platform should only need changes here.

use std::io;

/// What a failed anonymous open tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The kernel or filesystem can't do it; remember that and use a named file.
    Unsupported,
    /// A real failure, reported to the caller.
    Fatal,
}

pub fn probe(err: &io::Error) -> Probe {
    if io::ErrorKind::Unsupported == err.kind() {
        return Probe::Unsupported;
    }

    match err.raw_os_error() {
        Some(code) if unsupported_code(code) => Probe::Unsupported,
        _ => Probe::Fatal,
    }
}

// Kernels without O_TMPFILE see O_DIRECTORY with write access, and refuse with EISDIR.
#[cfg(unix)]
fn unsupported_code(code: i32) -> bool {
    code == libc::EISDIR || code == libc::EOPNOTSUPP || code == libc::ENOTSUP
}

#[cfg(not(unix))]
fn unsupported_code(_code: i32) -> bool {
    false
}

/// Does this error blame the target directory, rather than the file we tried to make in it?
pub fn is_directory_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied | io::ErrorKind::NotADirectory
    )
}

/// The OS error code, looking through any wrappers `tempfile` put around it.
pub fn raw_os_error(err: &io::Error) -> Option<i32> {
    if let Some(code) = err.raw_os_error() {
        return Some(code);
    }

    let mut cause = err.get_ref().map(|inner| inner as &(dyn std::error::Error + 'static));
    while let Some(current) = cause {
        if let Some(code) = current
            .downcast_ref::<io::Error>()
            .and_then(io::Error::raw_os_error)
        {
            return Some(code);
        }
        cause = current.source();
    }

    None
}
