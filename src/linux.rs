use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::AsRawFd;
use std::os::unix::io::FromRawFd;
use std::path::Path;
use std::path::PathBuf;

use libc::c_char;
use libc::c_int;
use libc::fcntl;
use libc::linkat;
use libc::open;
use libc::AT_FDCWD;
use libc::AT_SYMLINK_FOLLOW;
use libc::F_GETFL;
use libc::O_CLOEXEC;
use libc::O_RDWR;
use libc::O_TMPFILE;

/// This platform has a directory-scoped anonymous open.
pub const AVAILABLE: bool = true;

/// Open an unnamed regular file inside `dir`, which must be a directory.
pub fn create(dir: &Path) -> io::Result<fs::File> {
    let path = cstr(dir)?;
    let fd = cvt(unsafe { open(path.as_ptr(), O_CLOEXEC | O_TMPFILE | O_RDWR, 0o600) })?;
    Ok(unsafe { fs::File::from_raw_fd(fd) })
}

/// A name for an open file which doesn't need a directory entry.
pub fn fd_path(file: &fs::File) -> PathBuf {
    PathBuf::from(format!("/proc/self/fd/{}", file.as_raw_fd()))
}

/// Was this file opened with `O_TMPFILE`?
pub fn is_anonymous(file: &fs::File) -> io::Result<bool> {
    let flags = cvt(unsafe { fcntl(file.as_raw_fd(), F_GETFL) })?;
    Ok(flags & O_TMPFILE == O_TMPFILE)
}

/// Give an open file a (new) name. `dest` must not exist.
///
/// The borrow keeps `what` open until the kernel has resolved its `/proc` path.
pub fn link_at<P: AsRef<Path>>(what: &fs::File, dest: P) -> io::Result<()> {
    let old_path = cstr(&fd_path(what))?;
    let new_path = cstr(dest.as_ref())?;

    unsafe { link_symlink_fd_at(&old_path, &new_path) }
}

// Stolen from tempfile / std < 1.6.0.
pub fn cstr(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contained a null"))
}

fn cvt(result: c_int) -> io::Result<c_int> {
    if -1 == result {
        Err(io::Error::last_os_error())
    } else {
        Ok(result)
    }
}

/// Attempt to link an old symlink to a file back into the filesystem.
unsafe fn link_symlink_fd_at(old_path: &CString, new_path: &CString) -> io::Result<()> {
    cvt(linkat(
        AT_FDCWD,
        old_path.as_ptr() as *const c_char,
        AT_FDCWD,
        new_path.as_ptr() as *const c_char,
        AT_SYMLINK_FOLLOW,
    ))?;
    Ok(())
}
