use std::fmt;
use std::fs;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::ops::Deref;
use std::ops::DerefMut;
use std::path::Path;
use std::path::PathBuf;

use crate::linux;

/// An open temporary file, which may or may not have a name yet.
///
/// Produced by [`TempFiles::create_in`](crate::TempFiles::create_in), and given a permanent
/// name by [`TempFiles::link`](crate::TempFiles::link).
pub enum PersistableTempFile {
    /// No directory entry. The file vanishes when closed, unless linked first.
    Anonymous(fs::File, PathBuf),
    /// A visible file with a random name, which nobody will remove automatically.
    Named(fs::File, PathBuf),
}

use self::PersistableTempFile::*;

impl PersistableTempFile {
    pub(crate) fn anonymous(file: fs::File) -> PersistableTempFile {
        let path = linux::fd_path(&file);
        Anonymous(file, path)
    }

    pub(crate) fn named(file: fs::File, path: PathBuf) -> PersistableTempFile {
        Named(file, path)
    }

    /// Whether the caller must remove the file's allocated name when finished, unless the file
    /// is linked.
    ///
    /// `false` means the file has no visible name and goes away on its own once closed.
    ///
    /// This describes the file as it was created, and doesn't change on
    /// [`link`](crate::TempFiles::link). A successful link satisfies the obligation: afterwards,
    /// [`path()`](Self::path) is the permanent name, which must not be removed.
    #[inline]
    pub fn must_remove(&self) -> bool {
        match *self {
            Anonymous(..) => false,
            Named(..) => true,
        }
    }

    /// The file's current name.
    ///
    /// For an anonymous file this is a `/proc/self/fd` path, useful for diagnostics, not
    /// a directory entry.
    #[inline]
    pub fn path(&self) -> &Path {
        match *self {
            Anonymous(_, ref path) | Named(_, ref path) => path,
        }
    }

    /// Give up on the wrapper, keeping just the open file.
    pub fn into_file(self) -> fs::File {
        match self {
            Anonymous(file, _) | Named(file, _) => file,
        }
    }

    /// Record that a named file has been renamed to `to`.
    pub(crate) fn renamed(&mut self, to: PathBuf) {
        if let Named(_, ref mut path) = *self {
            *path = to;
        }
    }
}

impl AsRef<fs::File> for PersistableTempFile {
    #[inline]
    fn as_ref(&self) -> &fs::File {
        match *self {
            Anonymous(ref file, _) | Named(ref file, _) => file,
        }
    }
}

impl AsMut<fs::File> for PersistableTempFile {
    #[inline]
    fn as_mut(&mut self) -> &mut fs::File {
        match *self {
            Anonymous(ref mut file, _) | Named(ref mut file, _) => file,
        }
    }
}

impl Deref for PersistableTempFile {
    type Target = fs::File;
    #[inline]
    fn deref(&self) -> &fs::File {
        self.as_ref()
    }
}

impl DerefMut for PersistableTempFile {
    #[inline]
    fn deref_mut(&mut self) -> &mut fs::File {
        self.as_mut()
    }
}

impl fmt::Debug for PersistableTempFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PersistableTempFile::{}({})",
            match *self {
                Anonymous(..) => "Anonymous",
                Named(..) => "Named",
            },
            self.path().display()
        )
    }
}

impl Read for PersistableTempFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.as_mut().read(buf)
    }
}

impl Write for PersistableTempFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.as_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.as_mut().flush()
    }
}

impl Seek for PersistableTempFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.as_mut().seek(pos)
    }
}

impl<'a> Read for &'a PersistableTempFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.as_ref().read(buf)
    }
}

impl<'a> Write for &'a PersistableTempFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.as_ref().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.as_ref().flush()
    }
}

impl<'a> Seek for &'a PersistableTempFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.as_ref().seek(pos)
    }
}

#[cfg(unix)]
impl ::std::os::unix::io::AsRawFd for PersistableTempFile {
    #[inline]
    fn as_raw_fd(&self) -> ::std::os::unix::io::RawFd {
        self.as_ref().as_raw_fd()
    }
}

#[cfg(windows)]
impl ::std::os::windows::io::AsRawHandle for PersistableTempFile {
    #[inline]
    fn as_raw_handle(&self) -> ::std::os::windows::io::RawHandle {
        self.as_ref().as_raw_handle()
    }
}
