use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;

use crate::errno;
use crate::errno::Probe;
use crate::fallback;
use crate::linux;
use crate::Capability;
use crate::Error;
use crate::PersistableTempFile;

/// How a new temporary file will be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Try an anonymous file first, falling back if the filesystem refuses.
    Anonymous,
    /// Go straight to a named file.
    Named,
}

impl Strategy {
    pub fn select(capability: &Capability) -> Strategy {
        if linux::AVAILABLE && !capability.unsupported() {
            Strategy::Anonymous
        } else {
            Strategy::Named
        }
    }
}

/// Creates and links temporary files, remembering what the platform can do in a [`Capability`].
///
/// [`TempFiles::new`] shares the process-wide [`Capability`], as the free functions do.
/// Tests, or callers who want to keep filesystems apart, can bring their own.
#[derive(Debug, Clone, Copy)]
pub struct TempFiles<'c> {
    capability: &'c Capability,
    open_anonymous: fn(&Path) -> io::Result<fs::File>,
}

impl TempFiles<'static> {
    pub fn new() -> TempFiles<'static> {
        TempFiles::with_capability(Capability::process())
    }
}

impl Default for TempFiles<'static> {
    fn default() -> Self {
        TempFiles::new()
    }
}

impl<'c> TempFiles<'c> {
    pub fn with_capability(capability: &'c Capability) -> TempFiles<'c> {
        TempFiles {
            capability,
            open_anonymous: linux::create,
        }
    }

    #[cfg(test)]
    fn with_open_anonymous(self, open_anonymous: fn(&Path) -> io::Result<fs::File>) -> Self {
        TempFiles {
            open_anonymous,
            ..self
        }
    }

    pub fn capability(&self) -> &'c Capability {
        self.capability
    }

    /// Create a temporary file in the default temporary directory.
    pub fn create(&self) -> Result<PersistableTempFile, Error> {
        self.create_in("")
    }

    /// Create a temporary file in `dir`, open for reading and writing.
    ///
    /// An empty `dir` means the default temporary directory, as per [`tempfile::env::temp_dir`].
    ///
    /// Where the kernel and filesystem allow it, the file is anonymous. Otherwise, a randomly
    /// named file is created instead, and [`must_remove`](PersistableTempFile::must_remove) is
    /// set: removing it is now your problem. Concurrent callers never get the same file.
    pub fn create_in<P: AsRef<Path>>(&self, dir: P) -> Result<PersistableTempFile, Error> {
        let dir = resolve(dir.as_ref());
        let strategy = Strategy::select(self.capability);
        tracing::trace!(?strategy, dir = %dir.display(), "creating temporary file");

        if Strategy::Named == strategy {
            return create_named(&dir);
        }

        match (self.open_anonymous)(&dir) {
            Ok(file) => Ok(PersistableTempFile::anonymous(file)),
            Err(e) => match errno::probe(&e) {
                Probe::Unsupported => {
                    self.capability.mark_unsupported();
                    create_named(&dir)
                }
                Probe::Fatal => Err(Error::create("open", dir.into_owned(), e)),
            },
        }
    }

    /// Give `file` the permanent name `dest`, on the same filesystem.
    ///
    /// Named files are renamed, replacing anything at `dest`. Anonymous files are linked, and
    /// `dest` must not exist. Either way, `file` stays open and usable, and `dest` must not be
    /// removed separately. On error, nothing new is visible.
    ///
    /// `file` must have come from this crate.
    pub fn link<P: AsRef<Path>>(
        &self,
        file: &mut PersistableTempFile,
        dest: P,
    ) -> Result<(), Error> {
        let dest = dest.as_ref();
        if !self.is_anonymous(file, dest)? {
            return rename(file, dest);
        }

        tracing::trace!(dest = %dest.display(), "linking anonymous file");
        linux::link_at(file.as_ref(), dest).map_err(|e| Error::link("link", file.path(), dest, e))
    }

    /// Like [`link`](Self::link), but atomically replaces any existing file at `dest`.
    ///
    /// Anonymous files are first linked to a random name next to `dest`, then renamed over it.
    /// In pathological failure cases, that random name may be left behind.
    pub fn replace<P: AsRef<Path>>(
        &self,
        file: &mut PersistableTempFile,
        dest: P,
    ) -> Result<(), Error> {
        let dest = dest.as_ref();
        if !self.is_anonymous(file, dest)? {
            return rename(file, dest);
        }

        match linux::link_at(file.as_ref(), dest) {
            Ok(()) => return Ok(()),
            Err(ref e) if io::ErrorKind::AlreadyExists == e.kind() => (),
            Err(e) => return Err(Error::link("link", file.path(), dest, e)),
        }

        let mut dest_tmp = dest
            .parent()
            .ok_or_else(|| {
                let e = io::Error::new(io::ErrorKind::InvalidInput, "path must have a parent");
                Error::link("link", file.path(), dest, e)
            })?
            .to_path_buf();
        let mut rng = rand::thread_rng();

        for _ in 0..32768 {
            dest_tmp.push(format!(".{:x}.tmp", rng.gen::<u64>()));

            match linux::link_at(file.as_ref(), &dest_tmp) {
                Ok(()) => {
                    tracing::trace!(tmp = %dest_tmp.display(), dest = %dest.display(), "replacing");
                    // a named copy now exists; move it over the destination
                    return fs::rename(&dest_tmp, dest).map_err(|e| {
                        let _ = fs::remove_file(&dest_tmp);
                        Error::link("rename", &dest_tmp, dest, e)
                    });
                }
                Err(ref e) if io::ErrorKind::AlreadyExists == e.kind() => (),
                Err(e) => return Err(Error::link("link", file.path(), &dest_tmp, e)),
            }
            dest_tmp.pop();
        }

        Err(Error::link(
            "link",
            file.path(),
            dest,
            io::Error::new(io::ErrorKind::AlreadyExists, "couldn't find a free temporary name"),
        ))
    }

    // The capability says named files have been seen somewhere, not where this one came from:
    // another filesystem may still have handed out anonymous files.
    fn is_anonymous(&self, file: &PersistableTempFile, dest: &Path) -> Result<bool, Error> {
        match *file {
            PersistableTempFile::Named(..) => return Ok(false),
            PersistableTempFile::Anonymous(..) if self.capability.unsupported() => return Ok(true),
            PersistableTempFile::Anonymous(..) => (),
        }

        if !linux::AVAILABLE {
            return Ok(false);
        }

        linux::is_anonymous(file.as_ref()).map_err(|e| Error::link("fcntl", file.path(), dest, e))
    }
}

fn resolve(dir: &Path) -> Cow<'_, Path> {
    if dir.as_os_str().is_empty() {
        Cow::Owned(tempfile::env::temp_dir().to_path_buf())
    } else {
        Cow::Borrowed(dir)
    }
}

fn create_named(dir: &Path) -> Result<PersistableTempFile, Error> {
    let (file, path) = fallback::create(dir).map_err(|e| Error::create("create", dir, e))?;
    Ok(PersistableTempFile::named(file, path))
}

fn rename(file: &mut PersistableTempFile, dest: &Path) -> Result<(), Error> {
    tracing::trace!(from = %file.path().display(), dest = %dest.display(), "renaming");
    fs::rename(file.path(), dest).map_err(|e| Error::link("rename", file.path(), dest, e))?;
    file.renamed(dest.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn known_unsupported_selects_named() {
        let cap = Capability::new();
        cap.mark_unsupported();
        assert_eq!(Strategy::Named, Strategy::select(&cap));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unknown_selects_anonymous_on_linux() {
        assert_eq!(Strategy::Anonymous, Strategy::select(&Capability::new()));
    }

    #[test]
    fn empty_means_default() {
        assert_eq!(tempfile::env::temp_dir(), &*resolve(Path::new("")));
        assert_eq!(Path::new("/srv"), &*resolve(Path::new("/srv")));
    }

    #[test]
    fn missing_directory_does_not_mark() {
        let cap = Capability::new();
        let dir = tempfile::TempDir::new().unwrap();
        let err = TempFiles::with_capability(&cap)
            .create_in(dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::Directory { .. }), "{:?}", err);
        assert!(!cap.unsupported());
    }

    #[cfg(target_os = "linux")]
    fn old_kernel(_dir: &Path) -> io::Result<fs::File> {
        Err(io::Error::from_raw_os_error(libc::EISDIR))
    }

    #[cfg(target_os = "linux")]
    fn odd_filesystem(_dir: &Path) -> io::Result<fs::File> {
        Err(io::Error::from_raw_os_error(libc::EOPNOTSUPP))
    }

    #[cfg(target_os = "linux")]
    fn full_disc(_dir: &Path) -> io::Result<fs::File> {
        Err(io::Error::from_raw_os_error(libc::ENOSPC))
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn refused_open_falls_back_and_remembers() {
        for refusal in [old_kernel as fn(&Path) -> io::Result<fs::File>, odd_filesystem] {
            let cap = Capability::new();
            let dir = tempfile::TempDir::new().unwrap();
            let files = TempFiles::with_capability(&cap).with_open_anonymous(refusal);

            let made = files.create_in(dir.path()).unwrap();
            assert!(cap.unsupported());
            assert!(made.must_remove());
            assert_eq!(Some(dir.path()), made.path().parent());
            assert!(made.path().exists());
            assert_eq!(Strategy::Named, Strategy::select(&cap));
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_disc_is_reported() {
        let cap = Capability::new();
        let dir = tempfile::TempDir::new().unwrap();
        let files = TempFiles::with_capability(&cap).with_open_anonymous(full_disc);

        let err = files.create_in(dir.path()).unwrap_err();
        match err {
            Error::Allocate { op, ref path, .. } => {
                assert_eq!("open", op);
                assert_eq!(dir.path(), path);
            }
            ref other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(Some(libc::ENOSPC), err.raw_os_error());
        assert!(!cap.unsupported());
        assert_eq!(0, fs::read_dir(dir.path()).unwrap().count());
    }
}
