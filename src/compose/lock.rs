//! Exclusive per-image lock held for the duration of a composition.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct ImageLock {
    path: PathBuf,
    _file: File,
}

impl ImageLock {
    /// Lock `<image>.lock`, failing immediately if another process holds it.
    pub fn acquire(image: &Path) -> Result<Self> {
        let mut raw = OsString::from(image.as_os_str());
        raw.push(".lock");
        let path = PathBuf::from(raw);

        // The file outlives the lock. Unlinking it, before locking or on
        // release, lets another process lock a fresh inode at the same path.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(format!("creating lock file '{}'", path.display()), e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::Locked(path));
        }

        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_until_dropped() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("game.flatimage");

        let lock = ImageLock::acquire(&image).unwrap();
        assert_eq!(lock.path(), tmp.path().join("game.flatimage.lock"));
        assert!(matches!(ImageLock::acquire(&image), Err(Error::Locked(_))));

        drop(lock);
        assert!(ImageLock::acquire(&image).is_ok());
    }

    #[test]
    fn release_keeps_the_lock_file() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("game.flatimage");

        let first = ImageLock::acquire(&image).unwrap();
        let path = first.path().to_path_buf();
        drop(first);
        assert!(path.exists());

        // A holder on the surviving inode still excludes newcomers.
        let second = ImageLock::acquire(&image).unwrap();
        assert!(matches!(ImageLock::acquire(&image), Err(Error::Locked(_))));
        drop(second);
        assert!(path.exists());
    }
}
