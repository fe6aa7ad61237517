use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

/// A flat directory of picture files.
///
/// The provisioner only needs these operations, so tests can swap in an
/// in-memory store instead of touching the disk.
pub trait PictureStore: Send + Sync {
    /// Human-readable location, used in messages.
    fn location(&self) -> String;

    /// Create the directory (and its parents) if it does not exist yet.
    fn ensure_dir(&self) -> io::Result<()>;

    /// Names of the files directly inside the directory, symlinks included.
    /// Names are returned as the filesystem stores them, so every one can be
    /// passed back to `remove` unchanged.
    fn list(&self) -> io::Result<Vec<OsString>>;

    fn remove(&self, name: &OsStr) -> io::Result<()>;

    /// Create or overwrite `name` with `bytes`.
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

impl<T: PictureStore + ?Sized> PictureStore for std::sync::Arc<T> {
    fn location(&self) -> String {
        (**self).location()
    }

    fn ensure_dir(&self) -> io::Result<()> {
        (**self).ensure_dir()
    }

    fn list(&self) -> io::Result<Vec<OsString>> {
        (**self).list()
    }

    fn remove(&self, name: &OsStr) -> io::Result<()> {
        (**self).remove(name)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        (**self).write(name, bytes)
    }
}

/// Picture store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    dir: PathBuf,
}

impl LocalDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PictureStore for LocalDirStore {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    fn list(&self) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            // `remove_file` on a symlink removes the link, never its target.
            let file_type = entry.file_type()?;
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }
            names.push(entry.file_name());
        }
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &OsStr) -> io::Result<()> {
        std::fs::remove_file(self.dir.join(name))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(self.dir.join(name), bytes)
    }
}
