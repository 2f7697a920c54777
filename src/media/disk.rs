//! Filesystem-backed media
//!
//! Maps medium-relative paths onto a root directory using `std::fs`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use super::{Media, MediaFile};

/// A [`Media`] rooted at a host directory.
pub struct DiskMedia {
    root: PathBuf,
    mounted: bool,
}

impl DiskMedia {
    /// Create an unmounted medium rooted at `root`. Nothing is touched on
    /// disk until `mount`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Media for DiskMedia {
    type File = DiskFile;

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn mount(&mut self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        self.mounted = true;
        Ok(())
    }

    fn create_dir(&mut self, path: &str) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn open_read(&mut self, path: &str) -> io::Result<DiskFile> {
        let file = File::open(self.resolve(path))?;
        let len = file.metadata()?.len();
        Ok(DiskFile { file, pos: 0, len })
    }

    fn open_write(&mut self, path: &str) -> io::Result<DiskFile> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.resolve(path))?;
        Ok(DiskFile { file, pos: 0, len: 0 })
    }

    fn remove(&mut self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path))
    }
}

/// Open handle on a [`DiskMedia`] file. Tracks cursor and length so
/// `remaining` needs no syscall.
pub struct DiskFile {
    file: File,
    pos: u64,
    len: u64,
}

impl MediaFile for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.pos += n as u64;
        self.len = self.len.max(self.pos);
        Ok(n)
    }

    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }
}
