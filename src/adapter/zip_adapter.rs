//! ZIP archive adapter.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use crate::adapter::EntrySource;
use crate::entry::{Entry, EntryKind};
use crate::error::Result;

/// Entry source over a ZIP archive.
///
/// ZIP has a central directory, so content is reopened by index on every
/// [`EntrySource::open_content`] call and a retry always restarts from the
/// first byte. Symlink targets are stored as the entry body.
pub struct ZipSource<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
    next: usize,
    current: Option<usize>,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: zip::ZipArchive::new(reader)?,
            next: 0,
            current: None,
        })
    }

    /// Number of entries in the central directory.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

impl ZipSource<BufReader<File>> {
    /// Open a ZIP file from a path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        self.current = None;
        if self.next >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next;
        self.next += 1;

        let mut file = self.archive.by_index(index)?;
        let name = file.name().to_string();
        let kind = if file.is_dir() {
            EntryKind::Directory
        } else if file.is_symlink() {
            let mut target = String::new();
            file.read_to_string(&mut target)?;
            EntryKind::Symlink { target }
        } else {
            EntryKind::File
        };
        let entry = Entry::new(&name, kind)
            .with_mode(file.unix_mode().unwrap_or(0))
            .with_size(file.size());
        drop(file);

        self.current = Some(index);
        Ok(Some(entry))
    }

    fn open_content(&mut self, _entry: &Entry) -> Result<Box<dyn Read + '_>> {
        let index = self
            .current
            .ok_or_else(|| io::Error::other("no current zip entry"))?;
        Ok(Box::new(self.archive.by_index(index)?))
    }
}
