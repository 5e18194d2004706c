//! 7z archive adapter.
//!
//! Provides read-only extraction of 7z archives with the same policy
//! handling as ZIP and TAR.

use std::io::{Read, Write};
use std::path::Path;

use crate::adapter::{EntrySource, MemorySource};
use crate::entry::Entry;
use crate::error::{Error, Result};

/// Entry source over a 7z archive.
///
/// Uses the `sevenz-rust` crate for decompression. 7z archives are fully
/// decompressed into memory when opened, so very large archives may use
/// significant RAM. In exchange, content is re-readable on retry.
pub struct SevenZSource {
    entries: MemorySource,
}

impl SevenZSource {
    /// Open a 7z file from a path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            entries: decompress_all(path.as_ref())?,
        })
    }

    /// Open a 7z file from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        // sevenz-rust requires a file path, so we write to a temp file
        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(data)?;
        temp.flush()?;
        Self::open(temp.path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntrySource for SevenZSource {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        self.entries.next_entry()
    }

    fn open_content(&mut self, entry: &Entry) -> Result<Box<dyn Read + '_>> {
        self.entries.open_content(entry)
    }
}

fn decompress_all(path: &Path) -> Result<MemorySource> {
    let mut entries = MemorySource::new();

    let mut archive = sevenz_rust::SevenZReader::open(path, sevenz_rust::Password::empty())
        .map_err(|e| Error::Io(std::io::Error::other(format!("7z open error: {}", e))))?;

    archive
        .for_each_entries(|entry, reader| {
            let name = entry.name().to_string();

            let mut data = Vec::new();
            let info = if entry.is_directory() {
                Entry::directory(&name)
            } else {
                reader.read_to_end(&mut data)?;
                // 7z doesn't preserve Unix permissions
                Entry::file(&name).with_size(data.len() as u64)
            };

            entries.push(info, data);
            Ok(true)
        })
        .map_err(|e| Error::Io(std::io::Error::other(format!("7z read error: {}", e))))?;

    Ok(entries)
}
