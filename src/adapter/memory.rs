//! In-memory entry source.

use std::io::{self, Read};

use crate::adapter::EntrySource;
use crate::entry::Entry;
use crate::error::Result;

/// Entries held in memory with their content.
///
/// Content can be reopened any number of times, so retries always see the
/// full data. Useful for tests and for formats that must be decoded up
/// front.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<(Entry, Vec<u8>)>,
    next: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry, data: Vec<u8>) {
        self.entries.push((entry, data));
    }

    /// Builder-style [`Self::push`].
    pub fn with(mut self, entry: Entry, data: impl Into<Vec<u8>>) -> Self {
        self.push(entry, data.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntrySource for MemorySource {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        let Some((entry, _)) = self.entries.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        Ok(Some(entry.clone()))
    }

    fn open_content(&mut self, _entry: &Entry) -> Result<Box<dyn Read + '_>> {
        let current = self
            .next
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| io::Error::other("no current entry"))?;
        Ok(Box::new(current.1.as_slice()))
    }
}
