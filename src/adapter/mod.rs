//! Archive format adapters.
//!
//! Adapters normalize different archive formats into a common
//! [`EntrySource`] for the extraction driver. The driver never branches on
//! format.

use std::io::Read;

use crate::entry::Entry;
use crate::error::Result;

mod memory;
#[cfg(feature = "tar")]
mod tar_adapter;
mod zip_adapter;

#[cfg(feature = "sevenz")]
mod sevenz_adapter;

pub use memory::MemorySource;
#[cfg(feature = "tar")]
pub use tar_adapter::{open_archive as open_tar, TarSource};
pub use zip_adapter::ZipSource;

#[cfg(feature = "sevenz")]
pub use sevenz_adapter::SevenZSource;

/// A lazy, finite, non-restartable sequence of archive entries.
pub trait EntrySource {
    /// Advance to the next entry, or `None` once the archive is exhausted.
    fn next_entry(&mut self) -> Result<Option<Entry>>;

    /// Open the content of the entry last returned by [`Self::next_entry`].
    ///
    /// Sources that can rewind return the full content on every call.
    /// Sequential sources fail once part of the content has been consumed.
    fn open_content(&mut self, entry: &Entry) -> Result<Box<dyn Read + '_>>;
}

impl<S: EntrySource + ?Sized> EntrySource for &mut S {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        (**self).next_entry()
    }

    fn open_content(&mut self, entry: &Entry) -> Result<Box<dyn Read + '_>> {
        (**self).open_content(entry)
    }
}

impl<S: EntrySource + ?Sized> EntrySource for Box<S> {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        (**self).next_entry()
    }

    fn open_content(&mut self, entry: &Entry) -> Result<Box<dyn Read + '_>> {
        (**self).open_content(entry)
    }
}

/// Reader that remembers how many bytes it has handed out.
#[cfg_attr(not(feature = "tar"), allow(dead_code))]
pub(crate) struct TrackedReader<R> {
    inner: R,
    consumed: u64,
}

#[cfg_attr(not(feature = "tar"), allow(dead_code))]
impl<R: Read> TrackedReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}
