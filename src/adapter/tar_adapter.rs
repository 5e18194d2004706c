//! TAR archive adapter.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::adapter::{EntrySource, TrackedReader};
use crate::entry::{Entry, EntryKind};
use crate::error::{Error, Result};
use crate::format::Compression;

/// Entry source over a TAR archive.
///
/// TAR is a sequential format without a central directory, so:
/// - entries are produced strictly in order
/// - content can be read once; a retry after a partial read fails
///
/// Device files, FIFOs, and hard links are skipped with a warning.
///
/// # Example
///
/// ```no_run
/// use safe_extract::{ExtractConfig, Extractor, TarSource};
///
/// let file = std::fs::File::open("archive.tar")?;
/// let mut archive = tar::Archive::new(file);
/// let source = TarSource::new(&mut archive)?;
/// let report = Extractor::new(source, ExtractConfig::default()).extract("/tmp/out")?;
/// # Ok::<(), safe_extract::Error>(())
/// ```
pub struct TarSource<'a, R: Read + 'a> {
    entries: tar::Entries<'a, R>,
    current: Option<TrackedReader<tar::Entry<'a, R>>>,
}

impl<'a, R: Read + 'a> TarSource<'a, R> {
    pub fn new(archive: &'a mut tar::Archive<R>) -> Result<Self> {
        Ok(Self {
            entries: archive.entries()?,
            current: None,
        })
    }
}

impl<'a, R: Read + 'a> EntrySource for TarSource<'a, R> {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        self.current = None;

        for next in self.entries.by_ref() {
            let tar_entry = next?;
            let name = String::from_utf8_lossy(&tar_entry.path_bytes()).into_owned();
            let entry_type = tar_entry.header().entry_type();

            let kind = match entry_type {
                tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::GNUSparse => {
                    EntryKind::File
                }
                tar::EntryType::Directory => EntryKind::Directory,
                tar::EntryType::Symlink => {
                    let target = tar_entry
                        .link_name_bytes()
                        .map(|b| String::from_utf8_lossy(&b).into_owned())
                        .unwrap_or_default();
                    EntryKind::Symlink { target }
                }
                tar::EntryType::XGlobalHeader => {
                    debug!(entry = %name, "ignoring pax global header");
                    continue;
                }
                other => {
                    warn!(entry = %name, entry_type = %entry_type_name(other), "unsupported entry type, skipping");
                    continue;
                }
            };

            let entry = Entry::new(&name, kind)
                .with_mode(tar_entry.header().mode().unwrap_or(0))
                .with_size(tar_entry.size());
            self.current = Some(TrackedReader::new(tar_entry));
            return Ok(Some(entry));
        }

        Ok(None)
    }

    fn open_content(&mut self, entry: &Entry) -> Result<Box<dyn Read + '_>> {
        let reader = self
            .current
            .as_mut()
            .ok_or_else(|| io::Error::other("no current tar entry"))?;
        if reader.consumed() > 0 {
            return Err(Error::Io(io::Error::other(format!(
                "content of '{}' was already partially read and tar streams cannot rewind",
                entry.name()
            ))));
        }
        Ok(Box::new(reader))
    }
}

/// Open a TAR archive from a path, decompressing with `compression`.
///
/// Fails with [`Error::MissingDependency`] before reading anything when the
/// codec is not compiled in.
pub fn open_archive(path: &Path, compression: Compression) -> Result<tar::Archive<Box<dyn Read>>> {
    compression.probe()?;
    let file = File::open(path)?;
    let reader = compression.wrap_reader(BufReader::new(file))?;
    Ok(tar::Archive::new(reader))
}

/// Convert TAR entry type to a human-readable name.
fn entry_type_name(entry_type: tar::EntryType) -> String {
    match entry_type {
        tar::EntryType::Link => "hard link".into(),
        tar::EntryType::Char => "character device".into(),
        tar::EntryType::Block => "block device".into(),
        tar::EntryType::Fifo => "fifo (named pipe)".into(),
        tar::EntryType::GNULongName => "GNU long name".into(),
        tar::EntryType::GNULongLink => "GNU long link".into(),
        tar::EntryType::XHeader => "pax header".into(),
        _ => format!("unknown (0x{:02x})", entry_type.as_byte()),
    }
}
