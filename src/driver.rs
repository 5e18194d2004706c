//! Extraction driver.
//!
//! [`Extractor`] pulls entries from any [`EntrySource`], applies the
//! configured filter and component stripping, and hands the rest to the
//! [`Materializer`]. Failed entries go through the [`ErrorState`] machine.
//! The driver never branches on archive format.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::adapter::EntrySource;
use crate::config::ExtractConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::materialize::{Materialized, Materializer};
use crate::policy::PathGuard;
use crate::recovery::{Disposition, ErrorState};

/// Extraction report with statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Number of files successfully extracted.
    pub files_extracted: usize,
    /// Number of directories created.
    pub dirs_created: usize,
    pub symlinks_created: usize,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Entries filtered out, stripped away, or already present.
    pub entries_skipped: usize,
    /// Entries abandoned after an error (`Skip` or `SkipAll`).
    pub entries_failed: usize,
    /// Number of times an entry was attempted again.
    pub retries: usize,
    /// The error handler stopped extraction early.
    pub aborted: bool,
}

impl Report {
    fn record(&mut self, done: &Materialized) {
        match done {
            Materialized::Directory(_) => self.dirs_created += 1,
            Materialized::File { bytes, .. } => {
                self.files_extracted += 1;
                self.bytes_written += bytes;
            }
            Materialized::Symlink(_) => self.symlinks_created += 1,
            Materialized::Skipped(_) => self.entries_skipped += 1,
        }
    }
}

/// Generic extraction driver that works with any entry source.
///
/// # Example
///
/// ```no_run
/// use safe_extract::{ExtractConfig, Extractor, ZipSource};
///
/// let source = ZipSource::open("archive.zip")?;
/// let report = Extractor::new(source, ExtractConfig::default()).extract("/dest")?;
/// println!("{} files", report.files_extracted);
/// # Ok::<(), safe_extract::Error>(())
/// ```
pub struct Extractor<S> {
    source: S,
    config: ExtractConfig,
}

impl<S: EntrySource> Extractor<S> {
    pub fn new(source: S, config: ExtractConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Give back the entry source, e.g. to inspect what is left of it.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Extract every remaining entry of the source into `output`.
    ///
    /// Nothing is rolled back when extraction stops early: entries written
    /// before an abort or a returned error stay on disk.
    pub fn extract(&mut self, output: impl AsRef<Path>) -> Result<Report> {
        let output = output.as_ref();
        if !output.exists() {
            if !self.config.create_destination() {
                return Err(Error::DestinationNotFound {
                    path: output.display().to_string(),
                });
            }
            fs::create_dir_all(output)?;
        }
        let root = std::path::absolute(output)?;
        let guard = PathGuard::new(&root)?;
        let materializer =
            Materializer::new(&guard, self.config.overwrite(), self.config.symlinks());

        let mut state = ErrorState::new();
        let mut report = Report::default();
        // Entry held across retry attempts.
        let mut pending: Option<Entry> = None;

        loop {
            let entry = match pending.take() {
                Some(entry) => entry,
                None => {
                    let Some(entry) = self.source.next_entry()? else {
                        break;
                    };
                    state.advance();
                    match self.admit(entry) {
                        Some(entry) => entry,
                        None => {
                            report.entries_skipped += 1;
                            continue;
                        }
                    }
                }
            };

            let error = match materializer.materialize(&entry, &mut self.source) {
                Ok(done) => {
                    debug!(entry = entry.name(), path = %done.path().display(), "materialized");
                    report.record(&done);
                    if !matches!(done, Materialized::Skipped(_)) {
                        if let Some(hook) = self.config.post_process.as_mut() {
                            hook(&entry, done.path())?;
                        }
                    }
                    continue;
                }
                Err(error) => error,
            };

            match state.on_error(&entry, error, self.config.on_error.as_mut())? {
                Disposition::Retry => {
                    report.retries += 1;
                    pending = Some(entry);
                }
                Disposition::Abort => {
                    report.aborted = true;
                    break;
                }
                Disposition::Skip | Disposition::SkipAll | Disposition::Continue => {
                    report.entries_failed += 1;
                }
            }
        }

        info!(
            files = report.files_extracted,
            dirs = report.dirs_created,
            symlinks = report.symlinks_created,
            bytes = report.bytes_written,
            skipped = report.entries_skipped,
            failed = report.entries_failed,
            aborted = report.aborted,
            "extraction finished"
        );
        Ok(report)
    }

    /// Filter and strip a freshly pulled entry. `None` discards it.
    fn admit(&self, entry: Entry) -> Option<Entry> {
        if !self.config.accepts(&entry) {
            debug!(entry = entry.name(), "filtered out");
            return None;
        }
        let stripped = entry.strip_components(self.config.strip_components());
        if stripped.is_none() {
            debug!(entry = entry.name(), "nothing left after stripping components");
        }
        stripped
    }
}
