//! Policy-driven archive extraction.
//!
//! Entries from TAR, ZIP, and 7z archives are written under an output root
//! that they can never leave: `..` names are rejected, symlink targets are
//! checked against a [`SymlinkPolicy`], and per-entry failures are routed
//! through a caller-supplied [`ErrorHandler`].
//!
//! ```no_run
//! use safe_extract::{extract_file, Decision, ExtractConfig};
//!
//! let config = ExtractConfig::builder()
//!     .strip_components(1)
//!     .on_error(|_entry, _err| Decision::Skip)
//!     .build();
//! let report = extract_file("release.tar.gz", "/tmp/out", config)?;
//! println!("{} files, {} failed", report.files_extracted, report.entries_failed);
//! # Ok::<(), safe_extract::Error>(())
//! ```

use std::fs;
use std::path::Path;

mod adapter;
mod attributes;
mod config;
mod decompress;
mod driver;
mod entry;
mod error;
mod format;
mod materialize;
mod policy;
mod recovery;

pub use adapter::{EntrySource, MemorySource, ZipSource};
#[cfg(feature = "tar")]
pub use adapter::{open_tar, TarSource};
#[cfg(feature = "sevenz")]
pub use adapter::SevenZSource;
pub use attributes::apply_mode;
pub use config::{EntryFilter, ExtractConfig, ExtractConfigBuilder, PostProcessor};
pub use decompress::{decompress_file, output_name};
pub use driver::{Extractor, Report};
pub use entry::{Entry, EntryKind};
pub use error::{Error, Result};
pub use format::{ArchiveFormat, Compression};
pub use materialize::{Materialized, Materializer};
pub use policy::{PathGuard, SymlinkPolicy};
pub use recovery::{BailOut, Decision, Disposition, ErrorHandler, ErrorState};

/// Extract an archive file, picking the format from its extension.
///
/// A bare compressed file (`notes.txt.gz`) is decompressed into `output`
/// under its name without the compression extension.
pub fn extract_file(
    archive: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: ExtractConfig,
) -> Result<Report> {
    let (archive, output) = (archive.as_ref(), output.as_ref());
    let format = ArchiveFormat::detect(archive)?;
    format.probe()?;

    match format {
        #[cfg(feature = "tar")]
        ArchiveFormat::Tar(compression) => {
            let mut tar = open_tar(archive, compression)?;
            Extractor::new(TarSource::new(&mut tar)?, config).extract(output)
        }
        ArchiveFormat::Zip => Extractor::new(ZipSource::open(archive)?, config).extract(output),
        #[cfg(feature = "sevenz")]
        ArchiveFormat::SevenZ => Extractor::new(SevenZSource::open(archive)?, config).extract(output),
        ArchiveFormat::Compressed(compression) => {
            decompress_into(archive, output, compression, config)
        }
        // Rejected by `probe` above.
        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedFormat {
            path: archive.display().to_string(),
        }),
    }
}

/// List the entries of an archive file without extracting anything.
pub fn list_entries(archive: impl AsRef<Path>) -> Result<Vec<Entry>> {
    let archive = archive.as_ref();
    let format = ArchiveFormat::detect(archive)?;
    format.probe()?;

    match format {
        #[cfg(feature = "tar")]
        ArchiveFormat::Tar(compression) => {
            let mut tar = open_tar(archive, compression)?;
            collect(TarSource::new(&mut tar)?)
        }
        ArchiveFormat::Zip => collect(ZipSource::open(archive)?),
        #[cfg(feature = "sevenz")]
        ArchiveFormat::SevenZ => collect(SevenZSource::open(archive)?),
        ArchiveFormat::Compressed(compression) => {
            Ok(vec![Entry::file(&output_name(archive, compression))])
        }
        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedFormat {
            path: archive.display().to_string(),
        }),
    }
}

fn collect<S: EntrySource>(mut source: S) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    while let Some(entry) = source.next_entry()? {
        entries.push(entry);
    }
    Ok(entries)
}

fn decompress_into(
    input: &Path,
    output: &Path,
    compression: Compression,
    mut config: ExtractConfig,
) -> Result<Report> {
    if !output.exists() {
        if !config.create_destination() {
            return Err(Error::DestinationNotFound {
                path: output.display().to_string(),
            });
        }
        fs::create_dir_all(output)?;
    }

    let entry = Entry::file(&output_name(input, compression));
    let mut report = Report::default();
    if !config.accepts(&entry) {
        report.entries_skipped = 1;
        return Ok(report);
    }

    let target = output.join(entry.name());
    if !config.overwrite() && fs::symlink_metadata(&target).is_ok() {
        report.entries_skipped = 1;
        return Ok(report);
    }

    report.bytes_written = decompress_file(input, &target, compression, config.overwrite())?;
    report.files_extracted = 1;
    if let Some(hook) = config.post_process.as_mut() {
        hook(&entry, &target)?;
    }
    Ok(report)
}
