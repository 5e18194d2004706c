//! Archive format and compression dispatch by file extension.

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Stream compression wrapped around an archive or a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Check that the codec was compiled in.
    ///
    /// Sources call this before touching any input, so a missing codec is
    /// reported as [`Error::MissingDependency`] and never reaches the
    /// per-entry error handler.
    pub fn probe(self) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Gzip if cfg!(feature = "gzip") => Ok(()),
            Self::Bzip2 if cfg!(feature = "bzip2") => Ok(()),
            Self::Xz if cfg!(feature = "xz") => Ok(()),
            Self::Zstd if cfg!(feature = "zstd") => Ok(()),
            _ => Err(self.missing()),
        }
    }

    /// Wrap a reader in the matching decoder.
    pub fn wrap_reader<'r, R: Read + 'r>(self, reader: R) -> Result<Box<dyn Read + 'r>> {
        match self {
            Self::None => Ok(Box::new(reader)),
            #[cfg(feature = "gzip")]
            Self::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
            #[cfg(feature = "bzip2")]
            Self::Bzip2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader))),
            #[cfg(feature = "xz")]
            Self::Xz => Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader))),
            #[cfg(feature = "zstd")]
            Self::Zstd => Ok(Box::new(zstd::stream::read::Decoder::new(reader)?)),
            #[allow(unreachable_patterns)]
            _ => Err(self.missing()),
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("gz"),
            Self::Bzip2 => Some("bz2"),
            Self::Xz => Some("xz"),
            Self::Zstd => Some("zst"),
        }
    }

    fn missing(self) -> Error {
        let (codec, feature) = match self {
            Self::None => ("uncompressed", "default"),
            Self::Gzip => ("gzip", "gzip"),
            Self::Bzip2 => ("bzip2", "bzip2"),
            Self::Xz => ("xz", "xz"),
            Self::Zstd => ("zstd", "zstd"),
        };
        Error::MissingDependency { codec, feature }
    }
}

/// Container format of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar(Compression),
    Zip,
    SevenZ,
    /// A single compressed file, not an archive.
    Compressed(Compression),
}

// Longest suffix first so `.tar.gz` wins over `.gz`.
const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::Tar(Compression::Gzip)),
    (".tar.bz2", ArchiveFormat::Tar(Compression::Bzip2)),
    (".tar.xz", ArchiveFormat::Tar(Compression::Xz)),
    (".tar.zst", ArchiveFormat::Tar(Compression::Zstd)),
    (".tgz", ArchiveFormat::Tar(Compression::Gzip)),
    (".tbz2", ArchiveFormat::Tar(Compression::Bzip2)),
    (".tbz", ArchiveFormat::Tar(Compression::Bzip2)),
    (".txz", ArchiveFormat::Tar(Compression::Xz)),
    (".tzst", ArchiveFormat::Tar(Compression::Zstd)),
    (".tar", ArchiveFormat::Tar(Compression::None)),
    (".zip", ArchiveFormat::Zip),
    (".jar", ArchiveFormat::Zip),
    (".7z", ArchiveFormat::SevenZ),
    (".gz", ArchiveFormat::Compressed(Compression::Gzip)),
    (".bz2", ArchiveFormat::Compressed(Compression::Bzip2)),
    (".xz", ArchiveFormat::Compressed(Compression::Xz)),
    (".zst", ArchiveFormat::Compressed(Compression::Zstd)),
];

impl ArchiveFormat {
    /// Detect the format from the file name.
    pub fn detect(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();

        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix) && name.len() > suffix.len())
            .map(|(_, format)| *format)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.display().to_string(),
            })
    }

    /// Fail early when the format needs a feature that is not compiled in.
    pub fn probe(self) -> Result<()> {
        match self {
            Self::Tar(compression) => {
                if !cfg!(feature = "tar") {
                    return Err(Error::MissingDependency {
                        codec: "tar",
                        feature: "tar",
                    });
                }
                compression.probe()
            }
            Self::Zip => Ok(()),
            Self::SevenZ if cfg!(feature = "sevenz") => Ok(()),
            Self::SevenZ => Err(Error::MissingDependency {
                codec: "7z",
                feature: "sevenz",
            }),
            Self::Compressed(compression) => compression.probe(),
        }
    }
}
