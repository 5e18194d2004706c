//! Single-stream decompression (`.gz`, `.bz2`, `.xz`, `.zst`).

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::format::Compression;

/// Decompress `input` into the file `output`.
///
/// Returns the number of bytes written. With `overwrite` off an existing
/// output is left untouched and `0` is returned. A partially written output
/// is removed when decoding fails.
pub fn decompress_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    compression: Compression,
    overwrite: bool,
) -> Result<u64> {
    let (input, output) = (input.as_ref(), output.as_ref());
    compression.probe()?;

    let mut reader = compression.wrap_reader(BufReader::new(File::open(input)?))?;

    let file = if overwrite {
        if fs::symlink_metadata(output).is_ok_and(|m| m.file_type().is_symlink()) {
            fs::remove_file(output)?;
        }
        File::create(output)?
    } else {
        match OpenOptions::new().write(true).create_new(true).open(output) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %output.display(), "already exists, skipping");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        }
    };

    let mut writer = BufWriter::new(file);
    let copied = io::copy(&mut reader, &mut writer).and_then(|n| writer.flush().map(|_| n));
    drop(writer);
    match copied {
        Ok(bytes) => {
            debug!(input = %input.display(), output = %output.display(), bytes, "decompressed");
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(output);
            Err(e.into())
        }
    }
}

/// Output file name for a compressed input: the name with its compression
/// extension removed, or with `.out` appended when it has none.
pub fn output_name(input: &Path, compression: Compression) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    compression
        .extension()
        .and_then(|ext| {
            let lower = name.to_ascii_lowercase();
            lower
                .strip_suffix(ext)
                .and_then(|stem| stem.strip_suffix('.'))
                .map(|stem| name[..stem.len()].to_string())
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| format!("{name}.out"))
}
