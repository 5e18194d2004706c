//! Writing entries to the filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::adapter::EntrySource;
use crate::attributes;
use crate::entry::{Entry, EntryKind};
use crate::error::Result;
use crate::policy::{PathGuard, SymlinkPolicy};

/// What [`Materializer::materialize`] did with an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    Directory(PathBuf),
    File { path: PathBuf, bytes: u64 },
    Symlink(PathBuf),
    /// Something already exists at the path and overwrite is off.
    Skipped(PathBuf),
}

impl Materialized {
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(p) | Self::Symlink(p) | Self::Skipped(p) => p,
            Self::File { path, .. } => path,
        }
    }
}

/// Creates directories, files, and symlinks under a [`PathGuard`] root.
pub struct Materializer<'g> {
    guard: &'g PathGuard,
    overwrite: bool,
    symlinks: SymlinkPolicy,
}

impl<'g> Materializer<'g> {
    pub fn new(guard: &'g PathGuard, overwrite: bool, symlinks: SymlinkPolicy) -> Self {
        Self {
            guard,
            overwrite,
            symlinks,
        }
    }

    /// Materialize one entry, pulling file content from `source` only when
    /// the file is actually written.
    pub fn materialize<S>(&self, entry: &Entry, source: &mut S) -> Result<Materialized>
    where
        S: EntrySource + ?Sized,
    {
        match entry.kind() {
            EntryKind::Directory => {
                let path = self.guard.resolve(entry.name())?;
                fs::create_dir_all(&path)?;
                Ok(Materialized::Directory(path))
            }
            EntryKind::File => self.write_file(entry, source),
            EntryKind::Symlink { target } => self.write_symlink(entry, target),
        }
    }

    fn write_file<S>(&self, entry: &Entry, source: &mut S) -> Result<Materialized>
    where
        S: EntrySource + ?Sized,
    {
        let path = self.guard.resolve(entry.name())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let Some(mut outfile) = self.open_for_write(&path)? else {
            debug!(entry = entry.name(), "already exists, skipping");
            return Ok(Materialized::Skipped(path));
        };

        let copied = source
            .open_content(entry)
            .and_then(|mut reader| Ok(io::copy(&mut reader, &mut outfile)?));
        drop(outfile);
        // A half-written file would make a retry without overwrite skip it.
        let bytes = match copied {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&path);
                return Err(e);
            }
        };

        attributes::apply_mode(&path, entry.mode())?;
        Ok(Materialized::File { path, bytes })
    }

    fn write_symlink(&self, entry: &Entry, raw_target: &str) -> Result<Materialized> {
        let path = self.guard.resolve_link(entry.name())?;
        let target = self.guard.link_target(entry.name(), raw_target, self.symlinks)?;

        if let Ok(existing) = fs::symlink_metadata(&path) {
            if !self.overwrite {
                debug!(entry = entry.name(), "already exists, skipping");
                return Ok(Materialized::Skipped(path));
            }
            if existing.is_dir() {
                fs::remove_dir(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        create_symlink(&target, &path)?;
        Ok(Materialized::Symlink(path))
    }

    /// Open a file for writing based on the overwrite flag.
    /// Returns None if the file should be skipped.
    fn open_for_write(&self, path: &Path) -> Result<Option<fs::File>> {
        if !self.overwrite {
            // create_new(true) is atomic: fails if file exists (no TOCTOU)
            return match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
            {
                Ok(f) => Ok(Some(f)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
                Err(e) => Err(e.into()),
            };
        }

        // Remove any existing symlink first so the write never follows it
        if let Ok(m) = fs::symlink_metadata(path) {
            if m.file_type().is_symlink() {
                fs::remove_file(path)?;
            }
        }
        Ok(Some(fs::File::create(path)?))
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    let resolved = match link.parent() {
        Some(parent) if target.is_relative() => parent.join(target),
        _ => target.to_path_buf(),
    };
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemorySource;
    use crate::error::Error;
    use tempfile::tempdir;

    fn source_with(entry: &Entry, data: &[u8]) -> MemorySource {
        let mut source = MemorySource::new();
        source.push(entry.clone(), data.to_vec());
        source
    }

    #[test]
    fn writes_file_and_parents() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        let m = Materializer::new(&guard, false, SymlinkPolicy::Disallow);
        let entry = Entry::file("nested/deep/file.txt");
        let mut source = source_with(&entry, b"content");

        let result = m.materialize(&entry, &mut source).unwrap();
        assert_eq!(
            result,
            Materialized::File {
                path: dir.path().join("nested/deep/file.txt"),
                bytes: 7
            }
        );
        assert_eq!(fs::read(dir.path().join("nested/deep/file.txt")).unwrap(), b"content");
    }

    #[test]
    fn existing_file_is_kept_without_overwrite() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"original").unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        let entry = Entry::file("a.txt");
        let mut source = source_with(&entry, b"replacement");

        let skipped = Materializer::new(&guard, false, SymlinkPolicy::Disallow)
            .materialize(&entry, &mut source)
            .unwrap();
        assert!(matches!(skipped, Materialized::Skipped(_)));
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"original");

        Materializer::new(&guard, true, SymlinkPolicy::Disallow)
            .materialize(&entry, &mut source)
            .unwrap();
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"replacement");
    }

    #[test]
    fn directories_are_idempotent() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        let m = Materializer::new(&guard, false, SymlinkPolicy::Disallow);
        let entry = Entry::directory("a/b");
        let mut source = MemorySource::new();

        m.materialize(&entry, &mut source).unwrap();
        m.materialize(&entry, &mut source).unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_is_created_with_raw_target() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        let m = Materializer::new(&guard, false, SymlinkPolicy::Disallow);
        let entry = Entry::symlink("lib/current", "v1");
        let mut source = MemorySource::new();

        let result = m.materialize(&entry, &mut source).unwrap();
        assert_eq!(result, Materialized::Symlink(dir.path().join("lib/current")));
        assert_eq!(
            fs::read_link(dir.path().join("lib/current")).unwrap(),
            PathBuf::from("v1")
        );
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_replaces_symlink_instead_of_following_it() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let victim = outside.path().join("victim.txt");
        fs::write(&victim, b"keep me").unwrap();
        std::os::unix::fs::symlink(&victim, dir.path().join("a.txt")).unwrap();

        let guard = PathGuard::new(dir.path()).unwrap();
        let entry = Entry::file("a.txt");
        let mut source = source_with(&entry, b"new");
        let result = Materializer::new(&guard, true, SymlinkPolicy::Disallow)
            .materialize(&entry, &mut source);

        // Either the guard refuses the escaping link or the link is replaced;
        // the file outside the root is never written.
        if result.is_ok() {
            assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"new");
        }
        assert_eq!(fs::read(&victim).unwrap(), b"keep me");
    }

    #[test]
    fn blank_symlink_target_fails() {
        let dir = tempdir().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        let m = Materializer::new(&guard, false, SymlinkPolicy::Allow);
        let entry = Entry::symlink("link", "");
        let mut source = MemorySource::new();

        let result = m.materialize(&entry, &mut source);
        assert!(matches!(result, Err(Error::InvalidSymlink { .. })));
    }
}
