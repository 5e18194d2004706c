//! Path security for archive extraction.
//!
//! [`PathGuard`] turns entry names into destination paths and decides what
//! a symlink may point at. Every check is lexical first; the
//! [`path_jail::Jail`] over the output root then catches escapes through
//! links that already exist on disk.

use std::path::{Component, Path, PathBuf};

use path_jail::Jail;

use crate::entry::normalize_name;
use crate::error::{Error, Result};

/// What to do with symlink entries.
///
/// # Security Note
///
/// Symlinks in untrusted archives are dangerous. A malicious archive could
/// create `uploads/evil -> /etc` and then write `uploads/evil/passwd`.
/// The default (`Disallow`) refuses any link whose target would resolve
/// outside the output root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SymlinkPolicy {
    /// Create links exactly as the archive specifies. The caller accepts the risk.
    Allow,
    /// Reject absolute targets and relative targets that leave the output root.
    #[default]
    Disallow,
    /// Re-root absolute targets under the output root; relative targets are kept.
    RelativizeAbsolute,
}

/// Resolves entry names against an output root.
pub struct PathGuard {
    root: PathBuf,
    jail: Jail,
}

impl PathGuard {
    /// Create a guard for an existing output directory.
    pub fn new(root: &Path) -> Result<Self> {
        let jail = Jail::new(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            jail,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination path for an entry name.
    ///
    /// The result is always `root` or a descendant of it.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let segments = checked_segments(name)?;
        if segments.is_empty() {
            return Ok(self.root.clone());
        }
        let relative = segments.join("/");
        // The jail resolves symlinks already on disk. We only use it as a
        // check and keep the lexical path so an existing link at the
        // destination is replaced rather than followed.
        self.jail
            .join(&relative)
            .map_err(|e| Error::traversal(name, e.to_string()))?;
        Ok(self.root.join(relative))
    }

    /// Destination path for a symlink entry.
    ///
    /// Like [`Self::resolve`], but the jail only sees the parent directory:
    /// a link left at this location by an earlier run must not make its own
    /// replacement fail.
    pub fn resolve_link(&self, name: &str) -> Result<PathBuf> {
        let mut segments = checked_segments(name)?;
        let Some(file_name) = segments.pop() else {
            return Err(Error::traversal(name, "symlink cannot replace the output root"));
        };
        if !segments.is_empty() {
            self.jail
                .join(segments.join("/"))
                .map_err(|e| Error::traversal(name, e.to_string()))?;
        }
        segments.push(file_name);
        Ok(self.root.join(segments.join("/")))
    }

    /// Target to write into a symlink named `link_name`, under `policy`.
    pub fn link_target(&self, link_name: &str, raw: &str, policy: SymlinkPolicy) -> Result<PathBuf> {
        let segments = checked_segments(link_name)?;
        if raw.trim().is_empty() {
            return Err(Error::symlink(link_name, "missing link target"));
        }

        match policy {
            SymlinkPolicy::Allow => Ok(PathBuf::from(raw)),
            SymlinkPolicy::RelativizeAbsolute => {
                if !is_absolute_target(raw) {
                    return Ok(PathBuf::from(raw));
                }
                let mut inside: Vec<&str> = Vec::new();
                for (i, segment) in raw.split(['/', '\\']).enumerate() {
                    match segment {
                        "" | "." => {}
                        // `..` cannot climb above the new root
                        ".." => {
                            inside.pop();
                        }
                        drive if i == 0 && drive.ends_with(':') => {}
                        s => inside.push(s),
                    }
                }
                Ok(self.root.join(inside.join("/")))
            }
            SymlinkPolicy::Disallow => {
                if is_absolute_target(raw) {
                    return Err(Error::symlink(
                        link_name,
                        format!("absolute target '{}' is not allowed", raw),
                    ));
                }

                // Resolve against the directory the link really lands in.
                // Links written by earlier entries can make it differ from
                // the lexical parent.
                let parent = &segments[..segments.len().saturating_sub(1)];
                let real_parent = self
                    .jail
                    .join(parent.join("/"))
                    .map_err(|e| escaping_target(link_name, raw, e))?;
                let mut target = real_parent
                    .strip_prefix(self.jail.root())
                    .map(Path::to_path_buf)
                    .map_err(|_| Error::symlink(link_name, "link directory is outside the output root"))?;

                for segment in raw.split(['/', '\\']).filter(|s| !s.is_empty() && *s != ".") {
                    target.push(segment);
                }

                self.jail
                    .join(&target)
                    .map_err(|e| escaping_target(link_name, raw, e))?;
                Ok(PathBuf::from(raw))
            }
        }
    }
}

/// Split a normalized name into segments, rejecting anything that could
/// leave the root.
fn checked_segments(name: &str) -> Result<Vec<String>> {
    let normalized = normalize_name(name);
    let mut segments = Vec::new();

    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(Error::traversal(name, "contains '..' segment")),
            s => {
                let mut components = Path::new(s).components();
                if !matches!(components.next(), Some(Component::Normal(_))) || components.next().is_some() {
                    return Err(Error::traversal(name, "contains a drive or root component"));
                }
                segments.push(s.to_string());
            }
        }
    }

    Ok(segments)
}

fn escaping_target(link_name: &str, raw: &str, e: path_jail::JailError) -> Error {
    Error::symlink(link_name, format!("target '{}': {}", raw, e))
}

fn is_absolute_target(raw: &str) -> bool {
    if raw.starts_with(['/', '\\']) {
        return true;
    }
    let path = Path::new(raw);
    path.has_root() || matches!(path.components().next(), Some(Component::Prefix(_)))
}
