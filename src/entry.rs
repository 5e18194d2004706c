//! Archive entry model shared by every entry source.

/// What kind of filesystem object an entry describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symbolic link with its raw, unresolved target.
    Symlink { target: String },
}

/// One member of an archive.
///
/// The name is normalized on construction: surrounding whitespace is
/// trimmed, `\` becomes `/`, and leading and trailing slashes are removed.
/// `..` segments are kept as-is so the path guard can reject them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    kind: EntryKind,
    mode: u32,
    size: Option<u64>,
}

impl Entry {
    pub fn new(name: &str, kind: EntryKind) -> Self {
        Self {
            name: normalize_name(name),
            kind,
            mode: 0,
            size: None,
        }
    }

    pub fn file(name: &str) -> Self {
        Self::new(name, EntryKind::File)
    }

    pub fn directory(name: &str) -> Self {
        Self::new(name, EntryKind::Directory)
    }

    pub fn symlink(name: &str, target: &str) -> Self {
        Self::new(
            name,
            EntryKind::Symlink {
                target: target.to_string(),
            },
        )
    }

    /// Set permission bits. `0` means "use the platform default".
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Declared size, when the source knows it up front.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, EntryKind::Symlink { .. })
    }

    pub fn link_target(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Symlink { target } => Some(target),
            _ => None,
        }
    }

    /// Drop the first `count` path segments.
    ///
    /// Returns `None` when nothing is left, in which case the entry is
    /// discarded by the driver.
    pub fn strip_components(&self, count: usize) -> Option<Self> {
        if count == 0 {
            return Some(self.clone());
        }
        let rest: Vec<&str> = self
            .name
            .split('/')
            .filter(|s| !s.is_empty())
            .skip(count)
            .collect();
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            name: rest.join("/"),
            ..self.clone()
        })
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().replace('\\', "/").trim_matches('/').to_string()
}
