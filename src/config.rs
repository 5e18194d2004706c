//! Extraction settings.
//!
//! An [`ExtractConfig`] is assembled once with [`ExtractConfigBuilder`] and
//! handed to [`crate::Extractor::new`]. Nothing changes it afterwards.

use std::fmt;
use std::path::Path;

use crate::entry::Entry;
use crate::error::Result;
use crate::policy::SymlinkPolicy;
use crate::recovery::{BailOut, Decision, ErrorHandler};
use crate::Error;

/// Predicate deciding whether an entry is extracted at all.
pub type EntryFilter = Box<dyn Fn(&Entry) -> bool + Send + Sync>;

/// Hook run after an entry was written, with its final path.
pub type PostProcessor = Box<dyn FnMut(&Entry, &Path) -> Result<()> + Send>;

/// Immutable extraction settings.
pub struct ExtractConfig {
    overwrite: bool,
    symlinks: SymlinkPolicy,
    strip_components: usize,
    create_destination: bool,
    filter: Option<EntryFilter>,
    include: Vec<String>,
    exclude: Vec<String>,
    pub(crate) on_error: Box<dyn ErrorHandler>,
    pub(crate) post_process: Option<PostProcessor>,
}

impl ExtractConfig {
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::default()
    }

    /// Replace files and links that already exist. Default: `false`.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn symlinks(&self) -> SymlinkPolicy {
        self.symlinks
    }

    pub fn strip_components(&self) -> usize {
        self.strip_components
    }

    pub fn create_destination(&self) -> bool {
        self.create_destination
    }

    /// Whether the filter and glob patterns let `entry` through.
    ///
    /// Globs match against the entry name as stored in the archive, before
    /// component stripping.
    pub fn accepts(&self, entry: &Entry) -> bool {
        let name = entry.name();
        if !self.include.is_empty() && !self.include.iter().any(|p| glob_match::glob_match(p, name)) {
            return false;
        }
        if self.exclude.iter().any(|p| glob_match::glob_match(p, name)) {
            return false;
        }
        match &self.filter {
            Some(filter) => filter(entry),
            None => true,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("overwrite", &self.overwrite)
            .field("symlinks", &self.symlinks)
            .field("strip_components", &self.strip_components)
            .field("create_destination", &self.create_destination)
            .field("filter", &self.filter.is_some())
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("post_process", &self.post_process.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ExtractConfig`].
///
/// # Example
///
/// ```
/// use safe_extract::{Decision, ExtractConfig, SymlinkPolicy};
///
/// let config = ExtractConfig::builder()
///     .overwrite(true)
///     .symlinks(SymlinkPolicy::RelativizeAbsolute)
///     .strip_components(1)
///     .exclude_glob(["**/*.pyc"])
///     .on_error(|_entry, _err| Decision::Skip)
///     .build();
/// assert!(config.overwrite());
/// ```
#[derive(Default)]
pub struct ExtractConfigBuilder {
    overwrite: bool,
    symlinks: SymlinkPolicy,
    strip_components: usize,
    create_destination: bool,
    filter: Option<EntryFilter>,
    include: Vec<String>,
    exclude: Vec<String>,
    on_error: Option<Box<dyn ErrorHandler>>,
    post_process: Option<PostProcessor>,
}

impl ExtractConfigBuilder {
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn symlinks(mut self, policy: SymlinkPolicy) -> Self {
        self.symlinks = policy;
        self
    }

    /// Drop this many leading path segments from every entry name.
    pub fn strip_components(mut self, count: usize) -> Self {
        self.strip_components = count;
        self
    }

    /// Create the output directory when it is missing instead of failing
    /// with [`Error::DestinationNotFound`].
    pub fn create_destination(mut self, create: bool) -> Self {
        self.create_destination = create;
        self
    }

    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(f));
        self
    }

    /// Only extract entries matching at least one of these globs.
    pub fn include_glob<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Never extract entries matching any of these globs.
    pub fn exclude_glob<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Decide what happens when an entry fails. Default: bail out with the error.
    pub fn on_error<H>(mut self, handler: H) -> Self
    where
        H: FnMut(&Entry, &Error) -> Decision + Send + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Like [`Self::on_error`], for handlers that are not closures.
    pub fn error_handler<H: ErrorHandler + 'static>(mut self, handler: H) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Run `f` after each entry is written. Its errors end extraction
    /// directly and are not offered to the error handler.
    pub fn post_process<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Entry, &Path) -> Result<()> + Send + 'static,
    {
        self.post_process = Some(Box::new(f));
        self
    }

    pub fn build(self) -> ExtractConfig {
        ExtractConfig {
            overwrite: self.overwrite,
            symlinks: self.symlinks,
            strip_components: self.strip_components,
            create_destination: self.create_destination,
            filter: self.filter,
            include: self.include,
            exclude: self.exclude,
            on_error: self.on_error.unwrap_or_else(|| Box::new(BailOut)),
            post_process: self.post_process,
        }
    }
}
