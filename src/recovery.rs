//! Error dispositions for a running extraction.
//!
//! When an entry fails, the driver asks an [`ErrorHandler`] what to do and
//! records the answer in an [`ErrorState`]. The state lives for exactly one
//! `extract` call.

use tracing::{debug, warn};

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Answer from an [`ErrorHandler`] for one failed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Stop extracting. Entries already written stay on disk.
    Abort,
    /// Return the error from `extract`.
    BailOut,
    /// Try the same entry again.
    Retry,
    /// Abandon this entry and continue with the next one.
    Skip,
    /// Abandon this entry and swallow every later error in this call.
    SkipAll,
}

/// Where the driver stands after the last failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Disposition {
    #[default]
    Continue,
    Retry,
    Skip,
    SkipAll,
    Abort,
}

/// Decides how extraction reacts to a failed entry.
pub trait ErrorHandler: Send {
    /// Called once per failed attempt on `entry`.
    ///
    /// `Decision::Retry` re-presents the same entry with no upper bound, so a
    /// handler that retries must limit its own attempts. Sequential sources
    /// such as `TarSource` cannot rewind content that was partly read and
    /// fail the same way on every retry.
    fn decide(&mut self, entry: &Entry, error: &Error) -> Decision;
}

impl<F> ErrorHandler for F
where
    F: FnMut(&Entry, &Error) -> Decision + Send,
{
    fn decide(&mut self, entry: &Entry, error: &Error) -> Decision {
        self(entry, error)
    }
}

/// Default handler: the first error ends extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BailOut;

impl ErrorHandler for BailOut {
    fn decide(&mut self, _entry: &Entry, _error: &Error) -> Decision {
        Decision::BailOut
    }
}

/// Disposition tracking for one `extract` call.
#[derive(Debug, Default)]
pub struct ErrorState {
    disposition: Disposition,
    attempts: u32,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Failed attempts on the entry currently being retried.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Note that the driver moved on to a fresh entry.
    ///
    /// `SkipAll` is sticky for the rest of the call; anything else goes
    /// back to `Continue`.
    pub fn advance(&mut self) {
        self.attempts = 0;
        if self.disposition != Disposition::SkipAll {
            self.disposition = Disposition::Continue;
        }
    }

    /// Record a failure on `entry` and decide what happens next.
    ///
    /// Returns the error itself when the handler bails out.
    pub fn on_error(
        &mut self,
        entry: &Entry,
        error: Error,
        handler: &mut dyn ErrorHandler,
    ) -> Result<Disposition> {
        if self.disposition == Disposition::SkipAll {
            warn!(entry = entry.name(), error = %error, "skipping failed entry (skip-all)");
            return Ok(Disposition::SkipAll);
        }

        self.attempts += 1;
        let decision = handler.decide(entry, &error);
        debug!(entry = entry.name(), error = %error, ?decision, attempt = self.attempts, "entry failed");

        self.disposition = match decision {
            Decision::BailOut => return Err(error),
            Decision::Abort => {
                warn!(entry = entry.name(), error = %error, "extraction aborted");
                Disposition::Abort
            }
            Decision::Retry => Disposition::Retry,
            Decision::Skip => {
                warn!(entry = entry.name(), error = %error, "skipping failed entry");
                Disposition::Skip
            }
            Decision::SkipAll => {
                warn!(entry = entry.name(), error = %error, "skipping failed entry and all later failures");
                Disposition::SkipAll
            }
        };
        Ok(self.disposition)
    }
}
