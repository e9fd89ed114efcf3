//! Persistence decision
//!
//! Pure function deciding whether a submission is a client's final query,
//! given whatever the cache holds as that client's latest entry when the
//! debounce delay has elapsed.

use crate::ClientQueryEntry;

/// Outcome of evaluating a submission against the client's latest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Count the submission
    Persist,

    /// A newer submission from the same client replaced this one
    Superseded,

    /// The latest entry extends this submission's text
    PrefixOfLatest,
}

impl Decision {
    /// Decide for `submission` given the cache's current `latest` entry
    ///
    /// An absent entry (expired, or already deleted after a persist) is
    /// treated as "nothing newer", so the submission persists. Equal
    /// timestamps fall through to the prefix check.
    ///
    /// # Example
    /// ```
    /// use searchlog_core::{ClientQueryEntry, Decision};
    ///
    /// let submitted = ClientQueryEntry::new("ca", 1_000);
    /// let latest = ClientQueryEntry::new("cat", 1_500);
    /// assert_eq!(Decision::evaluate(&submitted, Some(&latest)), Decision::Superseded);
    /// assert_eq!(Decision::evaluate(&submitted, None), Decision::Persist);
    /// ```
    pub fn evaluate(submission: &ClientQueryEntry, latest: Option<&ClientQueryEntry>) -> Self {
        let Some(latest) = latest else {
            return Decision::Persist;
        };

        if submission.submitted_at < latest.submitted_at {
            Decision::Superseded
        } else if submission.is_strict_prefix_of(latest) {
            Decision::PrefixOfLatest
        } else {
            Decision::Persist
        }
    }

    pub fn is_persist(&self) -> bool {
        matches!(self, Decision::Persist)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Persist => "persist",
            Decision::Superseded => "superseded",
            Decision::PrefixOfLatest => "prefix_of_latest",
        }
    }
}
