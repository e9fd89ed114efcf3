//! Decision outcome reporting

use crate::Decision;

/// How a deferred persistence task finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionOutcome {
    /// The store was incremented (cache cleanup may still have failed)
    Persisted,

    /// A newer submission from the same client replaced this one
    Superseded,

    /// The latest entry extends this submission's text
    PrefixOfLatest,

    /// The cache could not be read; nothing was persisted
    CacheReadFailed,

    /// The store increment failed; the cache entry is left to expire
    StoreFailed,
}

impl DecisionOutcome {
    pub const ALL: [DecisionOutcome; 5] = [
        DecisionOutcome::Persisted,
        DecisionOutcome::Superseded,
        DecisionOutcome::PrefixOfLatest,
        DecisionOutcome::CacheReadFailed,
        DecisionOutcome::StoreFailed,
    ];

    /// Stable label for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionOutcome::Persisted => "persisted",
            DecisionOutcome::Superseded => "superseded",
            DecisionOutcome::PrefixOfLatest => "prefix_of_latest",
            DecisionOutcome::CacheReadFailed => "cache_read_failed",
            DecisionOutcome::StoreFailed => "store_failed",
        }
    }
}

impl From<Decision> for DecisionOutcome {
    /// Outcome of a skipped decision; `Persist` maps to `Persisted`
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Persist => DecisionOutcome::Persisted,
            Decision::Superseded => DecisionOutcome::Superseded,
            Decision::PrefixOfLatest => DecisionOutcome::PrefixOfLatest,
        }
    }
}

/// Receives the outcome of every finished deferred decision
///
/// Called from the decision task itself, so implementations must not block.
pub trait DecisionObserver: Send + Sync {
    fn on_decision(&self, outcome: DecisionOutcome);
}
