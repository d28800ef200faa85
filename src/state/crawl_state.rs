/// Lifecycle of a single domain crawl
///
/// Transitions only move forward: `Idle → Running → Draining → Done`, with a
/// shortcut `Idle → Done` for domains that fail before the first round.
use std::fmt;

/// Represents the current state of a domain crawl controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Frontier seeded with the root, nothing fetched yet
    Idle,

    /// Taking frontier batches and dispatching fetches
    Running,

    /// Nothing more is dispatched; the last batch is joined and the result
    /// assembled
    Draining,

    /// Result emitted; no further work
    Done,
}

impl CrawlState {
    /// Returns true if the controller may move to `next`
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Done)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true if the controller may still dispatch fetches
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
