// =============================================================================
// Shared types used across the watcher
// =============================================================================

use serde::{Deserialize, Serialize};

/// Directional regime implied by price relative to the active Supertrend band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a transition notification was (or wasn't) delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyStatus {
    /// Signal unchanged since the previous cycle.
    Unchanged,
    /// Notifier accepted the event at this RFC 3339 time.
    Sent(String),
    /// Notifier returned an error.
    Failed(String),
}

impl NotifyStatus {
    pub fn was_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

impl std::fmt::Display for NotifyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "-"),
            Self::Sent(at) => write!(f, "Sent {at}"),
            Self::Failed(e) => write!(f, "Failed: {e}"),
        }
    }
}
