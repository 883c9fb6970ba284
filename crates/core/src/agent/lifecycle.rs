use serde::{Deserialize, Serialize};

/// Lifecycle of an agent handle
///
/// A handle is initialized once at startup, serves many requests and is
/// closed exactly once at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initialized,
    Closed,
}

impl LifecycleState {
    /// Whether invoke/stream may run in this state
    pub fn can_execute(&self) -> bool {
        matches!(self, Self::Initialized)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Closed => "closed",
        }
    }
}
