// =============================================================================
// Shared types used across the signal desk
// =============================================================================

use serde::{Deserialize, Serialize};

/// Trading direction produced by the detector for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    None,
}

impl Signal {
    /// `true` for BUY and SELL.
    pub fn is_actionable(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::None => write!(f, "NONE"),
        }
    }
}
