//! Model capability tiers shared by config and the AI layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability tier of a chat model. Each tier maps to one concrete
/// provider model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModelVariant {
    #[default]
    Flash,
    FlashLite,
    Pro,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 3] = [Self::Flash, Self::FlashLite, Self::Pro];

    /// Provider model id for this tier.
    pub fn model_id(self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash",
            Self::FlashLite => "gemini-2.5-flash-lite",
            Self::Pro => "gemini-2.5-pro",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flash => "flash",
            Self::FlashLite => "flash-lite",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s || v.model_id() == s)
            .ok_or_else(|| format!("unknown model variant '{s}' (expected flash, flash-lite, or pro)"))
    }
}
