//! Lens tags shared by detection, weighting and the typed envelope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic category of a signal producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensTag {
    Equity,
    Strategy,
    Macro,
    Onchain,
    /// Nothing identified the producer
    Generic,
}

impl LensTag {
    /// Lenses a producer may declare, in the fixed enumeration order used for
    /// explicit-signal resolution.
    pub const DECLARABLE: [LensTag; 4] = [
        LensTag::Equity,
        LensTag::Strategy,
        LensTag::Macro,
        LensTag::Onchain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LensTag::Equity => "equity",
            LensTag::Strategy => "strategy",
            LensTag::Macro => "macro",
            LensTag::Onchain => "onchain",
            LensTag::Generic => "generic",
        }
    }

    /// Parse a value from an envelope's `lens` field. `generic` is not a
    /// declarable lens and yields `None`.
    pub fn from_declared(value: &str) -> Option<LensTag> {
        Self::DECLARABLE
            .iter()
            .copied()
            .find(|lens| lens.as_str() == value)
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, LensTag::Generic)
    }
}

impl fmt::Display for LensTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LensTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "generic" {
            return Ok(LensTag::Generic);
        }
        LensTag::from_declared(s).ok_or_else(|| format!("unknown lens '{}'", s))
    }
}
