//! Schema generations, selected by the envelope's `schema` literal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which root schema a payload is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaGeneration {
    /// `afi.usignal.v1`
    UsignalV1,
    /// `afi.usignal.v1.1`, stricter provenance
    UsignalV1_1,
    /// `afi.cpj.v0.1`, parsed chat messages
    CpjV0_1,
}

/// Families of envelopes; only universal signals are lens-scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaFamily {
    UniversalSignal,
    ChatParse,
}

impl SchemaGeneration {
    pub const ALL: [SchemaGeneration; 3] = [
        SchemaGeneration::UsignalV1,
        SchemaGeneration::UsignalV1_1,
        SchemaGeneration::CpjV0_1,
    ];

    /// The `schema` literal carried by envelopes of this generation
    pub fn literal(&self) -> &'static str {
        match self {
            SchemaGeneration::UsignalV1 => "afi.usignal.v1",
            SchemaGeneration::UsignalV1_1 => "afi.usignal.v1.1",
            SchemaGeneration::CpjV0_1 => "afi.cpj.v0.1",
        }
    }

    pub fn from_literal(literal: &str) -> Option<SchemaGeneration> {
        Self::ALL.iter().copied().find(|g| g.literal() == literal)
    }

    pub fn family(&self) -> SchemaFamily {
        match self {
            SchemaGeneration::UsignalV1 | SchemaGeneration::UsignalV1_1 => {
                SchemaFamily::UniversalSignal
            }
            SchemaGeneration::CpjV0_1 => SchemaFamily::ChatParse,
        }
    }
}

impl fmt::Display for SchemaGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}
