//! Shared signal contracts
//!
//! Typed shapes for the universal signal envelope and parsed chat messages,
//! plus the lens and schema-generation vocabularies used across the workspace.

pub mod cpj;
pub mod envelope;
pub mod generation;
pub mod lens;

pub use cpj::{ExtractedCall, MarketType, MessageProvenance, ParseInfo, ParsedMessage, ProviderType, TradeSide};
pub use envelope::{
    CashProxy, Core, Decay, DecayFunction, DeltaFcf, EquityBody, EquityTerminal, Frictions, Greeks,
    GreeksMethod, LensData, MacroBody, Measurement, OnchainBody, Provenance, RightsMode,
    SignalEnvelope, StrategyBody, Telemetry, TerminalDiscipline, TerminalMethod, parse_timestamp,
};
pub use generation::{SchemaFamily, SchemaGeneration};
pub use lens::LensTag;

// Re-export for convenience
pub use serde_json::Value;
