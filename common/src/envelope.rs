//! Typed shape of the universal signal envelope.
//!
//! Mirrors the `usignal` schema documents. Lens bodies are closed
//! (`deny_unknown_fields`) exactly like their schema counterparts, and each
//! exports its declared field list so the two definitions can be compared.

use crate::lens::LensTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a signal claims to create cash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashProxy {
    DeltaFcf,
    Pnl,
    RiskReduction,
    CapitalEfficiency,
}

impl CashProxy {
    pub const NAMES: &'static [&'static str] =
        &["delta_fcf", "pnl", "risk_reduction", "capital_efficiency"];
}

/// Terminal value method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalMethod {
    Gordon,
    ExitMultiple,
}

impl TerminalMethod {
    pub const NAMES: &'static [&'static str] = &["gordon", "exit_multiple"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayFunction {
    Exp,
    Power,
    Custom,
}

impl DecayFunction {
    pub const NAMES: &'static [&'static str] = &["exp", "power", "custom"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreeksMethod {
    Bsm,
    SurfaceFit,
    FiniteDiff,
    PathSim,
    Other,
}

impl GreeksMethod {
    pub const NAMES: &'static [&'static str] =
        &["bsm", "surface_fit", "finite_diff", "path_sim", "other"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreeksSource {
    #[serde(rename = "self")]
    SelfReported,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RightsMode {
    Owned,
    Licensed,
    Public,
    Restricted,
}

impl RightsMode {
    pub const NAMES: &'static [&'static str] = &["owned", "licensed", "public", "restricted"];
}

/// Friction amounts may be quoted as numbers or free text ("3bps")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Universal fields shared by every lens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Core {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_proxy: Option<CashProxy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Measurement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frictions: Option<Frictions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_constraints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinvestment_intensity: Option<ReinvestmentIntensity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rights: Option<Rights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Telemetry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_discipline: Option<TerminalDiscipline>,
}

impl Core {
    /// Upper bound on `capacityConstraints` entries
    pub const MAX_CAPACITY_CONSTRAINTS: usize = 8;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frictions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<NumberOrText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage: Option<NumberOrText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxes: Option<NumberOrText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinvestmentIntensity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roiic_intangible: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_to_capital: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RightsMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay: Option<Decay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeks: Option<Greeks>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_life_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<DecayFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Greeks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta_per_day: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_per1pct_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vega_per1vol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rho_per1pct_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<GreeksMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<GreeksSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hedge_policy: Option<HedgePolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HedgePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_band: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_cadence_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalDiscipline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<TerminalMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g_stable: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wacc: Option<f64>,
}

/// Equity research extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EquityBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EquityEntity>,
    #[serde(default, rename = "deltaFCF", skip_serializing_if = "Option::is_none")]
    pub delta_fcf: Option<DeltaFcf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Scenarios>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<EquityTerminal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statements_reconciled: Option<bool>,
}

impl EquityBody {
    pub const FIELDS: &'static [&'static str] =
        &["entity", "deltaFCF", "scenarios", "terminal", "statementsReconciled"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaFcf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drivers: Option<Vec<FcfDriver>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinvestment: Option<ReinvestmentIntensity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frictions: Option<EquityFrictions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_constraints: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcfDriver {
    pub name: String,
    pub delta: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityFrictions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenarios {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bear: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bull: Option<Map<String, Value>>,
}

/// Equity terminal block; note the snake_case growth field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityTerminal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<TerminalMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g_stable: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wacc: Option<f64>,
}

/// Systematic strategy extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StrategyBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl_after_frictions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frictions: Option<StrategyFrictions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<StrategyCapacity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl StrategyBody {
    pub const FIELDS: &'static [&'static str] =
        &["asset", "pnlAfterFrictions", "frictions", "capacity", "notes"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyFrictions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hedging_costs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_costs: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCapacity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_notional: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage_at_size_bps: Option<f64>,
}

/// Macro factor-model extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MacroBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_attribution: Option<Vec<Map<String, Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing_rate: Option<f64>,
}

impl MacroBody {
    pub const FIELDS: &'static [&'static str] = &["regimeTag", "factorAttribution", "financingRate"];
}

/// On-chain execution-cost extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OnchainBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mev_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_cost: Option<f64>,
    #[serde(default, rename = "poolDepthAt1pct", skip_serializing_if = "Option::is_none")]
    pub pool_depth_at_1pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_orderflow_access: Option<bool>,
}

impl OnchainBody {
    pub const FIELDS: &'static [&'static str] = &[
        "mevCost",
        "gasCost",
        "poolDepthAt1pct",
        "oracleLatencyMs",
        "privateOrderflowAccess",
    ];
}

/// Exactly one lens extension, keyed by lens name (`{"equity": {...}}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensData {
    Equity(EquityBody),
    Strategy(StrategyBody),
    Macro(MacroBody),
    Onchain(OnchainBody),
}

impl LensData {
    pub fn lens(&self) -> LensTag {
        match self {
            LensData::Equity(_) => LensTag::Equity,
            LensData::Strategy(_) => LensTag::Strategy,
            LensData::Macro(_) => LensTag::Macro,
            LensData::Onchain(_) => LensTag::Onchain,
        }
    }
}

/// Dataset seeds may be strings or numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(f64),
    Text(String),
}

/// Signal origin. The v1.1 generation makes the identity fields mandatory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Seed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_hash: Option<String>,
}

impl Provenance {
    pub const REQUIRED_V1: &'static [&'static str] = &["timestamp"];
    pub const REQUIRED_V1_1: &'static [&'static str] =
        &["timestamp", "source", "providerId", "signalId"];

    /// Parse the RFC 3339 timestamp, if it is one
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// RFC 3339 provenance stamps, normalised to UTC
pub fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// The canonical universal signal envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<LensTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<Core>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_data: Option<LensData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<EquityBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyBody>,
    #[serde(default, rename = "macro", skip_serializing_if = "Option::is_none")]
    pub macro_: Option<MacroBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onchain: Option<OnchainBody>,
    pub provenance: Provenance,
}

impl SignalEnvelope {
    /// Lenses carried as top-level blocks (multi-lens composition), in
    /// enumeration order
    pub fn composed_lenses(&self) -> Vec<LensTag> {
        let present = [
            self.equity.is_some(),
            self.strategy.is_some(),
            self.macro_.is_some(),
            self.onchain.is_some(),
        ];
        LensTag::DECLARABLE
            .iter()
            .zip(present)
            .filter_map(|(lens, is_present)| is_present.then_some(*lens))
            .collect()
    }
}
