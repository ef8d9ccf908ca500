//! Quality Weighter
//!
//! Additive, reason-annotated completeness score. Every rule in
//! [`QUALITY_RULES`] is evaluated (no early exit); universal rules apply to
//! every payload, lens rules only to the resolved lens. Reasons accumulate in
//! table order.
//!
//! The score is an ordinal ranking signal: unbounded above, never negative,
//! and independent of schema validity.

use crate::detector;
use crate::presence;
use common::LensTag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Nominal growth ceiling for terminal `g_stable` (inclusive)
pub const NOMINAL_GROWTH_CEILING: f64 = 0.05;

pub const MISSING_CASH_PROXY: &str = "missing core.cashProxy";
pub const MISSING_MEASUREMENT_WINDOW: &str = "missing measurement.window";
pub const TERMINAL_GROWTH_GUARDRAIL: &str = "terminal g_stable > nominal GDP guardrail (5% default)";

/// Result of weighting one payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub lens: LensTag,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Which payloads a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Universal,
    Lens(LensTag),
}

/// What a rule sees
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub payload: &'a Value,
    /// Fields of the resolved lens, if the payload carries them
    pub lens_block: Option<&'a Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleOutcome {
    Satisfied(f64),
    /// Check failed; some failures are silent
    Missed(Option<&'static str>),
    /// Preconditions for the check were not met
    Skipped,
}

#[derive(Debug, Clone, Copy)]
pub struct QualityRule {
    pub name: &'static str,
    pub scope: RuleScope,
    pub evaluate: fn(&RuleInput<'_>) -> RuleOutcome,
}

impl QualityRule {
    fn applies_to(&self, lens: LensTag) -> bool {
        match self.scope {
            RuleScope::Universal => true,
            RuleScope::Lens(scoped) => scoped == lens,
        }
    }
}

/// All scoring rules, in evaluation (and reason) order
pub const QUALITY_RULES: &[QualityRule] = &[
    QualityRule { name: "core.cashProxy", scope: RuleScope::Universal, evaluate: cash_proxy },
    QualityRule { name: "core.measurement.window", scope: RuleScope::Universal, evaluate: measurement_window },
    QualityRule { name: "core.frictions", scope: RuleScope::Universal, evaluate: core_frictions },
    QualityRule { name: "core.capacityConstraints", scope: RuleScope::Universal, evaluate: capacity_constraints },
    QualityRule { name: "provenance.timestamp", scope: RuleScope::Universal, evaluate: provenance_timestamp },
    QualityRule { name: "core.telemetry.decay.halfLifeDays", scope: RuleScope::Universal, evaluate: decay_half_life },
    QualityRule { name: "core.telemetry.greeks", scope: RuleScope::Universal, evaluate: verifiable_greeks },
    QualityRule { name: "equity.deltaFCF", scope: RuleScope::Lens(LensTag::Equity), evaluate: equity_delta_fcf },
    QualityRule { name: "equity.terminal", scope: RuleScope::Lens(LensTag::Equity), evaluate: equity_terminal },
    QualityRule { name: "strategy.pnlAfterFrictions", scope: RuleScope::Lens(LensTag::Strategy), evaluate: strategy_pnl },
    QualityRule { name: "strategy.frictions", scope: RuleScope::Lens(LensTag::Strategy), evaluate: strategy_frictions },
    QualityRule { name: "strategy.capacity", scope: RuleScope::Lens(LensTag::Strategy), evaluate: strategy_capacity },
    QualityRule { name: "onchain.costs", scope: RuleScope::Lens(LensTag::Onchain), evaluate: onchain_costs },
    QualityRule { name: "macro.factorAttribution", scope: RuleScope::Lens(LensTag::Macro), evaluate: macro_factors },
];

/// Score a payload. Without an explicit lens the detector resolves one.
pub fn weight(payload: &Value, lens: Option<LensTag>) -> QualityReport {
    let lens = lens.unwrap_or_else(|| detector::detect(payload));
    let input = RuleInput {
        payload,
        lens_block: presence::lens_block(payload, lens),
    };

    let mut score = 0.0;
    let mut reasons = Vec::new();

    for rule in QUALITY_RULES.iter().filter(|rule| rule.applies_to(lens)) {
        let outcome = (rule.evaluate)(&input);
        debug!(rule = rule.name, outcome = ?outcome, "quality rule evaluated");
        match outcome {
            RuleOutcome::Satisfied(delta) => score += delta,
            RuleOutcome::Missed(Some(reason)) => reasons.push(reason.to_string()),
            RuleOutcome::Missed(None) | RuleOutcome::Skipped => {}
        }
    }

    debug!(lens = %lens, score, reasons = reasons.len(), "payload weighted");
    QualityReport { lens, score, reasons }
}

fn award_if(condition: bool, delta: f64, reason: Option<&'static str>) -> RuleOutcome {
    if condition {
        RuleOutcome::Satisfied(delta)
    } else {
        RuleOutcome::Missed(reason)
    }
}

fn cash_proxy(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(
        presence::truthy(input.payload.pointer("/core/cashProxy")),
        1.0,
        Some(MISSING_CASH_PROXY),
    )
}

fn measurement_window(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(
        presence::truthy(input.payload.pointer("/core/measurement/window")),
        0.5,
        Some(MISSING_MEASUREMENT_WINDOW),
    )
}

fn core_frictions(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::truthy(input.payload.pointer("/core/frictions")), 0.5, None)
}

fn capacity_constraints(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::is_array(input.payload.pointer("/core/capacityConstraints")), 0.5, None)
}

fn provenance_timestamp(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::truthy(input.payload.pointer("/provenance/timestamp")), 0.5, None)
}

fn decay_half_life(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(
        presence::truthy(input.payload.pointer("/core/telemetry/decay/halfLifeDays")),
        0.5,
        None,
    )
}

// Presence alone earns nothing; both the as-of stamp and the method are needed
fn verifiable_greeks(input: &RuleInput<'_>) -> RuleOutcome {
    let greeks = input.payload.pointer("/core/telemetry/greeks");
    let verifiable = presence::truthy(greeks)
        && presence::truthy(greeks.and_then(|g| g.get("asOf")))
        && presence::truthy(greeks.and_then(|g| g.get("method")));
    award_if(verifiable, 0.5, None)
}

fn lens_field<'a>(input: &RuleInput<'a>, field: &str) -> Option<&'a Value> {
    input.lens_block.and_then(|block| block.get(field))
}

fn equity_delta_fcf(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::truthy(lens_field(input, "deltaFCF")), 1.0, None)
}

/// Terminal-value guardrail. A breach withholds the bonus; it never
/// subtracts from the score.
fn equity_terminal(input: &RuleInput<'_>) -> RuleOutcome {
    let equity_terminal = lens_field(input, "terminal");
    let block = if presence::truthy(equity_terminal) {
        equity_terminal
    } else {
        input.payload.pointer("/core/terminalDiscipline")
    };
    let Some(block) = block else {
        return RuleOutcome::Skipped;
    };

    let growth = presence::number(block.get("g_stable").filter(|g| g.is_number()))
        .or_else(|| presence::number(block.get("gStable")));
    let has_method = presence::truthy(block.get("method"));
    let has_wacc = presence::is_number(block.get("wacc"));

    match growth {
        Some(g_stable) if has_method && has_wacc => award_if(
            g_stable <= NOMINAL_GROWTH_CEILING,
            0.5,
            Some(TERMINAL_GROWTH_GUARDRAIL),
        ),
        _ => RuleOutcome::Skipped,
    }
}

fn strategy_pnl(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::is_number(lens_field(input, "pnlAfterFrictions")), 1.0, None)
}

fn strategy_frictions(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::truthy(lens_field(input, "frictions")), 0.5, None)
}

fn strategy_capacity(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::truthy(lens_field(input, "capacity")), 0.5, None)
}

// No partial credit for a single cost
fn onchain_costs(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(
        presence::is_number(lens_field(input, "mevCost")) && presence::is_number(lens_field(input, "gasCost")),
        1.0,
        None,
    )
}

fn macro_factors(input: &RuleInput<'_>) -> RuleOutcome {
    award_if(presence::is_array(lens_field(input, "factorAttribution")), 1.0, None)
}
