//! Lens Detector
//!
//! Maps a raw payload to exactly one lens by walking an ordered rule table;
//! the first rule that resolves wins. Explicit declarations come first, then
//! shape heuristics from least to most ambiguous, then `generic`.
//!
//! Detection is total: malformed or missing fields never fail, they simply do
//! not match.

use crate::presence;
use common::LensTag;
use serde_json::Value;
use tracing::debug;

/// One entry of the detection cascade
#[derive(Debug, Clone, Copy)]
pub struct DetectionRule {
    pub name: &'static str,
    pub resolve: fn(&Value) -> Option<LensTag>,
}

/// Outcome of detection, with the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub lens: LensTag,
    /// `None` when nothing matched and the lens fell back to `generic`
    pub rule: Option<&'static str>,
}

/// The cascade, in priority order
pub const DETECTION_RULES: &[DetectionRule] = &[
    DetectionRule { name: "explicit-equity", resolve: explicit_equity },
    DetectionRule { name: "explicit-strategy", resolve: explicit_strategy },
    DetectionRule { name: "explicit-macro", resolve: explicit_macro },
    DetectionRule { name: "explicit-onchain", resolve: explicit_onchain },
    DetectionRule { name: "terminal-value-shape", resolve: terminal_value_shape },
    DetectionRule { name: "pnl-shape", resolve: pnl_shape },
    DetectionRule { name: "execution-cost-shape", resolve: execution_cost_shape },
    DetectionRule { name: "factor-attribution-shape", resolve: factor_attribution_shape },
    DetectionRule { name: "lens-data-key", resolve: lens_data_key },
];

/// Resolve the lens of a payload
pub fn detect(payload: &Value) -> LensTag {
    explain(payload).lens
}

/// Resolve the lens of a payload and report which rule decided it
pub fn explain(payload: &Value) -> Detection {
    for rule in DETECTION_RULES {
        if let Some(lens) = (rule.resolve)(payload) {
            debug!(lens = %lens, rule = rule.name, "lens detected");
            return Detection { lens, rule: Some(rule.name) };
        }
    }
    debug!("no lens signal, falling back to generic");
    Detection { lens: LensTag::Generic, rule: None }
}

/// A top-level `<lens>` object or a `lens` field naming it
fn explicit(payload: &Value, lens: LensTag) -> Option<LensTag> {
    let has_block = presence::object(payload.get(lens.as_str())).is_some();
    let declared = payload
        .get("lens")
        .and_then(Value::as_str)
        .and_then(LensTag::from_declared)
        == Some(lens);
    (has_block || declared).then_some(lens)
}

fn explicit_equity(payload: &Value) -> Option<LensTag> {
    explicit(payload, LensTag::Equity)
}

fn explicit_strategy(payload: &Value) -> Option<LensTag> {
    explicit(payload, LensTag::Strategy)
}

fn explicit_macro(payload: &Value) -> Option<LensTag> {
    explicit(payload, LensTag::Macro)
}

fn explicit_onchain(payload: &Value) -> Option<LensTag> {
    explicit(payload, LensTag::Onchain)
}

fn terminal_value_shape(payload: &Value) -> Option<LensTag> {
    let has_terminal = presence::truthy(payload.pointer("/equity/terminal"))
        || presence::truthy(payload.pointer("/core/terminalDiscipline"));
    has_terminal.then_some(LensTag::Equity)
}

fn pnl_shape(payload: &Value) -> Option<LensTag> {
    let has_pnl = presence::is_number(payload.pointer("/strategy/pnlAfterFrictions"))
        || presence::is_number(payload.get("pnlAfterFrictions"));
    has_pnl.then_some(LensTag::Strategy)
}

fn execution_cost_shape(payload: &Value) -> Option<LensTag> {
    let has_costs = presence::is_number(payload.pointer("/onchain/mevCost"))
        || presence::is_number(payload.pointer("/onchain/gasCost"));
    has_costs.then_some(LensTag::Onchain)
}

fn factor_attribution_shape(payload: &Value) -> Option<LensTag> {
    payload
        .pointer("/macro/factorAttribution")
        .and_then(Value::as_array)
        .filter(|factors| !factors.is_empty())
        .map(|_| LensTag::Macro)
}

/// Untagged envelopes still name their lens through the single `lens_data` key
fn lens_data_key(payload: &Value) -> Option<LensTag> {
    let data = payload.get("lens_data")?.as_object()?;
    if data.len() != 1 {
        return None;
    }
    let (key, body) = data.iter().next()?;
    if !body.is_object() {
        return None;
    }
    LensTag::from_declared(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_block() {
        assert_eq!(detect(&json!({ "equity": { "deltaFCF": {} } })), LensTag::Equity);
        assert_eq!(detect(&json!({ "onchain": {} })), LensTag::Onchain);
    }

    #[test]
    fn test_explicit_lens_field() {
        assert_eq!(detect(&json!({ "lens": "macro" })), LensTag::Macro);
        assert_eq!(detect(&json!({ "lens": "strategy" })), LensTag::Strategy);
    }

    #[test]
    fn test_explicit_lens_beats_shape() {
        // Terminal discipline alone would classify as equity
        let payload = json!({
            "lens": "onchain",
            "core": { "terminalDiscipline": { "method": "gordon", "gStable": 0.02, "wacc": 0.08 } },
            "pnlAfterFrictions": 0.4
        });
        assert_eq!(detect(&payload), LensTag::Onchain);
        assert_eq!(explain(&payload).rule, Some("explicit-onchain"));
    }

    #[test]
    fn test_explicit_enumeration_order() {
        // Both an equity block and lens=macro are explicit; equity is checked first
        let payload = json!({ "lens": "macro", "equity": {} });
        assert_eq!(detect(&payload), LensTag::Equity);

        let payload = json!({ "strategy": {}, "onchain": {} });
        assert_eq!(detect(&payload), LensTag::Strategy);
    }

    #[test]
    fn test_terminal_shape_is_equity() {
        let payload = json!({ "core": { "terminalDiscipline": { "method": "gordon" } } });
        assert_eq!(detect(&payload), LensTag::Equity);
        assert_eq!(explain(&payload).rule, Some("terminal-value-shape"));
    }

    #[test]
    fn test_top_level_pnl_is_strategy() {
        let payload = json!({ "pnlAfterFrictions": -0.01 });
        assert_eq!(detect(&payload), LensTag::Strategy);

        let not_numeric = json!({ "pnlAfterFrictions": "1.2%" });
        assert_eq!(detect(&not_numeric), LensTag::Generic);
    }

    #[test]
    fn test_terminal_shape_beats_pnl_shape() {
        let payload = json!({
            "core": { "terminalDiscipline": { "method": "exit_multiple" } },
            "pnlAfterFrictions": 0.2
        });
        assert_eq!(detect(&payload), LensTag::Equity);
    }

    #[test]
    fn test_lens_data_key() {
        let payload = json!({ "lens_data": { "onchain": { "gasCost": 0.1 } } });
        assert_eq!(detect(&payload), LensTag::Onchain);
        assert_eq!(explain(&payload).rule, Some("lens-data-key"));

        // Shape heuristics still outrank lens_data
        let payload = json!({
            "pnlAfterFrictions": 0.2,
            "lens_data": { "macro": { "regimeTag": "easing" } }
        });
        assert_eq!(detect(&payload), LensTag::Strategy);

        let ambiguous = json!({ "lens_data": { "macro": {}, "equity": {} } });
        assert_eq!(detect(&ambiguous), LensTag::Generic);
    }

    #[test]
    fn test_fallback_generic() {
        assert_eq!(detect(&json!({})), LensTag::Generic);
        assert_eq!(detect(&json!(null)), LensTag::Generic);
        assert_eq!(detect(&json!("equity")), LensTag::Generic);
        assert_eq!(detect(&json!({ "lens": "generic" })), LensTag::Generic);
        assert_eq!(detect(&json!({ "lens": 3, "equity": "yes" })), LensTag::Generic);
        assert_eq!(explain(&json!({})).rule, None);
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = DETECTION_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "explicit-equity",
                "explicit-strategy",
                "explicit-macro",
                "explicit-onchain",
                "terminal-value-shape",
                "pnl-shape",
                "execution-cost-shape",
                "factor-attribution-shape",
                "lens-data-key",
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let payload = json!({ "core": { "cashProxy": "pnl" }, "pnlAfterFrictions": 1 });
        let first = explain(&payload);
        for _ in 0..10 {
            assert_eq!(explain(&payload), first);
        }
    }
}
