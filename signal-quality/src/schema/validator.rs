use super::error::SchemaError;
use super::repository::{root_id, SchemaRepository};
use common::SchemaGeneration;
use jsonschema::{Draft, Retrieve, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

lazy_static::lazy_static! {
    static ref BUILTIN: Result<Arc<SchemaValidator>, SchemaError> = SchemaRepository::builtin()
        .and_then(|repo| SchemaValidator::from_repository(&repo))
        .map(Arc::new);
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON pointer of the offending instance; `""` is the root
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }

    fn schema_literal_issue(message: String) -> Self {
        Self::from_issues(vec![ValidationIssue {
            path: "/schema".to_string(),
            message,
        }])
    }
}

/// Resolves cross-document `$ref`s against the repository
struct RepositoryRetriever {
    documents: BTreeMap<String, Value>,
}

impl Retrieve for RepositoryRetriever {
    fn retrieve(&self, uri: &Uri<String>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let id = uri.as_str().split('#').next().unwrap_or_default();
        self.documents
            .get(id)
            .cloned()
            .ok_or_else(|| format!("schema not registered: {id}").into())
    }
}

/// Compiled validators, one per schema generation.
///
/// Compiled once, then read-only: share it across threads freely.
#[derive(Debug)]
pub struct SchemaValidator {
    validators: HashMap<SchemaGeneration, jsonschema::Validator>,
}

impl SchemaValidator {
    pub fn from_repository(repo: &SchemaRepository) -> Result<Self, SchemaError> {
        let mut validators = HashMap::new();

        for generation in SchemaGeneration::ALL {
            let root = repo.require(root_id(generation))?;
            let retriever = RepositoryRetriever {
                documents: repo.documents().clone(),
            };
            let validator = jsonschema::options()
                .with_draft(Draft::Draft7)
                .with_retriever(retriever)
                .build(root)
                .map_err(|e| SchemaError::Compile {
                    generation,
                    message: e.to_string(),
                })?;
            debug!(generation = %generation, "schema validator compiled");
            validators.insert(generation, validator);
        }

        info!(generations = validators.len(), "schema validators ready");
        Ok(Self { validators })
    }

    /// Process-wide validator over the built-in documents, compiled on first use
    pub fn builtin() -> Result<Arc<SchemaValidator>, &'static SchemaError> {
        BUILTIN.as_ref().map(Arc::clone)
    }

    /// The generation named by a payload's `schema` literal
    pub fn generation_of(payload: &Value) -> Option<SchemaGeneration> {
        payload
            .get("schema")
            .and_then(Value::as_str)
            .and_then(SchemaGeneration::from_literal)
    }

    /// Validate against the generation named by the payload itself
    pub fn validate(&self, payload: &Value) -> ValidationReport {
        match payload.get("schema") {
            None => ValidationReport::schema_literal_issue("missing schema literal".to_string()),
            Some(Value::String(literal)) => match SchemaGeneration::from_literal(literal) {
                Some(generation) => self.validate_as(generation, payload),
                None => {
                    debug!(literal = %literal, "unknown schema literal");
                    ValidationReport::schema_literal_issue(format!("unknown schema literal \"{literal}\""))
                }
            },
            Some(_) => ValidationReport::schema_literal_issue("schema literal must be a string".to_string()),
        }
    }

    /// Validate against an explicit generation, collecting every violation
    pub fn validate_as(&self, generation: SchemaGeneration, payload: &Value) -> ValidationReport {
        let Some(validator) = self.validators.get(&generation) else {
            return ValidationReport::schema_literal_issue(format!("no validator compiled for {generation}"));
        };

        let errors: Vec<ValidationIssue> = validator
            .iter_errors(payload)
            .map(|error| ValidationIssue {
                path: error.instance_path.to_string(),
                message: error.to_string(),
            })
            .collect();

        debug!(generation = %generation, errors = errors.len(), "payload validated");
        ValidationReport::from_issues(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{
        CashProxy, Core, DecayFunction, EquityBody, GreeksMethod, MacroBody, MessageProvenance,
        OnchainBody, Provenance, RightsMode, StrategyBody, TerminalMethod,
    };
    use serde_json::json;

    fn validator() -> Arc<SchemaValidator> {
        SchemaValidator::builtin().unwrap()
    }

    fn fixture(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    fn has_error_at(report: &ValidationReport, path: &str) -> bool {
        report.errors.iter().any(|e| e.path == path)
    }

    fn mentions(report: &ValidationReport, needle: &str) -> bool {
        report.errors.iter().any(|e| e.message.contains(needle))
    }

    const V1_FIXTURES: &[&str] = &[
        include_str!("../../fixtures/usignal/basic-core-only.example.json"),
        include_str!("../../fixtures/usignal/equity-lens.example.json"),
        include_str!("../../fixtures/usignal/strategy-lens.example.json"),
        include_str!("../../fixtures/usignal/multi-lens.example.json"),
    ];

    const V1_1_FIXTURES: &[&str] = &[
        include_str!("../../fixtures/usignal/v1_1/minimal-runtime.example.json"),
        include_str!("../../fixtures/usignal/v1_1/tradingview-ingest.example.json"),
    ];

    const CPJ_FIXTURES: &[&str] = &[
        include_str!("../../fixtures/cpj/v0_1/telegram-blofin-perp.example.json"),
        include_str!("../../fixtures/cpj/v0_1/telegram-coinbase-spot.example.json"),
        include_str!("../../fixtures/cpj/v0_1/discord-signal.example.json"),
    ];

    #[test]
    fn test_v1_fixtures_valid() {
        let validator = validator();
        for text in V1_FIXTURES {
            let report = validator.validate(&fixture(text));
            assert!(report.ok, "{:?}", report.errors);
        }
    }

    #[test]
    fn test_v1_1_fixtures_valid() {
        let validator = validator();
        for text in V1_1_FIXTURES {
            let payload = fixture(text);
            assert_eq!(SchemaValidator::generation_of(&payload), Some(SchemaGeneration::UsignalV1_1));
            let report = validator.validate(&payload);
            assert!(report.ok, "{:?}", report.errors);
        }
    }

    #[test]
    fn test_cpj_fixtures_valid() {
        let validator = validator();
        for text in CPJ_FIXTURES {
            let report = validator.validate(&fixture(text));
            assert!(report.ok, "{:?}", report.errors);
        }
    }

    #[test]
    fn test_fixtures_deserialize_into_contracts() {
        for text in V1_FIXTURES.iter().chain(V1_1_FIXTURES) {
            serde_json::from_str::<common::SignalEnvelope>(text).unwrap();
        }
        for text in CPJ_FIXTURES {
            serde_json::from_str::<common::ParsedMessage>(text).unwrap();
        }
    }

    #[test]
    fn test_minimal_v1() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        let report = validator().validate(&payload);
        assert!(report.ok);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_missing_provenance() {
        let report = validator().validate(&json!({ "schema": "afi.usignal.v1" }));
        assert!(!report.ok);
        assert!(has_error_at(&report, ""));
        assert!(mentions(&report, "provenance"));
    }

    #[test]
    fn test_unknown_lens_field_rejected() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "lens": "equity",
            "lens_data": { "equity": { "deltaFCF": {}, "priceTarget": 120 } },
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(report.errors.iter().any(|e| e.path.starts_with("/lens_data")));
    }

    #[test]
    fn test_top_level_lens_block_closed() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "strategy": { "pnlAfterFrictions": 0.1, "sharpe": 2.0 },
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/strategy"));
    }

    #[test]
    fn test_open_root_accepts_extra_fields() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" },
            "notes": "free-form"
        });
        assert!(validator().validate(&payload).ok);
    }

    #[test]
    fn test_capacity_constraints_limit() {
        let mut payload = json!({
            "schema": "afi.usignal.v1",
            "core": { "capacityConstraints": ["a", "b", "c", "d", "e", "f", "g", "h"] },
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        assert!(validator().validate(&payload).ok);

        payload["core"]["capacityConstraints"] = json!(["a", "b", "c", "d", "e", "f", "g", "h", "i"]);
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/core/capacityConstraints"));
    }

    #[test]
    fn test_declared_lens_mismatch() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "lens": "equity",
            "lens_data": { "strategy": { "pnlAfterFrictions": 0.2 } },
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/lens_data"));
        assert!(mentions(&report, "equity"));
    }

    #[test]
    fn test_lens_data_single_lens() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "lens_data": {
                "macro": { "regimeTag": "easing" },
                "onchain": { "gasCost": 0.1 }
            },
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/lens_data"));
    }

    #[test]
    fn test_enum_violation_path() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "core": { "cashProxy": "vibes" },
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/core/cashProxy"));
    }

    #[test]
    fn test_collects_all_errors() {
        let payload = json!({
            "schema": "afi.usignal.v1",
            "core": { "cashProxy": "vibes", "capacityConstraints": "adv" }
        });
        let report = validator().validate(&payload);
        assert!(report.errors.len() >= 3, "{:?}", report.errors);
    }

    #[test]
    fn test_v1_1_requires_provider_and_signal_ids() {
        let payload = json!({
            "schema": "afi.usignal.v1.1",
            "provenance": { "timestamp": "2024-12-01T00:00:00Z", "source": "tradingview" }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(mentions(&report, "providerId"));
        assert!(mentions(&report, "signalId"));
        assert!(has_error_at(&report, "/provenance"));

        // The same content is fine under v1 once it carries the v1 literal
        let mut as_v1 = payload.clone();
        as_v1["schema"] = json!(SchemaGeneration::UsignalV1.literal());
        let report = validator().validate(&as_v1);
        assert!(report.ok, "{:?}", report.errors);
    }

    #[test]
    fn test_forced_generation_checks_literal() {
        let payload = json!({
            "schema": "afi.usignal.v1.1",
            "provenance": { "timestamp": "2024-12-01T00:00:00Z" }
        });
        let report = validator().validate_as(SchemaGeneration::UsignalV1, &payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/schema"));
    }

    #[test]
    fn test_v1_1_rejects_empty_ids() {
        let payload = json!({
            "schema": "afi.usignal.v1.1",
            "provenance": {
                "timestamp": "2024-12-01T00:00:00Z",
                "source": "tradingview",
                "providerId": "",
                "signalId": "tv-1"
            }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/provenance/providerId"));
    }

    #[test]
    fn test_v1_1_reuses_lens_extensions() {
        let payload = json!({
            "schema": "afi.usignal.v1.1",
            "lens": "onchain",
            "lens_data": { "onchain": { "gasCost": 0.2, "mevCost": 0.05, "rebates": 1 } },
            "provenance": {
                "timestamp": "2024-12-01T00:00:00Z",
                "source": "tradingview",
                "providerId": "tv",
                "signalId": "tv-1"
            }
        });
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(report.errors.iter().any(|e| e.path.starts_with("/lens_data")));
    }

    #[test]
    fn test_cpj_missing_provenance_fields() {
        let mut payload = fixture(CPJ_FIXTURES[0]);
        let provenance = payload["provenance"].as_object_mut().unwrap();
        provenance.remove("messageId");
        provenance.remove("postedAt");

        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(mentions(&report, "messageId"));
        assert!(mentions(&report, "postedAt"));
    }

    #[test]
    fn test_cpj_invalid_side() {
        let mut payload = fixture(CPJ_FIXTURES[1]);
        payload["extracted"]["side"] = json!("hold");
        let report = validator().validate(&payload);
        assert!(!report.ok);
        assert!(has_error_at(&report, "/extracted/side"));
    }

    #[test]
    fn test_cpj_confidence_bounds() {
        let mut payload = fixture(CPJ_FIXTURES[2]);
        payload["parse"]["confidence"] = json!(1.5);
        let report = validator().validate(&payload);
        assert!(has_error_at(&report, "/parse/confidence"));
    }

    #[test]
    fn test_unknown_or_missing_literal() {
        let validator = validator();

        let report = validator.validate(&json!({ "schema": "afi.usignal.v9" }));
        assert!(!report.ok);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "/schema");
        assert!(report.errors[0].message.contains("afi.usignal.v9"));

        let report = validator.validate(&json!({ "provenance": {} }));
        assert_eq!(report.errors[0].path, "/schema");

        let report = validator.validate(&json!({ "schema": 1 }));
        assert_eq!(report.errors[0].path, "/schema");
    }

    #[test]
    fn test_validation_ignores_quality() {
        // Valid and worthless
        let payload = json!({
            "schema": "afi.usignal.v1",
            "provenance": { "timestamp": "" }
        });
        assert!(validator().validate(&payload).ok);
        assert_eq!(crate::weighting::weight(&payload, None).score, 0.0);
    }

    #[test]
    fn test_repository_missing_root() {
        let repo = SchemaRepository::new();
        let err = SchemaValidator::from_repository(&repo).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownSchema { .. }));
    }

    #[test]
    fn test_concurrent_use() {
        let validator = validator();
        let payload = fixture(V1_FIXTURES[1]);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        assert!(validator.validate(&payload).ok);
                    }
                });
            }
        });
    }

    fn schema_doc(id: &str) -> Value {
        SchemaRepository::builtin().unwrap().get_schema(id).unwrap().clone()
    }

    fn string_list(value: &Value) -> Vec<String> {
        let mut items: Vec<String> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        items.sort();
        items
    }

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut items: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        items.sort();
        items
    }

    #[test]
    fn test_core_enums_match_contracts() {
        let core = schema_doc("https://afi.local/schemas/usignal/v1/core.schema.json");
        let props = &core["properties"];
        assert_eq!(string_list(&props["cashProxy"]["enum"]), sorted(CashProxy::NAMES));
        assert_eq!(
            props["capacityConstraints"]["maxItems"],
            json!(Core::MAX_CAPACITY_CONSTRAINTS)
        );
        let core_v1_1 = schema_doc("https://afi.local/schemas/usignal/v1_1/core.schema.json");
        assert_eq!(
            core_v1_1["properties"]["capacityConstraints"]["maxItems"],
            json!(Core::MAX_CAPACITY_CONSTRAINTS)
        );
        assert_eq!(
            string_list(&props["terminalDiscipline"]["properties"]["method"]["enum"]),
            sorted(TerminalMethod::NAMES)
        );
        assert_eq!(
            string_list(&props["telemetry"]["properties"]["decay"]["properties"]["function"]["enum"]),
            sorted(DecayFunction::NAMES)
        );
        assert_eq!(
            string_list(&props["telemetry"]["properties"]["greeks"]["properties"]["method"]["enum"]),
            sorted(GreeksMethod::NAMES)
        );
        assert_eq!(
            string_list(&props["rights"]["properties"]["mode"]["enum"]),
            sorted(RightsMode::NAMES)
        );
    }

    #[test]
    fn test_lens_bodies_match_contracts() {
        let cases: [(&str, &[&str]); 4] = [
            ("equity", EquityBody::FIELDS),
            ("strategy", StrategyBody::FIELDS),
            ("macro", MacroBody::FIELDS),
            ("onchain", OnchainBody::FIELDS),
        ];
        for (lens, fields) in cases {
            let doc = schema_doc(&format!(
                "https://afi.local/schemas/usignal/v1/lenses/{lens}.lens.schema.json"
            ));
            let body = &doc["definitions"]["body"];
            assert_eq!(body["additionalProperties"], json!(false), "{lens} body is open");
            let mut declared: Vec<String> = body["properties"]
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect();
            declared.sort();
            assert_eq!(declared, sorted(fields), "{lens} fields drifted");
        }
    }

    #[test]
    fn test_required_provenance_matches_contracts() {
        let v1 = schema_doc(root_id(SchemaGeneration::UsignalV1));
        assert_eq!(
            string_list(&v1["properties"]["provenance"]["required"]),
            sorted(Provenance::REQUIRED_V1)
        );
        let v1_1 = schema_doc(root_id(SchemaGeneration::UsignalV1_1));
        assert_eq!(
            string_list(&v1_1["properties"]["provenance"]["required"]),
            sorted(Provenance::REQUIRED_V1_1)
        );
        let cpj = schema_doc("https://afi.local/schemas/cpj/v0_1/core.schema.json");
        assert_eq!(
            string_list(&cpj["properties"]["provenance"]["required"]),
            sorted(MessageProvenance::REQUIRED)
        );
    }
}
