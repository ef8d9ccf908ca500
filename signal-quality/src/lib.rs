// Signal Quality
// Lens detection, schema validation and quality weighting for signal envelopes

pub mod config;
pub mod detector;
pub mod gates;
pub mod pipeline;
mod presence;
pub mod schema;
pub mod weighting;

pub use config::{create_config_template, load_config, save_config, PipelineConfig};
pub use detector::{detect, explain, Detection, DetectionRule, DETECTION_RULES};
pub use gates::{
    CompositeGate, IngestGate, LensAllowListConfig, LensAllowListGate, MinScoreConfig, MinScoreGate,
    SchemaValidityGate,
};
pub use pipeline::{CanonicalSignal, QualityPipeline, RankedSignal, SignalAssessment};
pub use schema::{SchemaError, SchemaRepository, SchemaValidator, ValidationIssue, ValidationReport};
pub use weighting::{weight, QualityReport, QualityRule, RuleOutcome, RuleScope, QUALITY_RULES};
