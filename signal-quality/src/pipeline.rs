// Signal Quality Pipeline
// Validates, scores, gates and ranks incoming payloads

use crate::config::PipelineConfig;
use crate::gates::{IngestGate, LensAllowListConfig, LensAllowListGate, MinScoreConfig, MinScoreGate, SchemaValidityGate};
use crate::schema::{SchemaRepository, SchemaValidator, ValidationReport};
use crate::weighting::{self, QualityReport};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{LensTag, ParsedMessage, SchemaFamily, SchemaGeneration, SignalEnvelope};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A payload decoded into its typed contract
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalSignal {
    Universal(Box<SignalEnvelope>),
    ChatParse(Box<ParsedMessage>),
}

/// Everything learned about one payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalAssessment {
    /// `None` when the `schema` literal is missing or unknown
    pub generation: Option<SchemaGeneration>,
    pub validation: ValidationReport,
    /// `None` for chat-parse payloads, which are never lens-scored
    pub quality: Option<QualityReport>,
    /// Provenance timestamp, used to break score ties
    pub observed_at: Option<DateTime<Utc>>,
    /// Present only for valid payloads
    #[serde(skip)]
    pub signal: Option<CanonicalSignal>,
}

impl SignalAssessment {
    /// Score used for ranking; unscored payloads rank as zero
    pub fn rank_score(&self) -> f64 {
        self.quality.as_ref().map(|q| q.score).unwrap_or(0.0)
    }
}

/// An admitted payload and its place in the batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSignal {
    /// 1-based position after ranking
    pub rank: usize,
    /// Position in the input batch
    pub index: usize,
    pub assessment: SignalAssessment,
}

/// Signal quality pipeline
pub struct QualityPipeline {
    validator: Arc<SchemaValidator>,
    gates: Vec<Box<dyn IngestGate>>,
    config: PipelineConfig,
}

impl QualityPipeline {
    /// Create a pipeline with the gates the configuration asks for
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let validator = match &config.schema_dir {
            Some(dir) => {
                let repo = SchemaRepository::load_dir(dir)
                    .with_context(|| format!("loading schemas from {}", dir.display()))?;
                Arc::new(SchemaValidator::from_repository(&repo).context("compiling schemas")?)
            }
            None => SchemaValidator::builtin()
                .map_err(|e| anyhow::anyhow!("compiling built-in schemas: {e}"))?,
        };

        let mut pipeline = Self::with_validator(validator, config.clone());
        if config.require_valid {
            pipeline = pipeline.add_gate(Box::new(SchemaValidityGate));
        }
        pipeline = pipeline.add_gate(Box::new(MinScoreGate::new(MinScoreConfig {
            min_score: config.min_score,
        })));
        if !config.allowed_lenses.is_empty() {
            pipeline = pipeline.add_gate(Box::new(LensAllowListGate::new(LensAllowListConfig {
                lenses: config.allowed_lenses.clone(),
            })));
        }
        Ok(pipeline)
    }

    /// Create a pipeline with no gates over an existing validator
    pub fn with_validator(validator: Arc<SchemaValidator>, config: PipelineConfig) -> Self {
        Self {
            validator,
            gates: Vec::new(),
            config,
        }
    }

    /// Add an ingest gate
    pub fn add_gate(mut self, gate: Box<dyn IngestGate>) -> Self {
        info!("Adding ingest gate: {}", gate.name());
        self.gates.push(gate);
        self
    }

    /// Validate and score one payload
    pub fn assess(&self, payload: &Value) -> SignalAssessment {
        let generation = SchemaValidator::generation_of(payload);
        let validation = self.validator.validate(payload);

        let quality = match generation.map(|g| g.family()) {
            Some(SchemaFamily::ChatParse) => None,
            _ => Some(weighting::weight(payload, declared_lens(payload))),
        };

        let signal = if validation.ok {
            generation.and_then(|g| decode(g, payload))
        } else {
            None
        };

        SignalAssessment {
            generation,
            validation,
            quality,
            observed_at: observed_at(payload),
            signal,
        }
    }

    /// Assess, gate and rank a batch
    pub fn process(&self, payloads: &[Value]) -> Vec<RankedSignal> {
        if !self.config.enabled {
            debug!("Pipeline is disabled, skipping batch");
            return Vec::new();
        }

        let mut admitted: Vec<(usize, SignalAssessment)> = Vec::new();
        for (index, payload) in payloads.iter().enumerate() {
            let assessment = self.assess(payload);
            if self.admit(&assessment) {
                admitted.push((index, assessment));
            } else {
                debug!(index, "payload refused by gates");
            }
        }

        // Score descending, then newer first, then input order
        admitted.sort_by(|(a_index, a), (b_index, b)| {
            b.rank_score()
                .partial_cmp(&a.rank_score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.observed_at.cmp(&a.observed_at))
                .then_with(|| a_index.cmp(b_index))
        });
        admitted.truncate(self.config.max_signals_per_batch);

        info!("Admitted {} of {} payloads", admitted.len(), payloads.len());
        admitted
            .into_iter()
            .enumerate()
            .map(|(position, (index, assessment))| RankedSignal {
                rank: position + 1,
                index,
                assessment,
            })
            .collect()
    }

    fn admit(&self, assessment: &SignalAssessment) -> bool {
        for gate in &self.gates {
            if !gate.admit(assessment) {
                debug!("Assessment refused by gate {}", gate.name());
                return false;
            }
        }
        true
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

fn decode(generation: SchemaGeneration, payload: &Value) -> Option<CanonicalSignal> {
    let decoded = match generation.family() {
        SchemaFamily::UniversalSignal => serde_json::from_value::<SignalEnvelope>(payload.clone())
            .map(|envelope| CanonicalSignal::Universal(Box::new(envelope))),
        SchemaFamily::ChatParse => serde_json::from_value::<ParsedMessage>(payload.clone())
            .map(|message| CanonicalSignal::ChatParse(Box::new(message))),
    };
    match decoded {
        Ok(signal) => Some(signal),
        Err(e) => {
            warn!(generation = %generation, "valid payload did not decode: {}", e);
            None
        }
    }
}

/// A declared `lens` is authoritative for weighting; the detector only
/// resolves untagged payloads
fn declared_lens(payload: &Value) -> Option<LensTag> {
    payload
        .get("lens")
        .and_then(Value::as_str)
        .and_then(LensTag::from_declared)
}

fn observed_at(payload: &Value) -> Option<DateTime<Utc>> {
    let provenance = payload.get("provenance")?;
    let stamp = provenance
        .get("timestamp")
        .or_else(|| provenance.get("postedAt"))
        .and_then(Value::as_str)?;
    common::parse_timestamp(stamp)
}
