// Ingest Gates
// Decide which assessed payloads are admitted to a batch

use crate::pipeline::SignalAssessment;
use common::LensTag;
use tracing::debug;

/// Trait for ingest gates
pub trait IngestGate: Send + Sync {
    fn name(&self) -> &'static str;

    fn admit(&self, assessment: &SignalAssessment) -> bool;
}

/// Admits only payloads that passed schema validation
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidityGate;

impl IngestGate for SchemaValidityGate {
    fn name(&self) -> &'static str {
        "schema-validity"
    }

    fn admit(&self, assessment: &SignalAssessment) -> bool {
        let passes = assessment.validation.ok;
        debug!(
            errors = assessment.validation.errors.len(),
            passes, "schema validity gate"
        );
        passes
    }
}

/// Configuration for the minimum score gate
#[derive(Debug, Clone)]
pub struct MinScoreConfig {
    pub min_score: f64,
}

impl Default for MinScoreConfig {
    fn default() -> Self {
        Self { min_score: 1.0 }
    }
}

/// Admits scored payloads at or above a quality floor. Unscored payloads pass.
pub struct MinScoreGate {
    config: MinScoreConfig,
}

impl MinScoreGate {
    pub fn new(config: MinScoreConfig) -> Self {
        Self { config }
    }
}

impl Default for MinScoreGate {
    fn default() -> Self {
        Self::new(MinScoreConfig::default())
    }
}

impl IngestGate for MinScoreGate {
    fn name(&self) -> &'static str {
        "min-score"
    }

    fn admit(&self, assessment: &SignalAssessment) -> bool {
        let Some(quality) = &assessment.quality else {
            return true;
        };
        let passes = quality.score >= self.config.min_score;
        debug!(
            score = quality.score,
            min_score = self.config.min_score,
            passes, "min score gate"
        );
        passes
    }
}

/// Configuration for the lens allow-list gate
#[derive(Debug, Clone, Default)]
pub struct LensAllowListConfig {
    /// Empty admits every lens
    pub lenses: Vec<LensTag>,
}

/// Admits scored payloads whose resolved lens is allowed. Unscored payloads pass.
pub struct LensAllowListGate {
    config: LensAllowListConfig,
}

impl LensAllowListGate {
    pub fn new(config: LensAllowListConfig) -> Self {
        Self { config }
    }
}

impl IngestGate for LensAllowListGate {
    fn name(&self) -> &'static str {
        "lens-allow-list"
    }

    fn admit(&self, assessment: &SignalAssessment) -> bool {
        if self.config.lenses.is_empty() {
            return true;
        }
        let Some(quality) = &assessment.quality else {
            return true;
        };
        let passes = self.config.lenses.contains(&quality.lens);
        debug!(lens = %quality.lens, passes, "lens allow-list gate");
        passes
    }
}

/// Combines multiple gates with AND logic
#[derive(Default)]
pub struct CompositeGate {
    gates: Vec<Box<dyn IngestGate>>,
}

impl CompositeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_gate(mut self, gate: Box<dyn IngestGate>) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

impl IngestGate for CompositeGate {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn admit(&self, assessment: &SignalAssessment) -> bool {
        for gate in &self.gates {
            if !gate.admit(assessment) {
                debug!(gate = gate.name(), "assessment refused");
                return false;
            }
        }
        true
    }
}
