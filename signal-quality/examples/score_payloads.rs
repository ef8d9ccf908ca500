//! Example usage of the signal quality pipeline

use serde_json::json;
use signal_quality::{detect, explain, weight, PipelineConfig, QualityPipeline, SchemaValidator};
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> anyhow::Result<()> {
    fmt().with_max_level(Level::WARN).init();

    println!("=== Signal Quality Example ===\n");

    // Example 1: Lens detection
    println!("Example 1: Lens Detection");
    let equity = json!({
        "equity": { "terminal": { "method": "gordon", "g_stable": 0.03, "wacc": 0.08 }, "deltaFCF": {} },
        "core": { "cashProxy": "delta_fcf" }
    });
    let shape_only = json!({ "pnlAfterFrictions": 0.012 });
    println!("  explicit block -> {}", detect(&equity));
    let detection = explain(&shape_only);
    println!("  pnl shape      -> {} (rule {:?})\n", detection.lens, detection.rule);

    // Example 2: Quality weighting
    println!("Example 2: Quality Weighting");
    let report = weight(&equity, None);
    println!("  Lens: {}", report.lens);
    println!("  Score: {:.2}", report.score);
    for reason in &report.reasons {
        println!("  - {}", reason);
    }
    println!();

    // Example 3: Schema validation
    println!("Example 3: Schema Validation");
    let validator = SchemaValidator::builtin().map_err(|e| anyhow::anyhow!("{e}"))?;
    let runtime = json!({
        "schema": "afi.usignal.v1.1",
        "provenance": { "timestamp": "2024-12-16T10:00:00Z", "source": "afi-runtime" }
    });
    let validation = validator.validate(&runtime);
    println!("  ok: {}", validation.ok);
    for issue in &validation.errors {
        println!("  {} {}", issue.path, issue.message);
    }
    println!();

    // Example 4: Ranking a batch
    println!("Example 4: Ranking a Batch");
    let pipeline = QualityPipeline::new(PipelineConfig {
        require_valid: false,
        ..Default::default()
    })?;
    let batch = vec![
        json!({ "schema": "afi.usignal.v1", "provenance": { "timestamp": "2024-12-01T00:00:00Z" } }),
        json!({ "schema": "afi.usignal.v1", "onchain": { "gasCost": 0.2, "mevCost": 0.1 },
                "provenance": { "timestamp": "2024-12-02T00:00:00Z" } }),
        equity,
    ];
    for entry in pipeline.process(&batch) {
        println!(
            "  #{} input {} score {:.2} valid {}",
            entry.rank,
            entry.index,
            entry.assessment.rank_score(),
            entry.assessment.validation.ok
        );
    }

    Ok(())
}
