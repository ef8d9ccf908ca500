use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use signal_quality::{load_config, PipelineConfig, QualityPipeline};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt;

/// Validate and score signal payloads
#[derive(Parser, Debug)]
#[command(name = "uss-check")]
#[command(about = "Validate, weight and rank signal envelope JSON files")]
struct Cli {
    /// Pipeline configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gate and rank the batch instead of printing each assessment
    #[arg(long)]
    rank: bool,

    /// Payload files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            load_config(path_str).with_context(|| format!("loading config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    let pipeline = QualityPipeline::new(config)?;

    let mut payloads = Vec::with_capacity(cli.files.len());
    for file in &cli.files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        let payload: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", file.display()))?;
        payloads.push(payload);
    }

    if cli.rank {
        let ranked = pipeline.process(&payloads);
        info!("{} of {} payloads admitted", ranked.len(), payloads.len());
        for entry in &ranked {
            let score = entry.assessment.rank_score();
            println!("#{} {} score={:.2}", entry.rank, cli.files[entry.index].display(), score);
        }
        return Ok(());
    }

    let mut invalid = 0;
    for (file, payload) in cli.files.iter().zip(&payloads) {
        let assessment = pipeline.assess(payload);
        if !assessment.validation.ok {
            invalid += 1;
            warn!("{} failed validation", file.display());
        }
        println!("{}", file.display());
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    }

    if invalid > 0 {
        bail!("{invalid} of {} payloads failed validation", cli.files.len());
    }
    Ok(())
}
