mod report;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sf_optimizer::{StageConfig, StageOptimizer};
use sf_types::StageDocument;

const DEFAULT_OUTPUT: &str = "optimized_stage2.json";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("STAGEFORGE_CONFIG") {
        Ok(path) => StageConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        Err(_) => StageConfig::default(),
    };
    let output = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STAGEFORGE_OUTPUT").ok())
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let optimizer = StageOptimizer::new(config)?;
    let result = optimizer.optimize()?;
    report::log_summary(&result);

    if let Some(document) = StageDocument::from_result(&result) {
        std::fs::write(&output, document.to_json_pretty()?)
            .with_context(|| format!("writing stage file {output}"))?;
        info!("Optimized configuration saved to {output}");
    }

    Ok(())
}
