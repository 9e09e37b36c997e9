use anyhow::Context;
use ccmatch::{Matcher, MatchingConfig};
use log::info;
use std::path::PathBuf;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("Usage: ccmatch <input.parquet> <output.parquet> [config.json]");
        std::process::exit(2);
    };
    let input = PathBuf::from(input);
    let output = PathBuf::from(output);

    let config = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            serde_json::from_str::<MatchingConfig>(&text)
                .with_context(|| format!("Failed to parse config file {path}"))?
        }
        None => MatchingConfig::default(),
    };

    let dataset = ccmatch::loader::read_parquet(&input)
        .with_context(|| format!("Failed to load dataset from {}", input.display()))?;

    let matcher = Matcher::new(config);
    let result = matcher
        .match_dataset(&dataset)
        .context("Matching run failed")?;

    info!(
        "Matched {} treated records ({} unmatched, {} cells filled, total distance {:.4})",
        result.matched_count(),
        result.unmatched_count(),
        result.filled_cells,
        result.total_distance()
    );

    ccmatch::loader::write_parquet(&result.output, &output)
        .with_context(|| format!("Failed to write output to {}", output.display()))?;

    Ok(())
}
