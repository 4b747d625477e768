use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::commands::InputArgs;

pub fn cmd_convert(input: InputArgs, output: Option<PathBuf>) -> Result<()> {
    let start = Instant::now();
    let builder = input.load()?;

    let output =
        output.unwrap_or_else(|| PathBuf::from(builder.variant().default_file_name()));

    // Nothing touches the output path until the whole file is in memory
    let bytes = builder.build();
    fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write database: {}", output.display()))?;

    let stats = builder.stats();
    tracing::info!(
        output = %output.display(),
        size = bytes.len(),
        data_size = stats.data_size,
        "wrote {}-node trie with {} networks ({} distinct labels) in {:.2} seconds",
        stats.node_count,
        stats.network_count,
        stats.distinct_records,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
