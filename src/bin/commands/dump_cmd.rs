use anyhow::{Context, Result};
use std::io::{self, BufWriter, Write};

use crate::commands::InputArgs;

pub fn cmd_dump(input: InputArgs) -> Result<()> {
    let builder = input.load()?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    builder.dump(&mut out).context("Failed to write node table")?;
    out.flush().context("Failed to write node table")?;

    let stats = builder.stats();
    tracing::info!(
        nodes = stats.node_count,
        networks = stats.network_count,
        distinct_records = stats.distinct_records,
        "dumped trie"
    );
    Ok(())
}
