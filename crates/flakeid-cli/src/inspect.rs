use crate::cli::DecomposeArgs;
use anyhow::Context;
use flakeid_generator::{decompose, DecomposedId, DEFAULT_START_TIME, MAX_TIME};
use jiff::Timestamp;
use std::io::{self, Write};
use tracing::warn;

pub fn run(args: &DecomposeArgs) -> anyhow::Result<()> {
    let start_time = args.start_time.unwrap_or(DEFAULT_START_TIME);
    let mut stdout = io::stdout().lock();
    for &id in &args.ids {
        writeln!(stdout, "{}", describe(id, start_time)).context("failed to write to stdout")?;
    }
    Ok(())
}

/// One line per id: the raw value, its fields and when its time unit began.
pub fn describe(id: u64, start_time: Timestamp) -> String {
    let parts = decompose(id);
    let DecomposedId {
        time,
        machine_id,
        sequence,
    } = parts;

    if time > MAX_TIME {
        warn!(id, time, "id has the reserved bit set");
    }

    let minted_at = parts
        .timestamp(start_time)
        .map(|ts| ts.to_string())
        .unwrap_or_else(|| "out of range".to_string());

    format!("id={id} time={time} machine_id={machine_id} sequence={sequence} timestamp={minted_at}")
}
