use std::{fs, io::Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use checkout_snapshot::{CheckoutStateStore, SnapshotState};

/// Handle the status command
/// Print the recorded state; an interrupted checkout shows up as in progress
pub fn handle<W: Write>(store: &CheckoutStateStore, output: &mut W, json: bool) -> Result<()> {
    let state = store
        .get_state()
        .with_context(|| format!("Failed to read {:?}", store.snapshot_path()))?;

    if json {
        writeln!(output, "{}", serde_json::to_string_pretty(&state)?)?;
        return Ok(());
    }

    match &state {
        SnapshotState::Stable {
            working_copy_parent,
            checked_out,
        } => {
            writeln!(output, "state: stable")?;
            writeln!(output, "working copy parent: {}", working_copy_parent)?;
            writeln!(output, "checked out: {}", checked_out)?;
        }
        SnapshotState::InProgress { from, to, pid } => {
            writeln!(output, "state: checkout in progress (pid {})", pid)?;
            writeln!(output, "from: {}", from)?;
            writeln!(output, "to: {}", to)?;
        }
    }

    let modified = fs::metadata(store.snapshot_path())?.modified()?;
    writeln!(output, "written: {}", DateTime::<Local>::from(modified).to_rfc3339())?;

    Ok(())
}
