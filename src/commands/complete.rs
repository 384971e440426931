use std::io::Write;

use anyhow::{Context, Result};

use checkout_snapshot::{CheckoutStateStore, RevisionId};

/// Handle the complete command - record `commit` as checked out
pub fn handle<W: Write>(store: &CheckoutStateStore, output: &mut W, commit: &str) -> Result<()> {
    store
        .complete_checkout(&RevisionId::from(commit))
        .context("Failed to record checkout completion")?;

    writeln!(output, "checked out {}", commit)?;
    Ok(())
}
