use std::io::Write;

use anyhow::{Context, Result};

use checkout_snapshot::{CheckoutStateStore, RevisionId};

/// Handle the set-parent command
/// Moves the working copy parent, keeps the checked out revision
pub fn handle<W: Write>(store: &CheckoutStateStore, output: &mut W, commit: &str) -> Result<()> {
    store
        .set_working_copy_parent(&RevisionId::from(commit))
        .context("Failed to set working copy parent")?;

    writeln!(output, "working copy parent is now {}", commit)?;
    Ok(())
}
