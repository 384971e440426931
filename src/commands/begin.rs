use std::io::Write;

use anyhow::{Context, Result};

use checkout_snapshot::{CheckoutStateStore, RevisionId};

/// Handle the begin command - mark a checkout as started
pub fn handle<W: Write>(
    store: &CheckoutStateStore,
    output: &mut W,
    from: &str,
    to: &str,
) -> Result<()> {
    store
        .begin_checkout(&RevisionId::from(from), &RevisionId::from(to))
        .context("Failed to record checkout start")?;

    writeln!(output, "checkout {} -> {} in progress", from, to)?;
    Ok(())
}
