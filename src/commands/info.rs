use std::io::Write;

use anyhow::{Context, Result};

use checkout_snapshot::client::ClientDirectory;

/// Handle the info command
/// Output repository settings of the checkout
pub fn handle<W: Write>(client: &ClientDirectory, output: &mut W) -> Result<()> {
    let config = client
        .load_checkout_config()
        .with_context(|| format!("Failed to load {:?}", client.config_path()))?;

    writeln!(output, "mount: {}", client.mount_path().display())?;
    writeln!(output, "client directory: {}", client.client_dir().display())?;
    writeln!(output, "repository: {} ({})", config.repo_source, config.repo_type)?;
    writeln!(output, "protocol: {:?}", config.mount_protocol)?;
    writeln!(output, "case sensitive: {}", config.case_sensitive)?;
    writeln!(output, "require utf-8 paths: {}", config.require_utf8_path)?;
    if let Some(catalog) = config.inode_catalog_type {
        writeln!(output, "inode catalog: {:?}", catalog)?;
    }
    for (path, target) in &config.redirection_targets {
        writeln!(output, "redirection: {} -> {}", path, target)?;
    }
    writeln!(
        output,
        "intentionally unmounted: {}",
        client.is_intentionally_unmounted()
    )?;

    Ok(())
}
