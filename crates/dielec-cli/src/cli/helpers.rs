use anyhow::{Context, bail};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub(super) fn default_log_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs the stderr subscriber once; later calls (tests) are no-ops.
pub(super) fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn ensure_input_deck(path: &Path) -> anyhow::Result<()> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("input deck '{}' is not accessible", path.display()))?;
    if !metadata.is_file() {
        bail!("input deck '{}' is not a regular file", path.display());
    }
    Ok(())
}
