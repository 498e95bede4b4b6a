//! Process-wide Ctrl-C handling.

use anyhow::{Context, Result};

/// Printed to stderr when the operator interrupts a run.
pub const CANCELLED_MESSAGE: &str = "Operation cancelled by user";

/// Install a handler that reports the interrupt and exits with status 1.
///
/// The handler runs on its own thread while the main thread may be blocked on
/// the overwrite prompt, so it ends the process directly.
pub fn install() -> Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("{CANCELLED_MESSAGE}");
        std::process::exit(1);
    })
    .context("failed to install interrupt handler")
}
