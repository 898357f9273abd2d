use std::time::Instant;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to stderr: stdout carries the JSON-RPC stream.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}

pub fn audit_mcp_action(
    method: &str,
    subject: Option<&str>,
    failed: bool,
    started_at: Instant,
) {
    info!(
        method = %method,
        subject = subject.unwrap_or("-"),
        outcome = if failed { "failure" } else { "success" },
        duration_ms = started_at.elapsed().as_millis() as u64,
        "mcp action audited"
    );
}
