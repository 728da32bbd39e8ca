//! Shared tracing/logging setup for the workspace.

pub mod tracing;

/// Initialize process-wide observability with JSON output.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::Json);
}
