//! Diagnostics sink handed to every repository operation
//!
//! The library never logs through ambient state on its own: callers pass a
//! sink into `Repository::open` (or directly into the allocator and status
//! editor). The binary uses [`TracingSink`], which forwards to `tracing`.

use std::sync::Arc;

/// Receives progress and recovery messages from the core.
pub trait DiagnosticSink: Send + Sync {
    /// Detailed progress, only interesting with `--verbose`.
    fn debug(&self, message: &str);

    /// Something was skipped or degraded, but the operation continues.
    fn warn(&self, message: &str);
}

/// Shared handle to a sink.
pub type Diagnostics = Arc<dyn DiagnosticSink>;

/// Forwards diagnostics to the `tracing` subscriber installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "adrman", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "adrman", "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn debug(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}
}

/// The sink the binary uses.
pub fn tracing_sink() -> Diagnostics {
    Arc::new(TracingSink)
}

/// A sink that drops all messages.
pub fn null_sink() -> Diagnostics {
    Arc::new(NullSink)
}

/// Keeps every message so tests can assert on them.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub(crate) debugs: std::sync::Mutex<Vec<String>>,
    pub(crate) warnings: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl DiagnosticSink for RecordingSink {
    fn debug(&self, message: &str) {
        if let Ok(mut debugs) = self.debugs.lock() {
            debugs.push(message.to_string());
        }
    }

    fn warn(&self, message: &str) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message.to_string());
        }
    }
}
