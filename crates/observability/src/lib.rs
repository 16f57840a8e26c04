//! Process-wide logging setup shared by the EventDesk binaries.

/// Initialize tracing/logging for the process with the default filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, layers).
pub mod tracing;
