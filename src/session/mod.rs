//! Session establishment: options, process launch/attach, teardown.

// ============================================================================
// Submodules
// ============================================================================

/// Process launch, attach, and teardown.
pub mod launcher;
/// Browser options builder.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use launcher::{BrowserSession, ProcessGuard};
pub use options::BrowserOptions;
