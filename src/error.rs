//! Error types for the automation bridge.
//!
//! Every fallible operation returns [`Result<T>`] carrying a richly-typed
//! [`enum@Error`] rather than a bare status code. Identifier-resolution and
//! capability-gate failures are reported before any native side effect is
//! attempted.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Resolution | [`Error::NoSuchWindow`], [`Error::NoSuchFrame`], [`Error::StaleElementReference`], [`Error::ElementNotFound`] |
//! | Gating | [`Error::UnsupportedOperation`] |
//! | Execution | [`Error::Timeout`], [`Error::UnexpectedScriptError`] |
//! | Input | [`Error::InvalidArgument`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Toolkit`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::{ElementId, ViewId};
use crate::toolkit::ToolkitError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The referenced view does not exist or has been closed.
    #[error("No such window: {view_id}")]
    NoSuchWindow {
        /// The unresolvable view ID.
        view_id: ViewId,
    },

    /// A frame path segment could not be resolved.
    #[error("No such frame: failed at segment '{segment}'")]
    NoSuchFrame {
        /// The path segment that failed to resolve.
        segment: String,
    },

    /// The element's backing native object has been destroyed, or its
    /// owning view has closed since the ID was minted.
    #[error("Stale element reference: {element_id}")]
    StaleElementReference {
        /// The stale element's ID.
        element_id: ElementId,
    },

    /// A locate operation matched no element.
    #[error("Element not found: locator={locator}, query={query}")]
    ElementNotFound {
        /// Locator strategy used.
        locator: String,
        /// Query string evaluated.
        query: String,
    },

    // ========================================================================
    // Gating Errors
    // ========================================================================
    /// The detected browser build does not support the operation.
    ///
    /// Gate failures are side-effect-free: the operation is not attempted.
    #[error("Unsupported operation: {message}")]
    UnsupportedOperation {
        /// Description of the unmet capability requirement.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// A bounded wait elapsed.
    ///
    /// The underlying native effect may still arrive later and is ignored.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    /// Script evaluation failed inside the rendering engine.
    #[error("Unexpected script error: {message}")]
    UnexpectedScriptError {
        /// Error message reported by the engine.
        message: String,
    },

    /// A caller-supplied argument was rejected.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Fault reported by the host toolkit.
    #[error("Toolkit error: {0}")]
    Toolkit(#[from] ToolkitError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a no-such-window error.
    #[inline]
    pub fn no_such_window(view_id: ViewId) -> Self {
        Self::NoSuchWindow { view_id }
    }

    /// Creates a no-such-frame error naming the failing segment.
    #[inline]
    pub fn no_such_frame(segment: impl Into<String>) -> Self {
        Self::NoSuchFrame {
            segment: segment.into(),
        }
    }

    /// Creates a stale element reference error.
    #[inline]
    pub fn stale_element(element_id: ElementId) -> Self {
        Self::StaleElementReference { element_id }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(locator: impl Into<String>, query: impl Into<String>) -> Self {
        Self::ElementNotFound {
            locator: locator.into(),
            query: query.into(),
        }
    }

    /// Creates an unsupported operation error.
    #[inline]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::UnexpectedScriptError {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is an identifier-resolution failure.
    #[inline]
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::NoSuchWindow { .. }
                | Self::NoSuchFrame { .. }
                | Self::StaleElementReference { .. }
                | Self::ElementNotFound { .. }
        )
    }

    /// Returns `true` if this is a capability-gate failure.
    #[inline]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// Returns `true` if this error may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::StaleElementReference { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_no_such_window_display() {
        let err = Error::no_such_window(ViewId::new(3));
        assert_eq!(err.to_string(), "No such window: view-3");
    }

    #[test]
    fn test_no_such_frame_names_segment() {
        let err = Error::no_such_frame("frame-b");
        assert!(err.to_string().contains("frame-b"));
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("key dispatch", 5000);
        let other_err = Error::invalid_argument("bad url");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_resolution_error() {
        assert!(Error::no_such_window(ViewId::new(1)).is_resolution_error());
        assert!(Error::stale_element(ElementId::mint()).is_resolution_error());
        assert!(Error::element_not_found("text", "Submit").is_resolution_error());
        assert!(!Error::unsupported("maximize").is_resolution_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::timeout("load", 1000).is_recoverable());
        assert!(Error::stale_element(ElementId::mint()).is_recoverable());
        assert!(!Error::invalid_argument("x").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
