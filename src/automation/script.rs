//! Script evaluation and frame tagging.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::frames::FramePath;
use crate::identifiers::ViewId;
use crate::notifier::ScriptNotifier;

use super::Automation;

// ============================================================================
// Automation - Script Operations
// ============================================================================

impl Automation {
    /// Evaluates script in a frame and returns its JSON result.
    ///
    /// Synchronous scripts are wrapped in an anonymous function whose value
    /// completes the evaluation; asynchronous scripts complete through the
    /// callback the engine hands them, and are passed through unwrapped.
    /// The wait is bounded by the script timeout; a completion arriving
    /// after the bound is dropped harmlessly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchFrame`](crate::Error::NoSuchFrame) for an
    /// unresolvable path,
    /// [`Error::UnexpectedScriptError`](crate::Error::UnexpectedScriptError)
    /// when the engine rejects the script, and
    /// [`Error::Timeout`](crate::Error::Timeout) past the bound.
    pub async fn execute_script(
        &self,
        view_id: ViewId,
        frame_path: &FramePath,
        script: &str,
        is_async: bool,
    ) -> Result<Value> {
        let frame = self.frame(view_id, frame_path)?;
        let source = if is_async {
            script.to_string()
        } else {
            format!("(function() {{ {script} }})()")
        };
        debug!(%view_id, frame = %frame_path, is_async, "Evaluating script");

        let notifier = ScriptNotifier::new();
        frame
            .evaluate_script(&source, notifier.clone())
            .map_err(|e| Self::view_fault(e, view_id))?;
        notifier.wait(self.timeouts().script).await
    }

    /// Injects a marker into the frame at `frame_path`, making it
    /// resolvable by that marker after its sibling position shifts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchFrame`](crate::Error::NoSuchFrame) for an
    /// unresolvable path.
    pub fn add_id_to_current_frame(
        &self,
        view_id: ViewId,
        frame_path: &FramePath,
        frame_id: &str,
    ) -> Result<()> {
        let frame = self.frame(view_id, frame_path)?;
        debug!(%view_id, frame = %frame_path, frame_id, "Tagging frame");
        frame.set_marker(frame_id);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
