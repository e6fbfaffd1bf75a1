//! Modal dialog and geolocation operations.
//!
//! Both groups are capability gated: alert handling landed in build 768
//! of the embedded browser and geolocation overrides in build 1119.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::ViewId;

use super::{ALERTS_MIN_BUILD, Automation, GEOLOCATION_MIN_BUILD};

// ============================================================================
// Automation - Modal Dialogs
// ============================================================================

impl Automation {
    /// Message of the view's active modal dialog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no dialog is open and
    /// [`Error::UnsupportedOperation`] below the required build.
    pub fn get_app_modal_dialog_message(&self, view_id: ViewId) -> Result<String> {
        self.check_build(ALERTS_MIN_BUILD, "get_app_modal_dialog_message")?;
        let window = self.window(view_id)?;
        window
            .dialog_message()
            .ok_or_else(|| Error::invalid_argument("no modal dialog is open"))
    }

    /// Accepts (`true`) or dismisses (`false`) the active modal dialog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no dialog is open and
    /// [`Error::UnsupportedOperation`] below the required build.
    pub fn accept_or_dismiss_app_modal_dialog(&self, view_id: ViewId, accept: bool) -> Result<()> {
        self.check_build(ALERTS_MIN_BUILD, "accept_or_dismiss_app_modal_dialog")?;
        let window = self.window(view_id)?;
        debug!(%view_id, accept, "Closing modal dialog");
        if window.close_dialog(accept) {
            Ok(())
        } else {
            Err(Error::invalid_argument("no modal dialog is open"))
        }
    }

    /// Types `text` into the active prompt dialog and accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no prompt is open and
    /// [`Error::UnsupportedOperation`] below the required build.
    pub fn accept_prompt_app_modal_dialog(&self, view_id: ViewId, text: &str) -> Result<()> {
        self.check_build(ALERTS_MIN_BUILD, "accept_prompt_app_modal_dialog")?;
        let window = self.window(view_id)?;
        if !window.set_prompt_text(text) {
            return Err(Error::invalid_argument("no prompt dialog is open"));
        }
        debug!(%view_id, "Accepting prompt dialog");
        // The prompt is known to be open, so the close cannot miss.
        window.close_dialog(true);
        Ok(())
    }
}

// ============================================================================
// Automation - Geolocation
// ============================================================================

impl Automation {
    /// The geolocation currently reported to pages in the view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no override is active and
    /// [`Error::UnsupportedOperation`] below the required build.
    pub fn get_geolocation(&self, view_id: ViewId) -> Result<Value> {
        self.check_build(GEOLOCATION_MIN_BUILD, "get_geolocation")?;
        let window = self.window(view_id)?;
        window
            .geolocation()
            .ok_or_else(|| Error::invalid_argument("no geolocation override is active"))
    }

    /// Overrides the geolocation reported to pages in the view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] below the required build.
    pub fn override_geolocation(&self, view_id: ViewId, location: Value) -> Result<()> {
        self.check_build(GEOLOCATION_MIN_BUILD, "override_geolocation")?;
        let window = self.window(view_id)?;
        debug!(%view_id, "Overriding geolocation");
        window
            .set_geolocation(location)
            .map_err(|e| Self::view_fault(e, view_id))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::automation::Automation;
    use crate::automation::tests::boot;
    use crate::error::Error;
    use crate::session::BrowserOptions;
    use crate::toolkit::mock::MockToolkit;

    #[tokio::test]
    async fn test_alert_message_and_dismiss() {
        let (_toolkit, automation, view_id, window) = boot().await;
        window.open_alert("Are you sure?");

        assert_eq!(
            automation.get_app_modal_dialog_message(view_id).unwrap(),
            "Are you sure?"
        );
        automation
            .accept_or_dismiss_app_modal_dialog(view_id, false)
            .unwrap();
        assert_eq!(window.dialog_choice(), Some(false));
    }

    #[tokio::test]
    async fn test_no_dialog_is_invalid_argument() {
        let (_toolkit, automation, view_id, _window) = boot().await;

        let err = automation
            .get_app_modal_dialog_message(view_id)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let err = automation
            .accept_or_dismiss_app_modal_dialog(view_id, true)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_prompt_text_then_accept() {
        let (_toolkit, automation, view_id, window) = boot().await;
        window.open_prompt("Name?");

        automation
            .accept_prompt_app_modal_dialog(view_id, "alice")
            .unwrap();
        assert_eq!(window.submitted_prompt().as_deref(), Some("alice"));
        assert_eq!(window.dialog_choice(), Some(true));
    }

    #[tokio::test]
    async fn test_prompt_accept_rejects_plain_alert() {
        let (_toolkit, automation, view_id, window) = boot().await;
        window.open_alert("just an alert");

        let err = automation
            .accept_prompt_app_modal_dialog(view_id, "text")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_geolocation_roundtrip() {
        let (_toolkit, automation, view_id, _window) = boot().await;

        let err = automation.get_geolocation(view_id).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let location = json!({"latitude": 52.52, "longitude": 13.405, "altitude": 34.0});
        automation
            .override_geolocation(view_id, location.clone())
            .unwrap();
        assert_eq!(automation.get_geolocation(view_id).unwrap(), location);
    }

    #[tokio::test]
    async fn test_builds_gate_dialogs_and_geolocation() {
        let toolkit = MockToolkit::with_version("shell (build 900)");
        let window = toolkit.add_window("main");
        let (automation, view_id) = Automation::init(Arc::new(toolkit), BrowserOptions::new())
            .await
            .unwrap();

        // Build 900 supports alerts but not geolocation.
        window.open_alert("hi");
        assert_eq!(
            automation.get_app_modal_dialog_message(view_id).unwrap(),
            "hi"
        );
        let err = automation
            .override_geolocation(view_id, json!({"latitude": 0.0}))
            .unwrap_err();
        assert!(err.is_unsupported());
    }
}
