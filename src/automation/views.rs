//! View enumeration and window management operations.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::Result;
use crate::geometry::Rect;
use crate::identifiers::ViewId;

use super::{Automation, MAXIMIZE_MIN_BUILD, VIEW_DETAILS_MIN_BUILD};

// ============================================================================
// Automation - View Operations
// ============================================================================

impl Automation {
    /// Lists every open view, registering windows the toolkit opened since
    /// the last call.
    #[must_use]
    pub fn get_views(&self) -> Vec<ViewId> {
        self.pump_events();
        for window in self.toolkit().windows() {
            self.registry().register_view(&window);
        }
        self.registry().view_ids()
    }

    /// Returns `true` if the view is registered and its window is alive.
    #[must_use]
    pub fn does_view_exist(&self, view_id: ViewId) -> bool {
        self.window(view_id).is_ok()
    }

    /// Closes a view's window.
    ///
    /// The registry entry is dropped when the toolkit's close notification
    /// is drained, at the latest on the next operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchWindow`](crate::Error::NoSuchWindow) for an
    /// unknown or dead view.
    pub fn close_view(&self, view_id: ViewId) -> Result<()> {
        let window = self.window(view_id)?;
        debug!(%view_id, "Closing view");
        window.close();
        self.pump_events();
        Ok(())
    }

    /// Window bounds in screen coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation)
    /// below the required build and
    /// [`Error::NoSuchWindow`](crate::Error::NoSuchWindow) for an unknown view.
    pub fn get_view_bounds(&self, view_id: ViewId) -> Result<Rect> {
        self.check_build(VIEW_DETAILS_MIN_BUILD, "get_view_bounds")?;
        Ok(self.window(view_id)?.bounds())
    }

    /// Moves/resizes a window. Position is in screen coordinates.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`get_view_bounds`](Self::get_view_bounds).
    pub fn set_view_bounds(&self, view_id: ViewId, bounds: Rect) -> Result<()> {
        self.check_build(VIEW_DETAILS_MIN_BUILD, "set_view_bounds")?;
        let window = self.window(view_id)?;
        window
            .set_bounds(bounds)
            .map_err(|e| Self::view_fault(e, view_id))
    }

    /// Maximizes a window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation)
    /// below the required build.
    pub fn maximize_view(&self, view_id: ViewId) -> Result<()> {
        self.check_build(MAXIMIZE_MIN_BUILD, "maximize_view")?;
        let window = self.window(view_id)?;
        window.maximize().map_err(|e| Self::view_fault(e, view_id))
    }

    /// Window title.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`get_view_bounds`](Self::get_view_bounds).
    pub fn get_view_title(&self, view_id: ViewId) -> Result<String> {
        self.check_build(VIEW_DETAILS_MIN_BUILD, "get_view_title")?;
        Ok(self.window(view_id)?.title())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::automation::tests::boot;
    use crate::error::Error;
    use crate::geometry::Rect;
    use crate::identifiers::ViewId;

    #[tokio::test]
    async fn test_get_views_picks_up_new_windows() {
        let (toolkit, automation, view_id, _window) = boot().await;
        assert_eq!(automation.get_views(), vec![view_id]);

        toolkit.add_window("popup");
        let views = automation.get_views();
        assert_eq!(views.len(), 2);
        assert!(views.contains(&view_id));
    }

    #[tokio::test]
    async fn test_close_view_invalidates_identifier() {
        let (_toolkit, automation, view_id, _window) = boot().await;
        assert!(automation.does_view_exist(view_id));

        automation.close_view(view_id).unwrap();

        assert!(!automation.does_view_exist(view_id));
        assert!(matches!(
            automation.close_view(view_id).unwrap_err(),
            Error::NoSuchWindow { .. }
        ));
    }

    #[tokio::test]
    async fn test_bounds_roundtrip() {
        let (_toolkit, automation, view_id, _window) = boot().await;
        let bounds = Rect::new(40, 50, 1024, 768);
        automation.set_view_bounds(view_id, bounds).unwrap();
        assert_eq!(automation.get_view_bounds(view_id).unwrap(), bounds);
    }

    #[tokio::test]
    async fn test_title() {
        let (_toolkit, automation, view_id, _window) = boot().await;
        assert_eq!(automation.get_view_title(view_id).unwrap(), "main");
    }

    #[tokio::test]
    async fn test_maximize() {
        let (_toolkit, automation, view_id, window) = boot().await;
        automation.maximize_view(view_id).unwrap();
        assert!(window.is_maximized());
    }

    #[tokio::test]
    async fn test_unknown_view_is_no_such_window() {
        let (_toolkit, automation, _view, _window) = boot().await;
        let err = automation.get_view_bounds(ViewId::new(4096)).unwrap_err();
        assert!(matches!(err, Error::NoSuchWindow { .. }));
    }
}
