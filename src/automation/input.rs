//! Input synthesis operations.
//!
//! Semantic events are translated through the session's [`KeyMap`] and
//! dispatched via the window's native entry points. Each dispatch is
//! awaited under the dispatch bound; a timed-out dispatch reports
//! [`Error::Timeout`](crate::Error::Timeout) and the toolkit finishing
//! afterwards is ignored.
//!
//! [`KeyMap`]: crate::input::KeyMap

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use tokio::time;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::identifiers::{ElementId, ViewId};
use crate::input::{KeyCode, KeyEvent, Modifiers, MouseEvent, NativeKeyEvent};
use crate::toolkit::WindowRef;

use super::{ADVANCED_INTERACTIONS_MIN_BUILD, Automation};

// ============================================================================
// Automation - Input Operations
// ============================================================================

impl Automation {
    /// Synthesizes a key event into a view's web content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation)
    /// below the required build and [`Error::Timeout`](crate::Error::Timeout)
    /// when processing does not settle within the bound.
    pub async fn send_web_key_event(&self, view_id: ViewId, event: KeyEvent) -> Result<()> {
        self.check_build(ADVANCED_INTERACTIONS_MIN_BUILD, "send_web_key_event")?;
        let window = self.window(view_id)?;
        let native = self.key_map().to_native_event(&event);
        debug!(%view_id, ?event, "Dispatching web key event");
        self.dispatch_key(&window, view_id, None, native).await
    }

    /// Synthesizes a full key press (down then up) through the native
    /// event pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`](crate::Error::Timeout) when processing
    /// does not settle within the bound.
    pub async fn send_native_key_event(
        &self,
        view_id: ViewId,
        code: KeyCode,
        modifiers: Modifiers,
    ) -> Result<()> {
        let window = self.window(view_id)?;
        debug!(%view_id, ?code, "Dispatching native key press");
        let down = self.key_map().to_native_event(&KeyEvent::down(code, modifiers));
        let up = self.key_map().to_native_event(&KeyEvent::up(code, modifiers));
        self.dispatch_key(&window, view_id, None, down).await?;
        self.dispatch_key(&window, view_id, None, up).await
    }

    /// Synthesizes a key event targeted at one element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`](crate::Error::StaleElementReference)
    /// when the element dies before or during dispatch.
    pub async fn send_native_element_web_key_event(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
        event: KeyEvent,
    ) -> Result<()> {
        self.check_build(
            ADVANCED_INTERACTIONS_MIN_BUILD,
            "send_native_element_web_key_event",
        )?;
        let window = self.window(view_id)?;
        let widget = self.element(view_id, element_id)?;
        let native = self.key_map().to_native_event(&event);
        debug!(%view_id, %element_id, ?event, "Dispatching element key event");

        let dispatch = self.timeouts().dispatch;
        match time::timeout(dispatch, window.dispatch_key(Some(widget), native)).await {
            Ok(result) => result.map_err(|e| Self::element_fault(e, *element_id)),
            Err(_) => Err(Error::timeout(
                "send_native_element_web_key_event",
                dispatch.as_millis() as u64,
            )),
        }
    }

    /// Synthesizes a mouse event into a view's web content.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`send_web_key_event`](Self::send_web_key_event).
    pub async fn send_web_mouse_event(&self, view_id: ViewId, event: MouseEvent) -> Result<()> {
        self.check_build(ADVANCED_INTERACTIONS_MIN_BUILD, "send_web_mouse_event")?;
        let window = self.window(view_id)?;
        let native = self.key_map().to_native_mouse(&event);
        debug!(%view_id, ?event, "Dispatching web mouse event");

        let dispatch = self.timeouts().dispatch;
        match time::timeout(dispatch, window.dispatch_mouse(native)).await {
            Ok(result) => result.map_err(|e| Self::view_fault(e, view_id)),
            Err(_) => Err(Error::timeout(
                "send_web_mouse_event",
                dispatch.as_millis() as u64,
            )),
        }
    }

    /// Drops file paths onto a view at a view-relative location.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`send_web_key_event`](Self::send_web_key_event).
    pub async fn drag_and_drop_file_paths(
        &self,
        view_id: ViewId,
        location: Point,
        paths: Vec<PathBuf>,
    ) -> Result<()> {
        self.check_build(ADVANCED_INTERACTIONS_MIN_BUILD, "drag_and_drop_file_paths")?;
        let window = self.window(view_id)?;
        debug!(%view_id, count = paths.len(), "Dispatching file drop");

        let dispatch = self.timeouts().dispatch;
        match time::timeout(dispatch, window.dispatch_file_drop(location, paths)).await {
            Ok(result) => result.map_err(|e| Self::view_fault(e, view_id)),
            Err(_) => Err(Error::timeout(
                "drag_and_drop_file_paths",
                dispatch.as_millis() as u64,
            )),
        }
    }

    async fn dispatch_key(
        &self,
        window: &WindowRef,
        view_id: ViewId,
        target: Option<crate::toolkit::WidgetRef>,
        event: NativeKeyEvent,
    ) -> Result<()> {
        let dispatch = self.timeouts().dispatch;
        match time::timeout(dispatch, window.dispatch_key(target, event)).await {
            Ok(result) => result.map_err(|e| Self::view_fault(e, view_id)),
            Err(_) => Err(Error::timeout("key dispatch", dispatch.as_millis() as u64)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
