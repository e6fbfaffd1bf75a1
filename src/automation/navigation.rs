//! Navigation and load-wait operations.
//!
//! Synchronous navigation awaits the toolkit's load-finished signal under
//! the configured load bound; a timed-out wait drops the pending future and
//! the toolkit finishing afterwards is ignored harmlessly.

// ============================================================================
// Imports
// ============================================================================

use futures_util::future::join_all;
use tokio::time;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ViewId;
use crate::toolkit::WindowRef;

use super::Automation;

// ============================================================================
// Automation - Navigation Operations
// ============================================================================

impl Automation {
    /// Navigates a view and waits for loading to finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unparseable URL,
    /// [`Error::Timeout`] when the load bound elapses, and
    /// [`Error::NoSuchWindow`] for an unknown view.
    pub async fn navigate_to_url(&self, view_id: ViewId, url: &str) -> Result<()> {
        let url = parse_url(url)?;
        let window = self.window(view_id)?;
        debug!(%view_id, %url, "Navigating");

        let load = self.timeouts().load;
        match time::timeout(load, window.load_url(url.as_str())).await {
            Ok(result) => result.map_err(|e| Self::view_fault(e, view_id)),
            Err(_) => Err(Error::timeout("navigate_to_url", load.as_millis() as u64)),
        }
    }

    /// Starts a navigation without waiting for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unparseable URL and
    /// [`Error::NoSuchWindow`] for an unknown view.
    pub fn navigate_to_url_async(&self, view_id: ViewId, url: &str) -> Result<()> {
        let url = parse_url(url)?;
        let window = self.window(view_id)?;
        debug!(%view_id, %url, "Navigating without load wait");
        window
            .load_url_async(url.as_str())
            .map_err(|e| Self::view_fault(e, view_id))
    }

    /// Navigates one step back in a view's history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the load bound elapses.
    pub async fn go_back(&self, view_id: ViewId) -> Result<()> {
        let window = self.window(view_id)?;
        let load = self.timeouts().load;
        match time::timeout(load, window.go_back()).await {
            Ok(result) => result.map_err(|e| Self::view_fault(e, view_id)),
            Err(_) => Err(Error::timeout("go_back", load.as_millis() as u64)),
        }
    }

    /// Navigates one step forward in a view's history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the load bound elapses.
    pub async fn go_forward(&self, view_id: ViewId) -> Result<()> {
        let window = self.window(view_id)?;
        let load = self.timeouts().load;
        match time::timeout(load, window.go_forward()).await {
            Ok(result) => result.map_err(|e| Self::view_fault(e, view_id)),
            Err(_) => Err(Error::timeout("go_forward", load.as_millis() as u64)),
        }
    }

    /// Reloads a view's current document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the load bound elapses.
    pub async fn reload(&self, view_id: ViewId) -> Result<()> {
        let window = self.window(view_id)?;
        let load = self.timeouts().load;
        match time::timeout(load, window.reload()).await {
            Ok(result) => result.map_err(|e| Self::view_fault(e, view_id)),
            Err(_) => Err(Error::timeout("reload", load.as_millis() as u64)),
        }
    }

    /// Waits until no registered view reports loading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the load bound elapses with a view
    /// still loading.
    pub async fn wait_for_all_views_to_stop_loading(&self) -> Result<()> {
        self.pump_events();
        let windows: Vec<WindowRef> = self
            .registry()
            .view_ids()
            .into_iter()
            .filter_map(|id| self.registry().resolve_view(id).ok())
            .collect();

        let load = self.timeouts().load;
        let waits = windows.iter().map(|window| self.wait_until_settled(window));
        if time::timeout(load, join_all(waits)).await.is_err() {
            return Err(Error::timeout(
                "wait_for_all_views_to_stop_loading",
                load.as_millis() as u64,
            ));
        }
        Ok(())
    }

    /// Waits for one window to stop loading, draining events as they come.
    async fn wait_until_settled(&self, window: &WindowRef) {
        loop {
            self.pump_events();
            if !window.is_loading() {
                return;
            }
            self.toolkit().event_arrived().await;
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::invalid_argument(format!("invalid URL {url:?}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
