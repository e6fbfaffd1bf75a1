//! The public operation surface.
//!
//! [`Automation`] is the only type external callers talk to. Every public
//! operation runs the same pipeline: capability gate against the detected
//! browser build, identifier resolution through the registry, delegation to
//! the component that does the work, and translation of collaborator faults
//! into the caller-facing error taxonomy. Gate and resolution failures are
//! reported before any native side effect.
//!
//! Operations are grouped by concern:
//!
//! | Module | Operations |
//! |--------|------------|
//! | [`views`] | enumeration, bounds, title, close, maximize |
//! | [`navigation`] | navigate sync/async, history, load waits |
//! | [`script`] | script evaluation, frame tagging |
//! | [`input`] | key/mouse synthesis, file drag-and-drop |
//! | [`elements`] | native element find/inspect |
//! | [`cookies`] | cookie pass-through |
//! | [`dialogs`] | modal dialogs, geolocation |
//! | [`capture`] | full-page PNG capture |

// ============================================================================
// Submodules
// ============================================================================

pub mod capture;
pub mod cookies;
pub mod dialogs;
pub mod elements;
pub mod input;
pub mod navigation;
pub mod script;
pub mod views;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::frames::{FramePath, resolve_frame};
use crate::identifiers::{ElementId, ViewId};
use crate::input::KeyMap;
use crate::registry::ViewRegistry;
use crate::session::{BrowserOptions, BrowserSession};
use crate::toolkit::{FrameRef, Toolkit, ToolkitError, WidgetRef, WindowRef};

// ============================================================================
// Capability Gates
// ============================================================================

/// Minimum build for synthesized web key/mouse events and drag-and-drop.
pub const ADVANCED_INTERACTIONS_MIN_BUILD: u32 = 750;

/// Minimum build for modal dialog handling.
pub const ALERTS_MIN_BUILD: u32 = 768;

/// Minimum build for view bounds and title queries on non-tab views.
pub const VIEW_DETAILS_MIN_BUILD: u32 = 947;

/// Minimum build for geolocation overrides.
pub const GEOLOCATION_MIN_BUILD: u32 = 1119;

/// Minimum build for window maximize.
pub const MAXIMIZE_MIN_BUILD: u32 = 1160;

// ============================================================================
// Timeouts
// ============================================================================

/// Upper bounds on the cooperative waits operations perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on native event dispatch settling.
    pub dispatch: Duration,
    /// Bound on page loads and load waits.
    pub load: Duration,
    /// Bound on script evaluation.
    pub script: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            dispatch: Duration::from_secs(10),
            load: Duration::from_secs(30),
            script: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// Automation
// ============================================================================

/// Shared state behind an [`Automation`] handle.
struct AutomationInner {
    toolkit: Arc<dyn Toolkit>,
    registry: ViewRegistry,
    key_map: KeyMap,
    /// Build number parsed from the version string; 0 when undetectable,
    /// which passes every gate.
    build_no: u32,
    timeouts: Timeouts,
    session: Mutex<Option<BrowserSession>>,
}

/// Automation facade over one embedding application.
///
/// Cheap to clone; clones share the session, registry, and key map.
#[derive(Clone)]
pub struct Automation {
    inner: Arc<AutomationInner>,
}

impl Automation {
    /// Establishes a session and returns the facade plus the initial view.
    ///
    /// Launches or attaches per `options`, registers every window the
    /// toolkit already reports, and creates one when there is none and
    /// `options.start_window` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for inconsistent options or when
    /// no view can be obtained, and [`Error::Io`] if the process fails to
    /// launch.
    pub async fn init(toolkit: Arc<dyn Toolkit>, options: BrowserOptions) -> Result<(Self, ViewId)> {
        Self::init_with_timeouts(toolkit, options, Timeouts::default()).await
    }

    /// [`init`](Self::init) with explicit wait bounds.
    ///
    /// # Errors
    ///
    /// See [`init`](Self::init).
    pub async fn init_with_timeouts(
        toolkit: Arc<dyn Toolkit>,
        options: BrowserOptions,
        timeouts: Timeouts,
    ) -> Result<(Self, ViewId)> {
        let session = BrowserSession::start(&options)?;
        let version = toolkit.browser_version();
        let build_no = parse_build_number(&version);
        info!(session_id = %session.id(), version, build_no, "Automation session starting");

        let automation = Self {
            inner: Arc::new(AutomationInner {
                toolkit,
                registry: ViewRegistry::new(),
                key_map: KeyMap::new(),
                build_no,
                timeouts,
                session: Mutex::new(Some(session)),
            }),
        };

        automation.pump_events();
        let mut initial = None;
        for window in automation.inner.toolkit.windows() {
            let view_id = automation.inner.registry.register_view(&window);
            initial.get_or_insert(view_id);
        }

        if initial.is_none() && options.start_window {
            let window = automation
                .inner
                .toolkit
                .create_window(options.view_class.as_deref())
                .await
                .map_err(Error::from)?;
            initial = Some(automation.inner.registry.register_view(&window));
        }

        let view_id = initial.ok_or_else(|| {
            Error::invalid_argument("toolkit reports no views and start_window is disabled")
        })?;
        debug!(%view_id, "Initial view registered");
        Ok((automation, view_id))
    }

    /// Tears the session down: drops all identifiers and, unless the
    /// options requested detaching, kills the owned browser process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if process teardown fails.
    pub async fn terminate(&self) -> Result<()> {
        self.inner.registry.clear();
        let session = self.inner.session.lock().take();
        if let Some(session) = session {
            session.terminate().await?;
        }
        Ok(())
    }

    /// Version string reported by the embedded browser.
    #[must_use]
    pub fn browser_version(&self) -> String {
        self.inner.toolkit.browser_version()
    }

    /// Build number parsed from the version string; 0 when undetectable.
    #[inline]
    #[must_use]
    pub fn build_number(&self) -> u32 {
        self.inner.build_no
    }

    /// Configured wait bounds.
    #[inline]
    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        self.inner.timeouts
    }
}

// ============================================================================
// Automation - Internal Plumbing
// ============================================================================

impl Automation {
    /// Drains toolkit lifecycle events into the registry.
    ///
    /// Called at operation entry and inside waits, so staleness is observed
    /// on the caller's task before any resolution.
    pub(crate) fn pump_events(&self) {
        for event in self.inner.toolkit.take_events() {
            self.inner.registry.handle_event(&event);
        }
    }

    /// Fails fast when the detected build is below `min`.
    ///
    /// An unknown build (0) passes every gate.
    pub(crate) fn check_build(&self, min: u32, operation: &str) -> Result<()> {
        let build = self.inner.build_no;
        if build != 0 && build < min {
            return Err(Error::unsupported(format!(
                "{operation} requires build {min}, detected {build}"
            )));
        }
        Ok(())
    }

    /// Resolves a view to its live window, pumping events first.
    pub(crate) fn window(&self, view_id: ViewId) -> Result<WindowRef> {
        self.pump_events();
        self.inner.registry.resolve_view(view_id)
    }

    /// Resolves an element to its live widget, pumping events first.
    pub(crate) fn element(&self, view_id: ViewId, element_id: &ElementId) -> Result<WidgetRef> {
        self.pump_events();
        self.inner.registry.resolve_element(view_id, element_id)
    }

    /// Resolves a frame path within a view.
    pub(crate) fn frame(&self, view_id: ViewId, path: &FramePath) -> Result<FrameRef> {
        let window = self.window(view_id)?;
        resolve_frame(&window.main_frame(), path)
    }

    pub(crate) fn registry(&self) -> &ViewRegistry {
        &self.inner.registry
    }

    pub(crate) fn toolkit(&self) -> &Arc<dyn Toolkit> {
        &self.inner.toolkit
    }

    pub(crate) fn key_map(&self) -> &KeyMap {
        &self.inner.key_map
    }

    /// Maps a collaborator fault in a view-scoped operation.
    pub(crate) fn view_fault(error: ToolkitError, view_id: ViewId) -> Error {
        match error {
            ToolkitError::TargetGone => Error::no_such_window(view_id),
            ToolkitError::ScriptRejected(message) => Error::script_error(message),
            ToolkitError::Unsupported(message) => Error::unsupported(message),
            other => Error::from(other),
        }
    }

    /// Maps a collaborator fault in an element-scoped operation.
    ///
    /// Target loss between resolution and dispatch reads as staleness, not
    /// a generic fault.
    pub(crate) fn element_fault(error: ToolkitError, element_id: ElementId) -> Error {
        match error {
            ToolkitError::TargetGone => Error::stale_element(element_id),
            other => Self::view_fault(other, ViewId::new(0)),
        }
    }
}

// ============================================================================
// Version Parsing
// ============================================================================

/// Extracts the build number from a browser version string.
///
/// Accepts `build 1200`, `build-1200`, `Build_1200`; returns 0 when the
/// string carries no recognizable build number.
#[must_use]
pub fn parse_build_number(version: &str) -> u32 {
    // Compiled once per session at init.
    match Regex::new(r"(?i)build[\s_-]*(\d+)") {
        Ok(re) => re
            .captures(version)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0),
        Err(_) => 0,
    }
}

// ============================================================================
// Tests
// ============================================================================
