//! Collaborator seams for the host GUI toolkit.
//!
//! The bridge never owns GUI objects. Everything the host application
//! provides (window enumeration, widget trees, document frames, native
//! event dispatch, script execution) is consumed through the traits in
//! this module, and the bridge holds only [`Weak`](std::sync::Weak)
//! references behind them.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`Toolkit`] | window enumeration/creation, lifecycle event source, version string |
//! | [`WindowHandle`] | one top-level view: navigation, dispatch, capture, dialogs |
//! | [`WidgetNode`] | locatable tree node: attribute accessors for serialization |
//! | [`WebFrame`] | one document context: child frames, markers, script entry |
//!
//! Lifecycle events ([`ToolkitEvent`]) are queued by the toolkit and drained
//! by the dispatcher on its own task, so registry mutation always happens on
//! the designated execution context.

// ============================================================================
// Submodules
// ============================================================================

/// In-memory toolkit implementation used by the test suite.
pub mod mock;

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::geometry::{Point, Rect, Size};
use crate::input::{NativeKeyEvent, NativeMouseEvent};
use crate::notifier::ScriptNotifier;

// ============================================================================
// Reference Aliases
// ============================================================================

/// Shared reference to a live widget.
pub type WidgetRef = Arc<dyn WidgetNode>;

/// Shared reference to a live document frame.
pub type FrameRef = Arc<dyn WebFrame>;

/// Shared reference to a live top-level window.
pub type WindowRef = Arc<dyn WindowHandle>;

// ============================================================================
// ToolkitError
// ============================================================================

/// Fault reported by a toolkit collaborator.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// The event target was destroyed between resolution and dispatch.
    #[error("event target is no longer alive")]
    TargetGone,

    /// A navigation request was rejected or failed to start.
    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    /// The rendering engine rejected a script before evaluating it.
    #[error("script rejected: {0}")]
    ScriptRejected(String),

    /// The toolkit cannot perform the requested operation.
    #[error("not supported by this toolkit: {0}")]
    Unsupported(String),
}

/// Result alias for toolkit collaborator calls.
pub type ToolkitResult<T> = std::result::Result<T, ToolkitError>;

// ============================================================================
// ToolkitEvent
// ============================================================================

/// Lifecycle notification queued by the toolkit.
///
/// Objects are identified by their toolkit-stable node ID; the registry
/// maps those back to opaque handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolkitEvent {
    /// A top-level window was closed or destroyed.
    WindowClosed(u64),
    /// A widget was destroyed.
    WidgetDestroyed(u64),
    /// A view began loading a document.
    LoadStarted(u64),
    /// A view finished loading a document.
    LoadFinished(u64),
}

// ============================================================================
// Cookie
// ============================================================================

/// Browser cookie, passed through to the toolkit's cookie store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// HTTP-only flag.
    #[serde(default)]
    pub http_only: bool,
    /// Expiry as a Unix timestamp, when not a session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl Cookie {
    /// Creates a session cookie with just a name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            expiry: None,
        }
    }
}

// ============================================================================
// WidgetNode
// ============================================================================

/// Locatable tree node: the capability surface every native widget kind
/// exposes for serialization and locator filtering.
///
/// Toolkit-specific widget types adapt to this one interface; the
/// serializer never switches on concrete classes.
pub trait WidgetNode: Send + Sync {
    /// Toolkit-stable unique ID for the underlying object.
    ///
    /// Two references report the same ID if and only if they refer to the
    /// same live object; IDs are not reused while the process runs.
    fn node_id(&self) -> u64;

    /// Widget class/type name.
    fn class_name(&self) -> String;

    /// Widget object name (the `name` attribute in queries).
    fn object_name(&self) -> String;

    /// Visible text, empty when the widget renders none.
    fn visible_text(&self) -> String;

    /// Geometry in view-relative coordinates.
    fn geometry(&self) -> Rect;

    /// Maps a view-relative point to screen coordinates.
    fn map_to_screen(&self, p: Point) -> Point;

    /// Returns `true` if the widget accepts input.
    fn is_enabled(&self) -> bool;

    /// Returns `true` if the widget is rendered on screen.
    ///
    /// With `ignore_opacity`, a fully transparent widget still counts as
    /// displayed.
    fn is_displayed(&self, ignore_opacity: bool) -> bool;

    /// Returns `true` for checked/selected stateful widgets.
    fn is_selected(&self) -> bool;

    /// Returns `true` if the widget has keyboard focus.
    fn has_focus(&self) -> bool;

    /// Gives the widget keyboard focus.
    fn set_focus(&self);

    /// Direct child widgets, in stacking order.
    fn children(&self) -> Vec<WidgetRef>;

    /// Reads a named toolkit property.
    fn property(&self, name: &str) -> Option<Value>;

    /// Clears editable content. Returns `false` if the widget is not
    /// editable.
    fn clear_editable(&self) -> bool;

    /// Serialized markup of embedded web content, for widgets hosting a
    /// rendering engine.
    fn web_source(&self) -> Option<String> {
        None
    }
}

// ============================================================================
// WebFrame
// ============================================================================

/// One document context within a view; frames nest.
pub trait WebFrame: Send + Sync {
    /// Frame name, empty for anonymous frames.
    fn frame_name(&self) -> String;

    /// Direct child frames, in sibling order.
    fn child_frames(&self) -> Vec<FrameRef>;

    /// Marker previously injected into this frame's document, if any.
    fn marker(&self) -> Option<String>;

    /// Injects a marker into this frame's document.
    fn set_marker(&self, id: &str);

    /// Starts evaluating `script` in this frame.
    ///
    /// The engine invokes `notifier.set_result` once evaluation (or, for
    /// asynchronous scripts, the script's own completion callback) finishes.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::ScriptRejected`] if the engine refuses the
    /// script outright.
    fn evaluate_script(&self, script: &str, notifier: ScriptNotifier) -> ToolkitResult<()>;
}

// ============================================================================
// WindowHandle
// ============================================================================

/// One top-level window or tab hosting a document tree.
///
/// A window is also the root [`WidgetNode`] of its widget subtree.
/// Dispatch and navigation methods resolve once the toolkit/page reports
/// the effects as settled; the dispatcher bounds them with timeouts.
#[async_trait]
pub trait WindowHandle: WidgetNode {
    /// Window title.
    fn title(&self) -> String;

    /// Window bounds in screen coordinates.
    fn bounds(&self) -> Rect;

    /// Moves/resizes the window. Position is in screen coordinates.
    fn set_bounds(&self, bounds: Rect) -> ToolkitResult<()>;

    /// Maximizes the window.
    fn maximize(&self) -> ToolkitResult<()>;

    /// Closes the window. Destruction is reported via
    /// [`ToolkitEvent::WindowClosed`].
    fn close(&self);

    /// Returns `true` while a document is loading.
    fn is_loading(&self) -> bool;

    /// The root document frame.
    fn main_frame(&self) -> FrameRef;

    /// The widget subtree root for serialization.
    fn root_widget(&self) -> WidgetRef;

    /// The widget currently holding keyboard focus, if any.
    fn focused_widget(&self) -> Option<WidgetRef>;

    /// Current page URL.
    fn url(&self) -> String;

    /// Dispatches a native key event, optionally to a specific widget,
    /// resolving once the page/toolkit has processed it.
    async fn dispatch_key(
        &self,
        target: Option<WidgetRef>,
        event: NativeKeyEvent,
    ) -> ToolkitResult<()>;

    /// Dispatches a native mouse event, resolving once processed.
    async fn dispatch_mouse(&self, event: NativeMouseEvent) -> ToolkitResult<()>;

    /// Drops the given file paths at a view-relative location.
    async fn dispatch_file_drop(&self, location: Point, paths: Vec<PathBuf>) -> ToolkitResult<()>;

    /// Navigates and resolves once loading finishes.
    async fn load_url(&self, url: &str) -> ToolkitResult<()>;

    /// Starts a navigation without waiting for it to finish.
    fn load_url_async(&self, url: &str) -> ToolkitResult<()>;

    /// Navigates one step back in history.
    async fn go_back(&self) -> ToolkitResult<()>;

    /// Navigates one step forward in history.
    async fn go_forward(&self) -> ToolkitResult<()>;

    /// Reloads the current document.
    async fn reload(&self) -> ToolkitResult<()>;

    /// Captures the entire page as tightly-packed RGBA8 pixels.
    fn capture_page(&self) -> ToolkitResult<(Vec<u8>, Size)>;

    /// Cookies visible to `url`.
    fn cookies(&self, url: &str) -> ToolkitResult<Vec<Cookie>>;

    /// Stores a cookie for `url`.
    fn set_cookie(&self, url: &str, cookie: Cookie) -> ToolkitResult<()>;

    /// Deletes the named cookie for `url`.
    fn delete_cookie(&self, url: &str, name: &str) -> ToolkitResult<()>;

    /// Message of the active modal dialog, if one is open.
    fn dialog_message(&self) -> Option<String>;

    /// Accepts or dismisses the active modal dialog. Returns `false` if no
    /// dialog is open.
    fn close_dialog(&self, accept: bool) -> bool;

    /// Sets the prompt text of the active prompt dialog. Returns `false`
    /// if no prompt is open.
    fn set_prompt_text(&self, text: &str) -> bool;

    /// Current geolocation reported to the page, if the toolkit exposes one.
    fn geolocation(&self) -> Option<Value>;

    /// Overrides the geolocation reported to the page.
    fn set_geolocation(&self, value: Value) -> ToolkitResult<()>;
}

// ============================================================================
// Toolkit
// ============================================================================

/// The host application: window source, lifecycle event source, and
/// browser version oracle.
#[async_trait]
pub trait Toolkit: Send + Sync {
    /// Version string of the embedded browser build.
    fn browser_version(&self) -> String;

    /// All currently open top-level windows.
    fn windows(&self) -> Vec<WindowRef>;

    /// Creates a new top-level window, optionally of a named view class.
    async fn create_window(&self, view_class: Option<&str>) -> ToolkitResult<WindowRef>;

    /// Drains queued lifecycle events.
    fn take_events(&self) -> Vec<ToolkitEvent>;

    /// Resolves once at least one new lifecycle event has been queued.
    async fn event_arrived(&self);
}
