//! In-memory toolkit used by the test suite.
//!
//! Implements every collaborator trait over plain data structures so the
//! bridge can be exercised without a GUI process: windows are built up with
//! [`MockToolkit::add_window`] and [`MockWindow::add_widget`], frames with
//! [`MockFrame::add_child_frame`], and failure modes are injected through
//! [`DispatchBehavior`], [`NavBehavior`] and [`ScriptBehavior`].
//!
//! Delayed behaviors use the tokio clock, so tests driving them run under
//! `#[tokio::test]`.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time;

use crate::geometry::{Point, Rect, Size};
use crate::input::{NativeKeyEvent, NativeMouseEvent};
use crate::notifier::ScriptNotifier;
use crate::toolkit::{
    Cookie, FrameRef, Toolkit, ToolkitError, ToolkitEvent, ToolkitResult, WebFrame, WidgetNode,
    WidgetRef, WindowHandle, WindowRef,
};

// ============================================================================
// Node IDs
// ============================================================================

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// Injected Behaviors
// ============================================================================

/// How a window handles native event dispatch.
#[derive(Debug, Clone, Default)]
pub enum DispatchBehavior {
    /// Record the event and resolve immediately.
    #[default]
    Immediate,
    /// Record the event after a delay.
    Delayed(Duration),
    /// Never resolve.
    Never,
    /// Fail with [`ToolkitError::TargetGone`].
    Gone,
}

/// How a window handles navigation requests.
#[derive(Debug, Clone, Default)]
pub enum NavBehavior {
    /// Finish loading immediately.
    #[default]
    Immediate,
    /// Finish loading after a delay.
    Delayed(Duration),
    /// Start loading and never finish.
    Never,
    /// Fail with [`ToolkitError::NavigationFailed`].
    Fail(String),
}

/// How a frame handles script evaluation.
#[derive(Debug, Clone)]
pub enum ScriptBehavior {
    /// Complete immediately with the given result.
    Fixed(Value),
    /// Complete with the given result after a delay.
    Delayed(Duration, Value),
    /// Reject the script outright.
    Reject(String),
    /// Accept the script and never complete.
    Never,
}

impl Default for ScriptBehavior {
    fn default() -> Self {
        ScriptBehavior::Fixed(Value::Null)
    }
}

// ============================================================================
// MockHub
// ============================================================================

/// Shared state behind a [`MockToolkit`] and the windows it owns.
struct MockHub {
    windows: Mutex<Vec<Arc<MockWindow>>>,
    events: Mutex<Vec<ToolkitEvent>>,
    notify: Notify,
    version: Mutex<String>,
}

impl MockHub {
    fn push_event(&self, event: ToolkitEvent) {
        self.events.lock().push(event);
        self.notify.notify_waiters();
    }
}

// ============================================================================
// MockToolkit
// ============================================================================

/// In-memory [`Toolkit`] with injectable windows, widgets and failures.
#[derive(Clone)]
pub struct MockToolkit {
    hub: Arc<MockHub>,
}

impl MockToolkit {
    /// Creates an empty toolkit reporting a default version string.
    #[must_use]
    pub fn new() -> Self {
        Self::with_version("MockKit 5.1 (WebCore 534.34, build 1200)")
    }

    /// Creates an empty toolkit reporting the given version string.
    #[must_use]
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            hub: Arc::new(MockHub {
                windows: Mutex::new(Vec::new()),
                events: Mutex::new(Vec::new()),
                notify: Notify::new(),
                version: Mutex::new(version.into()),
            }),
        }
    }

    /// Replaces the reported version string.
    pub fn set_version(&self, version: impl Into<String>) {
        *self.hub.version.lock() = version.into();
    }

    /// Opens a new titled window and returns its concrete handle.
    pub fn add_window(&self, title: &str) -> Arc<MockWindow> {
        let window = MockWindow::new(Arc::downgrade(&self.hub), title);
        self.hub.windows.lock().push(window.clone());
        window
    }
}

impl Default for MockToolkit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Toolkit for MockToolkit {
    fn browser_version(&self) -> String {
        self.hub.version.lock().clone()
    }

    fn windows(&self) -> Vec<WindowRef> {
        self.hub
            .windows
            .lock()
            .iter()
            .map(|w| w.clone() as WindowRef)
            .collect()
    }

    async fn create_window(&self, view_class: Option<&str>) -> ToolkitResult<WindowRef> {
        let window = self.add_window(view_class.unwrap_or("window"));
        Ok(window)
    }

    fn take_events(&self) -> Vec<ToolkitEvent> {
        std::mem::take(&mut *self.hub.events.lock())
    }

    async fn event_arrived(&self) {
        // Register before checking so a push between the check and the
        // await cannot be missed.
        let notified = self.hub.notify.notified();
        if !self.hub.events.lock().is_empty() {
            return;
        }
        notified.await;
    }
}

// ============================================================================
// MockWidget
// ============================================================================

struct WidgetState {
    class: String,
    name: String,
    text: String,
    rect: Rect,
    screen_offset: Point,
    enabled: bool,
    displayed: bool,
    transparent: bool,
    selected: bool,
    focused: bool,
    editable: bool,
    web_source: Option<String>,
    properties: FxHashMap<String, Value>,
    children: Vec<Arc<MockWidget>>,
}

/// Scriptable widget node.
pub struct MockWidget {
    node: u64,
    state: Mutex<WidgetState>,
}

impl MockWidget {
    fn new(class: &str, name: &str) -> Arc<Self> {
        Arc::new(Self {
            node: next_node_id(),
            state: Mutex::new(WidgetState {
                class: class.to_string(),
                name: name.to_string(),
                text: String::new(),
                rect: Rect::new(0, 0, 100, 30),
                screen_offset: Point::new(0, 0),
                enabled: true,
                displayed: true,
                transparent: false,
                selected: false,
                focused: false,
                editable: false,
                web_source: None,
                properties: FxHashMap::default(),
                children: Vec::new(),
            }),
        })
    }

    /// Sets the visible text.
    pub fn set_text(&self, text: &str) {
        self.state.lock().text = text.to_string();
    }

    /// Sets the view-relative geometry.
    pub fn set_geometry(&self, rect: Rect) {
        self.state.lock().rect = rect;
    }

    /// Sets the offset [`map_to_screen`](WidgetNode::map_to_screen) applies.
    pub fn set_screen_offset(&self, offset: Point) {
        self.state.lock().screen_offset = offset;
    }

    /// Sets whether the widget accepts input.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    /// Sets whether the widget is rendered at all.
    pub fn set_displayed(&self, displayed: bool) {
        self.state.lock().displayed = displayed;
    }

    /// Marks the widget fully transparent while still laid out.
    pub fn set_transparent(&self, transparent: bool) {
        self.state.lock().transparent = transparent;
    }

    /// Sets the checked/selected state.
    pub fn set_selected(&self, selected: bool) {
        self.state.lock().selected = selected;
    }

    /// Marks the widget as holding editable content.
    pub fn set_editable(&self, editable: bool) {
        self.state.lock().editable = editable;
    }

    /// Stores a named toolkit property.
    pub fn set_property(&self, name: &str, value: Value) {
        self.state.lock().properties.insert(name.to_string(), value);
    }

    /// Attaches embedded web content markup.
    pub fn set_web_source(&self, source: &str) {
        self.state.lock().web_source = Some(source.to_string());
    }

    /// Current visible text.
    #[must_use]
    pub fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    fn remove_child(&self, node: u64) -> Option<Arc<MockWidget>> {
        let mut state = self.state.lock();
        if let Some(at) = state.children.iter().position(|c| c.node == node) {
            return Some(state.children.remove(at));
        }
        let children = state.children.clone();
        drop(state);
        children.iter().find_map(|c| c.remove_child(node))
    }

    fn collect_nodes(&self, out: &mut Vec<u64>) {
        out.push(self.node);
        for child in &self.state.lock().children {
            child.collect_nodes(out);
        }
    }
}

impl WidgetNode for MockWidget {
    fn node_id(&self) -> u64 {
        self.node
    }

    fn class_name(&self) -> String {
        self.state.lock().class.clone()
    }

    fn object_name(&self) -> String {
        self.state.lock().name.clone()
    }

    fn visible_text(&self) -> String {
        self.state.lock().text.clone()
    }

    fn geometry(&self) -> Rect {
        self.state.lock().rect
    }

    fn map_to_screen(&self, p: Point) -> Point {
        let offset = self.state.lock().screen_offset;
        Point::new(p.x + offset.x, p.y + offset.y)
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    fn is_displayed(&self, ignore_opacity: bool) -> bool {
        let state = self.state.lock();
        state.displayed && (ignore_opacity || !state.transparent)
    }

    fn is_selected(&self) -> bool {
        self.state.lock().selected
    }

    fn has_focus(&self) -> bool {
        self.state.lock().focused
    }

    fn set_focus(&self) {
        self.state.lock().focused = true;
    }

    fn children(&self) -> Vec<WidgetRef> {
        self.state
            .lock()
            .children
            .iter()
            .map(|c| c.clone() as WidgetRef)
            .collect()
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.state.lock().properties.get(name).cloned()
    }

    fn clear_editable(&self) -> bool {
        let mut state = self.state.lock();
        if state.editable {
            state.text.clear();
            true
        } else {
            false
        }
    }

    fn web_source(&self) -> Option<String> {
        self.state.lock().web_source.clone()
    }
}

// ============================================================================
// MockFrame
// ============================================================================

struct FrameState {
    children: Vec<Arc<MockFrame>>,
    marker: Option<String>,
    behavior: ScriptBehavior,
    evaluated: Vec<String>,
}

/// Scriptable document frame.
pub struct MockFrame {
    name: String,
    state: Mutex<FrameState>,
}

impl MockFrame {
    /// Creates a detached frame; the empty name makes it anonymous.
    #[must_use]
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            state: Mutex::new(FrameState {
                children: Vec::new(),
                marker: None,
                behavior: ScriptBehavior::default(),
                evaluated: Vec::new(),
            }),
        })
    }

    /// Appends a named child frame and returns it.
    pub fn add_child_frame(&self, name: &str) -> Arc<MockFrame> {
        let child = MockFrame::new(name);
        self.state.lock().children.push(child.clone());
        child
    }

    /// Moves the named child to the front of the sibling list.
    pub fn move_child_frame_to_front(&self, name: &str) {
        let mut state = self.state.lock();
        if let Some(at) = state.children.iter().position(|c| c.name == name) {
            let child = state.children.remove(at);
            state.children.insert(0, child);
        }
    }

    /// Selects how [`evaluate_script`](WebFrame::evaluate_script) behaves.
    pub fn set_script_behavior(&self, behavior: ScriptBehavior) {
        self.state.lock().behavior = behavior;
    }

    /// Scripts handed to this frame so far, in order.
    #[must_use]
    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.state.lock().evaluated.clone()
    }

    /// Frame name, empty for anonymous frames.
    #[must_use]
    pub fn frame_name(&self) -> String {
        self.name.clone()
    }

    /// Injects a marker into this frame.
    pub fn set_marker(&self, id: &str) {
        self.state.lock().marker = Some(id.to_string());
    }

    /// Marker previously injected, if any.
    #[must_use]
    pub fn marker(&self) -> Option<String> {
        self.state.lock().marker.clone()
    }
}

impl WebFrame for MockFrame {
    fn frame_name(&self) -> String {
        MockFrame::frame_name(self)
    }

    fn child_frames(&self) -> Vec<FrameRef> {
        self.state
            .lock()
            .children
            .iter()
            .map(|c| c.clone() as FrameRef)
            .collect()
    }

    fn marker(&self) -> Option<String> {
        MockFrame::marker(self)
    }

    fn set_marker(&self, id: &str) {
        MockFrame::set_marker(self, id);
    }

    fn evaluate_script(&self, script: &str, notifier: ScriptNotifier) -> ToolkitResult<()> {
        let behavior = {
            let mut state = self.state.lock();
            state.evaluated.push(script.to_string());
            state.behavior.clone()
        };
        match behavior {
            ScriptBehavior::Fixed(value) => {
                notifier.set_result(value);
                Ok(())
            }
            ScriptBehavior::Delayed(delay, value) => {
                tokio::spawn(async move {
                    time::sleep(delay).await;
                    notifier.set_result(value);
                });
                Ok(())
            }
            ScriptBehavior::Reject(message) => Err(ToolkitError::ScriptRejected(message)),
            ScriptBehavior::Never => Ok(()),
        }
    }
}

// ============================================================================
// MockWindow
// ============================================================================

struct DialogState {
    message: String,
    prompt: bool,
    prompt_text: Option<String>,
}

struct WindowState {
    title: String,
    bounds: Rect,
    maximized: bool,
    loading: bool,
    history: Vec<String>,
    history_at: usize,
    nav: NavBehavior,
    dispatch: DispatchBehavior,
    keys: Vec<NativeKeyEvent>,
    mice: Vec<NativeMouseEvent>,
    drops: Vec<(Point, Vec<PathBuf>)>,
    cookies: FxHashMap<String, Vec<Cookie>>,
    dialog: Option<DialogState>,
    dialog_choice: Option<bool>,
    prompt_submission: Option<String>,
    geolocation: Option<Value>,
    fill: [u8; 4],
}

/// Scriptable top-level window.
pub struct MockWindow {
    hub: Weak<MockHub>,
    root: Arc<MockWidget>,
    main_frame: Arc<MockFrame>,
    state: Mutex<WindowState>,
}

impl MockWindow {
    fn new(hub: Weak<MockHub>, title: &str) -> Arc<Self> {
        Arc::new(Self {
            root: MockWidget::new("Window", title),
            main_frame: MockFrame::new(""),
            hub,
            state: Mutex::new(WindowState {
                title: title.to_string(),
                bounds: Rect::new(0, 0, 800, 600),
                maximized: false,
                loading: false,
                history: vec!["about:blank".to_string()],
                history_at: 0,
                nav: NavBehavior::default(),
                dispatch: DispatchBehavior::default(),
                keys: Vec::new(),
                mice: Vec::new(),
                drops: Vec::new(),
                cookies: FxHashMap::default(),
                dialog: None,
                dialog_choice: None,
                prompt_submission: None,
                geolocation: None,
                fill: [0xff, 0xff, 0xff, 0xff],
            }),
        })
    }

    /// Adds a widget under `parent`, or under the window root when `None`.
    pub fn add_widget(
        &self,
        parent: Option<&Arc<MockWidget>>,
        class: &str,
        name: &str,
    ) -> Arc<MockWidget> {
        let widget = MockWidget::new(class, name);
        let target = parent.unwrap_or(&self.root);
        target.state.lock().children.push(widget.clone());
        widget
    }

    /// Detaches a widget subtree, queuing destruction events for every node.
    pub fn destroy_widget(&self, widget: &Arc<MockWidget>) {
        if let Some(removed) = self.root.remove_child(widget.node) {
            let mut nodes = Vec::new();
            removed.collect_nodes(&mut nodes);
            if let Some(hub) = self.hub.upgrade() {
                for node in nodes {
                    hub.push_event(ToolkitEvent::WidgetDestroyed(node));
                }
            }
        }
    }

    /// The concrete main frame, for configuring script behavior.
    #[must_use]
    pub fn mock_main_frame(&self) -> Arc<MockFrame> {
        self.main_frame.clone()
    }

    /// Selects how navigation requests behave.
    pub fn set_nav_behavior(&self, nav: NavBehavior) {
        self.state.lock().nav = nav;
    }

    /// Selects how native event dispatch behaves.
    pub fn set_dispatch_behavior(&self, dispatch: DispatchBehavior) {
        self.state.lock().dispatch = dispatch;
    }

    /// Key events dispatched so far, in order.
    #[must_use]
    pub fn dispatched_keys(&self) -> Vec<NativeKeyEvent> {
        self.state.lock().keys.clone()
    }

    /// Mouse events dispatched so far, in order.
    #[must_use]
    pub fn dispatched_mice(&self) -> Vec<NativeMouseEvent> {
        self.state.lock().mice.clone()
    }

    /// File drops dispatched so far, in order.
    #[must_use]
    pub fn dispatched_drops(&self) -> Vec<(Point, Vec<PathBuf>)> {
        self.state.lock().drops.clone()
    }

    /// Opens a modal alert.
    pub fn open_alert(&self, message: &str) {
        self.state.lock().dialog = Some(DialogState {
            message: message.to_string(),
            prompt: false,
            prompt_text: None,
        });
    }

    /// Opens a modal prompt.
    pub fn open_prompt(&self, message: &str) {
        self.state.lock().dialog = Some(DialogState {
            message: message.to_string(),
            prompt: true,
            prompt_text: Some(String::new()),
        });
    }

    /// How the last dialog was closed, if any has been closed.
    #[must_use]
    pub fn dialog_choice(&self) -> Option<bool> {
        self.state.lock().dialog_choice
    }

    /// Text typed into the open prompt, if a prompt is open.
    #[must_use]
    pub fn prompt_text(&self) -> Option<String> {
        self.state
            .lock()
            .dialog
            .as_ref()
            .and_then(|d| d.prompt_text.clone())
    }

    /// Text of the last prompt that was accepted.
    #[must_use]
    pub fn submitted_prompt(&self) -> Option<String> {
        self.state.lock().prompt_submission.clone()
    }

    /// Whether [`maximize`](WindowHandle::maximize) has been called.
    #[must_use]
    pub fn is_maximized(&self) -> bool {
        self.state.lock().maximized
    }

    /// Sets the solid color page captures are filled with.
    pub fn set_capture_fill(&self, rgba: [u8; 4]) {
        self.state.lock().fill = rgba;
    }

    fn push_event(&self, event: ToolkitEvent) {
        if let Some(hub) = self.hub.upgrade() {
            hub.push_event(event);
        }
    }

    async fn navigate(&self, url: Option<String>, step: isize) -> ToolkitResult<()> {
        let nav = {
            let mut state = self.state.lock();
            state.loading = true;
            state.nav.clone()
        };
        self.push_event(ToolkitEvent::LoadStarted(self.root.node));
        match nav {
            NavBehavior::Immediate => {}
            NavBehavior::Delayed(delay) => time::sleep(delay).await,
            NavBehavior::Never => std::future::pending::<()>().await,
            NavBehavior::Fail(message) => {
                self.state.lock().loading = false;
                return Err(ToolkitError::NavigationFailed(message));
            }
        }
        self.finish_navigation(url, step);
        Ok(())
    }

    fn finish_navigation(&self, url: Option<String>, step: isize) {
        {
            let mut state = self.state.lock();
            if let Some(url) = url {
                let at = state.history_at;
                state.history.truncate(at + 1);
                state.history.push(url);
                state.history_at += 1;
            } else {
                let len = state.history.len() as isize;
                let at = (state.history_at as isize + step).clamp(0, len - 1);
                state.history_at = at as usize;
            }
            state.loading = false;
        }
        self.push_event(ToolkitEvent::LoadFinished(self.root.node));
    }
}

impl WidgetNode for MockWindow {
    fn node_id(&self) -> u64 {
        self.root.node_id()
    }

    fn class_name(&self) -> String {
        self.root.class_name()
    }

    fn object_name(&self) -> String {
        self.root.object_name()
    }

    fn visible_text(&self) -> String {
        self.root.visible_text()
    }

    fn geometry(&self) -> Rect {
        self.root.geometry()
    }

    fn map_to_screen(&self, p: Point) -> Point {
        let origin = self.state.lock().bounds.origin();
        Point::new(p.x + origin.x, p.y + origin.y)
    }

    fn is_enabled(&self) -> bool {
        self.root.is_enabled()
    }

    fn is_displayed(&self, ignore_opacity: bool) -> bool {
        self.root.is_displayed(ignore_opacity)
    }

    fn is_selected(&self) -> bool {
        self.root.is_selected()
    }

    fn has_focus(&self) -> bool {
        self.root.has_focus()
    }

    fn set_focus(&self) {
        self.root.set_focus();
    }

    fn children(&self) -> Vec<WidgetRef> {
        self.root.children()
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.root.property(name)
    }

    fn clear_editable(&self) -> bool {
        self.root.clear_editable()
    }
}

#[async_trait]
impl WindowHandle for MockWindow {
    fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    fn bounds(&self) -> Rect {
        self.state.lock().bounds
    }

    fn set_bounds(&self, bounds: Rect) -> ToolkitResult<()> {
        let mut state = self.state.lock();
        state.bounds = bounds;
        state.maximized = false;
        Ok(())
    }

    fn maximize(&self) -> ToolkitResult<()> {
        self.state.lock().maximized = true;
        Ok(())
    }

    fn close(&self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.windows.lock().retain(|w| w.root.node != self.root.node);
            hub.push_event(ToolkitEvent::WindowClosed(self.root.node));
        }
    }

    fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    fn main_frame(&self) -> FrameRef {
        self.main_frame.clone()
    }

    fn root_widget(&self) -> WidgetRef {
        self.root.clone()
    }

    fn focused_widget(&self) -> Option<WidgetRef> {
        fn scan(widget: &Arc<MockWidget>) -> Option<Arc<MockWidget>> {
            if widget.has_focus() {
                return Some(widget.clone());
            }
            let children = widget.state.lock().children.clone();
            children.iter().find_map(scan)
        }
        scan(&self.root).map(|w| w as WidgetRef)
    }

    fn url(&self) -> String {
        let state = self.state.lock();
        state.history[state.history_at].clone()
    }

    async fn dispatch_key(
        &self,
        _target: Option<WidgetRef>,
        event: NativeKeyEvent,
    ) -> ToolkitResult<()> {
        let dispatch = self.state.lock().dispatch.clone();
        match dispatch {
            DispatchBehavior::Immediate => {}
            DispatchBehavior::Delayed(delay) => time::sleep(delay).await,
            DispatchBehavior::Never => std::future::pending::<()>().await,
            DispatchBehavior::Gone => return Err(ToolkitError::TargetGone),
        }
        self.state.lock().keys.push(event);
        Ok(())
    }

    async fn dispatch_mouse(&self, event: NativeMouseEvent) -> ToolkitResult<()> {
        let dispatch = self.state.lock().dispatch.clone();
        match dispatch {
            DispatchBehavior::Immediate => {}
            DispatchBehavior::Delayed(delay) => time::sleep(delay).await,
            DispatchBehavior::Never => std::future::pending::<()>().await,
            DispatchBehavior::Gone => return Err(ToolkitError::TargetGone),
        }
        self.state.lock().mice.push(event);
        Ok(())
    }

    async fn dispatch_file_drop(&self, location: Point, paths: Vec<PathBuf>) -> ToolkitResult<()> {
        let dispatch = self.state.lock().dispatch.clone();
        match dispatch {
            DispatchBehavior::Immediate => {}
            DispatchBehavior::Delayed(delay) => time::sleep(delay).await,
            DispatchBehavior::Never => std::future::pending::<()>().await,
            DispatchBehavior::Gone => return Err(ToolkitError::TargetGone),
        }
        self.state.lock().drops.push((location, paths));
        Ok(())
    }

    async fn load_url(&self, url: &str) -> ToolkitResult<()> {
        self.navigate(Some(url.to_string()), 0).await
    }

    fn load_url_async(&self, url: &str) -> ToolkitResult<()> {
        let nav = {
            let mut state = self.state.lock();
            state.loading = true;
            state.nav.clone()
        };
        self.push_event(ToolkitEvent::LoadStarted(self.root.node));
        match nav {
            NavBehavior::Never => Ok(()),
            NavBehavior::Fail(message) => {
                self.state.lock().loading = false;
                Err(ToolkitError::NavigationFailed(message))
            }
            // The mock has no background page to finish loading in, so
            // immediate and delayed starts both settle right away.
            NavBehavior::Immediate | NavBehavior::Delayed(_) => {
                self.finish_navigation(Some(url.to_string()), 0);
                Ok(())
            }
        }
    }

    async fn go_back(&self) -> ToolkitResult<()> {
        self.navigate(None, -1).await
    }

    async fn go_forward(&self) -> ToolkitResult<()> {
        self.navigate(None, 1).await
    }

    async fn reload(&self) -> ToolkitResult<()> {
        self.navigate(None, 0).await
    }

    fn capture_page(&self) -> ToolkitResult<(Vec<u8>, Size)> {
        let state = self.state.lock();
        let size = state.bounds.size();
        let pixels = state
            .fill
            .iter()
            .copied()
            .cycle()
            .take((size.width * size.height * 4) as usize)
            .collect();
        Ok((pixels, size))
    }

    fn cookies(&self, url: &str) -> ToolkitResult<Vec<Cookie>> {
        Ok(self
            .state
            .lock()
            .cookies
            .get(url)
            .cloned()
            .unwrap_or_default())
    }

    fn set_cookie(&self, url: &str, cookie: Cookie) -> ToolkitResult<()> {
        let mut state = self.state.lock();
        let jar = state.cookies.entry(url.to_string()).or_default();
        jar.retain(|c| c.name != cookie.name);
        jar.push(cookie);
        Ok(())
    }

    fn delete_cookie(&self, url: &str, name: &str) -> ToolkitResult<()> {
        if let Some(jar) = self.state.lock().cookies.get_mut(url) {
            jar.retain(|c| c.name != name);
        }
        Ok(())
    }

    fn dialog_message(&self) -> Option<String> {
        self.state.lock().dialog.as_ref().map(|d| d.message.clone())
    }

    fn close_dialog(&self, accept: bool) -> bool {
        let mut state = self.state.lock();
        if let Some(dialog) = state.dialog.take() {
            state.dialog_choice = Some(accept);
            if accept {
                state.prompt_submission = dialog.prompt_text;
            }
            true
        } else {
            false
        }
    }

    fn set_prompt_text(&self, text: &str) -> bool {
        let mut state = self.state.lock();
        match &mut state.dialog {
            Some(dialog) if dialog.prompt => {
                dialog.prompt_text = Some(text.to_string());
                true
            }
            _ => false,
        }
    }

    fn geolocation(&self) -> Option<Value> {
        self.state.lock().geolocation.clone()
    }

    fn set_geolocation(&self, value: Value) -> ToolkitResult<()> {
        self.state.lock().geolocation = Some(value);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("a");
        let w1 = window.add_widget(None, "Label", "x");
        let w2 = window.add_widget(None, "Label", "x");
        assert_ne!(w1.node_id(), w2.node_id());
        assert_ne!(window.node_id(), w1.node_id());
    }

    #[test]
    fn test_close_removes_window_and_queues_event() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");
        let node = window.node_id();

        window.close();

        assert!(toolkit.windows().is_empty());
        assert_eq!(toolkit.take_events(), vec![ToolkitEvent::WindowClosed(node)]);
    }

    #[test]
    fn test_destroy_widget_queues_events_for_subtree() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");
        let parent = window.add_widget(None, "Form", "form");
        let child = window.add_widget(Some(&parent), "Label", "label");

        window.destroy_widget(&parent);

        let events = toolkit.take_events();
        assert!(events.contains(&ToolkitEvent::WidgetDestroyed(parent.node_id())));
        assert!(events.contains(&ToolkitEvent::WidgetDestroyed(child.node_id())));
        assert!(window.children().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_history() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");

        window.load_url("http://a/").await.unwrap();
        window.load_url("http://b/").await.unwrap();
        assert_eq!(window.url(), "http://b/");

        window.go_back().await.unwrap();
        assert_eq!(window.url(), "http://a/");
        window.go_forward().await.unwrap();
        assert_eq!(window.url(), "http://b/");
    }

    #[tokio::test]
    async fn test_failed_navigation_clears_loading() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");
        window.set_nav_behavior(NavBehavior::Fail("refused".into()));

        let err = window.load_url("http://a/").await.unwrap_err();
        assert!(matches!(err, ToolkitError::NavigationFailed(_)));
        assert!(!window.is_loading());
        assert_eq!(window.url(), "about:blank");
    }

    #[tokio::test]
    async fn test_event_arrived_wakes_on_push() {
        let toolkit = MockToolkit::new();
        let waiter = {
            let toolkit = toolkit.clone();
            tokio::spawn(async move { toolkit.event_arrived().await })
        };
        tokio::task::yield_now().await;

        toolkit.add_window("main").close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[test]
    fn test_dialog_lifecycle() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");

        assert!(!window.close_dialog(true));
        window.open_prompt("your name?");
        assert_eq!(window.dialog_message().as_deref(), Some("your name?"));
        assert!(window.set_prompt_text("alice"));
        assert_eq!(window.prompt_text().as_deref(), Some("alice"));
        assert!(window.close_dialog(true));
        assert_eq!(window.dialog_choice(), Some(true));
        assert!(window.dialog_message().is_none());
    }

    #[test]
    fn test_cookie_store_replaces_by_name() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");
        let url = "http://shop.example/cart";

        window.set_cookie(url, Cookie::new("sid", "1")).unwrap();
        window.set_cookie(url, Cookie::new("sid", "2")).unwrap();
        let jar = window.cookies(url).unwrap();
        assert_eq!(jar.len(), 1);
        assert_eq!(jar[0].value, "2");

        window.delete_cookie(url, "sid").unwrap();
        assert!(window.cookies(url).unwrap().is_empty());
    }

    #[test]
    fn test_capture_matches_bounds() {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");
        window.set_bounds(Rect::new(0, 0, 4, 2)).unwrap();
        window.set_capture_fill([1, 2, 3, 4]);

        let (pixels, size) = window.capture_page().unwrap();
        assert_eq!(size, Size::new(4, 2));
        assert_eq!(pixels.len(), 32);
        assert_eq!(&pixels[..4], &[1, 2, 3, 4]);
    }
}
