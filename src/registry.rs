//! Identity registry: opaque IDs over weak references to toolkit objects.
//!
//! The registry owns the global view map and one element map per open view.
//! Every entry holds a [`Weak`] reference, since GUI objects belong to the
//! host toolkit and never to the bridge, so dereferencing cannot touch freed
//! memory: a dead `Weak` fails to upgrade and is reported as staleness.
//!
//! Entries are removed two ways: explicitly (view invalidation on close)
//! and reactively, when the dispatcher drains toolkit destruction events
//! into [`ViewRegistry::handle_event`]. Reactive removal guarantees a
//! destroyed object is detectable on the next access instead of leaking.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, ViewId};
use crate::toolkit::{ToolkitEvent, WidgetNode, WidgetRef, WindowHandle, WindowRef};

// ============================================================================
// Types
// ============================================================================

/// Per-view registry entry.
struct ViewEntry {
    /// Weak reference to the native window.
    window: Weak<dyn WindowHandle>,
    /// Toolkit-stable ID of the window object.
    node_id: u64,
    /// ElementId to weak widget reference, one map per open view.
    elements: FxHashMap<ElementId, Weak<dyn WidgetNode>>,
    /// Reverse index for idempotent minting.
    minted: FxHashMap<u64, ElementId>,
}

/// Registry state behind one lock.
struct RegistryInner {
    /// Global view map.
    views: FxHashMap<ViewId, ViewEntry>,
    /// Window node ID to view ID, for idempotent registration and
    /// event-driven removal.
    by_node: FxHashMap<u64, ViewId>,
    /// Next view ID to mint.
    next_view: u32,
}

// ============================================================================
// ViewRegistry
// ============================================================================

/// Maps opaque view/element identifiers to weak native references.
///
/// Session-scoped: created at `init`, cleared at `terminate`. All mutation
/// happens on the dispatcher's task.
pub struct ViewRegistry {
    inner: Mutex<RegistryInner>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                views: FxHashMap::default(),
                by_node: FxHashMap::default(),
                next_view: 1,
            }),
        }
    }

    /// Registers a window, returning its view ID.
    ///
    /// Idempotent: registering the same live window again returns the ID
    /// already assigned to it.
    pub fn register_view(&self, window: &WindowRef) -> ViewId {
        let node_id = window.node_id();
        let mut inner = self.inner.lock();

        if let Some(&existing) = inner.by_node.get(&node_id)
            && let Some(entry) = inner.views.get(&existing)
            && entry.window.upgrade().is_some()
        {
            return existing;
        }

        let view_id = ViewId::new(inner.next_view);
        inner.next_view += 1;
        inner.views.insert(
            view_id,
            ViewEntry {
                window: Arc::downgrade(window),
                node_id,
                elements: FxHashMap::default(),
                minted: FxHashMap::default(),
            },
        );
        inner.by_node.insert(node_id, view_id);
        debug!(%view_id, node_id, "View registered");
        view_id
    }

    /// Resolves a view ID to its live window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchWindow`] if the view was never registered,
    /// was invalidated, or its window has been destroyed.
    pub fn resolve_view(&self, view_id: ViewId) -> Result<WindowRef> {
        let mut inner = self.inner.lock();
        let entry = inner
            .views
            .get(&view_id)
            .ok_or_else(|| Error::no_such_window(view_id))?;

        match entry.window.upgrade() {
            Some(window) => Ok(window),
            None => {
                // Destroyed without a close notification; drop the entry now.
                let node_id = entry.node_id;
                inner.views.remove(&view_id);
                inner.by_node.remove(&node_id);
                debug!(%view_id, "View resolved to a dead window, entry removed");
                Err(Error::no_such_window(view_id))
            }
        }
    }

    /// Returns the IDs of all registered views whose windows are alive.
    #[must_use]
    pub fn view_ids(&self) -> Vec<ViewId> {
        let inner = self.inner.lock();
        let mut ids: Vec<ViewId> = inner
            .views
            .iter()
            .filter(|(_, entry)| entry.window.upgrade().is_some())
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns `true` if the view resolves to a live window.
    #[must_use]
    pub fn contains_view(&self, view_id: ViewId) -> bool {
        let inner = self.inner.lock();
        inner
            .views
            .get(&view_id)
            .is_some_and(|entry| entry.window.upgrade().is_some())
    }

    /// Looks up the view registered for a window node ID.
    #[must_use]
    pub fn view_for_node(&self, node_id: u64) -> Option<ViewId> {
        self.inner.lock().by_node.get(&node_id).copied()
    }

    /// Mints an element ID for a widget discovered within a view.
    ///
    /// Idempotent: re-minting the same live widget under the same view
    /// returns the ID assigned on first discovery. IDs are never reused
    /// for a different object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchWindow`] if the view is not registered.
    pub fn mint(&self, view_id: ViewId, widget: &WidgetRef) -> Result<ElementId> {
        let node_id = widget.node_id();
        let mut inner = self.inner.lock();
        let entry = inner
            .views
            .get_mut(&view_id)
            .ok_or_else(|| Error::no_such_window(view_id))?;

        if let Some(existing) = entry.minted.get(&node_id)
            && entry
                .elements
                .get(existing)
                .is_some_and(|weak| weak.upgrade().is_some())
        {
            return Ok(existing.clone());
        }

        let element_id = ElementId::mint();
        entry
            .elements
            .insert(element_id.clone(), Arc::downgrade(widget));
        entry.minted.insert(node_id, element_id.clone());
        Ok(element_id)
    }

    /// Resolves an element ID to its live widget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] if the widget has been
    /// destroyed, the entry was removed, or the owning view has closed:
    /// an element identifier is only valid within the view it was minted
    /// under, and only while that view is open.
    pub fn resolve_element(&self, view_id: ViewId, element_id: &ElementId) -> Result<WidgetRef> {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.views.get_mut(&view_id) else {
            return Err(Error::stale_element(element_id.clone()));
        };

        match entry.elements.get(element_id).and_then(Weak::upgrade) {
            Some(widget) => Ok(widget),
            None => {
                entry.elements.remove(element_id);
                Err(Error::stale_element(element_id.clone()))
            }
        }
    }

    /// Removes a view and every element entry minted under it.
    pub fn invalidate_view(&self, view_id: ViewId) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.views.remove(&view_id) {
            inner.by_node.remove(&entry.node_id);
            debug!(%view_id, elements = entry.elements.len(), "View invalidated");
        }
    }

    /// Applies a toolkit lifecycle event to the registry.
    ///
    /// Window-close events invalidate the whole view; widget-destruction
    /// events drop the matching element entries so staleness is reported
    /// on the next access.
    pub fn handle_event(&self, event: &ToolkitEvent) {
        match *event {
            ToolkitEvent::WindowClosed(node_id) => {
                if let Some(view_id) = self.view_for_node(node_id) {
                    self.invalidate_view(view_id);
                }
            }
            ToolkitEvent::WidgetDestroyed(node_id) => {
                let mut inner = self.inner.lock();
                for entry in inner.views.values_mut() {
                    if let Some(element_id) = entry.minted.remove(&node_id) {
                        entry.elements.remove(&element_id);
                        debug!(%element_id, node_id, "Element entry removed on destruction");
                    }
                }
            }
            ToolkitEvent::LoadStarted(_) | ToolkitEvent::LoadFinished(_) => {}
        }
    }

    /// Drops every entry. Used at session teardown.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.views.clear();
        inner.by_node.clear();
        debug!("Registry cleared");
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::toolkit::Toolkit;
    use crate::toolkit::mock::MockToolkit;

    fn setup() -> (MockToolkit, ViewRegistry, ViewId, WindowRef) {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");
        let registry = ViewRegistry::new();
        let window: WindowRef = window;
        let view_id = registry.register_view(&window);
        (toolkit, registry, view_id, window)
    }

    #[test]
    fn test_register_view_is_idempotent() {
        let (_toolkit, registry, view_id, window) = setup();
        assert_eq!(registry.register_view(&window), view_id);
    }

    #[test]
    fn test_resolve_unknown_view() {
        let registry = ViewRegistry::new();
        let err = registry.resolve_view(ViewId::new(99)).err().unwrap();
        assert!(matches!(err, Error::NoSuchWindow { .. }));
    }

    #[test]
    fn test_mint_is_idempotent() {
        let (toolkit, registry, view_id, _window) = setup();
        let window = toolkit.windows().pop().unwrap();
        let widget = window.root_widget();

        let first = registry.mint(view_id, &widget).unwrap();
        let second = registry.mint(view_id, &widget).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_element_roundtrip() {
        let (toolkit, registry, view_id, _window) = setup();
        let window = toolkit.windows().pop().unwrap();
        let widget = window.root_widget();

        let id = registry.mint(view_id, &widget).unwrap();
        let resolved = registry.resolve_element(view_id, &id).unwrap();
        assert_eq!(resolved.node_id(), widget.node_id());
    }

    #[test]
    fn test_invalidated_view_makes_elements_stale() {
        let (toolkit, registry, view_id, _window) = setup();
        let window = toolkit.windows().pop().unwrap();
        let id = registry.mint(view_id, &window.root_widget()).unwrap();

        registry.invalidate_view(view_id);

        let err = registry.resolve_element(view_id, &id).err().unwrap();
        assert!(matches!(err, Error::StaleElementReference { .. }));
    }

    #[test]
    fn test_widget_destroyed_event_removes_entry() {
        let (_toolkit, registry, view_id, window) = setup();
        let widget = window.root_widget();
        let id = registry.mint(view_id, &widget).unwrap();

        registry.handle_event(&ToolkitEvent::WidgetDestroyed(widget.node_id()));

        let err = registry.resolve_element(view_id, &id).err().unwrap();
        assert!(matches!(err, Error::StaleElementReference { .. }));
    }

    #[test]
    fn test_window_closed_event_invalidates_view() {
        let (_toolkit, registry, view_id, window) = setup();
        registry.handle_event(&ToolkitEvent::WindowClosed(window.node_id()));
        assert!(!registry.contains_view(view_id));
        assert!(registry.resolve_view(view_id).is_err());
    }

    #[test]
    fn test_view_ids_skips_dead_windows() {
        let toolkit = MockToolkit::new();
        let a: WindowRef = toolkit.add_window("a");
        let b: WindowRef = toolkit.add_window("b");
        let registry = ViewRegistry::new();
        let id_a = registry.register_view(&a);
        let id_b = registry.register_view(&b);

        // Closing drops the toolkit's strong reference; ours is the last.
        b.close();
        drop(b);

        let ids = registry.view_ids();
        assert!(ids.contains(&id_a));
        assert!(!ids.contains(&id_b));
    }
}
