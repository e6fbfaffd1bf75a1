//! Widget-tree serialization.
//!
//! Locator queries never walk toolkit APIs predicate-by-predicate. Instead
//! one depth-first traversal serializes the live widget subtree into a
//! [`UiNode`] snapshot (stable keys, class names, and a fixed attribute
//! set), and every query kind (attribute, text, structural) evaluates
//! against that snapshot. The traversal is fully synchronous, so the
//! snapshot reflects a single consistent state of the subtree.
//!
//! Matching nodes map back to live widgets through the identity registry,
//! which also supplies the stable keys: serialization mints an
//! [`ElementId`] for every visited widget, idempotently.

// ============================================================================
// Submodules
// ============================================================================

/// Locator strategies and the structural query evaluator.
pub mod query;

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::geometry::Rect;
use crate::identifiers::{ElementId, ViewId};
use crate::registry::ViewRegistry;
use crate::toolkit::WidgetRef;

// ============================================================================
// UiNode
// ============================================================================

/// One serialized widget: stable key plus the attribute set locator
/// queries match on.
#[derive(Debug, Clone, Serialize)]
pub struct UiNode {
    /// Stable element key minted by the registry.
    pub key: ElementId,
    /// Widget class/type name.
    pub class: String,
    /// Widget object name.
    pub name: String,
    /// Visible text.
    pub text: String,
    /// Geometry in view-relative coordinates.
    pub rect: Rect,
    /// Accepts input.
    pub enabled: bool,
    /// Checked/selected state.
    pub selected: bool,
    /// Rendered on screen.
    pub displayed: bool,
    /// Embedded web content markup, when requested and present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_source: Option<String>,
    /// Child nodes in stacking order.
    pub children: Vec<UiNode>,
}

impl UiNode {
    /// Reads a named attribute as text, the form locator predicates use.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            "text" => Some(self.text.clone()),
            "class" => Some(self.class.clone()),
            "enabled" => Some(self.enabled.to_string()),
            "selected" => Some(self.selected.to_string()),
            "displayed" => Some(self.displayed.to_string()),
            "x" => Some(self.rect.x.to_string()),
            "y" => Some(self.rect.y.to_string()),
            "width" => Some(self.rect.width.to_string()),
            "height" => Some(self.rect.height.to_string()),
            _ => None,
        }
    }

    /// Renders the snapshot as a JSON tree document.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut node = json!({
            "key": self.key,
            "class": self.class,
            "name": self.name,
            "text": self.text,
            "rect": self.rect,
            "enabled": self.enabled,
            "selected": self.selected,
            "displayed": self.displayed,
            "children": self.children.iter().map(UiNode::to_value).collect::<Vec<_>>(),
        });
        if let Some(source) = &self.web_source
            && let Some(map) = node.as_object_mut()
        {
            map.insert("webSource".to_string(), Value::String(source.clone()));
        }
        node
    }

    /// Visits this node and every descendant, depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a UiNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Serializes a widget subtree into a snapshot, minting element keys.
///
/// One synchronous depth-first pass; no toolkit callback can interleave,
/// so the snapshot is never torn.
///
/// # Errors
///
/// Returns [`Error::NoSuchWindow`](crate::Error::NoSuchWindow) if the view
/// is not registered.
pub fn serialize_subtree(
    registry: &ViewRegistry,
    view_id: ViewId,
    root: &WidgetRef,
    include_web_source: bool,
) -> Result<UiNode> {
    let key = registry.mint(view_id, root)?;
    let children = root
        .children()
        .iter()
        .map(|child| serialize_subtree(registry, view_id, child, include_web_source))
        .collect::<Result<Vec<_>>>()?;

    Ok(UiNode {
        key,
        class: root.class_name(),
        name: root.object_name(),
        text: root.visible_text(),
        rect: root.geometry(),
        enabled: root.is_enabled(),
        selected: root.is_selected(),
        displayed: root.is_displayed(false),
        web_source: if include_web_source {
            root.web_source()
        } else {
            None
        },
        children,
    })
}

// ============================================================================
// Tests
// ============================================================================
