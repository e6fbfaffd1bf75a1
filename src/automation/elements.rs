//! Native element discovery and inspection operations.
//!
//! Discovery serializes the view's widget subtree into one consistent
//! snapshot, evaluates the locator query against it, and maps matches back
//! to live widgets through the registry, dropping any that died since the
//! snapshot was taken.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{Point, Size};
use crate::identifiers::{ElementId, ViewId};
use crate::tree::query::{self, Locator};
use crate::tree::{UiNode, serialize_subtree};

use super::Automation;

// ============================================================================
// Automation - Element Discovery
// ============================================================================

impl Automation {
    /// Finds the first element matching a locator query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementNotFound`] when nothing matches and
    /// [`Error::InvalidArgument`] for a malformed structural query.
    pub fn find_native_element(
        &self,
        view_id: ViewId,
        locator: Locator,
        query: &str,
    ) -> Result<ElementId> {
        self.find_native_elements(view_id, locator, query)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::element_not_found(locator.as_str(), query))
    }

    /// Finds every element matching a locator query, in document order.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a malformed structural query.
    pub fn find_native_elements(
        &self,
        view_id: ViewId,
        locator: Locator,
        query_str: &str,
    ) -> Result<Vec<ElementId>> {
        let tree = self.ui_snapshot(view_id, false)?;
        let matches = query::query(&tree, locator, query_str)?;
        debug!(%view_id, %locator, query_str, count = matches.len(), "Locator query evaluated");

        // Widgets may die between the snapshot and this point; matches that
        // no longer resolve are dropped rather than handed out stale.
        Ok(matches
            .into_iter()
            .filter(|id| self.element(view_id, id).is_ok())
            .collect())
    }

    /// The element currently holding keyboard focus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementNotFound`] when no widget has focus.
    pub fn get_native_element_with_focus(&self, view_id: ViewId) -> Result<ElementId> {
        let window = self.window(view_id)?;
        let widget = window
            .focused_widget()
            .ok_or_else(|| Error::element_not_found("focus", ""))?;
        self.registry().mint(view_id, &widget)
    }

    /// Serializes a view's widget tree into a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchWindow`] for an unknown view.
    pub fn serialize_view_tree(&self, view_id: ViewId, include_web_source: bool) -> Result<Value> {
        Ok(self.ui_snapshot(view_id, include_web_source)?.to_value())
    }

    fn ui_snapshot(&self, view_id: ViewId, include_web_source: bool) -> Result<UiNode> {
        let window = self.window(view_id)?;
        serialize_subtree(
            self.registry(),
            view_id,
            &window.root_widget(),
            include_web_source,
        )
    }
}

// ============================================================================
// Automation - Element Inspection
// ============================================================================

impl Automation {
    /// Element origin in screen coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when the element died.
    pub fn get_native_element_location(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
    ) -> Result<Point> {
        let widget = self.element(view_id, element_id)?;
        Ok(widget.map_to_screen(widget.geometry().origin()))
    }

    /// Element origin in view-relative coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when the element died.
    pub fn get_native_element_location_in_view(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
    ) -> Result<Point> {
        let widget = self.element(view_id, element_id)?;
        Ok(widget.geometry().origin())
    }

    /// Element size in pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when the element died.
    pub fn get_native_element_size(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
    ) -> Result<Size> {
        let widget = self.element(view_id, element_id)?;
        Ok(widget.geometry().size())
    }

    /// Reads a named toolkit property of an element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a property the widget does
    /// not expose.
    pub fn get_native_element_property(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
        name: &str,
    ) -> Result<Value> {
        let widget = self.element(view_id, element_id)?;
        widget
            .property(name)
            .ok_or_else(|| Error::invalid_argument(format!("element has no property {name:?}")))
    }

    /// Returns `true` if both identifiers name the same live widget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when either element died.
    pub fn native_element_equals(
        &self,
        view_id: ViewId,
        first: &ElementId,
        second: &ElementId,
    ) -> Result<bool> {
        let a = self.element(view_id, first)?;
        let b = self.element(view_id, second)?;
        Ok(a.node_id() == b.node_id())
    }

    /// Center of the element in screen coordinates, for synthesizing
    /// clicks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the element is not
    /// displayed.
    pub fn get_native_element_clickable_location(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
    ) -> Result<Point> {
        let widget = self.element(view_id, element_id)?;
        if !widget.is_displayed(false) {
            return Err(Error::invalid_argument(
                "element is not displayed and cannot be clicked",
            ));
        }
        Ok(widget.map_to_screen(widget.geometry().center()))
    }

    /// Clears an element's editable content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the element is not editable.
    pub fn clear_native_element(&self, view_id: ViewId, element_id: &ElementId) -> Result<()> {
        let widget = self.element(view_id, element_id)?;
        if widget.clear_editable() {
            Ok(())
        } else {
            Err(Error::invalid_argument("element is not editable"))
        }
    }

    /// Returns `true` if the element is rendered on screen.
    ///
    /// With `ignore_opacity`, a fully transparent element still counts as
    /// displayed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when the element died.
    pub fn is_native_element_displayed(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
        ignore_opacity: bool,
    ) -> Result<bool> {
        Ok(self
            .element(view_id, element_id)?
            .is_displayed(ignore_opacity))
    }

    /// Returns `true` if the element accepts input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when the element died.
    pub fn is_native_element_enabled(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
    ) -> Result<bool> {
        Ok(self.element(view_id, element_id)?.is_enabled())
    }

    /// Returns `true` for checked/selected stateful elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when the element died.
    pub fn is_native_element_selected(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
    ) -> Result<bool> {
        Ok(self.element(view_id, element_id)?.is_selected())
    }

    /// Visible text of an element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleElementReference`] when the element died.
    pub fn get_native_element_text(
        &self,
        view_id: ViewId,
        element_id: &ElementId,
    ) -> Result<String> {
        Ok(self.element(view_id, element_id)?.visible_text())
    }

    /// Markup of the first web-content widget in the view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the view hosts no web
    /// content.
    pub fn get_native_source(&self, view_id: ViewId) -> Result<String> {
        let tree = self.ui_snapshot(view_id, true)?;
        let mut source = None;
        tree.walk(&mut |node| {
            if source.is_none() && node.web_source.is_some() {
                source = node.web_source.clone();
            }
        });
        source.ok_or_else(|| Error::invalid_argument("view hosts no web content"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::automation::tests::boot;
    use crate::error::Error;
    use crate::geometry::{Point, Rect, Size};
    use crate::toolkit::WidgetNode;
    use crate::tree::query::Locator;

    #[tokio::test]
    async fn test_find_twice_returns_same_id() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let button = window.add_widget(None, "PushButton", "ok");
        button.set_text("OK");

        let by_name = automation
            .find_native_element(view_id, Locator::Name, "ok")
            .unwrap();
        let by_text = automation
            .find_native_element(view_id, Locator::Text, "OK")
            .unwrap();
        assert_eq!(by_name, by_text);
    }

    #[tokio::test]
    async fn test_closed_view_makes_elements_stale() {
        let (_toolkit, automation, view_id, window) = boot().await;
        window.add_widget(None, "PushButton", "ok");
        let element = automation
            .find_native_element(view_id, Locator::Name, "ok")
            .unwrap();

        automation.close_view(view_id).unwrap();

        let err = automation
            .get_native_element_text(view_id, &element)
            .unwrap_err();
        assert!(matches!(err, Error::StaleElementReference { .. }));
    }

    #[tokio::test]
    async fn test_text_locator_picks_submit_only() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let submit = window.add_widget(None, "PushButton", "submit");
        submit.set_text("Submit");
        let cancel = window.add_widget(None, "PushButton", "cancel");
        cancel.set_text("Cancel");

        let matches = automation
            .find_native_elements(view_id, Locator::Text, "Submit")
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(
            automation
                .get_native_element_text(view_id, &matches[0])
                .unwrap(),
            "Submit"
        );
    }

    #[tokio::test]
    async fn test_find_all_with_no_match_is_empty_not_error() {
        let (_toolkit, automation, view_id, _window) = boot().await;
        let matches = automation
            .find_native_elements(view_id, Locator::ClassName, "Carousel")
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_destroyed_widget_dropped_from_matches() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let a = window.add_widget(None, "Label", "tag");
        window.add_widget(None, "Label", "tag");
        assert_eq!(
            automation
                .find_native_elements(view_id, Locator::Name, "tag")
                .unwrap()
                .len(),
            2
        );

        window.destroy_widget(&a);
        assert_eq!(
            automation
                .find_native_elements(view_id, Locator::Name, "tag")
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_focus_lookup() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let err = automation.get_native_element_with_focus(view_id).unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { .. }));

        let field = window.add_widget(None, "LineEdit", "user");
        field.set_focus();
        let focused = automation.get_native_element_with_focus(view_id).unwrap();
        let by_name = automation
            .find_native_element(view_id, Locator::Name, "user")
            .unwrap();
        assert_eq!(focused, by_name);
    }

    #[tokio::test]
    async fn test_geometry_queries() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let widget = window.add_widget(None, "PushButton", "go");
        widget.set_geometry(Rect::new(10, 20, 100, 40));
        widget.set_screen_offset(Point::new(300, 400));
        let element = automation
            .find_native_element(view_id, Locator::Name, "go")
            .unwrap();

        assert_eq!(
            automation
                .get_native_element_location_in_view(view_id, &element)
                .unwrap(),
            Point::new(10, 20)
        );
        assert_eq!(
            automation
                .get_native_element_location(view_id, &element)
                .unwrap(),
            Point::new(310, 420)
        );
        assert_eq!(
            automation
                .get_native_element_size(view_id, &element)
                .unwrap(),
            Size::new(100, 40)
        );
        assert_eq!(
            automation
                .get_native_element_clickable_location(view_id, &element)
                .unwrap(),
            Point::new(360, 440)
        );
    }

    #[tokio::test]
    async fn test_hidden_element_has_no_clickable_location() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let widget = window.add_widget(None, "PushButton", "go");
        widget.set_displayed(false);
        let element = automation
            .find_native_element(view_id, Locator::Name, "go")
            .unwrap();

        let err = automation
            .get_native_element_clickable_location(view_id, &element)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_transparent_element_and_ignore_opacity() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let widget = window.add_widget(None, "Label", "ghost");
        widget.set_transparent(true);
        let element = automation
            .find_native_element(view_id, Locator::Name, "ghost")
            .unwrap();

        assert!(
            !automation
                .is_native_element_displayed(view_id, &element, false)
                .unwrap()
        );
        assert!(
            automation
                .is_native_element_displayed(view_id, &element, true)
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_state_queries() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let check = window.add_widget(None, "CheckBox", "opt");
        check.set_selected(true);
        check.set_enabled(false);
        let element = automation
            .find_native_element(view_id, Locator::Name, "opt")
            .unwrap();

        assert!(automation.is_native_element_selected(view_id, &element).unwrap());
        assert!(!automation.is_native_element_enabled(view_id, &element).unwrap());
    }

    #[tokio::test]
    async fn test_property_lookup() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let widget = window.add_widget(None, "Slider", "vol");
        widget.set_property("maximum", json!(11));
        let element = automation
            .find_native_element(view_id, Locator::Name, "vol")
            .unwrap();

        assert_eq!(
            automation
                .get_native_element_property(view_id, &element, "maximum")
                .unwrap(),
            json!(11)
        );
        let err = automation
            .get_native_element_property(view_id, &element, "minimum")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_element_equality() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let submit = window.add_widget(None, "PushButton", "submit");
        submit.set_text("Submit");
        window.add_widget(None, "PushButton", "other");

        let by_name = automation
            .find_native_element(view_id, Locator::Name, "submit")
            .unwrap();
        let by_text = automation
            .find_native_element(view_id, Locator::Text, "Submit")
            .unwrap();
        let other = automation
            .find_native_element(view_id, Locator::Name, "other")
            .unwrap();

        assert!(automation.native_element_equals(view_id, &by_name, &by_text).unwrap());
        assert!(!automation.native_element_equals(view_id, &by_name, &other).unwrap());
    }

    #[tokio::test]
    async fn test_clear_editable_element() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let field = window.add_widget(None, "LineEdit", "user");
        field.set_editable(true);
        field.set_text("alice");
        window.add_widget(None, "Label", "hint");
        let field_id = automation
            .find_native_element(view_id, Locator::Name, "user")
            .unwrap();
        let label_id = automation
            .find_native_element(view_id, Locator::Name, "hint")
            .unwrap();

        automation.clear_native_element(view_id, &field_id).unwrap();
        assert_eq!(field.text(), "");

        let err = automation
            .clear_native_element(view_id, &label_id)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_native_source() {
        let (_toolkit, automation, view_id, window) = boot().await;
        let err = automation.get_native_source(view_id).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let view = window.add_widget(None, "WebView", "content");
        view.set_web_source("<html><body>Hi</body></html>");
        assert_eq!(
            automation.get_native_source(view_id).unwrap(),
            "<html><body>Hi</body></html>"
        );
    }

    #[tokio::test]
    async fn test_serialize_view_tree_document() {
        let (_toolkit, automation, view_id, window) = boot().await;
        window.add_widget(None, "Form", "login");

        let doc = automation.serialize_view_tree(view_id, false).unwrap();
        assert_eq!(doc["class"], "Window");
        assert_eq!(doc["children"][0]["name"], "login");
    }
}
