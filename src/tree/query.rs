//! Locator strategies and the structural query evaluator.
//!
//! Attribute strategies (`name`, `class name`, `text`) compare a single
//! snapshot attribute against the query string. The `xpath` strategy
//! evaluates a structural subset against the snapshot:
//!
//! | Form             | Meaning                                  |
//! |------------------|------------------------------------------|
//! | `/Tag`           | child step with a class-name test        |
//! | `//Tag`          | descendant-or-self step                  |
//! | `*`              | any class name                           |
//! | `[@attr='v']`    | attribute-equality predicate             |
//! | `[n]`            | 1-based positional predicate             |
//!
//! Results come back in document order, without duplicates.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::tree::UiNode;

// ============================================================================
// Locator
// ============================================================================

/// Locator strategy carried by element-query commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Object-name attribute equality.
    Name,
    /// Class-name attribute equality.
    ClassName,
    /// Visible-text equality.
    Text,
    /// Structural path query.
    XPath,
}

impl Locator {
    /// Wire name of the strategy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Locator::Name => "name",
            Locator::ClassName => "class name",
            Locator::Text => "text",
            Locator::XPath => "xpath",
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(Locator::Name),
            "class name" | "class" => Ok(Locator::ClassName),
            "text" | "link text" => Ok(Locator::Text),
            "xpath" => Ok(Locator::XPath),
            other => Err(Error::invalid_argument(format!(
                "unknown locator strategy: {other:?}"
            ))),
        }
    }
}

// ============================================================================
// Query entry points
// ============================================================================

/// Evaluates a locator query against a snapshot, in document order.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when an `xpath` query is malformed.
pub fn query(tree: &UiNode, locator: Locator, query: &str) -> Result<Vec<ElementId>> {
    match locator {
        Locator::Name => Ok(match_attribute(tree, "name", query)),
        Locator::ClassName => Ok(match_attribute(tree, "class", query)),
        Locator::Text => Ok(match_attribute(tree, "text", query)),
        Locator::XPath => {
            let steps = parse_path(query)?;
            Ok(evaluate_path(tree, &steps))
        }
    }
}

/// First match of a query.
///
/// # Errors
///
/// Returns [`Error::ElementNotFound`] when nothing matches.
pub fn find_one(tree: &UiNode, locator: Locator, q: &str) -> Result<ElementId> {
    query(tree, locator, q)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::element_not_found(locator.as_str(), q))
}

fn match_attribute(tree: &UiNode, attr: &str, wanted: &str) -> Vec<ElementId> {
    let mut out = Vec::new();
    tree.walk(&mut |node| {
        if node.attr(attr).as_deref() == Some(wanted) {
            out.push(node.key);
        }
    });
    out
}

// ============================================================================
// Path parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// `[@attr='value']`
    Attribute { name: String, value: String },
    /// `[n]`, 1-based among the nodes the step selected under one parent.
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    /// Class-name test; `None` for `*`.
    tag: Option<String>,
    predicates: Vec<Predicate>,
}

fn parse_path(path: &str) -> Result<Vec<Step>> {
    if !path.starts_with('/') {
        return Err(Error::invalid_argument(format!(
            "xpath query must start with '/': {path:?}"
        )));
    }

    let mut steps = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        let axis = if let Some(after) = rest.strip_prefix("//") {
            rest = after;
            Axis::DescendantOrSelf
        } else if let Some(after) = rest.strip_prefix('/') {
            rest = after;
            Axis::Child
        } else {
            return Err(Error::invalid_argument(format!(
                "malformed xpath step near {rest:?}"
            )));
        };

        let end = rest.find('/').unwrap_or(rest.len());
        let (segment, remainder) = rest.split_at(end);
        rest = remainder;
        if segment.is_empty() {
            return Err(Error::invalid_argument("empty xpath step"));
        }
        steps.push(parse_step(axis, segment)?);
    }
    Ok(steps)
}

fn parse_step(axis: Axis, segment: &str) -> Result<Step> {
    let name_end = segment.find('[').unwrap_or(segment.len());
    let (name, mut rest) = segment.split_at(name_end);
    if name.is_empty() {
        return Err(Error::invalid_argument(format!(
            "xpath step has no node test: {segment:?}"
        )));
    }
    let tag = if name == "*" {
        None
    } else {
        Some(name.to_string())
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let close = rest.find(']').ok_or_else(|| {
            Error::invalid_argument(format!("unterminated predicate in {segment:?}"))
        })?;
        let body = &rest[1..close];
        rest = &rest[close + 1..];
        predicates.push(parse_predicate(body)?);
    }

    Ok(Step {
        axis,
        tag,
        predicates,
    })
}

fn parse_predicate(body: &str) -> Result<Predicate> {
    if let Some(attr) = body.strip_prefix('@') {
        let eq = attr
            .find('=')
            .ok_or_else(|| Error::invalid_argument(format!("predicate missing '=': {body:?}")))?;
        let name = attr[..eq].trim();
        let value = attr[eq + 1..].trim();
        let unquoted = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
            .ok_or_else(|| {
                Error::invalid_argument(format!("predicate value must be quoted: {body:?}"))
            })?;
        Ok(Predicate::Attribute {
            name: name.to_string(),
            value: unquoted.to_string(),
        })
    } else {
        let index: usize = body.trim().parse().map_err(|_| {
            Error::invalid_argument(format!("predicate must be @attr='v' or an index: {body:?}"))
        })?;
        if index == 0 {
            return Err(Error::invalid_argument("xpath positions are 1-based"));
        }
        Ok(Predicate::Position(index))
    }
}

// ============================================================================
// Evaluation
// ============================================================================

fn evaluate_path(root: &UiNode, steps: &[Step]) -> Vec<ElementId> {
    // The root node acts as the document node: the first child step
    // selects among the root itself, matching how the serializer exposes
    // the window as the top of the document.
    let mut current: Vec<&UiNode> = vec![root];
    let mut first = true;
    for step in steps {
        let mut next: Vec<&UiNode> = Vec::new();
        for node in &current {
            let candidates: Vec<&UiNode> = match step.axis {
                Axis::Child if first => vec![node],
                Axis::Child => node.children.iter().collect(),
                Axis::DescendantOrSelf => {
                    let mut all = Vec::new();
                    node.walk(&mut |n| all.push(n));
                    all
                }
            };
            let mut selected: Vec<&UiNode> = candidates
                .into_iter()
                .filter(|n| step.tag.as_deref().is_none_or(|tag| n.class == tag))
                .collect();
            for predicate in &step.predicates {
                selected = apply_predicate(selected, predicate);
            }
            next.extend(selected);
        }
        next.dedup_by_key(|n| n.key);
        current = next;
        first = false;
    }
    current.into_iter().map(|n| n.key).collect()
}

fn apply_predicate<'a>(nodes: Vec<&'a UiNode>, predicate: &Predicate) -> Vec<&'a UiNode> {
    match predicate {
        Predicate::Attribute { name, value } => nodes
            .into_iter()
            .filter(|n| n.attr(name).as_deref() == Some(value.as_str()))
            .collect(),
        Predicate::Position(index) => nodes
            .into_iter()
            .nth(index - 1)
            .map_or_else(Vec::new, |n| vec![n]),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::registry::ViewRegistry;
    use crate::toolkit::WindowRef;
    use crate::toolkit::mock::MockToolkit;
    use crate::tree::serialize_subtree;

    fn fixture() -> UiNode {
        let toolkit = MockToolkit::new();
        let window = toolkit.add_window("main");
        let form = window.add_widget(None, "Form", "login");
        let user = window.add_widget(Some(&form), "LineEdit", "username");
        user.set_text("alice");
        let pass = window.add_widget(Some(&form), "LineEdit", "password");
        pass.set_text("");
        let submit = window.add_widget(Some(&form), "PushButton", "submit");
        submit.set_text("Sign in");
        let footer = window.add_widget(None, "Label", "footer");
        footer.set_text("Sign in");

        let registry = ViewRegistry::new();
        let window: WindowRef = window;
        let view_id = registry.register_view(&window);
        serialize_subtree(&registry, view_id, &window.root_widget(), false).unwrap()
    }

    fn key_of(tree: &UiNode, name: &str) -> ElementId {
        let mut found = None;
        tree.walk(&mut |n| {
            if n.name == name {
                found = Some(n.key);
            }
        });
        found.unwrap()
    }

    #[test]
    fn test_locator_from_str() {
        assert_eq!("name".parse::<Locator>().unwrap(), Locator::Name);
        assert_eq!("class name".parse::<Locator>().unwrap(), Locator::ClassName);
        assert_eq!("xpath".parse::<Locator>().unwrap(), Locator::XPath);
        assert!("css selector".parse::<Locator>().is_err());
    }

    #[test]
    fn test_name_locator() {
        let tree = fixture();
        let hits = query(&tree, Locator::Name, "password").unwrap();
        assert_eq!(hits, vec![key_of(&tree, "password")]);
    }

    #[test]
    fn test_class_locator_in_document_order() {
        let tree = fixture();
        let hits = query(&tree, Locator::ClassName, "LineEdit").unwrap();
        assert_eq!(
            hits,
            vec![key_of(&tree, "username"), key_of(&tree, "password")]
        );
    }

    #[test]
    fn test_text_locator_matches_all() {
        let tree = fixture();
        let hits = query(&tree, Locator::Text, "Sign in").unwrap();
        assert_eq!(hits, vec![key_of(&tree, "submit"), key_of(&tree, "footer")]);
    }

    #[test]
    fn test_xpath_child_steps() {
        let tree = fixture();
        let hits = query(&tree, Locator::XPath, "/Window/Form/PushButton").unwrap();
        assert_eq!(hits, vec![key_of(&tree, "submit")]);
    }

    #[test]
    fn test_xpath_descendant_step() {
        let tree = fixture();
        let hits = query(&tree, Locator::XPath, "//LineEdit").unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_xpath_attribute_predicate() {
        let tree = fixture();
        let hits = query(&tree, Locator::XPath, "//LineEdit[@name='password']").unwrap();
        assert_eq!(hits, vec![key_of(&tree, "password")]);
    }

    #[test]
    fn test_xpath_positional_predicate() {
        let tree = fixture();
        let hits = query(&tree, Locator::XPath, "/Window/Form/LineEdit[2]").unwrap();
        assert_eq!(hits, vec![key_of(&tree, "password")]);
        assert!(
            query(&tree, Locator::XPath, "/Window/Form/LineEdit[9]")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_xpath_wildcard() {
        let tree = fixture();
        let hits = query(&tree, Locator::XPath, "/Window/Form/*").unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_xpath_malformed() {
        let tree = fixture();
        assert!(query(&tree, Locator::XPath, "Form").is_err());
        assert!(query(&tree, Locator::XPath, "//Form[@name]").is_err());
        assert!(query(&tree, Locator::XPath, "//Form[0]").is_err());
        assert!(query(&tree, Locator::XPath, "//Form[@name='x'").is_err());
    }

    #[test]
    fn test_find_one() {
        let tree = fixture();
        assert_eq!(
            find_one(&tree, Locator::Name, "footer").unwrap(),
            key_of(&tree, "footer")
        );
        let err = find_one(&tree, Locator::Name, "missing").unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { .. }));
    }
}
