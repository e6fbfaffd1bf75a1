//! Frame paths and frame resolution.
//!
//! A [`FramePath`] describes the descent from a view's root document to a
//! target frame, one selector segment per nesting level; the empty path is
//! the root frame itself.
//!
//! Resolution walks the path segment by segment. Each segment is tried
//! structurally first (a child frame with a matching name, then a numeric
//! sibling index), and only if both fail does the resolver fall back to
//! scanning descendant frames for a previously injected marker. The marker
//! fallback lets a tagged frame stay resolvable after its position in the
//! sibling list shifts.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::toolkit::FrameRef;

// ============================================================================
// FramePath
// ============================================================================

/// Ordered frame-selector segments from a view's root frame downward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FramePath {
    segments: Vec<String>,
}

impl FramePath {
    /// The root frame (empty path).
    #[inline]
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Creates a path from selector segments.
    #[must_use]
    pub fn new(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a copy with one more segment appended.
    #[must_use]
    pub fn descend(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns `true` for the root frame.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The selector segments in descent order.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment, if any.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for FramePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FramePath {
    type Err = Error;

    /// Parses `a/b/c` or `/a/b/c`; the empty string is the root frame.
    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<String> = s
            .split('/')
            .filter(|part| !part.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Ok(Self { segments })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolves a frame path starting at a view's root frame.
///
/// # Errors
///
/// Returns [`Error::NoSuchFrame`] naming the first segment that no
/// strategy can resolve.
pub fn resolve_frame(root: &FrameRef, path: &FramePath) -> Result<FrameRef> {
    let mut current = root.clone();

    for segment in path.segments() {
        let next = resolve_segment(&current, segment)
            .ok_or_else(|| Error::no_such_frame(segment.clone()))?;
        current = next;
    }

    Ok(current)
}

/// Resolves one segment against the current frame.
///
/// Structural strategies (name, then sibling index) are authoritative; the
/// marker scan only runs after both fail.
fn resolve_segment(current: &FrameRef, segment: &str) -> Option<FrameRef> {
    let children = current.child_frames();

    if let Some(by_name) = children
        .iter()
        .find(|frame| !segment.is_empty() && frame.frame_name() == segment)
    {
        return Some(by_name.clone());
    }

    if let Ok(index) = segment.parse::<usize>()
        && let Some(by_index) = children.get(index)
    {
        return Some(by_index.clone());
    }

    find_by_marker(current, segment)
}

/// Depth-first scan of descendant frames for an injected marker.
fn find_by_marker(current: &FrameRef, segment: &str) -> Option<FrameRef> {
    for child in current.child_frames() {
        if child.marker().as_deref() == Some(segment) {
            debug!(segment, "Frame resolved via injected marker");
            return Some(child);
        }
        if let Some(found) = find_by_marker(&child, segment) {
            return Some(found);
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::toolkit::mock::MockFrame;

    fn frame_tree() -> FrameRef {
        // root -> [A, B]; B -> [C]
        let root = MockFrame::new("");
        root.add_child_frame("A");
        let b = root.add_child_frame("B");
        b.add_child_frame("C");
        let root: FrameRef = root;
        root
    }

    #[test]
    fn test_path_display_and_parse() {
        let path: FramePath = "B/C".parse().unwrap();
        assert_eq!(path.segments(), ["B", "C"]);
        assert_eq!(path.to_string(), "/B/C");
        assert_eq!("".parse::<FramePath>().unwrap(), FramePath::root());
    }

    #[test]
    fn test_empty_path_resolves_to_root() {
        let root = frame_tree();
        let resolved = resolve_frame(&root, &FramePath::root()).unwrap();
        assert_eq!(resolved.frame_name(), "");
    }

    #[test]
    fn test_resolve_by_name_path() {
        let root = frame_tree();
        let resolved = resolve_frame(&root, &FramePath::new(["B", "C"])).unwrap();
        assert_eq!(resolved.frame_name(), "C");
    }

    #[test]
    fn test_resolve_by_index() {
        let root = frame_tree();
        let resolved = resolve_frame(&root, &FramePath::new(["1"])).unwrap();
        assert_eq!(resolved.frame_name(), "B");
    }

    #[test]
    fn test_unresolvable_segment_is_named() {
        let root = frame_tree();
        let err = resolve_frame(&root, &FramePath::new(["B", "missing"]))
            .err()
            .unwrap();
        match err {
            Error::NoSuchFrame { segment } => assert_eq!(segment, "missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_marker_survives_position_shift() {
        let root = MockFrame::new("");
        root.add_child_frame("first");
        let second = root.add_child_frame("second");
        second.set_marker("wd-tag-7");
        let root_ref: FrameRef = root.clone();

        // Resolvable by marker while second in the sibling list.
        let resolved = resolve_frame(&root_ref, &FramePath::new(["wd-tag-7"])).unwrap();
        assert_eq!(resolved.frame_name(), "second");

        // Move the tagged frame to the front; the marker still finds it.
        root.move_child_frame_to_front("second");
        let resolved = resolve_frame(&root_ref, &FramePath::new(["wd-tag-7"])).unwrap();
        assert_eq!(resolved.frame_name(), "second");
    }

    #[test]
    fn test_structural_match_wins_over_marker() {
        let root = MockFrame::new("");
        root.add_child_frame("checkout");
        let tagged = root.add_child_frame("decoy");
        tagged.set_marker("checkout");

        let root_ref: FrameRef = root;
        let resolved = resolve_frame(&root_ref, &FramePath::new(["checkout"])).unwrap();
        assert_eq!(resolved.frame_name(), "checkout");
    }
}
