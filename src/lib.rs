//! Webview Automation - WebDriver-style bridge for GUI-embedded web views.
//!
//! This library drives applications that embed a browser engine inside a
//! native widget toolkit. It resolves the identifiers a WebDriver remote
//! end hands out (views, native elements, frame paths) to live toolkit
//! objects and delegates the actual work to the host through a small set
//! of traits.
//!
//! # Architecture
//!
//! The crate sits between two worlds:
//!
//! - **Remote end**: speaks in stable, serializable identifiers
//!   ([`ViewId`], [`ElementId`], [`FramePath`])
//! - **Host toolkit**: exposes live windows, widgets, and web frames via
//!   the [`Toolkit`], [`WindowHandle`], [`WidgetNode`], and [`WebFrame`]
//!   traits
//!
//! Key design principles:
//!
//! - Identifiers are minted once per live object and stay stable until the
//!   object dies (idempotent minting)
//! - Invalidation is reactive: toolkit lifecycle events are drained at
//!   every operation boundary, never polled
//! - All waits are bounded; a hung page or dead widget surfaces as a
//!   [`Error::Timeout`] instead of a stuck caller
//! - Operations requiring newer embedded-browser builds are capability
//!   gated by the detected build number
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use webview_automation::toolkit::mock::MockToolkit;
//! use webview_automation::tree::query::Locator;
//! use webview_automation::{Automation, BrowserOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // In production the host application provides the Toolkit impl.
//!     let toolkit = Arc::new(MockToolkit::new());
//!     let (automation, view_id) =
//!         Automation::init(toolkit, BrowserOptions::new()).await?;
//!
//!     automation
//!         .navigate_to_url(view_id, "https://example.com")
//!         .await?;
//!     let button = automation.find_native_element(view_id, Locator::Name, "submit")?;
//!     println!("found {button}");
//!
//!     automation.terminate().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`automation`] | The operation facade: [`Automation`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`frames`] | Frame paths and frame-chain resolution |
//! | [`geometry`] | Points, sizes, rectangles |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`input`] | Semantic/native key and mouse event translation |
//! | [`notifier`] | Completion notifier for injected scripts |
//! | [`registry`] | View and element identity registry |
//! | [`session`] | Browser process launch, attach, and teardown |
//! | [`toolkit`] | Host toolkit traits and the in-memory mock |
//! | [`tree`] | UI tree snapshots and locator queries |

// ============================================================================
// Modules
// ============================================================================

/// The operation facade.
///
/// [`Automation`] gates each operation on the detected browser build,
/// resolves identifiers through the registry, and delegates to the
/// toolkit.
pub mod automation;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Frame paths and frame-chain resolution.
pub mod frames;

/// Points, sizes, and rectangles in view and screen coordinates.
pub mod geometry;

/// Type-safe identifiers for views, elements, and sessions.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Semantic key/mouse events and their native translations.
pub mod input;

/// Completion notifier handed to injected scripts.
pub mod notifier;

/// View and element identity registry.
pub mod registry;

/// Browser process launch, attach, and teardown.
pub mod session;

/// Host toolkit traits and the in-memory mock implementation.
pub mod toolkit;

/// UI tree snapshots and locator queries.
pub mod tree;

// ============================================================================
// Re-exports
// ============================================================================

// Facade types
pub use automation::{Automation, Timeouts, parse_build_number};

// Error types
pub use error::{Error, Result};

// Frame addressing
pub use frames::FramePath;

// Geometry types
pub use geometry::{Point, Rect, Size};

// Identifier types
pub use identifiers::{ElementId, SessionId, ViewId};

// Input types
pub use input::{
    KeyAction, KeyCode, KeyEvent, KeyMap, Modifiers, MouseAction, MouseButton, MouseEvent,
};

// Script completion
pub use notifier::ScriptNotifier;

// Registry
pub use registry::ViewRegistry;

// Session types
pub use session::{BrowserOptions, BrowserSession};

// Toolkit surface
pub use toolkit::{Cookie, Toolkit, ToolkitError, ToolkitEvent, WebFrame, WidgetNode, WindowHandle};
