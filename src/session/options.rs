//! Browser launch and attach options.
//!
//! Configures how a session reaches the embedding application: spawning a
//! process from a binary, attaching to an already-running instance over a
//! named channel, or driving a toolkit handed in directly (the default,
//! used by embedders and the test suite).
//!
//! # Example
//!
//! ```ignore
//! use webview_automation::BrowserOptions;
//!
//! let options = BrowserOptions::new()
//!     .with_binary("/usr/bin/embedded-shell")
//!     .with_ignore_certificate_errors()
//!     .with_detach_process();
//!
//! let args = options.to_args();
//! // ["--ignore-certificate-errors", "--user-data-dir=..."]
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ============================================================================
// BrowserOptions
// ============================================================================

/// Session configuration options.
///
/// Controls how the browser process is reached and which arguments it is
/// launched with. Launch (`binary`) and attach (`channel_id`) are mutually
/// exclusive; with neither set the session drives the toolkit it was handed
/// without owning a process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Path to the embedding application binary. Set to launch a process.
    pub binary: Option<PathBuf>,

    /// Named channel of an already-running instance. Set to attach.
    pub channel_id: Option<String>,

    /// Profile/cache directory. A temporary directory is created when unset.
    pub user_data_dir: Option<PathBuf>,

    /// Leave the process running when the session terminates.
    pub detach_process: bool,

    /// Skip TLS certificate validation in the embedded engine.
    pub ignore_certificate_errors: bool,

    /// Create an initial window at init when the toolkit reports none.
    pub start_window: bool,

    /// View class used when creating windows, when the toolkit
    /// distinguishes several.
    pub view_class: Option<String>,

    /// Additional custom command-line arguments.
    pub extra_args: Vec<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl BrowserOptions {
    /// Creates a new options instance with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            binary: None,
            channel_id: None,
            user_data_dir: None,
            detach_process: false,
            ignore_certificate_errors: false,
            start_window: true,
            view_class: None,
            extra_args: Vec::new(),
        }
    }

    /// Creates options that attach to a running instance.
    #[inline]
    #[must_use]
    pub fn attach(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BrowserOptions {
    /// Sets the binary to launch.
    #[inline]
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Sets the channel of a running instance to attach to.
    #[inline]
    #[must_use]
    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Sets an explicit user-data directory.
    #[inline]
    #[must_use]
    pub fn with_user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Leaves the process running at terminate.
    #[inline]
    #[must_use]
    pub fn with_detach_process(mut self) -> Self {
        self.detach_process = true;
        self
    }

    /// Skips TLS certificate validation.
    #[inline]
    #[must_use]
    pub fn with_ignore_certificate_errors(mut self) -> Self {
        self.ignore_certificate_errors = true;
        self
    }

    /// Suppresses initial window creation at init.
    #[inline]
    #[must_use]
    pub fn without_start_window(mut self) -> Self {
        self.start_window = false;
        self
    }

    /// Sets the view class for created windows.
    #[inline]
    #[must_use]
    pub fn with_view_class(mut self, view_class: impl Into<String>) -> Self {
        self.view_class = Some(view_class.into());
        self
    }

    /// Adds a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Adds multiple custom command-line arguments.
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl BrowserOptions {
    /// Converts options to process command-line arguments.
    ///
    /// The user-data directory argument is appended by the launcher, which
    /// knows the resolved path.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(2 + self.extra_args.len());

        if self.ignore_certificate_errors {
            args.push("--ignore-certificate-errors".to_string());
        }

        args.extend(self.extra_args.clone());
        args
    }

    /// Renders the user-data argument for a resolved directory.
    #[must_use]
    pub fn user_data_arg(dir: &Path) -> String {
        format!("--user-data-dir={}", dir.display())
    }

    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if launch and attach are both
    /// requested, or attach-only options carry launch-only settings.
    pub fn validate(&self) -> Result<()> {
        if self.binary.is_some() && self.channel_id.is_some() {
            return Err(Error::invalid_argument(
                "binary and channel_id are mutually exclusive",
            ));
        }
        if self.channel_id.is_some() && self.user_data_dir.is_some() {
            return Err(Error::invalid_argument(
                "user_data_dir has no effect when attaching to a running instance",
            ));
        }
        Ok(())
    }

    /// Returns `true` if the session should launch a process.
    #[inline]
    #[must_use]
    pub const fn is_launch(&self) -> bool {
        self.binary.is_some()
    }

    /// Returns `true` if the session should attach to a running instance.
    #[inline]
    #[must_use]
    pub const fn is_attach(&self) -> bool {
        self.channel_id.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_default() {
        let options = BrowserOptions::new();
        assert!(options.binary.is_none());
        assert!(options.channel_id.is_none());
        assert!(options.user_data_dir.is_none());
        assert!(!options.detach_process);
        assert!(!options.ignore_certificate_errors);
        assert!(options.start_window);
        assert!(options.extra_args.is_empty());
    }

    #[test]
    fn test_attach_constructor() {
        let options = BrowserOptions::attach("session-7");
        assert!(options.is_attach());
        assert!(!options.is_launch());
    }

    #[test]
    fn test_builder_chain() {
        let options = BrowserOptions::new()
            .with_binary("/opt/shell")
            .with_ignore_certificate_errors()
            .with_detach_process()
            .with_view_class("WebView");

        assert!(options.is_launch());
        assert!(options.ignore_certificate_errors);
        assert!(options.detach_process);
        assert_eq!(options.view_class.as_deref(), Some("WebView"));
    }

    #[test]
    fn test_to_args() {
        let options = BrowserOptions::new()
            .with_ignore_certificate_errors()
            .with_args(["--custom-a", "--custom-b"]);

        let args = options.to_args();
        assert!(args.contains(&"--ignore-certificate-errors".to_string()));
        assert!(args.contains(&"--custom-a".to_string()));
        assert!(args.contains(&"--custom-b".to_string()));
    }

    #[test]
    fn test_validate_rejects_launch_and_attach() {
        let options = BrowserOptions::new()
            .with_binary("/opt/shell")
            .with_channel_id("session-7");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_data_dir_on_attach() {
        let options = BrowserOptions::attach("session-7").with_user_data_dir("/tmp/profile");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_default_ok() {
        assert!(BrowserOptions::new().validate().is_ok());
    }
}
