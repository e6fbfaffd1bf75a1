//! Cookie store operations.
//!
//! Cookies are scoped to a URL rather than to the view's current page, so
//! a caller can manage the store for origins it is about to navigate to.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ViewId;
use crate::toolkit::Cookie;

use super::Automation;

// ============================================================================
// Automation - Cookies
// ============================================================================

impl Automation {
    /// Cookies visible to `url` in the given view's cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unparseable URL and
    /// [`Error::NoSuchWindow`] for an unknown view.
    pub fn get_cookies(&self, view_id: ViewId, url: &str) -> Result<Vec<Cookie>> {
        let url = parse_cookie_url(url)?;
        let window = self.window(view_id)?;
        window
            .cookies(url.as_str())
            .map_err(|e| Self::view_fault(e, view_id))
    }

    /// Stores a cookie for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unparseable URL and
    /// [`Error::NoSuchWindow`] for an unknown view.
    pub fn set_cookie(&self, view_id: ViewId, url: &str, cookie: Cookie) -> Result<()> {
        let url = parse_cookie_url(url)?;
        debug!(%view_id, url = %url, name = %cookie.name, "Setting cookie");
        let window = self.window(view_id)?;
        window
            .set_cookie(url.as_str(), cookie)
            .map_err(|e| Self::view_fault(e, view_id))
    }

    /// Deletes the named cookie for `url`. Deleting a cookie that does not
    /// exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unparseable URL and
    /// [`Error::NoSuchWindow`] for an unknown view.
    pub fn delete_cookie(&self, view_id: ViewId, url: &str, name: &str) -> Result<()> {
        let url = parse_cookie_url(url)?;
        debug!(%view_id, url = %url, name, "Deleting cookie");
        let window = self.window(view_id)?;
        window
            .delete_cookie(url.as_str(), name)
            .map_err(|e| Self::view_fault(e, view_id))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_cookie_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::invalid_argument(format!("invalid URL {url:?}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::automation::tests::boot;
    use crate::error::Error;
    use crate::toolkit::Cookie;

    const URL: &str = "https://example.com/";

    #[tokio::test]
    async fn test_set_and_get_cookies() {
        let (_toolkit, automation, view_id, _window) = boot().await;

        automation
            .set_cookie(view_id, URL, Cookie::new("session", "abc"))
            .unwrap();
        automation
            .set_cookie(view_id, URL, Cookie::new("theme", "dark"))
            .unwrap();

        let cookies = automation.get_cookies(view_id, URL).unwrap();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.name == "session" && c.value == "abc"));
    }

    #[tokio::test]
    async fn test_set_cookie_replaces_same_name() {
        let (_toolkit, automation, view_id, _window) = boot().await;

        automation
            .set_cookie(view_id, URL, Cookie::new("session", "abc"))
            .unwrap();
        automation
            .set_cookie(view_id, URL, Cookie::new("session", "def"))
            .unwrap();

        let cookies = automation.get_cookies(view_id, URL).unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "def");
    }

    #[tokio::test]
    async fn test_delete_cookie() {
        let (_toolkit, automation, view_id, _window) = boot().await;

        automation
            .set_cookie(view_id, URL, Cookie::new("session", "abc"))
            .unwrap();
        automation.delete_cookie(view_id, URL, "session").unwrap();
        assert!(automation.get_cookies(view_id, URL).unwrap().is_empty());

        // Deleting again is a no-op, not an error.
        automation.delete_cookie(view_id, URL, "session").unwrap();
    }

    #[tokio::test]
    async fn test_cookie_urls_are_validated() {
        let (_toolkit, automation, view_id, _window) = boot().await;

        let err = automation.get_cookies(view_id, "not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let err = automation
            .set_cookie(view_id, "%%", Cookie::new("a", "b"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_cookies_are_scoped_per_url() {
        let (_toolkit, automation, view_id, _window) = boot().await;

        automation
            .set_cookie(view_id, "https://a.example/", Cookie::new("x", "1"))
            .unwrap();
        assert!(
            automation
                .get_cookies(view_id, "https://b.example/")
                .unwrap()
                .is_empty()
        );
    }
}
