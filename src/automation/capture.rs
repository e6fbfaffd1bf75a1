//! Page capture.

// ============================================================================
// Imports
// ============================================================================

use std::io::Cursor;

use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::ViewId;

use super::Automation;

// ============================================================================
// Automation - Capture
// ============================================================================

impl Automation {
    /// Captures the entire page of a view and encodes it as PNG.
    ///
    /// The toolkit hands over tightly-packed RGBA8 pixels covering the
    /// whole document, not just the visible viewport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchWindow`] for an unknown view and
    /// [`Error::InvalidArgument`] when the pixel buffer does not match the
    /// reported dimensions.
    pub fn capture_entire_page_as_png(&self, view_id: ViewId) -> Result<Vec<u8>> {
        let window = self.window(view_id)?;
        let (pixels, size) = window
            .capture_page()
            .map_err(|e| Self::view_fault(e, view_id))?;
        debug!(%view_id, width = size.width, height = size.height, "Captured page");

        let image = image::RgbaImage::from_raw(size.width, size.height, pixels)
            .ok_or_else(|| Error::invalid_argument("capture buffer does not match dimensions"))?;
        let mut output = Cursor::new(Vec::new());
        image
            .write_to(&mut output, image::ImageFormat::Png)
            .map_err(|e| Error::invalid_argument(format!("PNG encoding failed: {e}")))?;
        Ok(output.into_inner())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::automation::tests::boot;
    use crate::error::Error;
    use crate::geometry::Rect;
    use crate::identifiers::ViewId;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[tokio::test]
    async fn test_capture_produces_decodable_png() {
        let (_toolkit, automation, view_id, window) = boot().await;
        window.set_capture_fill([10, 20, 30, 255]);

        let png = automation.capture_entire_page_as_png(view_id).unwrap();
        assert_eq!(&png[..8], &PNG_MAGIC[..]);

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.width(), 800);
        assert_eq!(decoded.height(), 600);
        assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[tokio::test]
    async fn test_capture_follows_window_bounds() {
        let (_toolkit, automation, view_id, _window) = boot().await;
        automation
            .set_view_bounds(view_id, Rect::new(0, 0, 32, 16))
            .unwrap();

        let png = automation.capture_entire_page_as_png(view_id).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 16);
    }

    #[tokio::test]
    async fn test_capture_unknown_view() {
        let (_toolkit, automation, _view, _window) = boot().await;
        let err = automation
            .capture_entire_page_as_png(ViewId::new(4096))
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchWindow { .. }));
    }
}
