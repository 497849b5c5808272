//! # Core Traits (Ports)
//!
//! Capabilities the composer needs from its surroundings. Any plugin must
//! implement these traits to be wired in by the binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DecodedImage, ImageElement, NoticeItem, NoticeNo, NoticePayload, Route};

#[cfg(test)]
use mockall::automock;

/// HTML fragment inspection.
#[cfg_attr(test, automock)]
pub trait MarkupParser: Send + Sync {
    /// Locates the first `<img>` element of the fragment, in document order.
    fn first_image(&self, html: &str) -> Option<ImageElement>;
}

/// Off-screen raster surface: decode, redraw at a new size, encode.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RasterSurface: Send + Sync {
    /// Decodes encoded image bytes (PNG, JPEG, GIF, ...) into RGBA.
    async fn decode_image(&self, bytes: Vec<u8>) -> Result<DecodedImage>;

    /// Draws `image` onto a `width`×`height` surface and returns it as PNG bytes.
    ///
    /// `quality` is an encoder hint in `0.0..=1.0`; lossless encoders may ignore it.
    async fn resample(
        &self,
        image: DecodedImage,
        width: u32,
        height: u32,
        quality: f32,
    ) -> Result<Vec<u8>>;
}

/// The notice backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NoticeApi: Send + Sync {
    /// Stores a notice and returns the number it was filed under.
    async fn insert_notice(&self, payload: &NoticePayload) -> Result<NoticeNo>;
    async fn list_notices(&self) -> Result<Vec<NoticeItem>>;
    async fn get_notice(&self, no: &NoticeNo) -> Result<NoticeItem>;
}

/// Moves the user between views.
#[cfg_attr(test, automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Blocking dialogs shown to the user.
#[cfg_attr(test, automock)]
pub trait Dialog: Send + Sync {
    fn alert(&self, message: &str);
    /// Returns `true` when the user accepts.
    fn confirm(&self, message: &str) -> bool;
}
