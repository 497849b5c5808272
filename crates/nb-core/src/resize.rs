//! Downscaling of the embedded image before upload.

use crate::error::Result;
use crate::models::DataUri;
use crate::traits::RasterSurface;

/// Bounds and encoder hint for [`resize_and_compress`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Passed to the encoder untouched. PNG output is lossless and ignores it.
    pub quality: f32,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
            quality: 0.7,
        }
    }
}

/// Target size for a `width`×`height` source.
///
/// Only the longer side is checked: width against `max_width` for landscape
/// sources, height against `max_height` otherwise. Sources already within
/// that bound keep their size. Fractional results are truncated, never
/// below one pixel.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let (w, h) = if width > height {
        if width > max_width {
            (max_width as f64, h * max_width as f64 / w)
        } else {
            (w, h)
        }
    } else if height > max_height {
        (w * max_height as f64 / h, max_height as f64)
    } else {
        (w, h)
    };
    ((w as u32).max(1), (h as u32).max(1))
}

/// Decodes an image data URI, shrinks it with [`fit_within`], and re-encodes
/// it as a PNG data URI.
pub async fn resize_and_compress(
    surface: &dyn RasterSurface,
    data_uri: &str,
    options: ResizeOptions,
) -> Result<DataUri> {
    let source = DataUri::parse(data_uri)?;
    let bytes = source.decode_bytes()?;
    let image = surface.decode_image(bytes).await?;

    let (width, height) = fit_within(
        image.width,
        image.height,
        options.max_width,
        options.max_height,
    );
    tracing::debug!(
        from_width = image.width,
        from_height = image.height,
        width,
        height,
        "resampling embedded image"
    );

    let png = surface.resample(image, width, height, options.quality).await?;
    Ok(DataUri::from_bytes("image/png", &png))
}
