//! # nb-raster-image
//!
//! `RasterSurface` backed by image-rs.
//! Decoding and resampling run on tokio's blocking pool; decoding is bounded
//! by a deadline so a bad source cannot stall a submit.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbaImage};
use nb_core::error::{NoticeError, Result};
use nb_core::models::DecodedImage;
use nb_core::traits::RasterSurface;
use std::io::Cursor;
use std::time::Duration;

/// oxipng preset used when PNG optimisation is on.
const OXIPNG_PRESET: u8 = 2;

pub struct ImageRasterSurface {
    decode_timeout: Duration,
    /// Run oxipng over the encoded PNG
    optimize_png: bool,
}

impl ImageRasterSurface {
    pub fn new(decode_timeout: Duration, optimize_png: bool) -> Self {
        Self {
            decode_timeout,
            optimize_png,
        }
    }
}

impl Default for ImageRasterSurface {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), false)
    }
}

#[async_trait]
impl RasterSurface for ImageRasterSurface {
    async fn decode_image(&self, bytes: Vec<u8>) -> Result<DecodedImage> {
        let task = tokio::task::spawn_blocking(move || decode_rgba(&bytes));

        match tokio::time::timeout(self.decode_timeout, task).await {
            Ok(Ok(decoded)) => decoded,
            Ok(Err(join)) => Err(NoticeError::ImageDecode(join.to_string())),
            Err(_) => {
                tracing::warn!(timeout = ?self.decode_timeout, "image decode abandoned");
                Err(NoticeError::DecodeTimeout(self.decode_timeout))
            }
        }
    }

    /// `quality` is not used: the output is always lossless PNG.
    async fn resample(
        &self,
        image: DecodedImage,
        width: u32,
        height: u32,
        _quality: f32,
    ) -> Result<Vec<u8>> {
        let optimize = self.optimize_png;
        tokio::task::spawn_blocking(move || {
            let png = encode_png(image, width, height)?;
            if optimize {
                optimize_png(&png)
            } else {
                Ok(png)
            }
        })
        .await
        .map_err(|e| NoticeError::ImageEncode(e.to_string()))?
    }
}

/// Decodes and applies the EXIF orientation, so the raster is upright.
fn decode_rgba(bytes: &[u8]) -> Result<DecodedImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| NoticeError::ImageDecode(e.to_string()))?
        .into_decoder()
        .map_err(|e| NoticeError::ImageDecode(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| NoticeError::ImageDecode(e.to_string()))?;
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| NoticeError::ImageDecode(e.to_string()))?;
    img.apply_orientation(orientation);

    let rgba = img.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// Draws the raster at `width`×`height` and encodes it as PNG.
fn encode_png(image: DecodedImage, width: u32, height: u32) -> Result<Vec<u8>> {
    let source = RgbaImage::from_raw(image.width, image.height, image.rgba).ok_or_else(|| {
        NoticeError::ImageEncode(format!(
            "pixel buffer does not match {}x{}",
            image.width, image.height
        ))
    })?;

    let target = if source.dimensions() == (width, height) {
        source
    } else {
        imageops::resize(&source, width, height, FilterType::Triangle)
    };

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(target)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| NoticeError::ImageEncode(e.to_string()))?;
    Ok(out.into_inner())
}

fn optimize_png(png: &[u8]) -> Result<Vec<u8>> {
    let options = oxipng::Options::from_preset(OXIPNG_PRESET);
    let optimized = oxipng::optimize_from_memory(png, &options)
        .map_err(|e| NoticeError::ImageEncode(e.to_string()))?;
    tracing::debug!(before = png.len(), after = optimized.len(), "optimized png");
    Ok(optimized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{GenericImageView, ImageEncoder, Rgba};
    use nb_core::models::DataUri;
    use nb_core::resize::{resize_and_compress, ResizeOptions};

    /// Little-endian TIFF block holding a single Orientation (0x0112) entry.
    fn exif_orientation(value: u8) -> Vec<u8> {
        let mut exif = vec![b'I', b'I', 42, 0, 8, 0, 0, 0, 1, 0];
        exif.extend_from_slice(&[0x12, 0x01, 3, 0, 1, 0, 0, 0, value, 0, 0, 0]);
        exif.extend_from_slice(&[0, 0, 0, 0]);
        exif
    }

    fn rotated_jpeg(width: u32, height: u32, orientation: u8) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
        let mut out = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, 90);
            encoder.set_exif_metadata(exif_orientation(orientation)).unwrap();
            encoder.encode_image(&rgb).unwrap();
        }
        out
    }

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let img = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn dimensions_of(png: &[u8]) -> (u32, u32) {
        image::load_from_memory_with_format(png, ImageFormat::Png)
            .unwrap()
            .dimensions()
    }

    #[tokio::test]
    async fn decodes_png_and_jpeg() {
        let surface = ImageRasterSurface::default();

        let png = surface.decode_image(encoded(40, 30, ImageFormat::Png)).await.unwrap();
        assert_eq!((png.width, png.height), (40, 30));
        assert_eq!(png.rgba.len(), 40 * 30 * 4);

        let jpeg = surface.decode_image(encoded(64, 48, ImageFormat::Jpeg)).await.unwrap();
        assert_eq!((jpeg.width, jpeg.height), (64, 48));
    }

    #[tokio::test]
    async fn garbage_is_a_decode_error() {
        let err = ImageRasterSurface::default()
            .decode_image(b"definitely not an image".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, NoticeError::ImageDecode(_)));
    }

    #[tokio::test]
    async fn exif_orientation_is_applied() {
        let surface = ImageRasterSurface::default();

        let upright = surface.decode_image(rotated_jpeg(64, 48, 1)).await.unwrap();
        assert_eq!((upright.width, upright.height), (64, 48));

        let quarter = surface.decode_image(rotated_jpeg(64, 48, 6)).await.unwrap();
        assert_eq!((quarter.width, quarter.height), (48, 64));

        let three_quarter = surface.decode_image(rotated_jpeg(64, 48, 8)).await.unwrap();
        assert_eq!((three_quarter.width, three_quarter.height), (48, 64));
    }

    #[tokio::test]
    async fn sideways_photo_is_bounded_as_portrait() {
        let source = DataUri::from_bytes("image/jpeg", &rotated_jpeg(1600, 1200, 6));
        let surface = ImageRasterSurface::default();

        let out = resize_and_compress(&surface, &source.to_string(), ResizeOptions::default())
            .await
            .unwrap();

        assert_eq!(dimensions_of(&out.decode_bytes().unwrap()), (450, 600));
    }

    #[tokio::test]
    async fn slow_decode_hits_the_deadline() {
        let surface = ImageRasterSurface::new(Duration::from_millis(1), false);
        let big = encoded(3000, 3000, ImageFormat::Png);

        let err = surface.decode_image(big).await.unwrap_err();
        assert!(matches!(err, NoticeError::DecodeTimeout(d) if d == Duration::from_millis(1)));
    }

    #[tokio::test]
    async fn resample_outputs_png_at_requested_size() {
        let surface = ImageRasterSurface::default();
        let decoded = surface.decode_image(encoded(160, 120, ImageFormat::Png)).await.unwrap();

        let png = surface.resample(decoded, 80, 60, 0.7).await.unwrap();
        assert_eq!(dimensions_of(&png), (80, 60));
    }

    #[tokio::test]
    async fn mismatched_buffer_is_an_encode_error() {
        let bogus = DecodedImage {
            width: 10,
            height: 10,
            rgba: vec![0; 12],
        };
        let err = ImageRasterSurface::default()
            .resample(bogus, 5, 5, 0.7)
            .await
            .unwrap_err();
        assert!(matches!(err, NoticeError::ImageEncode(_)));
    }

    #[tokio::test]
    async fn optimized_output_is_still_a_valid_png() {
        let surface = ImageRasterSurface::new(Duration::from_secs(10), true);
        let decoded = surface.decode_image(encoded(64, 64, ImageFormat::Png)).await.unwrap();

        let png = surface.resample(decoded, 32, 32, 0.7).await.unwrap();
        assert_eq!(dimensions_of(&png), (32, 32));
    }

    #[tokio::test]
    async fn oversized_upload_is_shrunk_to_bounds() {
        let source = DataUri::from_bytes("image/png", &encoded(1600, 1200, ImageFormat::Png));
        let surface = ImageRasterSurface::default();

        let out = resize_and_compress(&surface, &source.to_string(), ResizeOptions::default())
            .await
            .unwrap();

        assert_eq!(out.mime(), "image/png");
        assert_eq!(dimensions_of(&out.decode_bytes().unwrap()), (800, 600));
    }

    #[tokio::test]
    async fn small_upload_keeps_its_size() {
        let source = DataUri::from_bytes("image/jpeg", &encoded(400, 300, ImageFormat::Jpeg));
        let surface = ImageRasterSurface::default();

        let out = resize_and_compress(&surface, &source.to_string(), ResizeOptions::default())
            .await
            .unwrap();

        assert_eq!(dimensions_of(&out.decode_bytes().unwrap()), (400, 300));
    }
}
