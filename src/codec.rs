//! Image codec boundary.
//!
//! `ImageCodec` is the decode/encode capability the producer depends on:
//! decode a source path into an `ImageBuffer` once at arm time, and encode
//! the held buffer into JPEG/PNG payloads on demand. Implementations report
//! every failure as an error (missing file, unreadable format, empty result)
//! so the caller can gate its lifecycle on them.

use anyhow::{bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageReader};

use crate::frame::{ColorFormat, ImageBuffer, RGB_CHANNELS};
use crate::pack;

pub trait ImageCodec {
    /// Decode the image at `path` into a packed 8-bit, 3-channel buffer.
    fn decode(&self, path: &str) -> Result<ImageBuffer>;

    /// Encode `image` as `format`. `quality` is the JPEG quality (0-100)
    /// or the PNG compression level (0-9).
    fn encode(&self, image: &ImageBuffer, format: ColorFormat, quality: u8) -> Result<Vec<u8>>;
}

/// Production codec backed by the `image` crate (BMP/JPEG/PNG decode,
/// JPEG/PNG encode).
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageRsCodec;

impl ImageRsCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ImageCodec for ImageRsCodec {
    fn decode(&self, path: &str) -> Result<ImageBuffer> {
        let reader = ImageReader::open(path)
            .with_context(|| format!("load: cannot open image file {}", path))?
            .with_guessed_format()
            .with_context(|| format!("load: cannot probe image file {}", path))?;
        let decoded = reader
            .decode()
            .with_context(|| format!("load: cannot decode image file {}", path))?;
        log::debug!("decoded {} as {:?}", path, decoded.color());

        // Normalize whatever layout the decoder produced to packed 8-bit RGB
        // rows; this is the one-time load-time channel normalization, so the
        // packer can copy rows without reordering.
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        let stride = width as usize * RGB_CHANNELS as usize;
        ImageBuffer::new(width, height, RGB_CHANNELS, stride, 8, rgb.into_raw())
    }

    fn encode(&self, image: &ImageBuffer, format: ColorFormat, quality: u8) -> Result<Vec<u8>> {
        let pixels = pack::pack_rows(image).context("encode: flatten pixel rows")?;
        let mut out = Vec::new();
        match format {
            ColorFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut out, quality);
                encoder
                    .write_image(&pixels, image.width, image.height, ExtendedColorType::Rgb8)
                    .context("encode: jpeg encoder")?;
            }
            ColorFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut out,
                    png_compression(quality),
                    FilterType::Adaptive,
                );
                encoder
                    .write_image(&pixels, image.width, image.height, ExtendedColorType::Rgb8)
                    .context("encode: png encoder")?;
            }
            ColorFormat::Rgb => bail!("encode: RGB is not an encoded container format"),
        }
        Ok(out)
    }
}

/// Bucket the numeric 0-9 level onto the image crate's compression presets.
fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_test_image() -> ImageBuffer {
        let data: Vec<u8> = (0..24).collect();
        ImageBuffer::new(4, 2, 3, 12, 8, data).unwrap()
    }

    #[test]
    fn decode_reports_missing_file() {
        let codec = ImageRsCodec::new();
        let err = codec.decode("/nonexistent/test.bmp").unwrap_err();
        assert!(err.to_string().contains("load:"));
    }

    #[test]
    fn decode_normalizes_to_three_channels() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("gray.png");
        // Grayscale source: decode must still hand back packed RGB rows.
        let gray = image::GrayImage::from_fn(5, 3, |x, y| image::Luma([(x + y) as u8]));
        gray.save(&path).expect("write fixture");

        let codec = ImageRsCodec::new();
        let image = codec.decode(path.to_str().unwrap()).unwrap();

        assert_eq!(image.width, 5);
        assert_eq!(image.height, 3);
        assert_eq!(image.channels, RGB_CHANNELS);
        assert_eq!(image.stride, 15);
        assert_eq!(image.bit_depth, 8);
        // Gray expands to equal R, G, B samples.
        assert_eq!(&image.row(1)[..6], &[1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn encode_rejects_raw_format() {
        let codec = ImageRsCodec::new();
        let image = tight_test_image();
        assert!(codec.encode(&image, ColorFormat::Rgb, 100).is_err());
    }

    #[test]
    fn encode_produces_container_bytes() {
        let codec = ImageRsCodec::new();
        let image = tight_test_image();

        let png = codec.encode(&image, ColorFormat::Png, 9).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let jpeg = codec.encode(&image, ColorFormat::Jpeg, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
