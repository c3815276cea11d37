//! Payload packing and encoding strategies.
//!
//! `ColorPacker` turns the armed session's `ImageBuffer` into the outgoing
//! payload for the configured `ColorFormat`:
//! - `Rgb`: stride-stripping row copy, exactly width * height * channels bytes
//! - `Jpeg`/`Png`: delegate to the codec's encoder with parameters derived
//!   from the configured compression ratio

use anyhow::{bail, ensure, Context, Result};

use crate::codec::ImageCodec;
use crate::frame::{ColorFormat, ImageBuffer};

/// Upper bound of the `compression_ratio` configuration value.
pub const MAX_COMPRESSION_RATIO: u8 = 100;

/// Highest PNG compression level the codec accepts.
pub(crate) const MAX_PNG_LEVEL: u8 = 9;

/// Per-session packing strategy, fixed at arm time.
#[derive(Clone, Copy, Debug)]
pub struct ColorPacker {
    format: ColorFormat,
    compression_ratio: u8,
}

impl ColorPacker {
    pub fn new(format: ColorFormat, compression_ratio: u8) -> Result<Self> {
        ensure!(
            compression_ratio <= MAX_COMPRESSION_RATIO,
            "compression ratio {} out of range 0-{}",
            compression_ratio,
            MAX_COMPRESSION_RATIO
        );
        Ok(Self {
            format,
            compression_ratio,
        })
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// Produce the payload for one frame.
    ///
    /// Raw output performs no channel reordering: the channel order was
    /// normalized once at load time, so rows are copied verbatim.
    pub fn pack(&self, codec: &dyn ImageCodec, image: &ImageBuffer) -> Result<Vec<u8>> {
        match self.format {
            ColorFormat::Rgb => pack_rows(image),
            ColorFormat::Jpeg => {
                let bytes = codec
                    .encode(image, ColorFormat::Jpeg, self.compression_ratio)
                    .context("encode: jpeg")?;
                ensure!(!bytes.is_empty(), "encode: jpeg encoder produced no bytes");
                Ok(bytes)
            }
            ColorFormat::Png => {
                let level = png_compression_level(self.compression_ratio);
                log::debug!("png compression level: {}", level);
                let bytes = codec
                    .encode(image, ColorFormat::Png, level)
                    .context("encode: png")?;
                ensure!(!bytes.is_empty(), "encode: png encoder produced no bytes");
                Ok(bytes)
            }
        }
    }
}

/// Copy each row's tight prefix into a flat buffer, dropping stride padding.
pub(crate) fn pack_rows(image: &ImageBuffer) -> Result<Vec<u8>> {
    let row_bytes = image.row_bytes();
    if image.is_empty() || row_bytes == 0 {
        bail!("pack: image buffer is empty");
    }
    let mut packed = vec![0u8; row_bytes * image.height as usize];
    for row in 0..image.height {
        let start = row as usize * row_bytes;
        packed[start..start + row_bytes].copy_from_slice(image.row(row));
    }
    Ok(packed)
}

/// Map the 0-100 compression ratio onto the codec's 0-9 PNG level range.
pub(crate) fn png_compression_level(compression_ratio: u8) -> u8 {
    (compression_ratio / 10).min(MAX_PNG_LEVEL)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Records the parameters of the last encode call.
    struct RecordingCodec {
        last_quality: Cell<Option<u8>>,
        fail: bool,
    }

    impl RecordingCodec {
        fn new(fail: bool) -> Self {
            Self {
                last_quality: Cell::new(None),
                fail,
            }
        }
    }

    impl ImageCodec for RecordingCodec {
        fn decode(&self, _path: &str) -> Result<ImageBuffer> {
            bail!("not a decoder");
        }

        fn encode(
            &self,
            _image: &ImageBuffer,
            _format: ColorFormat,
            quality: u8,
        ) -> Result<Vec<u8>> {
            if self.fail {
                bail!("encoder rejected input");
            }
            self.last_quality.set(Some(quality));
            Ok(vec![0xAB; 7])
        }
    }

    fn padded_test_image() -> ImageBuffer {
        // 4x2 pixels, 3 channels, stride 16: 4 padding bytes per row.
        let mut data = vec![0xFFu8; 32];
        for (i, byte) in data.iter_mut().enumerate().take(12) {
            *byte = i as u8;
        }
        for (i, byte) in data.iter_mut().enumerate().skip(16).take(12) {
            *byte = i as u8;
        }
        ImageBuffer::new(4, 2, 3, 16, 8, data).unwrap()
    }

    #[test]
    fn rgb_pack_strips_row_padding() {
        let image = padded_test_image();
        let packer = ColorPacker::new(ColorFormat::Rgb, 100).unwrap();
        let codec = RecordingCodec::new(false);

        let payload = packer.pack(&codec, &image).unwrap();

        assert_eq!(payload.len(), 4 * 2 * 3);
        assert_eq!(&payload[..12], image.row(0));
        assert_eq!(&payload[12..], image.row(1));
        // padding bytes 12..16 of the raw storage never appear
        assert!(!payload.contains(&0xFF));
    }

    #[test]
    fn empty_buffer_is_an_error_not_an_empty_payload() {
        let image = ImageBuffer {
            width: 0,
            height: 0,
            channels: 3,
            stride: 0,
            bit_depth: 8,
            data: Vec::new(),
        };
        assert!(pack_rows(&image).is_err());
    }

    #[test]
    fn jpeg_pack_passes_ratio_as_quality() {
        let image = padded_test_image();
        let packer = ColorPacker::new(ColorFormat::Jpeg, 85).unwrap();
        let codec = RecordingCodec::new(false);

        let payload = packer.pack(&codec, &image).unwrap();

        assert_eq!(payload.len(), 7);
        assert_eq!(codec.last_quality.get(), Some(85));
    }

    #[test]
    fn png_pack_maps_ratio_to_level() {
        let image = padded_test_image();
        let packer = ColorPacker::new(ColorFormat::Png, 100).unwrap();
        let codec = RecordingCodec::new(false);

        packer.pack(&codec, &image).unwrap();

        assert_eq!(codec.last_quality.get(), Some(9));
    }

    #[test]
    fn png_level_mapping_divides_and_clamps() {
        assert_eq!(png_compression_level(0), 0);
        assert_eq!(png_compression_level(9), 0);
        assert_eq!(png_compression_level(10), 1);
        assert_eq!(png_compression_level(89), 8);
        assert_eq!(png_compression_level(95), 9);
        assert_eq!(png_compression_level(100), 9);
    }

    #[test]
    fn encoder_failure_propagates() {
        let image = padded_test_image();
        let packer = ColorPacker::new(ColorFormat::Jpeg, 100).unwrap();
        let codec = RecordingCodec::new(true);

        assert!(packer.pack(&codec, &image).is_err());
    }

    #[test]
    fn ratio_out_of_range_is_rejected() {
        assert!(ColorPacker::new(ColorFormat::Rgb, 101).is_err());
        assert!(ColorPacker::new(ColorFormat::Rgb, 100).is_ok());
    }
}
