//! Frame assembly.

use anyhow::{ensure, Result};

use crate::codec::ImageCodec;
use crate::frame::{CalibrationBlock, ColorFormat, FrameRecord, ImageBuffer, Timestamp};
use crate::pack::ColorPacker;

/// Assembles one complete `FrameRecord` per tick: capture timestamp, zeroed
/// calibration block, image geometry, format tag, packed payload.
#[derive(Clone, Copy, Debug)]
pub struct FrameBuilder {
    packer: ColorPacker,
}

impl FrameBuilder {
    pub fn new(format: ColorFormat, compression_ratio: u8) -> Result<Self> {
        Ok(Self {
            packer: ColorPacker::new(format, compression_ratio)?,
        })
    }

    pub fn format(&self) -> ColorFormat {
        self.packer.format()
    }

    /// Build one frame from the armed session's image.
    ///
    /// The returned record is internally consistent: for `Rgb` the payload
    /// length equals width * height * channels exactly; for `Jpeg`/`Png` it
    /// is whatever the encoder produced, never empty.
    pub fn build(
        &self,
        codec: &dyn ImageCodec,
        image: &ImageBuffer,
        timestamp: Timestamp,
    ) -> Result<FrameRecord> {
        let payload = self.packer.pack(codec, image)?;
        if self.packer.format() == ColorFormat::Rgb {
            let expected = image.row_bytes() * image.height as usize;
            ensure!(
                payload.len() == expected,
                "pack: rgb payload of {} bytes, geometry {}x{}x{} requires {}",
                payload.len(),
                image.width,
                image.height,
                image.channels,
                expected
            );
        }
        Ok(FrameRecord::new(
            timestamp,
            CalibrationBlock::zeroed(),
            image.width,
            image.height,
            self.packer.format(),
            payload,
        ))
    }
}
