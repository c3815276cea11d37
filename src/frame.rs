//! Frame data model.
//!
//! Value types shared across the production pipeline:
//!
//! - `ImageBuffer`: the decoded source image plus derived metadata
//! - `Timestamp`: capture time stamped onto every outgoing frame
//! - `CalibrationBlock`: placeholder camera intrinsics (all zero)
//! - `ColorFormat`: the configured output encoding
//! - `FrameRecord`: one complete outgoing frame
//!
//! `ImageBuffer` is owned exclusively by the producer between arm and
//! disarm. `FrameRecord` is constructed fresh on every tick and moves into
//! the sink on write; it exposes no mutators after construction.

use anyhow::{anyhow, ensure, Result};
use serde::Serialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Channel count of the normalized decode layout.
pub const RGB_CHANNELS: u8 = 3;

/// Entry count of the intrinsic matrix and the distortion coefficients.
pub const CALIBRATION_LEN: usize = 5;

// ----------------------------------------------------------------------------
// ImageBuffer: the decoded source image
// ----------------------------------------------------------------------------

/// Decoded image held for the duration of an armed session.
///
/// Rows are stored contiguously, one row per `stride` bytes; `stride` may
/// exceed `width * channels` to account for row padding. The constructor
/// validates the geometry so row access never reads past the storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Row pitch in bytes, >= width * channels.
    pub stride: usize,
    /// Bits per sample after decode normalization.
    pub bit_depth: u8,
    pub(crate) data: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        stride: usize,
        bit_depth: u8,
        data: Vec<u8>,
    ) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "load: decoded image is empty ({}x{})",
            width,
            height
        );
        ensure!(channels > 0, "load: decoded image has no channels");
        let row_bytes = width as usize * channels as usize;
        ensure!(
            stride >= row_bytes,
            "load: stride {} shorter than row of {} bytes",
            stride,
            row_bytes
        );
        let required = stride * (height as usize - 1) + row_bytes;
        ensure!(
            data.len() >= required,
            "load: pixel storage holds {} bytes, geometry requires {}",
            data.len(),
            required
        );
        Ok(Self {
            width,
            height,
            channels,
            stride,
            bit_depth,
            data,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Tight row length in bytes, excluding stride padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// The tight (padding-free) prefix of row `index`.
    pub fn row(&self, index: u32) -> &[u8] {
        let start = index as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Total pixel storage, including padding.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Capture time as seconds + nanoseconds since the Unix epoch.
///
/// Ordering is lexicographic over (secs, nanos). Monotonic clamping across
/// ticks is the producer's job, not this type's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn now() -> Result<Self> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| anyhow!("system clock is before the unix epoch"))?;
        Ok(Self {
            secs: elapsed.as_secs(),
            nanos: elapsed.subsec_nanos(),
        })
    }
}

// ----------------------------------------------------------------------------
// CalibrationBlock
// ----------------------------------------------------------------------------

/// Placeholder camera intrinsics carried on every frame.
///
/// The source is a static image, so every entry is zero; the block is still
/// always present and always length-5 to keep the output contract of a live
/// camera device. Length-5 is enforced by the array types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CalibrationBlock {
    pub matrix_elements: [f64; CALIBRATION_LEN],
    pub distortion_coefficients: [f64; CALIBRATION_LEN],
}

impl CalibrationBlock {
    pub fn zeroed() -> Self {
        Self::default()
    }
}

// ----------------------------------------------------------------------------
// ColorFormat
// ----------------------------------------------------------------------------

/// Output encoding selected by configuration, fixed per armed session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Rgb,
    Jpeg,
    Png,
}

impl ColorFormat {
    /// Parse a configuration value. Accepted: "RGB", "JPEG", "PNG"
    /// (ASCII case-insensitive).
    pub fn parse(value: &str) -> Result<Self> {
        let v = value.trim();
        if v.eq_ignore_ascii_case("RGB") {
            Ok(Self::Rgb)
        } else if v.eq_ignore_ascii_case("JPEG") {
            Ok(Self::Jpeg)
        } else if v.eq_ignore_ascii_case("PNG") {
            Ok(Self::Png)
        } else {
            Err(anyhow!(
                "unknown output color format '{}'; expected RGB, JPEG, or PNG",
                value
            ))
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgb => "RGB",
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
        };
        f.write_str(name)
    }
}

// ----------------------------------------------------------------------------
// FrameRecord: one outgoing frame
// ----------------------------------------------------------------------------

/// One unit of image data plus metadata, produced per tick.
///
/// Built by `FrameBuilder`; ownership transfers to the sink on write. The
/// payload is only reachable through `payload()`/`into_payload()`, so a
/// record cannot be mutated after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    pub timestamp: Timestamp,
    pub calibration: CalibrationBlock,
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
    payload: Vec<u8>,
}

impl FrameRecord {
    pub(crate) fn new(
        timestamp: Timestamp,
        calibration: CalibrationBlock,
        width: u32,
        height: u32,
        format: ColorFormat,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            timestamp,
            calibration,
            width,
            height,
            format,
            payload,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the record, yielding the packed payload bytes.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
