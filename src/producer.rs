//! Frame producer lifecycle.
//!
//! `FrameProducer` owns the armed session. The hosting runtime drives it
//! through three externally triggered transitions:
//! - `arm()`: decode the configured source image once, enter `Armed`
//! - `tick()`: build one frame from the held image and write it to the sink
//! - `disarm()`: release the held image, return to `Idle`
//!
//! The producer is responsible for:
//! - Gating ticks on the `Armed` state
//! - Keeping emitted timestamps non-decreasing within an armed session
//! - Handing each frame to the sink exactly once, transferring ownership
//!
//! The producer MUST NOT:
//! - Retry a failed load or a failed tick
//! - Retain or mutate a frame after handoff
//! - Share the held image outside arm()/disarm()

use anyhow::{bail, Context, Result};

use crate::builder::FrameBuilder;
use crate::codec::ImageCodec;
use crate::frame::{ColorFormat, ImageBuffer, Timestamp};
use crate::sink::FrameSink;

/// The unset-path sentinel: arming fails until a real path is configured.
pub const FILE_NAME_UNSET: &str = "NULL";

/// Source settings, handed in already validated by the configuration layer.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Path of the still image to republish.
    pub file_name: String,
    /// Output encoding, fixed for the lifetime of an armed session.
    pub output_color_format: ColorFormat,
    /// 0-100; meaningful for JPEG/PNG only.
    pub compression_ratio: u8,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            file_name: FILE_NAME_UNSET.to_string(),
            output_color_format: ColorFormat::Rgb,
            compression_ratio: 100,
        }
    }
}

/// Externally observable lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProducerState {
    Idle,
    Armed,
}

/// Per-session statistics.
#[derive(Clone, Debug)]
pub struct ProducerStats {
    pub frames_produced: u64,
    pub source: String,
}

pub struct FrameProducer<C, S> {
    config: SourceConfig,
    codec: C,
    sink: S,
    builder: FrameBuilder,
    image: Option<ImageBuffer>,
    last_timestamp: Option<Timestamp>,
    frames_produced: u64,
}

impl<C: ImageCodec, S: FrameSink> FrameProducer<C, S> {
    pub fn new(config: SourceConfig, codec: C, sink: S) -> Result<Self> {
        let builder = FrameBuilder::new(config.output_color_format, config.compression_ratio)?;
        Ok(Self {
            config,
            codec,
            sink,
            builder,
            image: None,
            last_timestamp: None,
            frames_produced: 0,
        })
    }

    pub fn state(&self) -> ProducerState {
        if self.image.is_some() {
            ProducerState::Armed
        } else {
            ProducerState::Idle
        }
    }

    /// Decode the configured source image and enter `Armed`.
    ///
    /// Load is attempted exactly once; on failure the producer stays `Idle`
    /// and the caller must not schedule ticks.
    pub fn arm(&mut self) -> Result<()> {
        if self.image.is_some() {
            bail!("contract: arm while already armed");
        }
        if self.config.file_name == FILE_NAME_UNSET || self.config.file_name.trim().is_empty() {
            bail!("load: source file name is unset");
        }
        let image = self
            .codec
            .decode(&self.config.file_name)
            .with_context(|| format!("load: {}", self.config.file_name))?;
        log::info!("image size: {} x {}", image.width, image.height);
        log::info!("depth     : {}", image.bit_depth);
        log::info!("channels  : {}", image.channels);
        self.image = Some(image);
        Ok(())
    }

    /// Release the held image and return to `Idle`. No-op from `Idle`.
    pub fn disarm(&mut self) {
        if self.image.take().is_some() {
            log::info!("source released: {}", self.config.file_name);
        }
        self.last_timestamp = None;
        self.frames_produced = 0;
    }

    /// Produce one frame and hand it to the sink. `Armed` only.
    ///
    /// An encode failure fails this tick and nothing is emitted, but the
    /// session stays `Armed`; the next tick starts fresh.
    pub fn tick(&mut self) -> Result<()> {
        let Some(image) = self.image.as_ref() else {
            bail!("contract: tick while idle");
        };
        let now = Timestamp::now()?;
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        let frame = self.builder.build(&self.codec, image, timestamp)?;
        self.sink.write(frame).context("sink write")?;
        self.last_timestamp = Some(timestamp);
        self.frames_produced += 1;
        Ok(())
    }

    pub fn stats(&self) -> ProducerStats {
        ProducerStats {
            frames_produced: self.frames_produced,
            source: self.config.file_name.clone(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Tear down the producer, handing back the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
