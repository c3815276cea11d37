//! Outgoing frame port boundary.
//!
//! `FrameSink` is the single-shot, synchronous port the producer writes each
//! frame to. Ownership of the record transfers on write; the producer never
//! retains or retries a handed-off frame.

use anyhow::Result;

use crate::frame::FrameRecord;

pub trait FrameSink {
    fn write(&mut self, frame: FrameRecord) -> Result<()>;
}

/// Counts and drops frames. Stands in for a real port during bring-up.
#[derive(Debug, Default)]
pub struct NullSink {
    written: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for NullSink {
    fn write(&mut self, frame: FrameRecord) -> Result<()> {
        self.written += 1;
        log::debug!(
            "frame dropped (null sink): {} {}x{} {} bytes",
            frame.format,
            frame.width,
            frame.height,
            frame.payload().len()
        );
        Ok(())
    }
}

/// Retains written frames in memory, in write order.
#[derive(Debug, Default)]
pub struct CollectSink {
    frames: Vec<FrameRecord>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSink for CollectSink {
    fn write(&mut self, frame: FrameRecord) -> Result<()> {
        self.frames.push(frame);
        Ok(())
    }
}
