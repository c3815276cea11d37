//! stillcam - still-image camera source
//!
//! This crate republishes a still image loaded once from storage as a
//! periodic, timestamped frame stream, mimicking the output contract of a
//! live camera device.
//!
//! # Architecture
//!
//! load (once, on arm) -> `ImageBuffer` -> [every tick] `ColorPacker` ->
//! packed bytes -> `FrameBuilder` -> `FrameRecord` -> `FrameSink::write`.
//!
//! # Module Structure
//!
//! - `frame`: frame data model (ImageBuffer, FrameRecord, calibration)
//! - `codec`: decode/encode boundary, `image`-crate backend
//! - `pack`: payload packing/encoding strategies
//! - `builder`: per-tick frame assembly
//! - `producer`: lifecycle (Idle/Armed) and tick driver
//! - `sink`: outgoing port boundary
//! - `transport`: concrete MQTT frame port
//! - `config`: daemon configuration surface

pub mod builder;
pub mod codec;
pub mod config;
pub mod frame;
pub mod pack;
pub mod producer;
pub mod sink;
pub mod transport;

pub use builder::FrameBuilder;
pub use codec::{ImageCodec, ImageRsCodec};
pub use config::{MqttSettings, StillcamConfig, TickSettings};
pub use frame::{
    CalibrationBlock, ColorFormat, FrameRecord, ImageBuffer, Timestamp, CALIBRATION_LEN,
    RGB_CHANNELS,
};
pub use pack::{ColorPacker, MAX_COMPRESSION_RATIO};
pub use producer::{FrameProducer, ProducerState, ProducerStats, SourceConfig, FILE_NAME_UNSET};
pub use sink::{CollectSink, FrameSink, NullSink};
pub use transport::MqttSink;
