//! Outbound transport implementations.
//!
//! Concrete frame ports behind the `FrameSink` boundary. MQTT is the only
//! transport shipped here; everything the core knows about it is the
//! `FrameSink` trait.

pub mod mqtt;

pub use mqtt::MqttSink;
