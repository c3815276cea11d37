//! MQTT frame port.
//!
//! Publishes every produced frame to an MQTT broker:
//! - `<prefix>/frame/meta`: JSON frame metadata (timestamp, geometry,
//!   format, calibration block, payload length)
//! - `<prefix>/frame/data`: the packed payload bytes, raw
//! - `<prefix>/status`: retained "online"/"offline" availability, with a
//!   last-will fallback when the connection drops
//!
//! The topic layout is this repo's port contract; subscribers pair a data
//! message with the metadata message published immediately before it.

use anyhow::{anyhow, Context, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, MqttOptions};
use serde::Serialize;
use std::time::Duration;

use crate::config::MqttSettings;
use crate::frame::{CalibrationBlock, FrameRecord, Timestamp};
use crate::sink::FrameSink;

const PAYLOAD_ONLINE: &str = "online";
const PAYLOAD_OFFLINE: &str = "offline";
const CHANNEL_CAPACITY: usize = 10;
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Frame metadata published alongside the payload bytes.
#[derive(Serialize)]
struct FrameMeta<'a> {
    timestamp: Timestamp,
    width: u32,
    height: u32,
    format: String,
    payload_len: usize,
    calibration: &'a CalibrationBlock,
}

impl<'a> FrameMeta<'a> {
    fn from_record(frame: &'a FrameRecord) -> Self {
        Self {
            timestamp: frame.timestamp,
            width: frame.width,
            height: frame.height,
            format: frame.format.to_string(),
            payload_len: frame.payload().len(),
            calibration: &frame.calibration,
        }
    }
}

/// MQTT-backed `FrameSink`.
///
/// The connection eventloop runs on a background thread; `disconnect()`
/// publishes the offline status and joins it.
pub struct MqttSink {
    client: Client,
    connection_handle: Option<std::thread::JoinHandle<()>>,
    meta_topic: String,
    data_topic: String,
    status_topic: String,
}

impl MqttSink {
    pub fn connect(settings: &MqttSettings) -> Result<Self> {
        let (host, port) = split_broker_addr(&settings.broker_addr)?;
        let mut options = MqttOptions::new(&settings.client_id, host, port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_start(true);
        if let Some(username) = &settings.username {
            options.set_credentials(username, settings.password.clone().unwrap_or_default());
        }

        let status_topic = format!("{}/status", settings.topic_prefix);
        let will = rumqttc::v5::mqttbytes::v5::LastWill::new(
            status_topic.clone(),
            PAYLOAD_OFFLINE.as_bytes().to_vec(),
            QoS::AtLeastOnce,
            true,
            None,
        );
        options.set_last_will(will);

        let (client, connection) = Client::new(options, CHANNEL_CAPACITY);
        let handle = spawn_eventloop(connection);
        let sink = Self {
            client,
            connection_handle: Some(handle),
            meta_topic: format!("{}/frame/meta", settings.topic_prefix),
            data_topic: format!("{}/frame/data", settings.topic_prefix),
            status_topic,
        };
        sink.publish(&sink.status_topic, PAYLOAD_ONLINE.as_bytes().to_vec(), true)?;
        log::info!(
            "mqtt frame port connected: {} (prefix {}, auth: {})",
            settings.broker_addr,
            settings.topic_prefix,
            settings.username.is_some()
        );
        Ok(sink)
    }

    /// Publish the offline status, close the connection, join the eventloop.
    pub fn disconnect(mut self) -> Result<()> {
        self.publish(&self.status_topic, PAYLOAD_OFFLINE.as_bytes().to_vec(), true)?;
        self.client.disconnect()?;
        if let Some(handle) = self.connection_handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()> {
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)?;
        Ok(())
    }
}

impl FrameSink for MqttSink {
    fn write(&mut self, frame: FrameRecord) -> Result<()> {
        let meta = FrameMeta::from_record(&frame);
        let meta_json = serde_json::to_vec(&meta).context("serialize frame metadata")?;
        self.publish(&self.meta_topic, meta_json, false)?;
        self.publish(&self.data_topic, frame.into_payload(), false)?;
        Ok(())
    }
}

fn spawn_eventloop(mut connection: Connection) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(_)) | Ok(Event::Outgoing(_)) => {}
                Err(e) => {
                    log::warn!("mqtt connection error: {}", e);
                    break;
                }
            }
        }
    })
}

fn split_broker_addr(addr: &str) -> Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("mqtt broker address '{}' must be host:port", addr))?;
    if host.is_empty() {
        return Err(anyhow!("mqtt broker address '{}' has no host", addr));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| anyhow!("invalid mqtt broker port in '{}'", addr))?;
    Ok((host.to_string(), port))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ColorFormat;

    #[test]
    fn broker_addr_splits_host_and_port() {
        assert_eq!(
            split_broker_addr("127.0.0.1:1883").unwrap(),
            ("127.0.0.1".to_string(), 1883)
        );
        assert_eq!(
            split_broker_addr("broker.local:8883").unwrap(),
            ("broker.local".to_string(), 8883)
        );
        assert!(split_broker_addr("no-port").is_err());
        assert!(split_broker_addr(":1883").is_err());
        assert!(split_broker_addr("host:notaport").is_err());
    }

    #[test]
    fn frame_meta_serializes_wire_fields() {
        let frame = FrameRecord::new(
            Timestamp { secs: 10, nanos: 500 },
            CalibrationBlock::zeroed(),
            4,
            2,
            ColorFormat::Rgb,
            vec![0u8; 24],
        );

        let json = serde_json::to_value(FrameMeta::from_record(&frame)).unwrap();

        assert_eq!(json["timestamp"]["secs"], 10);
        assert_eq!(json["timestamp"]["nanos"], 500);
        assert_eq!(json["width"], 4);
        assert_eq!(json["height"], 2);
        assert_eq!(json["format"], "RGB");
        assert_eq!(json["payload_len"], 24);
        assert_eq!(
            json["calibration"]["matrix_elements"]
                .as_array()
                .unwrap()
                .len(),
            5
        );
        assert_eq!(
            json["calibration"]["distortion_coefficients"]
                .as_array()
                .unwrap()
                .len(),
            5
        );
    }
}
