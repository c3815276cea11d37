use std::sync::Mutex;

use tempfile::NamedTempFile;

use stillcam::{ColorFormat, StillcamConfig, FILE_NAME_UNSET};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "STILLCAM_CONFIG",
        "STILLCAM_FILE",
        "STILLCAM_COLOR_FORMAT",
        "STILLCAM_COMPRESSION_RATIO",
        "STILLCAM_FPS",
        "STILLCAM_MQTT_ADDR",
        "STILLCAM_MQTT_TOPIC_PREFIX",
        "STILLCAM_MQTT_CLIENT_ID",
        "STILLCAM_MQTT_USERNAME",
        "STILLCAM_MQTT_PASSWORD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_leave_source_unset() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = StillcamConfig::load().expect("load config");

    assert_eq!(cfg.source.file_name, FILE_NAME_UNSET);
    assert_eq!(cfg.source.output_color_format, ColorFormat::Rgb);
    assert_eq!(cfg.source.compression_ratio, 100);
    assert_eq!(cfg.tick.target_fps, 10);
    assert_eq!(cfg.tick.period().as_millis(), 100);
    assert_eq!(cfg.mqtt.broker_addr, "127.0.0.1:1883");
    assert_eq!(cfg.mqtt.topic_prefix, "stillcam");
    assert_eq!(cfg.mqtt.client_id, "stillcamd");
    assert!(cfg.mqtt.username.is_none());

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": {
            "file_name": "/var/lib/stillcam/test.bmp",
            "output_color_format": "JPEG",
            "compression_ratio": 85
        },
        "tick": {
            "target_fps": 25
        },
        "mqtt": {
            "broker_addr": "broker.local:8883",
            "topic_prefix": "cameras/front",
            "client_id": "front-door",
            "username": "camera"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("STILLCAM_CONFIG", file.path());
    std::env::set_var("STILLCAM_COLOR_FORMAT", "PNG");
    std::env::set_var("STILLCAM_FPS", "5");

    let cfg = StillcamConfig::load().expect("load config");

    assert_eq!(cfg.source.file_name, "/var/lib/stillcam/test.bmp");
    assert_eq!(cfg.source.output_color_format, ColorFormat::Png);
    assert_eq!(cfg.source.compression_ratio, 85);
    assert_eq!(cfg.tick.target_fps, 5);
    assert_eq!(cfg.tick.period().as_millis(), 200);
    assert_eq!(cfg.mqtt.broker_addr, "broker.local:8883");
    assert_eq!(cfg.mqtt.topic_prefix, "cameras/front");
    assert_eq!(cfg.mqtt.client_id, "front-door");
    assert_eq!(cfg.mqtt.username.as_deref(), Some("camera"));

    clear_env();
}

#[test]
fn rejects_out_of_range_compression_ratio() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("STILLCAM_COMPRESSION_RATIO", "101");
    assert!(StillcamConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_unknown_color_format() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("STILLCAM_COLOR_FORMAT", "TIFF");
    assert!(StillcamConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_zero_fps() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("STILLCAM_FPS", "0");
    assert!(StillcamConfig::load().is_err());

    clear_env();
}
