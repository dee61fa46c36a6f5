#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::process::{Command, Output};

fn pixelbox(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pixelbox"))
        .env_remove("PIXELBOX_MAC")
        .env_remove("PIXELBOX_CHANNEL")
        .env_remove("PIXELBOX_CONFIG")
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("pixelbox should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be utf-8")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn brightness_dry_run_prints_wire_hex() {
    let output = pixelbox(&["--dry-run", "--format", "pretty", "brightness", "50"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "0104007432aa0002\n");
}

#[test]
fn dry_run_json_report() {
    let output = pixelbox(&["--dry-run", "--format", "json", "cloud"]);
    assert_eq!(output.status.code(), Some(0));

    let value = json(&output);
    assert_eq!(value["command"], "cloud");
    assert_eq!(value["sent"], false);
    assert_eq!(value["packets"][0], "01040045024b0002");
    assert_eq!(value["bytes"], 8);
    assert!(value.get("target").is_none());
}

#[test]
fn out_of_range_exits_data_invalid() {
    let output = pixelbox(&["--dry-run", "volume", "17"]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("between 0 and 16"), "stderr: {stderr}");
}

#[test]
fn negative_temperature_is_accepted() {
    let output = pixelbox(&["--dry-run", "--format", "pretty", "weather", "-5", "SNOW"]);
    assert_eq!(output.status.code(), Some(0));
    // 0x5F, -5 as a byte, SNOW
    assert!(stdout(&output).starts_with("0105005ffb08"));
}

#[test]
fn unknown_weather_exits_usage() {
    let output = pixelbox(&["--dry-run", "weather", "20", "SUNNY"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn bad_color_exits_usage() {
    let output = pixelbox(&["--dry-run", "light", "--color", "#12345"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn sync_time_at_explicit_moment() {
    let output = pixelbox(&[
        "--dry-run",
        "--format",
        "pretty",
        "sync-time",
        "--at",
        "2024-03-09 07:05:30",
    ]);
    assert_eq!(output.status.code(), Some(0));
    // 0x18, year % 100, year / 100, month, day, hour, minute, second, 0
    assert!(stdout(&output).starts_with("010b00181814030907051e00"));
}

#[test]
fn image_and_animation_from_raw_files() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let red = dir.path().join("red.rgb");
    let blue = dir.path().join("blue.rgb");
    std::fs::write(&red, [0xFF, 0x00, 0x00].repeat(256)).expect("frame should be writable");
    std::fs::write(&blue, [0x00, 0x00, 0xFF].repeat(256)).expect("frame should be writable");

    let red_path = red.to_str().expect("utf-8 path");
    let blue_path = blue.to_str().expect("utf-8 path");

    let output = pixelbox(&["--dry-run", "--format", "json", "image", red_path]);
    assert_eq!(output.status.code(), Some(0));
    let value = json(&output);
    let packet = value["packets"][0].as_str().expect("hex packet");
    // prefix, length, then 0x44 and the fixed image preamble
    assert!(packet.starts_with("01"));
    assert_eq!(&packet[6..16], "44000a0a04");
    assert!(packet.ends_with("02"));

    let output = pixelbox(&[
        "--dry-run",
        "--format",
        "json",
        "animation",
        red_path,
        blue_path,
        "--duration-ms",
        "250",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let value = json(&output);
    let packets = value["packets"].as_array().expect("packet list");
    assert!(!packets.is_empty());
    for packet in packets {
        assert_eq!(&packet.as_str().expect("hex packet")[6..8], "49");
    }
}

#[test]
fn animation_duration_mismatch_is_data_invalid() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let frame = dir.path().join("frame.rgb");
    std::fs::write(&frame, [0u8; 768]).expect("frame should be writable");
    let path = frame.to_str().expect("utf-8 path");

    let output = pixelbox(&["--dry-run", "animation", path, path, "--duration-ms", "1,2,3"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn wrong_size_image_is_data_invalid() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file should be creatable");
    file.write_all(&[0u8; 10]).expect("temp file should be writable");
    let output = pixelbox(&[
        "--dry-run",
        "image",
        file.path().to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn decode_prints_messages() {
    let output = pixelbox(&["--format", "pretty", "decode", "01060004325532c30002"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "Set brightness to 50\n");
}

#[test]
fn decode_checksum_mismatch_strict_drops_all_lenient_keeps_good() {
    let good = "01060004325532c30002";
    let bad = "01060004325532c40002";
    let input = format!("{good}{bad}");

    let strict = pixelbox(&["--format", "pretty", "decode", &input]);
    assert_eq!(strict.status.code(), Some(60));
    assert!(strict.stdout.is_empty());

    let lenient = pixelbox(&["--format", "pretty", "decode", "--lenient", &input]);
    assert_eq!(lenient.status.code(), Some(60));
    assert_eq!(stdout(&lenient), "Set brightness to 50\n");
}

#[test]
fn no_device_selected_exits_usage() {
    let output = pixelbox(&["brightness", "50"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_config_file_exits_usage() {
    let output = pixelbox(&["--config", "/nonexistent/pixelbox.json", "off"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn unknown_device_in_config_exits_usage() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file should be creatable");
    file.write_all(br#"{"devices":[{"name":"desk","mac":"11:75:58:2A:3B:4C"}]}"#)
        .expect("temp file should be writable");
    let output = pixelbox(&[
        "--config",
        file.path().to_str().expect("utf-8 path"),
        "--device",
        "kitchen",
        "off",
    ]);
    assert_eq!(output.status.code(), Some(64));
}
