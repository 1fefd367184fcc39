#![cfg(feature = "cli")]

use std::path::Path;

use armor_vision::{DetectConfig, DetectorKind};
use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("armor-vision").expect("binary")
}

fn write_outpost(path: &Path) {
    let mut img = RgbImage::new(160, 120);
    for y in 40..70 {
        for x in (40..45).chain(90..95) {
            img.put_pixel(x, y, Rgb([255, 30, 30]));
        }
    }
    img.save(path).expect("save png");
}

#[test]
fn init_params_writes_loadable_document() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("buff.json");

    cli()
        .args(["init-params", "buff"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("buff.json"));

    let config = DetectConfig::load_json(&path).expect("load");
    assert_eq!(config, DetectConfig::default_for(DetectorKind::Buff));
}

#[test]
fn detect_prints_report_and_saves_overlay() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("snipe.json");
    let image = dir.path().join("outpost.png");
    let output = dir.path().join("overlay.png");
    DetectConfig::default_for(DetectorKind::Snipe)
        .write_json(&config)
        .expect("write config");
    write_outpost(&image);

    cli()
        .arg("detect")
        .arg("--config")
        .arg(&config)
        .arg("--image")
        .arg(&image)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind": "snipe""#))
        .stdout(predicate::str::contains(r#""model": "outpost""#));

    assert!(output.exists());
}

#[test]
fn log_level_flag_controls_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("snipe.json");
    let image = dir.path().join("outpost.png");
    DetectConfig::default_for(DetectorKind::Snipe)
        .write_json(&config)
        .expect("write config");
    write_outpost(&image);

    let detect = |level: &str| {
        let mut cmd = cli();
        cmd.env_remove("RUST_LOG")
            .args(["--log-level", level, "detect", "--config"])
            .arg(&config)
            .arg("--image")
            .arg(&image);
        cmd
    };

    detect("info")
        .assert()
        .success()
        .stderr(predicate::str::contains("snipe: 1 targets"));
    detect("warn")
        .assert()
        .success()
        .stderr(predicate::str::contains("targets in").not());
    detect("loud").assert().failure();
}

#[test]
fn team_flag_overrides_document() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("snipe.json");
    let image = dir.path().join("outpost.png");
    DetectConfig::default_for(DetectorKind::Snipe)
        .write_json(&config)
        .expect("write config");
    write_outpost(&image);

    let out = cli()
        .arg("detect")
        .arg("--config")
        .arg(&config)
        .arg("--image")
        .arg(&image)
        .args(["--team", "blue"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json report");
    assert_eq!(report["team"], "blue");
    assert_eq!(report["targets"].as_array().map(Vec::len), Some(0));
}

#[test]
fn missing_config_fails_with_message() {
    let dir = TempDir::new().expect("tempdir");
    let image = dir.path().join("outpost.png");
    write_outpost(&image);

    cli()
        .arg("detect")
        .arg("--config")
        .arg(dir.path().join("absent.json"))
        .arg("--image")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn unknown_kind_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["init-params", "laser"])
        .arg(dir.path().join("laser.json"))
        .assert()
        .failure();
}
