use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::Builder;

use upright::config::UprightConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "UPRIGHT_CONFIG",
        "UPRIGHT_SAMPLE_FRAMES",
        "UPRIGHT_CONFIDENCE",
        "UPRIGHT_OUTPUT_SUBDIR",
        "UPRIGHT_BACKEND",
        "UPRIGHT_MODEL",
        "UPRIGHT_FFMPEG",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".json").tempfile().expect("temp config");
    let json = r#"{
        "output_subdir": "fixed",
        "analysis": {
            "sample_frames": 12,
            "confidence_threshold": 0.6
        },
        "model": {
            "backend": "tract",
            "path": "/opt/models/pose.onnx",
            "input_size": 320
        },
        "ffmpeg": "/usr/local/bin/ffmpeg"
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("UPRIGHT_CONFIG", file.path());
    std::env::set_var("UPRIGHT_SAMPLE_FRAMES", "30");
    std::env::set_var("UPRIGHT_BACKEND", "stub");

    let cfg = UprightConfig::load().expect("load config");
    assert_eq!(cfg.output_subdir, "fixed");
    assert_eq!(cfg.sample_frames, 30);
    assert_eq!(cfg.confidence_threshold, 0.6);
    assert_eq!(cfg.model.backend, "stub");
    assert_eq!(cfg.model.path, PathBuf::from("/opt/models/pose.onnx"));
    assert_eq!(cfg.model.input_size, 320);
    assert_eq!(cfg.ffmpeg, PathBuf::from("/usr/local/bin/ffmpeg"));

    let batch = cfg.batch_options();
    assert_eq!(batch.output_subdir, "fixed");
    assert_eq!(batch.analysis.sample_frames, 30);

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp config");
    let toml = r#"
output_subdir = "upright"

[analysis]
sample_frames = 8
"#;
    file.write_all(toml.as_bytes()).expect("write config");
    std::env::set_var("UPRIGHT_CONFIG", file.path());
    std::env::set_var("UPRIGHT_CONFIDENCE", "0.5");

    let cfg = UprightConfig::load().expect("load config");
    assert_eq!(cfg.output_subdir, "upright");
    assert_eq!(cfg.sample_frames, 8);
    assert_eq!(cfg.confidence_threshold, 0.5);
    assert_eq!(cfg.model.backend, "stub");

    clear_env();
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = UprightConfig::load().expect("load config");
    assert_eq!(cfg, UprightConfig::default());

    clear_env();
}

#[test]
fn rejects_invalid_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("UPRIGHT_SAMPLE_FRAMES", "0");
    assert!(UprightConfig::load().is_err());

    std::env::set_var("UPRIGHT_SAMPLE_FRAMES", "many");
    assert!(UprightConfig::load().is_err());
    clear_env();

    std::env::set_var("UPRIGHT_CONFIDENCE", "1.5");
    assert!(UprightConfig::load().is_err());
    clear_env();

    std::env::set_var("UPRIGHT_OUTPUT_SUBDIR", "../escape");
    assert!(UprightConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_malformed_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".json").tempfile().expect("temp config");
    file.write_all(b"{ not json").expect("write config");
    std::env::set_var("UPRIGHT_CONFIG", file.path());
    let err = UprightConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    std::env::set_var("UPRIGHT_CONFIG", "/nonexistent/upright.toml");
    assert!(UprightConfig::load().is_err());

    clear_env();
}
