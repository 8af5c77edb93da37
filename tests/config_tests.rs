use raw_viewer::config::{Configuration, DEFAULT_RAW_PATH};
use std::io::Write;
use std::time::Duration;
use viewer_wire::Identifier;

#[test]
fn empty_config_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.poll_interval, Duration::from_millis(2000));
    assert_eq!(cfg.default_raw_path, DEFAULT_RAW_PATH);
    assert_eq!(cfg.server_url().unwrap().as_str(), "http://127.0.0.1:5000/");
    assert!((cfg.viewport.initial_scale - 0.08).abs() < f64::EPSILON);
    assert!(cfg.preset_filters.is_none());
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
server: "http://frame.local:5000/viewer"
poll-interval: 500ms
request-timeout: 5s
default-raw-path: /mnt/raw/a.ARW
snapshot-path: /tmp/shown.jpg
preset-filters:
  saturation: 1.2
  warmth: 1.1
initial:
  preview: p.jpg
viewport:
  initial-scale: 0.5
  max-scale: 4.0
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.poll_interval, Duration::from_millis(500));
    assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    assert_eq!(cfg.default_raw_path, "/mnt/raw/a.ARW");
    assert_eq!(
        cfg.server_url().unwrap().as_str(),
        "http://frame.local:5000/viewer/"
    );
    let presets = cfg.preset_filters.unwrap();
    assert!((presets.saturation - 1.2).abs() < f32::EPSILON);
    assert!((presets.contrast - 1.0).abs() < f32::EPSILON);
    assert_eq!(cfg.initial.preview, Some(Identifier::from("p.jpg")));
    assert!(cfg.initial.full.is_none());
    assert!((cfg.viewport.max_scale - 4.0).abs() < f64::EPSILON);
    assert!((cfg.viewport.min_scale - 0.2).abs() < f64::EPSILON);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = serde_yaml::from_str::<Configuration>("poll-every: 2s").unwrap_err();
    assert!(err.to_string().contains("poll-every"));
}

#[test]
fn invalid_values_fail_validation() {
    let cases = [
        "poll-interval: 0s",
        "server: ftp://example.com/",
        "server: not a url",
        "viewport: { min-scale: 2.0, max-scale: 1.0 }",
        "viewport: { zoom-step: 1.0 }",
        "viewport: { initial-scale: 0.0 }",
    ];
    for yaml in cases {
        let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.validated().is_err(), "{yaml} should be rejected");
    }
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "poll-interval: 3s\ninitial:\n  full: f.jpg").unwrap();
    let cfg = Configuration::from_yaml_file(file.path()).unwrap();
    assert_eq!(cfg.poll_interval, Duration::from_secs(3));
    assert_eq!(cfg.initial.full, Some(Identifier::from("f.jpg")));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = Configuration::from_yaml_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.yaml"));
}
