use penumbra::{ConfigError, DemoConfig};

fn customised() -> DemoConfig {
    let mut config = DemoConfig::default();
    config.asset_dir = "data/assets".into();
    config.spin_speed = 0.0;
    config.window.width = 800;
    config.window.height = 600;
    config.camera.position = [1.0, 2.0, -8.0];
    config.shadow.resolution = 1024;
    config
}

#[test]
fn ron_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penumbra.ron");
    let config = customised();
    config.save(&path).unwrap();
    assert_eq!(DemoConfig::load(&path).unwrap(), config);
}

#[test]
fn toml_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penumbra.toml");
    let config = customised();
    config.save(&path).unwrap();
    assert_eq!(DemoConfig::load(&path).unwrap(), config);
}

#[test]
fn hand_written_toml_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penumbra.toml");
    std::fs::write(&path, "show_stats = false\n\n[shadow]\nresolution = 512\n").unwrap();

    let config = DemoConfig::load(&path).unwrap();
    assert!(!config.show_stats);
    assert_eq!(config.shadow.resolution, 512);
    assert_eq!(config.window, DemoConfig::default().window);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = DemoConfig::load(dir.path().join("absent.ron"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    std::fs::write(&path, "(spin_speed: ").unwrap();
    assert!(matches!(
        DemoConfig::load(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn saving_with_unknown_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = DemoConfig::default().save(dir.path().join("penumbra.json"));
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}
