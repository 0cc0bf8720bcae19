//! Config file, parameter store and presets working together.

use std::fs;

use aarrow_audio::{snapshot_cell, EngineSnapshot};
use aarrow_core::{load_preset, save_preset, Config, ConfigError, ParamStore};
use aarrow_types::{ArpDirection, ParamId, ParamValue};

#[test]
fn config_file_seeds_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [defaults]
        sync = true
        speed = 0.93
        direction = "down"

        [transport]
        tempo_bpm = 140.0
        time_signature_numerator = 3
        "#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    let store = ParamStore::new(config.params(), config.transport());
    assert_eq!(store.params().direction, ArpDirection::Down);
    assert_eq!(store.params().display(ParamId::Speed), "1/8");
    assert_eq!(store.transport().usable(), Some((140.0, 3)));
}

#[test]
fn bad_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[defaults\noctaves = ").unwrap();
    assert!(matches!(Config::load_from(&path), Err(ConfigError::Toml(_))));
    assert!(matches!(
        Config::load_from(&dir.path().join("missing.toml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn preset_round_trip_reaches_audio_thread() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets").join("walk.json");

    let mut store = ParamStore::new(Default::default(), Default::default());
    store.set_text("octaves", "2").unwrap();
    store.set_text("return", "on").unwrap();
    store.set(ParamId::Probability, ParamValue::Int(25));
    save_preset(&path, store.params()).unwrap();
    let saved = *store.params();

    let (writer, mut reader) = snapshot_cell(EngineSnapshot::default());
    let mut fresh = ParamStore::new(Default::default(), Default::default());
    fresh.attach(writer);
    fresh.replace(load_preset(&path).unwrap());

    assert_eq!(reader.latest().params, saved);
    assert!(reader.latest().params.ping_pong);
}
