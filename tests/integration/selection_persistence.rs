// Integration tests for saved selections, config and catalog files

use std::fs;

use audioparams::catalog::{Catalog, CatalogError};
use audioparams::config::Config;
use audioparams::selection::{DetailValue, Selection};
use tempfile::tempdir;

use crate::common::helpers::*;

#[test]
fn test_selection_survives_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("selection.json");

    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "Opus", "libopus");
    form.on_detail_changed("application", "voip".into());
    let (saved, _) = form.into_parts();
    saved.save(&path).unwrap();

    let loaded = Selection::load(&path).unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.detail("application"), Some(&DetailValue::from("voip")));
    assert_eq!(loaded.detail("compression_level"), Some(&DetailValue::Number(1.0)));
}

#[test]
fn test_saved_json_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("selection.json");

    let mut sel = selection("MP3", "libmp3lame");
    sel.set_detail("joint_stereo", "0".into());
    sel.save(&path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["acodec"], "MP3");
    assert_eq!(value["aencoder"], "libmp3lame");
    assert_eq!(value["ratecontrol"], "CBR/ABR");
    assert_eq!(value["ratevalue"], 0.5);
    assert_eq!(value["detail"]["joint_stereo"], "0");
    assert_eq!(value["vol"], 0.5);
    assert_eq!(value["custom"], "");
}

#[test]
fn test_corrupt_selection_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("selection.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(Selection::load(&path).is_err());
}

#[test]
fn test_stale_saved_selection_heals_after_one_show() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("selection.json");

    let mut stale = selection("Opus", "libopus");
    stale.ratecontrol = "Q".to_string();
    stale.save(&path).unwrap();

    let mut form = recording_form(Catalog::builtin(), Selection::load(&path).unwrap());
    form.controls();
    let (healed, recorder) = form.into_parts();
    assert_eq!(recorder.count(), 1);
    healed.save(&path).unwrap();

    let reloaded = Selection::load(&path).unwrap();
    assert_eq!(reloaded.ratecontrol, "CBR/ABR");

    let mut form = recording_form(Catalog::builtin(), reloaded);
    form.controls();
    assert_eq!(form.sink().count(), 0);
}

#[test]
fn test_config_points_at_state_file_and_pruning() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let state_path = dir.path().join("state").join("audio.json");

    fs::write(
        &config_path,
        format!(
            "[session]\nstate_file = {:?}\nprune_orphans = true\n",
            state_path.display().to_string()
        ),
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();
    assert!(config.session.prune_orphans);
    assert_eq!(config.state_file().unwrap(), state_path);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_custom_catalog_file() {
    let dir = tempdir().unwrap();
    let catalog_path = dir.path().join("acodecs.toml");
    fs::write(&catalog_path, SCENARIO_CATALOG).unwrap();

    let mut config = Config::default();
    config.catalog.path = Some(catalog_path.clone());
    let catalog = config.catalog().unwrap();

    let ids: Vec<_> = catalog.codecs().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["AAC", "Lab"]);
    assert_eq!(*catalog, Catalog::load(&catalog_path).unwrap());
}

#[test]
fn test_catalog_with_unknown_rate_control_is_rejected() {
    let dir = tempdir().unwrap();
    let catalog_path = dir.path().join("acodecs.toml");
    fs::write(
        &catalog_path,
        SCENARIO_CATALOG.replace("id = \"CBR/ABR\"", "id = \"CRF\""),
    )
    .unwrap();

    let err = Catalog::load(&catalog_path).unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)), "got {:?}", err);
    assert!(err.to_string().contains("CRF") || format!("{:?}", err).contains("CRF"));
}
