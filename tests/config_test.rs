use std::fs;

use tempfile::TempDir;
use vasctree::application::render::{ColorBy, Shading};
use vasctree::application::ApplicationError;
use vasctree::config::{local_config_path, RadiusModeSetting, Settings};
use vasctree::util::testing;

#[test]
fn given_no_files_when_loading_then_defaults() {
    testing::init_test_setup();

    let settings = Settings::load_from(None, None).unwrap();

    assert_eq!(settings.picking, Settings::default().picking);
    assert_eq!(settings.render, Settings::default().render);
}

#[test]
fn given_global_and_local_files_when_loading_then_local_wins_per_key() {
    testing::init_test_setup();
    // Arrange
    let tmp = TempDir::new().unwrap();
    let global = tmp.path().join("global.toml");
    fs::write(
        &global,
        "[picking]\nmin_radius = 0.02\n\n[render]\nwidth = 1024\nshading = \"flat\"\n",
    )
    .unwrap();
    let local = local_config_path(tmp.path());
    fs::write(
        &local,
        "[picking]\nmin_radius = 0.03\n\n[radius]\nmode = \"per-edge\"\n",
    )
    .unwrap();

    // Act
    let settings = Settings::load_from(Some(&global), Some(&local)).unwrap();

    // Assert
    assert_eq!(settings.picking.min_radius, 0.03);
    assert_eq!(settings.render.width, 1024);
    assert_eq!(settings.render.shading, Shading::Flat);
    assert_eq!(settings.render.height, 600);
    assert_eq!(settings.radius.mode, RadiusModeSetting::PerEdge);
    assert_eq!(settings.render.color_by, ColorBy::Depth);
}

#[test]
fn given_invalid_value_when_loading_then_config_error() {
    testing::init_test_setup();
    let tmp = TempDir::new().unwrap();
    let local = local_config_path(tmp.path());
    fs::write(&local, "[render]\nshading = \"glossy\"\n").unwrap();

    let err = Settings::load_from(None, Some(&local)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_data_dir_with_local_file_when_loading_then_picked_up() {
    testing::init_test_setup();
    let tmp = TempDir::new().unwrap();
    fs::write(
        local_config_path(tmp.path()),
        "[animation]\nspeed = 8.0\n",
    )
    .unwrap();

    let settings = Settings::load(Some(tmp.path())).unwrap();

    assert_eq!(settings.animation.speed, 8.0);
}

#[test]
fn given_settings_when_building_services_then_values_flow_through() {
    testing::init_test_setup();
    let mut settings = Settings::default();
    settings.picking.min_radius = 0.5;
    settings.render.width = 0;
    settings.topology.allow_isolated_points = true;

    let session = settings.session_settings();

    assert_eq!(session.picker.min_radius, 0.5);
    assert_eq!(session.viewport.width, 1);
    assert!(settings.tree_builder().build(3, &[(0, 1)]).is_ok());
}
