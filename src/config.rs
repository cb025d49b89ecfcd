//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/vasctree/vasctree.toml`
//! 3. Local config: `<data_dir>/.vasctree.toml` (next to the step files)
//! 4. Environment variables: `VASCTREE_*` prefix, `__` between section and key

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::{AnimationSettings, SessionSettings};
use crate::application::{ApplicationError, Dimension, RenderOptions};
use crate::application::render::{ColorBy, Shading};
use crate::domain::branch::{DEFAULT_FALLBACK_RADIUS, DEFAULT_RADIUS_FLOOR};
use crate::domain::picking::DEFAULT_MIN_PICK_RADIUS;
use crate::domain::{CameraLimits, Picker, Projection, RadiusMode, RadiusPolicy, TreeBuilder, Viewport};
use crate::util::path::expand_path;

const APP_NAME: &str = "vasctree";
const ENV_PREFIX: &str = "VASCTREE";

/// Tree validation switches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TopologyConfig {
    /// Tolerate points that no edge touches.
    pub allow_isolated_points: bool,
}

/// Radius assignment; `auto` follows the dataset dimension.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RadiusModeSetting {
    #[default]
    Auto,
    PointAverage,
    PerEdge,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RadiusConfig {
    pub mode: RadiusModeSetting,
    pub fallback: f64,
    pub floor: f64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            mode: RadiusModeSetting::Auto,
            fallback: DEFAULT_FALLBACK_RADIUS,
            floor: DEFAULT_RADIUS_FLOOR,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PickingConfig {
    /// Capsule radius below which branches are inflated for hit-testing.
    pub min_radius: f64,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            min_radius: DEFAULT_MIN_PICK_RADIUS,
        }
    }
}

/// Render toggles plus output size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    pub fixed_radius: bool,
    pub shading: Shading,
    pub transparency: bool,
    pub color_by: ColorBy,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        let viewport = Viewport::default();
        Self {
            fixed_radius: options.fixed_radius,
            shading: options.shading,
            transparency: options.transparency,
            color_by: options.color_by,
            width: viewport.width,
            height: viewport.height,
        }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            fixed_radius: self.fixed_radius,
            shading: self.shading,
            transparency: self.transparency,
            color_by: self.color_by,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }
}

/// Unified configuration for vasctree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Dataset directory used when none is given on the command line.
    pub data_dir: PathBuf,
    pub topology: TopologyConfig,
    pub radius: RadiusConfig,
    pub picking: PickingConfig,
    pub animation: AnimationSettings,
    pub camera: CameraLimits,
    pub projection: Projection,
    pub render: RenderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            topology: TopologyConfig::default(),
            radius: RadiusConfig::default(),
            picking: PickingConfig::default(),
            animation: AnimationSettings::default(),
            camera: CameraLimits::default(),
            projection: Projection::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Get the XDG config directory for vasctree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(format!("{APP_NAME}.toml")))
}

/// Get the path to the local config file of a dataset directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!(".{APP_NAME}.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `data_dir` - Optional dataset directory for local config
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/vasctree/vasctree.toml`
    /// 3. Local config: `<data_dir>/.vasctree.toml`
    /// 4. Environment variables: `VASCTREE_*` prefix, e.g. `VASCTREE_PICKING__MIN_RADIUS`
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        let local = data_dir.map(local_config_path).filter(|p| p.exists());
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Layered load from explicit files; missing layers are skipped.
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        for path in [global, local].into_iter().flatten() {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        // Expand ~ and $VAR in path-like fields
        settings.expand_paths();

        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
    }

    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new().allow_isolated_points(self.topology.allow_isolated_points)
    }

    /// Radius policy for a dataset of the given dimension.
    pub fn radius_policy(&self, dimension: Dimension) -> RadiusPolicy {
        let mode = match self.radius.mode {
            RadiusModeSetting::Auto => dimension.radius_mode(),
            RadiusModeSetting::PointAverage => RadiusMode::PointAverage,
            RadiusModeSetting::PerEdge => RadiusMode::PerEdge,
        };
        RadiusPolicy {
            mode,
            fallback: self.radius.fallback,
            floor: self.radius.floor,
        }
    }

    pub fn picker(&self) -> Picker {
        Picker::new(self.picking.min_radius)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            picker: self.picker(),
            limits: self.camera,
            projection: self.projection,
            viewport: self.render.viewport(),
            animation: self.animation,
            render: self.render.options(),
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# vasctree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/vasctree/vasctree.toml
#   Local:  <data_dir>/.vasctree.toml
#   Env:    VASCTREE_* environment variables, e.g. VASCTREE_PICKING__MIN_RADIUS=0.01

# Dataset directory used when none is given
# data_dir = "~/data/Nterm_128"

[topology]
# Accept points not referenced by any line cell
# allow_isolated_points = false

[radius]
# auto | point-average | per-edge  (auto: 2D per-edge, 3D point-average)
# mode = "auto"
# fallback = 0.01
# floor = 0.001

[picking]
# min_radius = 0.005

[animation]
# speed = 2.0
# reveal_stride = 5
# speed_factor = 1.5

[camera]
# min_distance = 0.02
# max_distance = 2.0
# orbit_sensitivity = 0.6
# pan_factor = 0.002
# zoom_step = 1.08

[projection]
# fov_y = 45.0
# near = 0.001
# far = 10.0

[render]
# flat | smooth
# shading = "smooth"
# depth | radius
# color_by = "depth"
# fixed_radius = false
# transparency = false
# width = 800
# height = 600
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_building_policy_then_follows_dimension() {
        let settings = Settings::default();

        assert_eq!(
            settings.radius_policy(Dimension::TwoD).mode,
            RadiusMode::PerEdge
        );
        assert_eq!(
            settings.radius_policy(Dimension::ThreeD).mode,
            RadiusMode::PointAverage
        );
    }

    #[test]
    fn given_explicit_mode_when_building_policy_then_overrides_dimension() {
        let mut settings = Settings::default();
        settings.radius.mode = RadiusModeSetting::PerEdge;

        assert_eq!(
            settings.radius_policy(Dimension::ThreeD).mode,
            RadiusMode::PerEdge
        );
    }

    #[test]
    fn given_tilde_in_data_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/trees"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.data_dir.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_defaults_when_serializing_then_toml_has_sections() {
        let toml = Settings::default().to_toml().unwrap();

        assert!(toml.contains("[radius]"));
        assert!(toml.contains("[render]"));
        assert!(toml.contains("mode = \"auto\""));
    }

    #[test]
    fn given_template_when_parsing_then_yields_defaults() {
        let parsed: Settings = toml::from_str(&Settings::template()).unwrap();

        assert_eq!(parsed, Settings::default());
    }
}
