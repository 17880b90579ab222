//! Scene configuration, loaded from YAML. Every field defaults to the values
//! the space client ships with, so an empty file is a valid config.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use starroom_common::{Color3, Color4};
use std::collections::BTreeMap;
use std::path::Path;

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How a synchronization pass maps the player map onto scene entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Diff against the previous pass: dispose departed, create joined,
    /// update the rest in place.
    #[default]
    Reconcile,
    /// Dispose every participant entity and recreate all of them.
    FullReissue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLightConfig {
    pub intensity: f32,
    pub ground_color: Color3,
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            ground_color: Color3::BLUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunLightConfig {
    pub position: Vec3,
    pub intensity: f32,
}

impl Default for SunLightConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            intensity: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub lower_radius_limit: f32,
    pub upper_radius_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lower_radius_limit: 10.0,
            upper_radius_limit: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    /// Cube texture root; faces are resolved by the host.
    pub texture_root: String,
    pub size: f32,
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            texture_root: "assets/images/skybox/skybox".into(),
            size: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub size: f32,
    /// Diffuse colour per ship model.
    pub model_colors: BTreeMap<String, Color3>,
    /// Used for models missing from `model_colors`.
    pub fallback_color: Color3,
}

impl Default for ShipConfig {
    fn default() -> Self {
        let mut model_colors = BTreeMap::new();
        model_colors.insert("scout".to_owned(), Color3::new(0.6, 0.8, 1.0));
        model_colors.insert("freighter".to_owned(), Color3::new(0.9, 0.6, 0.2));
        Self {
            size: 1.0,
            model_colors,
            fallback_color: Color3::new(0.7, 0.7, 0.7),
        }
    }
}

/// Static decor spawned once at scene setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetConfig {
    pub name: String,
    pub position: Vec3,
    pub diameter: f32,
    pub color: Color3,
    #[serde(default)]
    pub emissive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub clear_color: Color4,
    pub ambient: AmbientLightConfig,
    pub sun: SunLightConfig,
    pub camera: CameraConfig,
    pub skybox: SkyboxConfig,
    pub ship: ShipConfig,
    pub planets: Vec<PlanetConfig>,
    pub policy: SyncPolicy,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: Color4::new(0.0, 0.0, 0.0, 1.0),
            ambient: AmbientLightConfig::default(),
            sun: SunLightConfig::default(),
            camera: CameraConfig::default(),
            skybox: SkyboxConfig::default(),
            ship: ShipConfig::default(),
            planets: vec![
                PlanetConfig {
                    name: "sun".into(),
                    position: Vec3::ZERO,
                    diameter: 8.0,
                    color: Color3::new(1.0, 0.85, 0.3),
                    emissive: true,
                },
                PlanetConfig {
                    name: "earth".into(),
                    position: Vec3::new(30.0, 0.0, 0.0),
                    diameter: 3.0,
                    color: Color3::new(0.2, 0.4, 0.9),
                    emissive: false,
                },
            ],
            policy: SyncPolicy::default(),
        }
    }
}

impl SceneConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.as_ref().display(), "scene config loaded");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.lower_radius_limit > 0.0 && cam.lower_radius_limit <= cam.upper_radius_limit) {
            return Err(ConfigError::Invalid(format!(
                "camera radius limits must satisfy 0 < lower <= upper, got {} / {}",
                cam.lower_radius_limit, cam.upper_radius_limit
            )));
        }
        if self.skybox.size <= 0.0 {
            return Err(ConfigError::Invalid("skybox size must be positive".into()));
        }
        if self.ship.size <= 0.0 {
            return Err(ConfigError::Invalid("ship size must be positive".into()));
        }
        if let Some(p) = self.planets.iter().find(|p| p.diameter <= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "planet {} must have a positive diameter",
                p.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_client_constants() {
        let config = SceneConfig::default();
        assert_eq!(config.camera.lower_radius_limit, 10.0);
        assert_eq!(config.camera.upper_radius_limit, 50.0);
        assert_eq!(config.skybox.texture_root, "assets/images/skybox/skybox");
        assert_eq!(config.skybox.size, 1000.0);
        assert_eq!(config.ambient.intensity, 0.5);
        assert_eq!(config.sun.intensity, 2.0);
        assert_eq!(config.policy, SyncPolicy::Reconcile);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = SceneConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn partial_override() {
        let yaml = "camera:\n  upper_radius_limit: 80.0\npolicy: full_reissue\nplanets: []\n";
        let config = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.camera.lower_radius_limit, 10.0);
        assert_eq!(config.camera.upper_radius_limit, 80.0);
        assert_eq!(config.policy, SyncPolicy::FullReissue);
        assert!(config.planets.is_empty());
    }

    #[test]
    fn inverted_limits_rejected() {
        let yaml = "camera:\n  lower_radius_limit: 60.0\n  upper_radius_limit: 50.0\n";
        assert!(matches!(
            SceneConfig::from_yaml_str(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_policy_rejected() {
        assert!(matches!(
            SceneConfig::from_yaml_str("policy: sometimes\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "ship:\n  size: 2.5").unwrap();
        let config = SceneConfig::load(tmp.path()).unwrap();
        assert_eq!(config.ship.size, 2.5);
        assert!(config.ship.model_colors.contains_key("scout"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SceneConfig::load(dir.path().join("nope.yaml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn yaml_round_trip() {
        let config = SceneConfig::default();
        let back = SceneConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
