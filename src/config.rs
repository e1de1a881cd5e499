use crate::transform::Orbit;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse scene configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read scene configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scene configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub name: String,
    pub description: Option<String>,
}

/// Drawable surface and per-frame clear values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Logical width; the surface is this times the device pixel ratio
    pub width: u32,
    /// Logical height; the surface is this times the device pixel ratio
    pub height: u32,
    pub clear_color: [f64; 4],
    pub clear_depth: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
        }
    }
}

/// Scene configuration file
/// Input is in TOML
/// The [simulation] block names the scene, [display] sizes the surface and
/// sets clear values, [orbit] sets the figure's motion.
/// [display] and [orbit] fall back to their defaults when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub simulation: SceneMetadata,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub orbit: Orbit,
}

impl SceneConfig {
    pub fn new(data: impl AsRef<str>) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(data.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = read_to_string(path)?;
        Self::new(data)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(message))
        };
        let DisplayConfig {
            width,
            height,
            clear_color,
            clear_depth,
        } = &self.display;

        if *width == 0 || *height == 0 {
            return invalid(format!("display size must be non-zero, got {width}x{height}"));
        }

        if clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return invalid(format!("clear_color must lie in [0, 1], got {clear_color:?}"));
        }

        if !(0.0..=1.0).contains(clear_depth) {
            return invalid(format!("clear_depth must lie in [0, 1], got {clear_depth}"));
        }

        let Orbit {
            radius,
            speed,
            scale,
        } = &self.orbit;

        if !radius.is_finite() || *radius < 0.0 {
            return invalid(format!("orbit radius must be finite and non-negative, got {radius}"));
        }

        if !speed.is_finite() {
            return invalid(format!("orbit speed must be finite, got {speed}"));
        }

        if scale.iter().any(|s| !s.is_finite()) {
            return invalid(format!("orbit scale must be finite, got {scale:?}"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_empty_string() {
        assert!(SceneConfig::new("").is_err())
    }

    #[test]
    fn config_defaults() {
        let document = r#"
            [simulation]
            name = "test"
        "#;

        let result = SceneConfig::new(document).unwrap();

        assert_eq!(
            SceneConfig {
                simulation: SceneMetadata {
                    name: "test".to_owned(),
                    description: None,
                },
                display: DisplayConfig {
                    width: 1024,
                    height: 768,
                    clear_color: [0.0, 0.0, 0.0, 1.0],
                    clear_depth: 1.0,
                },
                orbit: Orbit {
                    radius: 0.5,
                    speed: 0.01,
                    scale: [0.25, 0.25],
                },
            },
            result
        );
    }

    #[test]
    fn config_partial_sections() {
        let document = r#"
            [simulation]
            name = "test"
            description = "testing"

            [display]
            width = 640

            [orbit]
            radius = 0.75
        "#;

        let result = SceneConfig::new(document).unwrap();

        assert_eq!(Some("testing".to_owned()), result.simulation.description);
        assert_eq!(640, result.display.width);
        assert_eq!(768, result.display.height);
        assert_eq!(0.75, result.orbit.radius);
        assert_eq!(0.01, result.orbit.speed);
    }

    #[test]
    fn config_rejects_zero_size() {
        let document = r#"
            [simulation]
            name = "test"

            [display]
            height = 0
        "#;

        assert!(matches!(
            SceneConfig::new(document),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn config_rejects_negative_radius() {
        let document = r#"
            [simulation]
            name = "test"

            [orbit]
            radius = -1.0
        "#;

        assert!(matches!(
            SceneConfig::new(document),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn config_rejects_out_of_range_clear_color() {
        let document = r#"
            [simulation]
            name = "test"

            [display]
            clear_color = [0.0, 2.0, 0.0, 1.0]
        "#;

        assert!(matches!(
            SceneConfig::new(document),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn config_missing_file() {
        assert!(matches!(
            SceneConfig::from_file("/nonexistent/orbitgraphs/scene.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
