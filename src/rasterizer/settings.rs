//! Rasterizer settings
//!
//! Stored as RON (Rusty Object Notation) so they can be tweaked by hand.
//! Fields missing from a file keep their default values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::math::{Vec3, Vec4};
use super::texture::Sampling;

/// Directional sun plus ambient term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub enabled: bool,
    /// Direction towards the sun, normalized on use
    pub sun_direction: Vec3,
    pub sun_color: Vec4,
    pub sun_intensity: f32,
    pub ambient_color: Vec4,
    /// Lower bound of the light factor
    pub ambient_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            enabled: true,
            sun_direction: Vec3::new(0.5, 1.0, 0.75).normalize(),
            sun_color: Vec4::rgb(1.0, 0.95, 0.85),
            sun_intensity: 1.0,
            ambient_color: Vec4::rgb(0.15, 0.18, 0.3),
            ambient_intensity: 0.2,
        }
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Interpolate attributes divided by w (false = affine, PS1 warping)
    pub perspective_correct: bool,
    /// Skip triangles facing away (false = draw both sides)
    pub backface_cull: bool,
    /// Shade alternate pixels each frame (checkerboard)
    pub interlaced: bool,
    pub sampling: Sampling,
    pub mipmaps: bool,
    /// Added to the computed mip level
    pub mip_bias: f32,
    pub lighting: Lighting,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            perspective_correct: true,
            backface_cull: true,
            interlaced: false,
            sampling: Sampling::default(),
            mipmaps: true,
            mip_bias: 0.0,
            lighting: Lighting::default(),
        }
    }
}

/// Error type for settings loading
#[derive(Debug)]
pub enum SettingsError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(e: ron::error::SpannedError) -> Self {
        SettingsError::ParseError(e)
    }
}

impl From<ron::Error> for SettingsError {
    fn from(e: ron::Error) -> Self {
        SettingsError::SerializeError(e)
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::IoError(e) => write!(f, "IO error: {}", e),
            SettingsError::ParseError(e) => write!(f, "Parse error: {}", e),
            SettingsError::SerializeError(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

impl RenderSettings {
    /// Load settings from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Save settings to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    pub fn from_ron_str(s: &str) -> Result<Self, SettingsError> {
        let settings: RenderSettings = ron::from_str(s)?;
        log::debug!("Parsed render settings: {:?}", settings);
        Ok(settings)
    }

    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::texture::{Filter, Wrap};

    #[test]
    fn test_partial_file_keeps_defaults() {
        let s = RenderSettings::from_ron_str(
            "(interlaced: true, sampling: (filter: CubicHermite, wrap: Clamp), lighting: (enabled: false))",
        )
        .unwrap();
        assert!(s.interlaced);
        assert!(s.perspective_correct);
        assert_eq!(s.sampling.filter, Filter::CubicHermite);
        assert_eq!(s.sampling.wrap, Wrap::Clamp);
        assert!(!s.lighting.enabled);
        assert_eq!(s.lighting.ambient_intensity, Lighting::default().ambient_intensity);
    }

    #[test]
    fn test_save_and_load_file() {
        let mut s = RenderSettings::default();
        s.mip_bias = -0.5;
        s.backface_cull = false;
        let path = std::env::temp_dir().join(format!("scanline-settings-{}.ron", std::process::id()));
        s.save(&path).unwrap();
        let loaded = RenderSettings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_bad_input_is_parse_error() {
        assert!(matches!(
            RenderSettings::from_ron_str("(interlaced: maybe)"),
            Err(SettingsError::ParseError(_))
        ));
        assert!(matches!(
            RenderSettings::load("/nonexistent/dir/settings.ron"),
            Err(SettingsError::IoError(_))
        ));
    }
}
