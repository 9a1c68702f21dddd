//! # Mesh Configuration
//!
//! Construction-time options for [`TriMesh`](crate::TriMesh). Every field has
//! a default, so an empty TOML document is a valid configuration:
//!
//! ```toml
//! reserve_vertices = 1024
//! reserve_faces = 2048
//! reject_degenerate_faces = true
//! degenerate_area_epsilon = 1e-12
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound for `reserve_vertices` and `reserve_faces`
pub const MAX_RESERVE: usize = 1 << 28;

/// Options applied when a mesh is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshConfig {
    /// Vertex capacity reserved up front
    pub reserve_vertices: usize,
    /// Face capacity reserved up front
    pub reserve_faces: usize,
    /// Reject triangles whose area is below `degenerate_area_epsilon`
    pub reject_degenerate_faces: bool,
    /// Area threshold used when `reject_degenerate_faces` is set
    pub degenerate_area_epsilon: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            reserve_vertices: 0,
            reserve_faces: 0,
            reject_degenerate_faces: false,
            degenerate_area_epsilon: 1e-12,
        }
    }
}

impl MeshConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MeshConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("reserve_vertices", self.reserve_vertices),
            ("reserve_faces", self.reserve_faces),
        ] {
            if value > MAX_RESERVE {
                return Err(ConfigError::Invalid(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_RESERVE, value
                )));
            }
        }
        if !self.degenerate_area_epsilon.is_finite() || self.degenerate_area_epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "degenerate_area_epsilon must be finite and >= 0, got {}",
                self.degenerate_area_epsilon
            )));
        }
        Ok(())
    }
}
