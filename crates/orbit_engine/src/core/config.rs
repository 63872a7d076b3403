//! # Viewer Configuration
//!
//! Everything needed to assemble a rotating model viewer: camera projection,
//! background animation, fixed render state, the uniform names that receive
//! camera matrices and where the model and shaders live.
//!
//! Every section has defaults, so a partial file (or none at all) is valid.

use crate::render::RenderSettings;
use crate::system::{EqualityMatcher, Projection, RoleMatchers};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub use crate::config::{Config, ConfigError};

/// Camera projection and starting position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Initial width / height ratio, replaced on the first resize
    pub aspect_ratio: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Zoom applied once after construction
    pub initial_zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let projection = Projection::default();
        Self {
            fov_degrees: projection.fov_degrees,
            aspect_ratio: projection.aspect_ratio,
            near: projection.near,
            far: projection.far,
            initial_zoom: -4.0,
        }
    }
}

impl CameraConfig {
    /// Projection parameters
    pub const fn projection(&self) -> Projection {
        Projection {
            fov_degrees: self.fov_degrees,
            aspect_ratio: self.aspect_ratio,
            near: self.near,
            far: self.far,
        }
    }
}

/// Background rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Run the background rotation
    pub enabled: bool,
    /// Degrees per second
    pub speed: f32,
    /// Wake-up interval in milliseconds
    pub tick_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: crate::system::auto_rotation::DEFAULT_SPEED,
            tick_ms: crate::system::auto_rotation::DEFAULT_INTERVAL.as_millis() as u64,
        }
    }
}

impl AnimationConfig {
    /// Wake-up interval
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// A uniform selected by declared type and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformBinding {
    /// GLSL type name, e.g. `mat4`
    pub glsl_type: String,
    /// Uniform name
    pub name: String,
}

impl UniformBinding {
    /// Binding for `glsl_type name`
    pub fn new(glsl_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self { glsl_type: glsl_type.into(), name: name.into() }
    }

    fn matcher(&self) -> EqualityMatcher {
        EqualityMatcher::from_names(&self.glsl_type, self.name.clone())
    }
}

/// Uniforms that receive the camera matrices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Projection matrix
    pub projection: UniformBinding,
    /// Model-view matrix
    pub modelview: UniformBinding,
    /// Normal matrix
    pub normal: UniformBinding,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            projection: UniformBinding::new("mat4", "projection"),
            modelview: UniformBinding::new("mat4", "modelview"),
            normal: UniformBinding::new("mat4", "normalMat"),
        }
    }
}

impl BindingConfig {
    /// Equality matchers for each camera role
    pub fn role_matchers(&self) -> RoleMatchers {
        RoleMatchers {
            projection: Box::new(self.projection.matcher()),
            modelview: Box::new(self.modelview.matcher()),
            normal: Box::new(self.normal.matcher()),
        }
    }
}

/// Asset locations, relative to `root`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory
    pub root: String,
    /// OBJ model
    pub model: String,
    /// Vertex shader source
    pub vertex_shader: String,
    /// Fragment shader source
    pub fragment_shader: String,
    /// Vertex buffer index sourcing each attribute
    pub attribute_buffers: BTreeMap<String, usize>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            model: "ico.obj".to_string(),
            vertex_shader: "shader.vert".to_string(),
            fragment_shader: "shader.frag".to_string(),
            attribute_buffers: BTreeMap::from([
                ("inputPosition".to_string(), 0),
                ("inputNormal".to_string(), 1),
            ]),
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Camera projection
    pub camera: CameraConfig,
    /// Background rotation
    pub animation: AnimationConfig,
    /// Fixed render state
    pub render: RenderSettings,
    /// Matrix uniforms
    pub bindings: BindingConfig,
    /// Model and shader locations
    pub assets: AssetConfig,
}

impl Config for ViewerConfig {}

impl ViewerConfig {
    /// Check values a file could get wrong
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera
            .projection()
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        if !self.animation.speed.is_finite() {
            return Err(ConfigError::Invalid(format!("animation speed {} is not finite", self.animation.speed)));
        }
        if self.animation.tick_ms == 0 {
            return Err(ConfigError::Invalid("animation tick must be at least 1 ms".to_string()));
        }
        if !self.camera.initial_zoom.is_finite() {
            return Err(ConfigError::Invalid("initial zoom is not finite".to_string()));
        }
        if self.assets.attribute_buffers.is_empty() {
            return Err(ConfigError::Invalid("no attribute buffers mapped".to_string()));
        }
        Ok(())
    }
}
