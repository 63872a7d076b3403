//! Camera state and the routing of its matrices into shader variables

pub mod auto_rotation;
pub mod state_controller;
pub mod state_variable;

pub use auto_rotation::AutoRotation;
pub use state_controller::{Projection, RoleMatchers, ViewableStateController};
pub use state_variable::{EqualityMatcher, StateVariable, StateVariableMatcher};

use crate::foundation::math::Vec3;
use std::sync::Arc;
use thiserror::Error;

/// Invalid operations on state controllers
#[derive(Error, Debug)]
pub enum StateError {
    /// Rotation requested with a zero input delta
    #[error("Rotation delta is zero; the rotation axis is undefined")]
    ZeroRotation,

    /// A projection parameter was rejected
    #[error("Invalid {parameter}: {value}")]
    InvalidProjection {
        /// Parameter name
        parameter: &'static str,
        /// Rejected value
        value: f32,
    },

    /// A camera input was NaN or infinite
    #[error("Non-finite input to {operation}: {value}")]
    NonFiniteInput {
        /// Operation name
        operation: &'static str,
        /// Rejected value
        value: f32,
    },

    /// The background rotation thread could not start
    #[error("Failed to start background rotation: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Camera controls issued by input handlers and animations
pub trait Viewable: Send + Sync {
    /// Rotate about the origin; axis `(dy, dx, 0)`, angle `|(dx, dy)|` degrees
    fn rotate_camera(&self, dx: f32, dy: f32) -> Result<(), StateError> {
        self.rotate_camera_about(dx, dy, Vec3::zeros())
    }

    /// Rotate about a world-space pivot
    fn rotate_camera_about(&self, dx: f32, dy: f32, pivot: Vec3) -> Result<(), StateError>;

    /// Move along the view axis; successive zooms add up
    fn zoom_camera(&self, dz: f32) -> Result<(), StateError>;

    /// Viewport width / height
    fn viewport_ratio(&self) -> f32;
    /// Set the viewport width / height
    fn set_viewport_ratio(&self, ratio: f32) -> Result<(), StateError>;

    /// Vertical field of view in degrees
    fn fov(&self) -> f32;
    /// Set the vertical field of view in degrees
    fn set_fov(&self, fov: f32) -> Result<(), StateError>;

    /// Near clip distance
    fn near(&self) -> f32;
    /// Set the near clip distance
    fn set_near(&self, near: f32) -> Result<(), StateError>;

    /// Far clip distance
    fn far(&self) -> f32;
    /// Set the far clip distance
    fn set_far(&self, far: f32) -> Result<(), StateError>;
}

/// Something that owns values and pushes them into attached state variables
pub trait StateControllable: Send + Sync {
    /// Whether the controller takes part in rendering
    fn is_enabled(&self) -> bool;

    /// Attach a variable; attaching the same variable twice has no effect
    fn attach_state_variable(&self, variable: Arc<dyn StateVariable>);

    /// Remove an attached variable and any role binding it holds
    fn detach_state_variable(&self, variable: &Arc<dyn StateVariable>);

    /// Test every attached variable against the role matchers
    fn bind_attachments(&self);

    /// Drop role bindings; attached variables stay attached
    fn unbind_attachments(&self);

    /// Push current values into every bound variable
    fn envalue_bindings(&self);
}
