//! Camera state controller
//!
//! Keeps an accumulated rotation and translation plus the projection
//! parameters, and pushes the derived matrices into whichever attached
//! variables match the projection, model-view and normal roles. All mutators
//! run under a single lock and push synchronously.

use super::state_variable::{EqualityMatcher, StateVariable, StateVariableMatcher};
use super::{StateControllable, StateError, Viewable};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::shader::GlslType;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Viewport width / height
    pub aspect_ratio: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self { fov_degrees: 60.0, aspect_ratio: 1.0, near: 2.0, far: 10_000.0 }
    }
}

impl Projection {
    /// Reject parameters that produce a degenerate projection
    pub fn validate(&self) -> Result<(), StateError> {
        let invalid = |parameter, value| Err(StateError::InvalidProjection { parameter, value });

        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return invalid("field of view", self.fov_degrees);
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return invalid("viewport ratio", self.aspect_ratio);
        }
        if !(self.near.is_finite() && self.near > 0.0) {
            return invalid("near plane", self.near);
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return invalid("far plane", self.far);
        }
        Ok(())
    }

    /// GL perspective matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_gl(self.fov_degrees, self.aspect_ratio, self.near, self.far)
    }
}

/// Matchers selecting the variables that receive each camera matrix
pub struct RoleMatchers {
    /// Receives the projection matrix
    pub projection: Box<dyn StateVariableMatcher>,
    /// Receives the model-view matrix
    pub modelview: Box<dyn StateVariableMatcher>,
    /// Receives the normal matrix
    pub normal: Box<dyn StateVariableMatcher>,
}

impl Default for RoleMatchers {
    /// `mat4 projection`, `mat4 modelview`, `mat4 normalMat`
    fn default() -> Self {
        Self {
            projection: Box::new(EqualityMatcher::new(GlslType::Mat4, "projection")),
            modelview: Box::new(EqualityMatcher::new(GlslType::Mat4, "modelview")),
            normal: Box::new(EqualityMatcher::new(GlslType::Mat4, "normalMat")),
        }
    }
}

impl std::fmt::Debug for RoleMatchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleMatchers").finish_non_exhaustive()
    }
}

type Bindings = Vec<Arc<dyn StateVariable>>;

struct CameraState {
    rotation: Mat4,
    translation: Mat4,
    projection: Projection,
    attachments: Bindings,
    projection_bindings: Bindings,
    modelview_bindings: Bindings,
    normal_bindings: Bindings,
}

impl CameraState {
    fn modelview(&self) -> Mat4 {
        self.translation * self.rotation
    }

    fn push_projection(&self) {
        push_matrix(&self.projection_bindings, &self.projection.matrix());
    }

    fn push_modelview(&self) {
        let modelview = self.modelview();
        push_matrix(&self.modelview_bindings, &modelview);
        push_matrix(&self.normal_bindings, &modelview.normal_matrix_approx());
    }
}

/// Column-major upload; `mat3` variables get the upper-left block
fn push_matrix(bindings: &[Arc<dyn StateVariable>], matrix: &Mat4) {
    for variable in bindings {
        match variable.glsl_type() {
            GlslType::Mat3 => variable.set_floats(matrix.upper_left_3x3().as_slice()),
            _ => variable.set_floats(matrix.as_slice()),
        }
    }
}

/// Orbit camera routing projection, model-view and normal matrices into variables
pub struct ViewableStateController {
    state: Mutex<CameraState>,
    matchers: RoleMatchers,
    enabled: bool,
}

impl ViewableStateController {
    /// Controller with identity rotation and translation
    pub fn new(projection: Projection, matchers: RoleMatchers) -> Result<Self, StateError> {
        projection.validate()?;
        log::debug!("Camera projection: {projection:?}");

        Ok(Self {
            state: Mutex::new(CameraState {
                rotation: Mat4::identity(),
                translation: Mat4::identity(),
                projection,
                attachments: Vec::new(),
                projection_bindings: Vec::new(),
                modelview_bindings: Vec::new(),
                normal_bindings: Vec::new(),
            }),
            matchers,
            enabled: true,
        })
    }

    fn lock(&self) -> MutexGuard<'_, CameraState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_projection(&self, change: impl FnOnce(&mut Projection)) -> Result<(), StateError> {
        let mut state = self.lock();
        let mut projection = state.projection;
        change(&mut projection);
        projection.validate()?;
        state.projection = projection;
        state.push_projection();
        Ok(())
    }

    /// Current projection parameters
    pub fn projection(&self) -> Projection {
        self.lock().projection
    }

    /// Current projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.lock().projection.matrix()
    }

    /// Current model-view matrix: translation × rotation
    pub fn modelview_matrix(&self) -> Mat4 {
        self.lock().modelview()
    }

    /// Current normal matrix
    pub fn normal_matrix(&self) -> Mat4 {
        self.lock().modelview().normal_matrix_approx()
    }

    /// Accumulated rotation
    pub fn rotation_matrix(&self) -> Mat4 {
        self.lock().rotation
    }

    /// Accumulated translation
    pub fn translation_matrix(&self) -> Mat4 {
        self.lock().translation
    }

    /// Number of attached variables
    pub fn attachment_count(&self) -> usize {
        self.lock().attachments.len()
    }

    /// Number of variables bound to the projection, model-view and normal roles
    pub fn binding_counts(&self) -> (usize, usize, usize) {
        let state = self.lock();
        (
            state.projection_bindings.len(),
            state.modelview_bindings.len(),
            state.normal_bindings.len(),
        )
    }
}

impl std::fmt::Debug for ViewableStateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewableStateController")
            .field("projection", &self.projection())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Viewable for ViewableStateController {
    fn rotate_camera_about(&self, dx: f32, dy: f32, pivot: Vec3) -> Result<(), StateError> {
        let angle = dx.hypot(dy);
        if !(angle > 0.0) {
            return Err(StateError::ZeroRotation);
        }
        if !angle.is_finite() || !pivot.iter().all(|c| c.is_finite()) {
            return Err(StateError::NonFiniteInput { operation: "rotate", value: angle });
        }

        let axis = Vec3::new(dy / angle, dx / angle, 0.0);
        let rotation = Mat4::rotation_degrees(angle, &axis).ok_or(StateError::ZeroRotation)?;
        let step = Mat4::rotation_about(&rotation, &pivot);

        let mut state = self.lock();
        state.rotation = step * state.rotation;
        state.push_modelview();
        Ok(())
    }

    fn zoom_camera(&self, dz: f32) -> Result<(), StateError> {
        if !dz.is_finite() {
            return Err(StateError::NonFiniteInput { operation: "zoom", value: dz });
        }

        let mut state = self.lock();
        state.translation = Mat4::new_translation(&Vec3::new(0.0, 0.0, dz)) * state.translation;
        state.push_modelview();
        Ok(())
    }

    fn viewport_ratio(&self) -> f32 {
        self.lock().projection.aspect_ratio
    }

    fn set_viewport_ratio(&self, ratio: f32) -> Result<(), StateError> {
        self.update_projection(|projection| projection.aspect_ratio = ratio)
    }

    fn fov(&self) -> f32 {
        self.lock().projection.fov_degrees
    }

    fn set_fov(&self, fov: f32) -> Result<(), StateError> {
        self.update_projection(|projection| projection.fov_degrees = fov)
    }

    fn near(&self) -> f32 {
        self.lock().projection.near
    }

    fn set_near(&self, near: f32) -> Result<(), StateError> {
        self.update_projection(|projection| projection.near = near)
    }

    fn far(&self) -> f32 {
        self.lock().projection.far
    }

    fn set_far(&self, far: f32) -> Result<(), StateError> {
        self.update_projection(|projection| projection.far = far)
    }
}

impl StateControllable for ViewableStateController {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn attach_state_variable(&self, variable: Arc<dyn StateVariable>) {
        let mut state = self.lock();
        if !state.attachments.iter().any(|attached| Arc::ptr_eq(attached, &variable)) {
            state.attachments.push(variable);
        }
    }

    fn detach_state_variable(&self, variable: &Arc<dyn StateVariable>) {
        let mut state = self.lock();
        let keep = |attached: &Arc<dyn StateVariable>| !Arc::ptr_eq(attached, variable);
        state.attachments.retain(keep);
        state.projection_bindings.retain(keep);
        state.modelview_bindings.retain(keep);
        state.normal_bindings.retain(keep);
    }

    fn bind_attachments(&self) {
        let mut state = self.lock();
        let select = |matcher: &dyn StateVariableMatcher, attachments: &Bindings| -> Bindings {
            attachments
                .iter()
                .filter(|variable| matcher.matches(variable.as_ref()))
                .cloned()
                .collect()
        };

        let projection = select(self.matchers.projection.as_ref(), &state.attachments);
        let modelview = select(self.matchers.modelview.as_ref(), &state.attachments);
        let normal = select(self.matchers.normal.as_ref(), &state.attachments);
        state.projection_bindings = projection;
        state.modelview_bindings = modelview;
        state.normal_bindings = normal;

        log::debug!(
            "Bound {} projection, {} model-view and {} normal variables out of {}",
            state.projection_bindings.len(),
            state.modelview_bindings.len(),
            state.normal_bindings.len(),
            state.attachments.len()
        );
    }

    fn unbind_attachments(&self) {
        let mut state = self.lock();
        state.projection_bindings.clear();
        state.modelview_bindings.clear();
        state.normal_bindings.clear();
    }

    fn envalue_bindings(&self) {
        let state = self.lock();
        state.push_projection();
        state.push_modelview();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::uniform::{Uniform, UniformValue};
    use approx::assert_relative_eq;

    fn controller() -> ViewableStateController {
        ViewableStateController::new(Projection::default(), RoleMatchers::default()).unwrap()
    }

    fn floats(uniform: &Uniform) -> Vec<f32> {
        match uniform.value() {
            Some(UniformValue::Floats(values)) => values,
            other => panic!("unexpected value {other:?}"),
        }
    }

    fn bound(controller: &ViewableStateController, uniforms: &[Arc<Uniform>]) {
        for uniform in uniforms {
            controller.attach_state_variable(uniform.clone());
        }
        controller.bind_attachments();
    }

    #[test]
    fn test_zero_rotation_is_rejected_and_leaves_state() {
        let camera = controller();
        camera.rotate_camera(5.0, 0.0).unwrap();
        let before = camera.rotation_matrix();

        assert!(matches!(camera.rotate_camera(0.0, 0.0), Err(StateError::ZeroRotation)));
        assert_eq!(camera.rotation_matrix(), before);
    }

    #[test]
    fn test_zoom_is_additive() {
        let split = controller();
        split.zoom_camera(-1.5).unwrap();
        split.zoom_camera(-2.25).unwrap();

        let single = controller();
        single.zoom_camera(-3.75).unwrap();

        assert_relative_eq!(split.translation_matrix(), single.translation_matrix(), epsilon = 1e-6);
        assert_relative_eq!(single.translation_matrix()[(2, 3)], -3.75);
    }

    #[test]
    fn test_horizontal_drag_rotates_about_vertical_axis() {
        let camera = controller();
        camera.rotate_camera(90.0, 0.0).unwrap();

        let x = camera.rotation_matrix().transform_vector(&Vec3::x());
        assert_relative_eq!(x, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotations_accumulate_by_premultiplication() {
        let camera = controller();
        camera.rotate_camera(30.0, 0.0).unwrap();
        camera.rotate_camera(0.0, 45.0).unwrap();

        let expected = Mat4::rotation_degrees(45.0, &Vec3::x()).unwrap()
            * Mat4::rotation_degrees(30.0, &Vec3::y()).unwrap();
        assert_relative_eq!(camera.rotation_matrix(), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_pivot_stays_fixed() {
        let camera = controller();
        let pivot = Vec3::new(0.0, 0.0, -3.0);
        camera.rotate_camera_about(40.0, 25.0, pivot).unwrap();

        let moved = camera.rotation_matrix().transform_point(&pivot.into());
        assert_relative_eq!(moved.coords, pivot, epsilon = 1e-5);
    }

    #[test]
    fn test_bindings_receive_matrices() {
        let camera = controller();
        let projection = Arc::new(Uniform::new("projection", GlslType::Mat4, None));
        let modelview = Arc::new(Uniform::new("modelview", GlslType::Mat4, None));
        let normal = Arc::new(Uniform::new("normalMat", GlslType::Mat4, None));
        let other = Arc::new(Uniform::new("tint", GlslType::Vec4, None));
        bound(&camera, &[projection.clone(), modelview.clone(), normal.clone(), other.clone()]);
        assert_eq!(camera.binding_counts(), (1, 1, 1));

        camera.envalue_bindings();
        assert_eq!(floats(&projection), camera.projection_matrix().as_slice());
        assert!(!other.has_changed());

        camera.zoom_camera(-4.0).unwrap();
        let values = floats(&modelview);
        // column-major: translation in elements 12..15
        assert_relative_eq!(values[14], -4.0);
        assert_eq!(floats(&normal), camera.normal_matrix().as_slice());
    }

    #[test]
    fn test_variable_may_take_several_roles() {
        let matchers = RoleMatchers {
            projection: Box::new(EqualityMatcher::new(GlslType::Mat4, "shared")),
            modelview: Box::new(EqualityMatcher::new(GlslType::Mat4, "shared")),
            normal: Box::new(|variable: &dyn StateVariable| variable.name() == "normals3"),
        };
        let camera = ViewableStateController::new(Projection::default(), matchers).unwrap();
        let shared = Arc::new(Uniform::new("shared", GlslType::Mat4, None));
        let normals3 = Arc::new(Uniform::new("normals3", GlslType::Mat3, None));
        bound(&camera, &[shared.clone(), normals3.clone()]);

        assert_eq!(camera.binding_counts(), (1, 1, 1));
        camera.envalue_bindings();
        assert_eq!(floats(&normals3).len(), 9);
    }

    #[test]
    fn test_attach_is_idempotent_and_unbind_keeps_attachments() {
        let camera = controller();
        let projection = Arc::new(Uniform::new("projection", GlslType::Mat4, None));
        camera.attach_state_variable(projection.clone());
        camera.attach_state_variable(projection.clone());
        assert_eq!(camera.attachment_count(), 1);

        camera.bind_attachments();
        camera.unbind_attachments();
        assert_eq!(camera.attachment_count(), 1);
        assert_eq!(camera.binding_counts(), (0, 0, 0));

        camera.bind_attachments();
        assert_eq!(camera.binding_counts(), (1, 0, 0));
    }

    #[test]
    fn test_detach_removes_attachment_and_binding() {
        let camera = controller();
        let projection = Arc::new(Uniform::new("projection", GlslType::Mat4, None));
        let modelview = Arc::new(Uniform::new("modelview", GlslType::Mat4, None));
        bound(&camera, &[projection.clone(), modelview.clone()]);
        assert_eq!(camera.binding_counts(), (1, 1, 0));

        let detached: Arc<dyn StateVariable> = projection.clone();
        camera.detach_state_variable(&detached);
        assert_eq!(camera.attachment_count(), 1);
        assert_eq!(camera.binding_counts(), (0, 1, 0));

        camera.zoom_camera(-1.0).unwrap();
        camera.set_fov(45.0).unwrap();
        assert!(projection.value().is_none());
    }

    #[test]
    fn test_projection_setters_push_and_validate() {
        let camera = controller();
        let projection = Arc::new(Uniform::new("projection", GlslType::Mat4, None));
        bound(&camera, &[projection.clone()]);

        camera.set_viewport_ratio(2.0).unwrap();
        assert!(projection.has_changed());
        assert_relative_eq!(camera.viewport_ratio(), 2.0);
        assert_eq!(floats(&projection), camera.projection_matrix().as_slice());

        assert!(camera.set_fov(180.0).is_err());
        assert!(camera.set_viewport_ratio(0.0).is_err());
        assert!(camera.set_near(0.0).is_err());
        assert!(camera.set_far(1.0).is_err());
        assert!(camera.set_near(f32::NAN).is_err());
        assert_relative_eq!(camera.fov(), 60.0);
        assert_relative_eq!(camera.near(), 2.0);
        assert_relative_eq!(camera.far(), 10_000.0);

        camera.set_fov(45.0).unwrap();
        camera.set_near(0.5).unwrap();
        camera.set_far(50.0).unwrap();
        assert_eq!(
            camera.projection(),
            Projection { fov_degrees: 45.0, aspect_ratio: 2.0, near: 0.5, far: 50.0 }
        );
    }

    #[test]
    fn test_non_finite_inputs_rejected() {
        let camera = controller();
        assert!(matches!(camera.zoom_camera(f32::INFINITY), Err(StateError::NonFiniteInput { .. })));
        assert!(camera.rotate_camera(f32::NAN, 1.0).is_err());
        assert_eq!(camera.rotation_matrix(), Mat4::identity());
    }

    #[test]
    fn test_invalid_initial_projection() {
        let projection = Projection { near: 5.0, far: 1.0, ..Projection::default() };
        assert!(ViewableStateController::new(projection, RoleMatchers::default()).is_err());
    }
}
