//! Shader uniforms with change tracking
//!
//! Values are written by controller threads and uploaded by the render thread.
//! One lock covers the value and the changed flag, so a commit always uploads a
//! whole value.

use crate::render::gl::{GlContext, UniformLocation};
use crate::render::shader::{GlslType, ScalarKind};
use crate::system::state_variable::StateVariable;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A stored uniform value, sized to its type's component count
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Float components
    Floats(Vec<f32>),
    /// Int components
    Ints(Vec<i32>),
    /// Bool components
    Bools(Vec<bool>),
}

impl UniformValue {
    fn as_floats(&self) -> Vec<f32> {
        match self {
            Self::Floats(values) => values.clone(),
            Self::Ints(values) => values.iter().map(|&v| v as f32).collect(),
            Self::Bools(values) => values.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect(),
        }
    }

    fn as_ints(&self) -> Vec<i32> {
        match self {
            Self::Floats(values) => values.iter().map(|&v| v as i32).collect(),
            Self::Ints(values) => values.clone(),
            Self::Bools(values) => values.iter().map(|&v| i32::from(v)).collect(),
        }
    }
}

#[derive(Debug, Default)]
struct UniformState {
    value: Option<UniformValue>,
    changed: bool,
}

/// A uniform declared by a linked program
#[derive(Debug)]
pub struct Uniform {
    name: String,
    glsl_type: GlslType,
    location: Option<UniformLocation>,
    state: Mutex<UniformState>,
}

fn sized<T: Copy + Default>(values: &[T], count: usize) -> Vec<T> {
    let mut out = vec![T::default(); count];
    let copied = values.len().min(count);
    out[..copied].copy_from_slice(&values[..copied]);
    out
}

impl Uniform {
    /// Uniform with no value; `location` is `None` when the linker dropped it
    pub fn new(name: impl Into<String>, glsl_type: GlslType, location: Option<UniformLocation>) -> Self {
        Self {
            name: name.into(),
            glsl_type,
            location,
            state: Mutex::new(UniformState::default()),
        }
    }

    /// Resolved location
    pub const fn location(&self) -> Option<UniformLocation> {
        self.location
    }

    /// Last stored value
    pub fn value(&self) -> Option<UniformValue> {
        self.lock().value.clone()
    }

    fn lock(&self) -> MutexGuard<'_, UniformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, value: UniformValue) {
        if self.glsl_type.scalar_kind().is_none() {
            log::warn!("Uniform {} has type {} with no upload path", self.name, self.glsl_type);
        }
        let mut state = self.lock();
        state.value = Some(value);
        state.changed = true;
    }

    /// Upload the pending value, returning whether anything was sent
    ///
    /// Uniforms without a location clear their flag without uploading.
    /// Types with no upload path keep their flag set.
    pub fn commit_change(&self, gl: &dyn GlContext) -> bool {
        let mut state = self.lock();
        if !state.changed {
            return false;
        }

        let Some(location) = self.location else {
            state.changed = false;
            return false;
        };
        let Some(value) = state.value.as_ref() else {
            state.changed = false;
            return false;
        };

        let components = self.glsl_type.component_count();
        match (self.glsl_type.scalar_kind(), self.glsl_type.matrix_dimension()) {
            (Some(ScalarKind::Float), Some(dimension)) => {
                gl.uniform_matrix(location, dimension, &value.as_floats());
            }
            (Some(ScalarKind::Float), None) => gl.uniform_f32(location, components, &value.as_floats()),
            (Some(ScalarKind::Int | ScalarKind::Bool), _) => {
                gl.uniform_i32(location, components, &value.as_ints());
            }
            (None, _) => {
                log::trace!("Uniform {} left pending: no upload path for {}", self.name, self.glsl_type);
                return false;
            }
        }

        state.changed = false;
        true
    }
}

impl StateVariable for Uniform {
    fn name(&self) -> &str {
        &self.name
    }

    fn glsl_type(&self) -> &GlslType {
        &self.glsl_type
    }

    fn set_floats(&self, values: &[f32]) {
        self.store(UniformValue::Floats(sized(values, self.glsl_type.component_count())));
    }

    fn set_ints(&self, values: &[i32]) {
        self.store(UniformValue::Ints(sized(values, self.glsl_type.component_count())));
    }

    fn set_bools(&self, values: &[bool]) {
        self.store(UniformValue::Bools(sized(values, self.glsl_type.component_count())));
    }

    fn has_changed(&self) -> bool {
        self.lock().changed
    }
}
