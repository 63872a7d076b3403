//! Named, typed values routed into shaders
//!
//! A state variable is set from any thread and picked up by the render
//! thread on its next commit. Matchers select which variables take a role
//! such as "projection matrix".

use crate::render::shader::GlslType;

/// A named, typed shader input with change tracking
pub trait StateVariable: Send + Sync {
    /// Declared name
    fn name(&self) -> &str;

    /// Declared type
    fn glsl_type(&self) -> &GlslType;

    /// Store float components, padded or truncated to the type's component count
    fn set_floats(&self, values: &[f32]);

    /// Store int components, padded or truncated to the type's component count
    fn set_ints(&self, values: &[i32]);

    /// Store bool components, padded or truncated to the type's component count
    fn set_bools(&self, values: &[bool]);

    /// Whether a value is waiting to be committed
    fn has_changed(&self) -> bool;

    /// Store a single float
    fn set_float(&self, value: f32) {
        self.set_floats(&[value]);
    }

    /// Store a single int
    fn set_int(&self, value: i32) {
        self.set_ints(&[value]);
    }

    /// Store a single bool
    fn set_bool(&self, value: bool) {
        self.set_bools(&[value]);
    }
}

/// Selects state variables for a role
pub trait StateVariableMatcher: Send + Sync {
    /// Whether `variable` takes the role
    fn matches(&self, variable: &dyn StateVariable) -> bool;
}

impl<F> StateVariableMatcher for F
where
    F: Fn(&dyn StateVariable) -> bool + Send + Sync,
{
    fn matches(&self, variable: &dyn StateVariable) -> bool {
        self(variable)
    }
}

/// Matches on exact type and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityMatcher {
    glsl_type: GlslType,
    name: String,
}

impl EqualityMatcher {
    /// Matcher for `<glsl_type> <name>`
    pub fn new(glsl_type: GlslType, name: impl Into<String>) -> Self {
        Self { glsl_type, name: name.into() }
    }

    /// Matcher from a type keyword and a name, e.g. `("mat4", "projection")`
    pub fn from_names(glsl_type: &str, name: impl Into<String>) -> Self {
        Self::new(GlslType::parse(glsl_type), name)
    }
}

impl StateVariableMatcher for EqualityMatcher {
    fn matches(&self, variable: &dyn StateVariable) -> bool {
        variable.glsl_type() == &self.glsl_type && variable.name() == self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::uniform::Uniform;

    #[test]
    fn test_equality_matcher_needs_type_and_name() {
        let matcher = EqualityMatcher::from_names("mat4", "projection");

        assert!(matcher.matches(&Uniform::new("projection", GlslType::Mat4, None)));
        assert!(!matcher.matches(&Uniform::new("projection", GlslType::Mat3, None)));
        assert!(!matcher.matches(&Uniform::new("modelview", GlslType::Mat4, None)));
    }

    #[test]
    fn test_closure_matcher() {
        let any_matrix = |variable: &dyn StateVariable| variable.glsl_type().matrix_dimension().is_some();

        assert!(any_matrix.matches(&Uniform::new("normalMat", GlslType::Mat3, None)));
        assert!(!any_matrix.matches(&Uniform::new("tint", GlslType::Vec4, None)));
    }
}
