//! Shader programs and GLSL source introspection

pub mod allocator;
pub mod diagnostics;
pub mod introspect;
pub mod program;

pub use allocator::AttributeSlotAllocator;
pub use introspect::{scan_attributes, scan_uniforms, Declaration};
pub use program::{AttributeRef, ShaderProgram};

use crate::assets::AssetError;
use crate::render::gl::ShaderStage;
use std::fmt;
use thiserror::Error;

/// Shader initialization errors
#[derive(Error, Debug)]
pub enum ShaderError {
    /// The context refused to create a shader or program object
    #[error("Failed to create {0}")]
    CreationFailed(&'static str),

    /// A stage failed to compile
    #[error("{stage} shader failed to compile: {log}\n{annotated}")]
    CompileFailed {
        /// Failing stage
        stage: ShaderStage,
        /// Compiler diagnostics
        log: String,
        /// Source with the erroring line marked
        annotated: String,
    },

    /// The program failed to link
    #[error("Program failed to link: {log}")]
    LinkFailed {
        /// Linker diagnostics
        log: String,
    },

    /// More attributes than the context supports
    #[error("Attribute slot {requested} requested but only {max} generic attributes are available")]
    AttributeSlotsExhausted {
        /// Slot that would have been handed out
        requested: u32,
        /// Context limit
        max: u32,
    },

    /// Shader source could not be read
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Scalar component kind of a GLSL type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// `float` based
    Float,
    /// `int` based, samplers included
    Int,
    /// `bool` based
    Bool,
}

/// GLSL ES 1.00 types recognized in declarations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Sampler2D,
    SamplerCube,
    Void,
    /// Any type name not listed above
    Other(String),
}

impl GlslType {
    /// Parse a type keyword
    pub fn parse(name: &str) -> Self {
        match name {
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "mat2" => Self::Mat2,
            "mat3" => Self::Mat3,
            "mat4" => Self::Mat4,
            "int" => Self::Int,
            "ivec2" => Self::IVec2,
            "ivec3" => Self::IVec3,
            "ivec4" => Self::IVec4,
            "bool" => Self::Bool,
            "bvec2" => Self::BVec2,
            "bvec3" => Self::BVec3,
            "bvec4" => Self::BVec4,
            "sampler2D" => Self::Sampler2D,
            "samplerCube" => Self::SamplerCube,
            "void" => Self::Void,
            other => Self::Other(other.to_string()),
        }
    }

    /// GLSL keyword
    pub fn name(&self) -> &str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Int => "int",
            Self::IVec2 => "ivec2",
            Self::IVec3 => "ivec3",
            Self::IVec4 => "ivec4",
            Self::Bool => "bool",
            Self::BVec2 => "bvec2",
            Self::BVec3 => "bvec3",
            Self::BVec4 => "bvec4",
            Self::Sampler2D => "sampler2D",
            Self::SamplerCube => "samplerCube",
            Self::Void => "void",
            Self::Other(name) => name,
        }
    }

    /// Number of scalar components in one value
    pub const fn component_count(&self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Bool | Self::Sampler2D | Self::SamplerCube => 1,
            Self::Vec2 | Self::IVec2 | Self::BVec2 => 2,
            Self::Vec3 | Self::IVec3 | Self::BVec3 => 3,
            Self::Vec4 | Self::IVec4 | Self::BVec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
            Self::Void | Self::Other(_) => 0,
        }
    }

    /// Scalar kind, `None` for `void` and unknown types
    pub const fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Float | Self::Vec2 | Self::Vec3 | Self::Vec4 | Self::Mat2 | Self::Mat3 | Self::Mat4 => {
                Some(ScalarKind::Float)
            }
            Self::Int | Self::IVec2 | Self::IVec3 | Self::IVec4 | Self::Sampler2D | Self::SamplerCube => {
                Some(ScalarKind::Int)
            }
            Self::Bool | Self::BVec2 | Self::BVec3 | Self::BVec4 => Some(ScalarKind::Bool),
            Self::Void | Self::Other(_) => None,
        }
    }

    /// Matrix dimension for `matN`
    pub const fn matrix_dimension(&self) -> Option<usize> {
        match self {
            Self::Mat2 => Some(2),
            Self::Mat3 => Some(3),
            Self::Mat4 => Some(4),
            _ => None,
        }
    }

    /// Components per vertex when sourced from a float attribute array
    ///
    /// Only `float` and `vecN` map onto a single attribute pointer.
    pub const fn attribute_components(&self) -> Option<i32> {
        match self {
            Self::Float => Some(1),
            Self::Vec2 => Some(2),
            Self::Vec3 => Some(3),
            Self::Vec4 => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
