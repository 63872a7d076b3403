//! Rendering: GL seam, buffers, meshes, programs, drawables and the frame driver

pub mod buffer;
pub mod drawable;
pub mod gl;
pub mod mesh;
pub mod renderer;
pub mod shader;
pub mod uniform;

#[cfg(test)]
pub(crate) mod test_support;

pub use buffer::{BufferError, GpuBuffer};
pub use drawable::{AttributeBufferMapping, AttributeSource, Drawable, SimpleDrawable};
pub use gl::{check_gl_error, GlContext, GlError, HeadlessContext};
pub use mesh::{deindex, Deindexed, Mesh, MeshError, StepLoadListener};
pub use renderer::{DrawableKey, RenderControl, RenderSettings, Renderer};
pub use shader::{AttributeSlotAllocator, GlslType, ShaderError, ShaderProgram};
pub use uniform::{Uniform, UniformValue};

use crate::assets::{AssetError, ObjError};
use crate::system::StateError;
use thiserror::Error;

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// A drawable is missing one of its parts
    #[error("Drawable is not configured: {0} not set")]
    NotConfigured(&'static str),

    /// An attribute maps to a vertex buffer the mesh does not have
    #[error("Attribute {attribute} maps to vertex buffer {index} but the mesh has {available}")]
    BufferIndexOutOfRange {
        /// Attribute name
        attribute: String,
        /// Requested buffer index
        index: usize,
        /// Number of vertex buffers in the mesh
        available: usize,
    },

    /// An attribute type cannot be sourced from a float vertex buffer
    #[error("Attribute {attribute} has unsupported element type {glsl_type}")]
    UnsupportedElementType {
        /// Attribute name
        attribute: String,
        /// Declared type
        glsl_type: GlslType,
    },

    /// An attribute-buffer mapping with no entries
    #[error("Attribute buffer mapping is empty")]
    EmptyMapping,

    /// Camera operation failed
    #[error(transparent)]
    State(#[from] StateError),

    /// Mesh initialization failed
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Program initialization failed
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// Geometry parsing failed
    #[error(transparent)]
    Obj(#[from] ObjError),

    /// Asset loading failed
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// The GL error flag was set
    #[error(transparent)]
    Gl(#[from] GlError),
}
