//! Graphics API seam
//!
//! Every GPU call the engine makes goes through [`GlContext`], which models the
//! OpenGL ES 2.0 subset needed to compile programs, upload buffers and issue
//! indexed draws. [`HeadlessContext`] emulates that subset in memory;
//! [`GlowContext`] forwards to a real driver.

pub mod headless;
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub mod glow_backend;

pub use headless::{GlCall, HeadlessContext};
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use glow_backend::GlowContext;

use bitflags::bitflags;
use thiserror::Error;

/// Shader object handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

/// Program object handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Buffer object handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Resolved uniform location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

impl ShaderStage {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => 0x8B31,
            Self::Fragment => 0x8B30,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data
    ArrayBuffer,
    /// Index data
    ElementArrayBuffer,
}

impl BufferTarget {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::ArrayBuffer => 0x8892,
            Self::ElementArrayBuffer => 0x8893,
        }
    }
}

/// Buffer usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    StaticDraw,
    /// Uploaded repeatedly, drawn many times
    DynamicDraw,
    /// Uploaded once, drawn a few times
    StreamDraw,
}

impl BufferUsage {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::StaticDraw => 0x88E4,
            Self::DynamicDraw => 0x88E8,
            Self::StreamDraw => 0x88E0,
        }
    }
}

/// Element type of buffer contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// 8-bit signed integer
    Int8,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit signed integer
    Int16,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit signed integer
    Int32,
    /// 32-bit unsigned integer
    UInt32,
    /// 32-bit float
    Float32,
}

impl ValueKind {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Int8 => 0x1400,
            Self::UInt8 => 0x1401,
            Self::Int16 => 0x1402,
            Self::UInt16 => 0x1403,
            Self::Int32 => 0x1404,
            Self::UInt32 => 0x1405,
            Self::Float32 => 0x1406,
        }
    }

    /// Size of one element in bytes
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
        }
    }
}

/// Primitive topology for draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    /// Independent triangles
    Triangles,
}

impl PrimitiveMode {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Triangles => 0x0004,
        }
    }
}

/// Server-side capabilities toggled with enable/disable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Face culling
    CullFace,
    /// Blending
    Blend,
    /// Depth testing
    DepthTest,
    /// Dithering
    Dither,
}

impl Capability {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::CullFace => 0x0B44,
            Self::Blend => 0x0BE2,
            Self::DepthTest => 0x0B71,
            Self::Dither => 0x0BD0,
        }
    }
}

/// Faces selected for culling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    /// Front faces
    Front,
    /// Back faces
    Back,
}

impl CullFace {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Front => 0x0404,
            Self::Back => 0x0405,
        }
    }
}

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendEquation {
    /// source + destination
    Add,
    /// source - destination
    Subtract,
}

impl BlendEquation {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Add => 0x8006,
            Self::Subtract => 0x800A,
        }
    }
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    /// 0
    Zero,
    /// 1
    One,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
}

impl BlendFactor {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::SrcAlpha => 0x0302,
            Self::OneMinusSrcAlpha => 0x0303,
        }
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    /// Passes if the incoming depth is less
    Less,
    /// Passes if the incoming depth is less or equal
    LessEqual,
    /// Always passes
    Always,
}

impl DepthFunc {
    /// GL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Less => 0x0201,
            Self::LessEqual => 0x0203,
            Self::Always => 0x0207,
        }
    }
}

bitflags! {
    /// Buffers cleared by [`GlContext::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        /// Depth buffer
        const DEPTH = 0x0000_0100;
        /// Stencil buffer
        const STENCIL = 0x0000_0400;
        /// Color buffer
        const COLOR = 0x0000_4000;
    }
}

/// The OpenGL ES 2.0 subset used by the engine
///
/// Methods take `&self`: GL contexts are single-threaded state machines and
/// implementations handle interior mutability themselves.
pub trait GlContext {
    /// Create a shader object, `None` when the driver refuses
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId>;
    /// Replace the source of a shader
    fn shader_source(&self, shader: ShaderId, source: &str);
    /// Compile a shader
    fn compile_shader(&self, shader: ShaderId);
    /// Whether the last compile succeeded
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    /// Compiler diagnostics
    fn shader_info_log(&self, shader: ShaderId) -> String;
    /// Delete a shader object
    fn delete_shader(&self, shader: ShaderId);

    /// Create a program object, `None` when the driver refuses
    fn create_program(&self) -> Option<ProgramId>;
    /// Attach a shader to a program
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    /// Detach a shader from a program
    fn detach_shader(&self, program: ProgramId, shader: ShaderId);
    /// Bind a named attribute to a generic attribute index, effective at link
    fn bind_attrib_location(&self, program: ProgramId, index: u32, name: &str);
    /// Link a program
    fn link_program(&self, program: ProgramId);
    /// Whether the last link succeeded
    fn program_link_status(&self, program: ProgramId) -> bool;
    /// Linker diagnostics
    fn program_info_log(&self, program: ProgramId) -> String;
    /// Delete a program object
    fn delete_program(&self, program: ProgramId);
    /// Location of an active uniform, `None` when inactive or unknown
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// Make a program current, or none
    fn use_program(&self, program: Option<ProgramId>);
    /// `GL_MAX_VERTEX_ATTRIBS`
    fn max_vertex_attribs(&self) -> u32;

    /// Create a buffer object, `None` when the driver refuses
    fn create_buffer(&self) -> Option<BufferId>;
    /// Bind a buffer to a target, or unbind with `None`
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>);
    /// Replace the contents of the buffer bound to `target`
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    /// Delete a buffer object
    fn delete_buffer(&self, buffer: BufferId);
    /// Read back the contents of a buffer, `None` when the backend cannot
    fn read_buffer_data(&self, _buffer: BufferId) -> Option<Vec<u8>> {
        None
    }

    /// Enable a generic vertex attribute array
    fn enable_vertex_attrib_array(&self, index: u32);
    /// Disable a generic vertex attribute array
    fn disable_vertex_attrib_array(&self, index: u32);
    /// Describe the layout of a vertex attribute in the bound array buffer
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        kind: ValueKind,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    /// `glUniform{1..4}fv`
    fn uniform_f32(&self, location: UniformLocation, components: usize, values: &[f32]);
    /// `glUniform{1..4}iv`
    fn uniform_i32(&self, location: UniformLocation, components: usize, values: &[i32]);
    /// `glUniformMatrix{2..4}fv`, column-major, never transposed
    fn uniform_matrix(&self, location: UniformLocation, dimension: usize, values: &[f32]);

    /// Indexed draw from the bound element array buffer
    fn draw_elements(&self, mode: PrimitiveMode, count: i32, kind: ValueKind, offset: i32);

    /// Pop the oldest error flag, 0 when none
    fn get_error(&self) -> u32;
    /// Color used by clear
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// Clear the selected buffers
    fn clear(&self, mask: ClearMask);
    /// Enable a capability
    fn enable(&self, capability: Capability);
    /// Disable a capability
    fn disable(&self, capability: Capability);
    /// Select culled faces
    fn cull_face(&self, face: CullFace);
    /// Blend equation
    fn blend_equation(&self, equation: BlendEquation);
    /// Blend factors
    fn blend_func(&self, src: BlendFactor, dst: BlendFactor);
    /// Depth comparison
    fn depth_func(&self, func: DepthFunc);
    /// Flush queued commands
    fn flush(&self);
    /// Viewport rectangle
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
}

/// Named GL error codes
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlError {
    /// `GL_INVALID_ENUM`
    #[error("GL_INVALID_ENUM during {0}")]
    InvalidEnum(&'static str),
    /// `GL_INVALID_VALUE`
    #[error("GL_INVALID_VALUE during {0}")]
    InvalidValue(&'static str),
    /// `GL_INVALID_OPERATION`
    #[error("GL_INVALID_OPERATION during {0}")]
    InvalidOperation(&'static str),
    /// `GL_INVALID_FRAMEBUFFER_OPERATION`
    #[error("GL_INVALID_FRAMEBUFFER_OPERATION during {0}")]
    InvalidFramebufferOperation(&'static str),
    /// `GL_OUT_OF_MEMORY`
    #[error("GL_OUT_OF_MEMORY during {0}")]
    OutOfMemory(&'static str),
    /// Any other code
    #[error("GL error 0x{code:04X} during {context}")]
    Unknown {
        /// Raw error code
        code: u32,
        /// Operation being checked
        context: &'static str,
    },
}

/// GL error code constants
pub mod codes {
    /// `GL_NO_ERROR`
    pub const NO_ERROR: u32 = 0;
    /// `GL_INVALID_ENUM`
    pub const INVALID_ENUM: u32 = 0x0500;
    /// `GL_INVALID_VALUE`
    pub const INVALID_VALUE: u32 = 0x0501;
    /// `GL_INVALID_OPERATION`
    pub const INVALID_OPERATION: u32 = 0x0502;
    /// `GL_OUT_OF_MEMORY`
    pub const OUT_OF_MEMORY: u32 = 0x0505;
    /// `GL_INVALID_FRAMEBUFFER_OPERATION`
    pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;
}

/// Check the GL error flag after `context`
///
/// Diagnostic helper; not called on the per-frame path.
pub fn check_gl_error(gl: &dyn GlContext, context: &'static str) -> Result<(), GlError> {
    let error = match gl.get_error() {
        codes::NO_ERROR => return Ok(()),
        codes::INVALID_ENUM => GlError::InvalidEnum(context),
        codes::INVALID_VALUE => GlError::InvalidValue(context),
        codes::INVALID_OPERATION => GlError::InvalidOperation(context),
        codes::INVALID_FRAMEBUFFER_OPERATION => GlError::InvalidFramebufferOperation(context),
        codes::OUT_OF_MEMORY => GlError::OutOfMemory(context),
        code => GlError::Unknown { code, context },
    };
    log::error!("{error}");
    Err(error)
}
