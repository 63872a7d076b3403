//! GPU buffer objects
//!
//! One type covers vertex and index buffers; the binding target decides which.
//! The handle is allocated on construction and contents are replaced with a
//! single bulk upload.

use crate::render::gl::{BufferId, BufferTarget, BufferUsage, GlContext};
use bytemuck::Pod;
use thiserror::Error;

/// Buffer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The context refused to create a buffer object
    #[error("Failed to create {0:?} buffer")]
    CreationFailed(BufferTarget),
}

/// A server-side buffer object
#[derive(Debug)]
pub struct GpuBuffer {
    id: BufferId,
    target: BufferTarget,
    usage: BufferUsage,
    len_bytes: usize,
}

impl GpuBuffer {
    /// Allocate a buffer handle for `target`
    pub fn new(gl: &dyn GlContext, target: BufferTarget, usage: BufferUsage) -> Result<Self, BufferError> {
        let id = gl.create_buffer().ok_or(BufferError::CreationFailed(target))?;
        log::trace!("Created {target:?} buffer {}", id.0);
        Ok(Self { id, target, usage, len_bytes: 0 })
    }

    /// Allocate a buffer and upload `data` into it
    pub fn with_data<T: Pod>(
        gl: &dyn GlContext,
        target: BufferTarget,
        usage: BufferUsage,
        data: &[T],
    ) -> Result<Self, BufferError> {
        let mut buffer = Self::new(gl, target, usage)?;
        buffer.upload(gl, data);
        Ok(buffer)
    }

    /// Replace the buffer contents with `data` in native byte order
    pub fn upload<T: Pod>(&mut self, gl: &dyn GlContext, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.bind(gl);
        gl.buffer_data(self.target, bytes, self.usage);
        self.unbind(gl);
        self.len_bytes = bytes.len();
        log::trace!("Uploaded {} bytes into buffer {}", bytes.len(), self.id.0);
    }

    /// Bind to this buffer's target
    pub fn bind(&self, gl: &dyn GlContext) {
        gl.bind_buffer(self.target, Some(self.id));
    }

    /// Clear this buffer's target
    pub fn unbind(&self, gl: &dyn GlContext) {
        gl.bind_buffer(self.target, None);
    }

    /// Release the handle
    pub fn delete(self, gl: &dyn GlContext) {
        gl.delete_buffer(self.id);
    }

    /// Buffer handle
    pub const fn id(&self) -> BufferId {
        self.id
    }

    /// Binding target
    pub const fn target(&self) -> BufferTarget {
        self.target
    }

    /// Usage hint
    pub const fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Size of the last upload in bytes
    pub const fn len_bytes(&self) -> usize {
        self.len_bytes
    }
}
