//! Generic vertex attribute slot allocation

use super::ShaderError;
use crate::render::gl::GlContext;

/// Hands out attribute indices monotonically across every program it builds
///
/// Slots are never reused; one allocator is meant to live for the whole
/// initialization phase of a GL context.
#[derive(Debug, Clone)]
pub struct AttributeSlotAllocator {
    next: u32,
    max: u32,
}

impl AttributeSlotAllocator {
    /// Allocator bounded by the context's `GL_MAX_VERTEX_ATTRIBS`
    pub fn for_context(gl: &dyn GlContext) -> Self {
        Self::with_limit(gl.max_vertex_attribs())
    }

    /// Allocator bounded by `max` slots
    pub const fn with_limit(max: u32) -> Self {
        Self { next: 0, max }
    }

    /// Next free slot
    pub fn allocate(&mut self) -> Result<u32, ShaderError> {
        if self.next >= self.max {
            return Err(ShaderError::AttributeSlotsExhausted { requested: self.next, max: self.max });
        }
        let slot = self.next;
        self.next += 1;
        Ok(slot)
    }

    /// Slots handed out so far
    pub const fn allocated(&self) -> u32 {
        self.next
    }

    /// Slots still available
    pub const fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.next)
    }
}
