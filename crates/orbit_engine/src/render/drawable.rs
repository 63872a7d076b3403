//! Drawables: a program, a mesh, a state controller and an attribute mapping
//!
//! A drawable links lazily. The first render after any part changes attaches
//! every program uniform to the controller, rebuilds its role bindings and
//! pushes the current matrices.

use super::gl::{GlContext, ValueKind};
use super::mesh::Mesh;
use super::shader::ShaderProgram;
use super::RenderError;
use crate::system::{StateControllable, StateVariable};
use std::collections::HashMap;
use std::sync::Arc;

/// Where an attribute's data lives in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSource {
    /// Index into the mesh's vertex buffers
    pub buffer_index: usize,
    /// Byte stride between vertices, 0 for tightly packed
    pub stride: i32,
    /// Byte offset of the first component
    pub offset: i32,
}

/// Maps attribute names to mesh vertex buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBufferMapping {
    sources: HashMap<String, AttributeSource>,
}

impl AttributeBufferMapping {
    /// Mapping from `(attribute name, buffer index)` pairs
    pub fn new<I, S>(entries: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let sources: HashMap<String, AttributeSource> = entries
            .into_iter()
            .map(|(name, buffer_index)| (name.into(), AttributeSource { buffer_index, stride: 0, offset: 0 }))
            .collect();

        if sources.is_empty() {
            return Err(RenderError::EmptyMapping);
        }
        Ok(Self { sources })
    }

    /// Override the stride and offset of a mapped attribute
    #[must_use]
    pub fn with_layout(mut self, attribute: &str, stride: i32, offset: i32) -> Self {
        if let Some(source) = self.sources.get_mut(attribute) {
            source.stride = stride;
            source.offset = offset;
        } else {
            log::warn!("Layout given for unmapped attribute {attribute}");
        }
        self
    }

    /// Source of `attribute`
    pub fn get(&self, attribute: &str) -> Option<&AttributeSource> {
        self.sources.get(attribute)
    }

    /// Number of mapped attributes
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always false; empty mappings are rejected on construction
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Something the renderer can draw every frame
pub trait Drawable {
    /// Issue this drawable's draw calls
    fn render(&mut self, gl: &dyn GlContext) -> Result<(), RenderError>;
}

/// A single indexed draw of one mesh with one program
#[derive(Default)]
pub struct SimpleDrawable {
    program: Option<ShaderProgram>,
    mesh: Option<Mesh>,
    controller: Option<Arc<dyn StateControllable>>,
    mapping: Option<AttributeBufferMapping>,
    linked: bool,
}

impl std::fmt::Debug for SimpleDrawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleDrawable")
            .field("program", &self.program.as_ref().map(ShaderProgram::id))
            .field("mesh", &self.mesh.as_ref().map(Mesh::index_count))
            .field("controller", &self.controller.is_some())
            .field("mapping", &self.mapping)
            .field("linked", &self.linked)
            .finish()
    }
}

impl SimpleDrawable {
    /// Drawable with nothing set
    pub fn new() -> Self {
        Self::default()
    }

    /// Drawable with every part set
    pub fn with_parts(
        program: ShaderProgram,
        mesh: Mesh,
        controller: Arc<dyn StateControllable>,
        mapping: AttributeBufferMapping,
    ) -> Self {
        Self {
            program: Some(program),
            mesh: Some(mesh),
            controller: Some(controller),
            mapping: Some(mapping),
            linked: false,
        }
    }

    /// Replace the program, returning the previous one
    pub fn set_program(&mut self, program: ShaderProgram) -> Option<ShaderProgram> {
        self.detach_uniforms();
        self.linked = false;
        self.program.replace(program)
    }

    /// Replace the mesh, returning the previous one
    pub fn set_mesh(&mut self, mesh: Mesh) -> Option<Mesh> {
        self.linked = false;
        self.mesh.replace(mesh)
    }

    /// Replace the state controller
    pub fn set_state_controller(&mut self, controller: Arc<dyn StateControllable>) {
        self.detach_uniforms();
        self.linked = false;
        self.controller = Some(controller);
    }

    /// Replace the attribute mapping
    pub fn set_attribute_mapping(&mut self, mapping: AttributeBufferMapping) {
        self.linked = false;
        self.mapping = Some(mapping);
    }

    /// Whether the last link is still valid
    pub const fn is_linked(&self) -> bool {
        self.linked
    }

    /// Program, if set
    pub const fn program(&self) -> Option<&ShaderProgram> {
        self.program.as_ref()
    }

    /// Mesh, if set
    pub const fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Release the program and mesh
    pub fn delete(self, gl: &dyn GlContext) {
        self.detach_uniforms();
        if let Some(program) = self.program {
            program.delete(gl);
        }
        if let Some(mesh) = self.mesh {
            mesh.delete(gl);
        }
    }

    /// Take this drawable's uniforms off its controller
    fn detach_uniforms(&self) {
        let (Some(program), Some(controller)) = (&self.program, &self.controller) else {
            return;
        };
        for uniform in program.uniforms() {
            let variable: Arc<dyn StateVariable> = uniform.clone();
            controller.detach_state_variable(&variable);
        }
    }

    fn link(program: &ShaderProgram, controller: &dyn StateControllable, mapping: &AttributeBufferMapping) {
        controller.unbind_attachments();
        for uniform in program.uniforms() {
            let variable: Arc<dyn StateVariable> = uniform.clone();
            controller.attach_state_variable(variable);
        }
        controller.bind_attachments();
        controller.envalue_bindings();

        for attribute in program.attributes() {
            if mapping.get(&attribute.name).is_none() {
                log::warn!("Attribute {} has no buffer mapping and will not be sourced", attribute.name);
            }
        }
        log::debug!("Linked drawable for program {}", program.id().0);
    }
}

impl Drawable for SimpleDrawable {
    fn render(&mut self, gl: &dyn GlContext) -> Result<(), RenderError> {
        let program = self.program.as_ref().ok_or(RenderError::NotConfigured("program"))?;
        let mesh = self.mesh.as_ref().ok_or(RenderError::NotConfigured("mesh"))?;
        let controller = self.controller.as_deref().ok_or(RenderError::NotConfigured("state controller"))?;
        let mapping = self.mapping.as_ref().ok_or(RenderError::NotConfigured("attribute mapping"))?;

        if !self.linked {
            Self::link(program, controller, mapping);
            self.linked = true;
        }

        // resolve every mapped attribute before touching GL state
        let mut sourced = Vec::new();
        for attribute in program.attributes() {
            let Some(source) = mapping.get(&attribute.name) else {
                log::trace!("Skipping unmapped attribute {}", attribute.name);
                continue;
            };
            let buffer = mesh.vertex_buffer(source.buffer_index).ok_or_else(|| {
                RenderError::BufferIndexOutOfRange {
                    attribute: attribute.name.clone(),
                    index: source.buffer_index,
                    available: mesh.vertex_buffer_count(),
                }
            })?;
            let components = attribute.glsl_type.attribute_components().ok_or_else(|| {
                RenderError::UnsupportedElementType {
                    attribute: attribute.name.clone(),
                    glsl_type: attribute.glsl_type.clone(),
                }
            })?;
            sourced.push((attribute.index, buffer, components, source));
        }

        program.bind(gl);

        for &(index, buffer, components, source) in &sourced {
            buffer.bind(gl);
            gl.enable_vertex_attrib_array(index);
            gl.vertex_attrib_pointer(index, components, ValueKind::Float32, false, source.stride, source.offset);
        }

        for uniform in program.uniforms() {
            if uniform.has_changed() {
                uniform.commit_change(gl);
            }
        }

        mesh.index_buffer().bind(gl);
        gl.draw_elements(mesh.primitive_mode(), mesh.index_count() as i32, mesh.index_kind(), 0);
        mesh.index_buffer().unbind(gl);

        for &(index, buffer, _, _) in &sourced {
            gl.disable_vertex_attrib_array(index);
            buffer.unbind(gl);
        }

        program.unbind(gl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::gl::headless::UniformData;
    use crate::render::gl::{BufferTarget, GlCall, HeadlessContext, PrimitiveMode};
    use crate::render::test_support;
    use crate::system::{Projection, RoleMatchers, Viewable, ViewableStateController};

    fn camera() -> Arc<ViewableStateController> {
        Arc::new(ViewableStateController::new(Projection::default(), RoleMatchers::default()).unwrap())
    }

    fn full_mapping() -> AttributeBufferMapping {
        AttributeBufferMapping::new([("inputPosition", 0), ("inputNormal", 1)]).unwrap()
    }

    fn drawable(gl: &HeadlessContext, camera: Arc<ViewableStateController>, mapping: AttributeBufferMapping) -> SimpleDrawable {
        SimpleDrawable::with_parts(test_support::program(gl), test_support::mesh(gl), camera, mapping)
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let entries: [(&str, usize); 0] = [];
        assert!(matches!(AttributeBufferMapping::new(entries), Err(RenderError::EmptyMapping)));
    }

    #[test]
    fn test_layout_override() {
        let mapping = full_mapping().with_layout("inputNormal", 12, 4);
        assert_eq!(mapping.get("inputNormal"), Some(&AttributeSource { buffer_index: 1, stride: 12, offset: 4 }));
        assert_eq!(mapping.get("inputPosition").unwrap().stride, 0);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_unconfigured_drawable_fails() {
        let gl = HeadlessContext::new();
        let mut drawable = SimpleDrawable::new();
        assert!(matches!(drawable.render(&gl), Err(RenderError::NotConfigured("program"))));

        drawable.set_program(test_support::program(&gl));
        drawable.set_mesh(test_support::mesh(&gl));
        assert!(matches!(drawable.render(&gl), Err(RenderError::NotConfigured("state controller"))));
    }

    #[test]
    fn test_render_sequence() {
        let gl = HeadlessContext::new();
        let mut drawable = drawable(&gl, camera(), full_mapping());
        let program = drawable.program().unwrap().id();
        let mesh = drawable.mesh().unwrap();
        let index_buffer = mesh.index_buffer().id();
        let positions = mesh.vertex_buffer(0).unwrap().id();
        gl.clear_log();

        drawable.render(&gl).unwrap();
        assert!(drawable.is_linked());

        let calls = gl.calls();
        let draw_at = calls
            .iter()
            .position(|call| matches!(call, GlCall::DrawElements { .. }))
            .unwrap();
        assert_eq!(calls.first(), Some(&GlCall::UseProgram(Some(program))));
        assert_eq!(calls.last(), Some(&GlCall::UseProgram(None)));
        assert_eq!(&calls[1..4], &[
            GlCall::BindBuffer(BufferTarget::ArrayBuffer, Some(positions)),
            GlCall::EnableVertexAttribArray(0),
            GlCall::VertexAttribPointer { index: 0, size: 3, kind: ValueKind::Float32, normalized: false, stride: 0, offset: 0 },
        ]);
        assert_eq!(calls[draw_at - 1], GlCall::BindBuffer(BufferTarget::ElementArrayBuffer, Some(index_buffer)));
        assert_eq!(calls[draw_at], GlCall::DrawElements { mode: PrimitiveMode::Triangles, count: 3, kind: ValueKind::UInt16, offset: 0 });
        assert_eq!(calls[draw_at + 1], GlCall::BindBuffer(BufferTarget::ElementArrayBuffer, None));

        // three matrices committed once
        assert_eq!(gl.uniform_upload_count(), 3);
        assert_eq!(gl.draws().len(), 1);
        assert_eq!(gl.draws()[0].enabled_attributes, vec![0, 1]);
        assert!(gl.enabled_attributes().is_empty());
    }

    #[test]
    fn test_unchanged_uniforms_not_recommitted() {
        let gl = HeadlessContext::new();
        let camera = camera();
        let mut drawable = drawable(&gl, camera.clone(), full_mapping());
        drawable.render(&gl).unwrap();
        gl.clear_log();

        drawable.render(&gl).unwrap();
        assert_eq!(gl.uniform_upload_count(), 0);

        camera.zoom_camera(-2.0).unwrap();
        drawable.render(&gl).unwrap();
        // model-view and normal matrix only
        assert_eq!(gl.uniform_upload_count(), 2);

        let program = drawable.program().unwrap().id();
        let Some(UniformData::Matrix(modelview)) = gl.uniform_value(program, "modelview") else {
            panic!("modelview not uploaded");
        };
        approx::assert_relative_eq!(modelview[14], -2.0);
    }

    #[test]
    fn test_unmapped_attribute_is_skipped() {
        let gl = HeadlessContext::new();
        let mapping = AttributeBufferMapping::new([("inputPosition", 0)]).unwrap();
        let mut drawable = drawable(&gl, camera(), mapping);

        drawable.render(&gl).unwrap();
        assert_eq!(gl.draws().len(), 1);
        assert_eq!(gl.draws()[0].enabled_attributes, vec![0]);
    }

    #[test]
    fn test_buffer_index_out_of_range() {
        let gl = HeadlessContext::new();
        let mapping = AttributeBufferMapping::new([("inputPosition", 0), ("inputNormal", 5)]).unwrap();
        let mut drawable = drawable(&gl, camera(), mapping);
        gl.clear_log();

        let err = drawable.render(&gl).unwrap_err();
        assert!(matches!(err, RenderError::BufferIndexOutOfRange { index: 5, available: 2, .. }));
        assert!(gl.draws().is_empty());
        assert_eq!(gl.current_program(), None);
    }

    #[test]
    fn test_non_float_attribute_rejected() {
        let gl = HeadlessContext::new();
        let vertex = "attribute mat4 instance;\nvoid main() { gl_Position = instance[0]; }\n";
        let mut allocator = crate::render::shader::AttributeSlotAllocator::for_context(&gl);
        let program = ShaderProgram::new(&gl, &mut allocator, vertex, test_support::FRAGMENT).unwrap();
        let mapping = AttributeBufferMapping::new([("instance", 0)]).unwrap();
        let mut drawable = SimpleDrawable::with_parts(program, test_support::mesh(&gl), camera(), mapping);

        assert!(matches!(drawable.render(&gl), Err(RenderError::UnsupportedElementType { .. })));
    }

    #[test]
    fn test_setters_force_relink() {
        let gl = HeadlessContext::new();
        let camera = camera();
        let mut drawable = drawable(&gl, camera.clone(), full_mapping());
        drawable.render(&gl).unwrap();
        assert_eq!(camera.attachment_count(), 3);

        let previous = drawable.set_program(test_support::program(&gl)).unwrap();
        assert!(!drawable.is_linked());
        // replaced program's uniforms leave the camera right away
        assert_eq!(camera.attachment_count(), 0);
        previous.delete(&gl);

        drawable.render(&gl).unwrap();
        assert!(drawable.is_linked());
        assert_eq!(camera.attachment_count(), 3);
    }

    fn modelview_z(gl: &HeadlessContext, drawable: &SimpleDrawable) -> f32 {
        let program = drawable.program().unwrap().id();
        match gl.uniform_value(program, "modelview") {
            Some(UniformData::Matrix(values)) => values[14],
            other => panic!("unexpected modelview {other:?}"),
        }
    }

    #[test]
    fn test_shared_camera_updates_every_drawable() {
        let gl = HeadlessContext::new();
        let camera = camera();
        let mut first = drawable(&gl, camera.clone(), full_mapping());
        let mut second = drawable(&gl, camera.clone(), full_mapping());
        first.render(&gl).unwrap();
        second.render(&gl).unwrap();
        assert_eq!(camera.attachment_count(), 6);
        assert_eq!(camera.binding_counts(), (2, 2, 2));

        camera.zoom_camera(-5.0).unwrap();
        first.render(&gl).unwrap();
        second.render(&gl).unwrap();
        approx::assert_relative_eq!(modelview_z(&gl, &first), -5.0);
        approx::assert_relative_eq!(modelview_z(&gl, &second), -5.0);
    }

    #[test]
    fn test_deleting_one_drawable_keeps_the_other_bound() {
        let gl = HeadlessContext::new();
        let camera = camera();
        let mut first = drawable(&gl, camera.clone(), full_mapping());
        let mut second = drawable(&gl, camera.clone(), full_mapping());
        first.render(&gl).unwrap();
        second.render(&gl).unwrap();

        first.delete(&gl);
        assert_eq!(camera.attachment_count(), 3);
        assert_eq!(camera.binding_counts(), (1, 1, 1));

        camera.zoom_camera(-3.0).unwrap();
        second.render(&gl).unwrap();
        approx::assert_relative_eq!(modelview_z(&gl, &second), -3.0);
    }
}
