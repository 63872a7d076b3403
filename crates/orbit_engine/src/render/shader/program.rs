//! Linked vertex + fragment programs

use super::allocator::AttributeSlotAllocator;
use super::diagnostics::{annotate_source, error_location};
use super::introspect::{scan_attributes, scan_uniforms};
use super::{GlslType, ShaderError};
use crate::assets::AssetReader;
use crate::render::gl::{GlContext, ProgramId, ShaderId, ShaderStage};
use crate::render::uniform::Uniform;
use crate::system::state_variable::StateVariable;
use std::sync::Arc;

/// A vertex attribute and the generic slot it was bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRef {
    /// Declared name
    pub name: String,
    /// Declared type
    pub glsl_type: GlslType,
    /// Generic attribute index
    pub index: u32,
}

/// A linked program with its introspected attributes and uniforms
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    attributes: Vec<AttributeRef>,
    uniforms: Vec<Arc<Uniform>>,
}

fn release(gl: &dyn GlContext, program: Option<ProgramId>, shaders: &[ShaderId]) {
    if let Some(program) = program {
        gl.delete_program(program);
    }
    for &shader in shaders {
        gl.delete_shader(shader);
    }
}

fn compile(gl: &dyn GlContext, shader: ShaderId, stage: ShaderStage, source: &str) -> Result<(), ShaderError> {
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if gl.shader_compile_status(shader) {
        return Ok(());
    }

    let log = gl.shader_info_log(shader);
    let line = error_location(&log).map(|(_, line)| line);
    log::error!("Failed to compile {stage} shader: {log}");
    Err(ShaderError::CompileFailed {
        stage,
        annotated: annotate_source(source, line),
        log,
    })
}

impl ShaderProgram {
    /// Compile, bind attributes, link and introspect a program
    ///
    /// Every attribute declared by the vertex stage takes the next slot from
    /// `allocator` before linking. Shader objects are released once linked.
    pub fn new(
        gl: &dyn GlContext,
        allocator: &mut AttributeSlotAllocator,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = gl
            .create_shader(ShaderStage::Vertex)
            .ok_or(ShaderError::CreationFailed("vertex shader"))?;
        let Some(fragment) = gl.create_shader(ShaderStage::Fragment) else {
            release(gl, None, &[vertex]);
            return Err(ShaderError::CreationFailed("fragment shader"));
        };
        let shaders = [vertex, fragment];

        if let Err(err) = compile(gl, vertex, ShaderStage::Vertex, vertex_source)
            .and_then(|()| compile(gl, fragment, ShaderStage::Fragment, fragment_source))
        {
            release(gl, None, &shaders);
            return Err(err);
        }

        let Some(id) = gl.create_program() else {
            release(gl, None, &shaders);
            return Err(ShaderError::CreationFailed("program"));
        };
        gl.attach_shader(id, vertex);
        gl.attach_shader(id, fragment);

        let mut attributes = Vec::new();
        for declaration in scan_attributes(vertex_source) {
            let index = match allocator.allocate() {
                Ok(index) => index,
                Err(err) => {
                    release(gl, Some(id), &shaders);
                    return Err(err);
                }
            };
            gl.bind_attrib_location(id, index, &declaration.name);
            attributes.push(AttributeRef {
                name: declaration.name,
                glsl_type: declaration.glsl_type,
                index,
            });
        }

        gl.link_program(id);
        if !gl.program_link_status(id) {
            let log = gl.program_info_log(id);
            log::error!("Failed to link program: {log}");
            release(gl, Some(id), &shaders);
            return Err(ShaderError::LinkFailed { log });
        }

        for shader in shaders {
            gl.detach_shader(id, shader);
            gl.delete_shader(shader);
        }

        let mut declarations = Vec::new();
        scan_uniforms(vertex_source, &mut declarations);
        scan_uniforms(fragment_source, &mut declarations);

        let uniforms: Vec<Arc<Uniform>> = declarations
            .into_iter()
            .map(|declaration| {
                let location = gl.uniform_location(id, &declaration.name);
                if location.is_none() {
                    log::debug!("Uniform {} is inactive in program {}", declaration.name, id.0);
                }
                Arc::new(Uniform::new(declaration.name, declaration.glsl_type, location))
            })
            .collect();

        log::info!(
            "Linked program {} with {} attributes and {} uniforms",
            id.0,
            attributes.len(),
            uniforms.len()
        );
        for attribute in &attributes {
            log::debug!("  attribute {} {} -> slot {}", attribute.glsl_type, attribute.name, attribute.index);
        }

        Ok(Self { id, attributes, uniforms })
    }

    /// Build a program from two named shader assets
    pub fn from_assets(
        gl: &dyn GlContext,
        allocator: &mut AttributeSlotAllocator,
        assets: &AssetReader,
        vertex_name: &str,
        fragment_name: &str,
    ) -> Result<Self, ShaderError> {
        let vertex_source = assets.read_to_string(vertex_name)?;
        let fragment_source = assets.read_to_string(fragment_name)?;
        Self::new(gl, allocator, &vertex_source, &fragment_source)
    }

    /// Program handle
    pub const fn id(&self) -> ProgramId {
        self.id
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[AttributeRef] {
        &self.attributes
    }

    /// Uniforms of both stages, de-duplicated
    pub fn uniforms(&self) -> &[Arc<Uniform>] {
        &self.uniforms
    }

    /// Attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeRef> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// First uniform with `name`
    pub fn uniform(&self, name: &str) -> Option<&Arc<Uniform>> {
        self.uniforms.iter().find(|uniform| uniform.name() == name)
    }

    /// Make this program current
    pub fn bind(&self, gl: &dyn GlContext) {
        gl.use_program(Some(self.id));
    }

    /// Make no program current
    pub fn unbind(&self, gl: &dyn GlContext) {
        gl.use_program(None);
    }

    /// Release the program object
    pub fn delete(self, gl: &dyn GlContext) {
        gl.delete_program(self.id);
    }
}
