//! Native GL/GLES backend built on `glow`

use super::{
    BlendEquation, BlendFactor, BufferId, BufferTarget, BufferUsage, Capability, ClearMask,
    CullFace, DepthFunc, GlContext, PrimitiveMode, ProgramId, ShaderId, ShaderStage,
    UniformLocation, ValueKind,
};
use glow::{HasContext, NativeBuffer, NativeProgram, NativeShader, NativeUniformLocation};
use std::num::NonZeroU32;

/// [`GlContext`] backed by a current `glow` context
///
/// The wrapped context must be current on the calling thread for every call.
pub struct GlowContext {
    gl: glow::Context,
}

impl GlowContext {
    /// Wrap an existing context
    pub const fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Load GL entry points through the windowing layer's loader
    ///
    /// # Safety
    ///
    /// A GL context must be current and `loader` must return valid function
    /// pointers for it.
    pub unsafe fn from_loader_function<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const std::os::raw::c_void,
    {
        Self::new(glow::Context::from_loader_function(loader))
    }

    /// Underlying `glow` context
    pub const fn raw(&self) -> &glow::Context {
        &self.gl
    }
}

fn shader(id: ShaderId) -> Option<NativeShader> {
    NonZeroU32::new(id.0).map(NativeShader)
}

fn program(id: ProgramId) -> Option<NativeProgram> {
    NonZeroU32::new(id.0).map(NativeProgram)
}

fn buffer(id: BufferId) -> Option<NativeBuffer> {
    NonZeroU32::new(id.0).map(NativeBuffer)
}

impl GlContext for GlowContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        match unsafe { self.gl.create_shader(stage.gl_enum()) } {
            Ok(native) => Some(ShaderId(native.0.get())),
            Err(message) => {
                log::error!("glCreateShader({stage}) failed: {message}");
                None
            }
        }
    }

    fn shader_source(&self, id: ShaderId, source: &str) {
        if let Some(native) = shader(id) {
            unsafe { self.gl.shader_source(native, source) };
        }
    }

    fn compile_shader(&self, id: ShaderId) {
        if let Some(native) = shader(id) {
            unsafe { self.gl.compile_shader(native) };
        }
    }

    fn shader_compile_status(&self, id: ShaderId) -> bool {
        shader(id).is_some_and(|native| unsafe { self.gl.get_shader_compile_status(native) })
    }

    fn shader_info_log(&self, id: ShaderId) -> String {
        shader(id)
            .map(|native| unsafe { self.gl.get_shader_info_log(native) })
            .unwrap_or_default()
    }

    fn delete_shader(&self, id: ShaderId) {
        if let Some(native) = shader(id) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn create_program(&self) -> Option<ProgramId> {
        match unsafe { self.gl.create_program() } {
            Ok(native) => Some(ProgramId(native.0.get())),
            Err(message) => {
                log::error!("glCreateProgram failed: {message}");
                None
            }
        }
    }

    fn attach_shader(&self, program_id: ProgramId, shader_id: ShaderId) {
        if let (Some(p), Some(s)) = (program(program_id), shader(shader_id)) {
            unsafe { self.gl.attach_shader(p, s) };
        }
    }

    fn detach_shader(&self, program_id: ProgramId, shader_id: ShaderId) {
        if let (Some(p), Some(s)) = (program(program_id), shader(shader_id)) {
            unsafe { self.gl.detach_shader(p, s) };
        }
    }

    fn bind_attrib_location(&self, id: ProgramId, index: u32, name: &str) {
        if let Some(native) = program(id) {
            unsafe { self.gl.bind_attrib_location(native, index, name) };
        }
    }

    fn link_program(&self, id: ProgramId) {
        if let Some(native) = program(id) {
            unsafe { self.gl.link_program(native) };
        }
    }

    fn program_link_status(&self, id: ProgramId) -> bool {
        program(id).is_some_and(|native| unsafe { self.gl.get_program_link_status(native) })
    }

    fn program_info_log(&self, id: ProgramId) -> String {
        program(id)
            .map(|native| unsafe { self.gl.get_program_info_log(native) })
            .unwrap_or_default()
    }

    fn delete_program(&self, id: ProgramId) {
        if let Some(native) = program(id) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn uniform_location(&self, id: ProgramId, name: &str) -> Option<UniformLocation> {
        let native = program(id)?;
        unsafe { self.gl.get_uniform_location(native, name) }.map(|location| UniformLocation(location.0))
    }

    fn use_program(&self, id: Option<ProgramId>) {
        unsafe { self.gl.use_program(id.and_then(program)) };
    }

    fn max_vertex_attribs(&self) -> u32 {
        let max = unsafe { self.gl.get_parameter_i32(glow::MAX_VERTEX_ATTRIBS) };
        u32::try_from(max).unwrap_or(0)
    }

    fn create_buffer(&self) -> Option<BufferId> {
        match unsafe { self.gl.create_buffer() } {
            Ok(native) => Some(BufferId(native.0.get())),
            Err(message) => {
                log::error!("glGenBuffers failed: {message}");
                None
            }
        }
    }

    fn bind_buffer(&self, target: BufferTarget, id: Option<BufferId>) {
        unsafe { self.gl.bind_buffer(target.gl_enum(), id.and_then(buffer)) };
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe { self.gl.buffer_data_u8_slice(target.gl_enum(), data, usage.gl_enum()) };
    }

    fn delete_buffer(&self, id: BufferId) {
        if let Some(native) = buffer(id) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) };
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        kind: ValueKind,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, kind.gl_enum(), normalized, stride, offset);
        }
    }

    fn uniform_f32(&self, location: UniformLocation, components: usize, values: &[f32]) {
        let location = NativeUniformLocation(location.0);
        unsafe {
            match components {
                1 => self.gl.uniform_1_f32_slice(Some(&location), values),
                2 => self.gl.uniform_2_f32_slice(Some(&location), values),
                3 => self.gl.uniform_3_f32_slice(Some(&location), values),
                4 => self.gl.uniform_4_f32_slice(Some(&location), values),
                _ => log::warn!("No float uniform upload for {components} components"),
            }
        }
    }

    fn uniform_i32(&self, location: UniformLocation, components: usize, values: &[i32]) {
        let location = NativeUniformLocation(location.0);
        unsafe {
            match components {
                1 => self.gl.uniform_1_i32_slice(Some(&location), values),
                2 => self.gl.uniform_2_i32_slice(Some(&location), values),
                3 => self.gl.uniform_3_i32_slice(Some(&location), values),
                4 => self.gl.uniform_4_i32_slice(Some(&location), values),
                _ => log::warn!("No int uniform upload for {components} components"),
            }
        }
    }

    fn uniform_matrix(&self, location: UniformLocation, dimension: usize, values: &[f32]) {
        let location = NativeUniformLocation(location.0);
        // GLES 2.0 requires transpose = false
        unsafe {
            match dimension {
                2 => self.gl.uniform_matrix_2_f32_slice(Some(&location), false, values),
                3 => self.gl.uniform_matrix_3_f32_slice(Some(&location), false, values),
                4 => self.gl.uniform_matrix_4_f32_slice(Some(&location), false, values),
                _ => log::warn!("No matrix uniform upload for dimension {dimension}"),
            }
        }
    }

    fn draw_elements(&self, mode: PrimitiveMode, count: i32, kind: ValueKind, offset: i32) {
        unsafe { self.gl.draw_elements(mode.gl_enum(), count, kind.gl_enum(), offset) };
    }

    fn get_error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&self, mask: ClearMask) {
        unsafe { self.gl.clear(mask.bits()) };
    }

    fn enable(&self, capability: Capability) {
        unsafe { self.gl.enable(capability.gl_enum()) };
    }

    fn disable(&self, capability: Capability) {
        unsafe { self.gl.disable(capability.gl_enum()) };
    }

    fn cull_face(&self, face: CullFace) {
        unsafe { self.gl.cull_face(face.gl_enum()) };
    }

    fn blend_equation(&self, equation: BlendEquation) {
        unsafe { self.gl.blend_equation(equation.gl_enum()) };
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(src.gl_enum(), dst.gl_enum()) };
    }

    fn depth_func(&self, func: DepthFunc) {
        unsafe { self.gl.depth_func(func.gl_enum()) };
    }

    fn flush(&self) {
        unsafe { self.gl.flush() };
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }
}
