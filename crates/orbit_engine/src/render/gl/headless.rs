//! In-memory OpenGL ES 2.0 emulation
//!
//! Keeps enough server-side state to run the engine without a driver: shader
//! sources and compile results, program link results and uniform locations,
//! buffer contents, uniform values and the draw log. Every call is recorded so
//! callers can assert on the exact command stream.

use super::{
    codes, BlendEquation, BlendFactor, BufferId, BufferTarget, BufferUsage, Capability,
    ClearMask, CullFace, DepthFunc, GlContext, PrimitiveMode, ProgramId, ShaderId, ShaderStage,
    UniformLocation, ValueKind,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

/// Default `GL_MAX_VERTEX_ATTRIBS`
pub const DEFAULT_MAX_VERTEX_ATTRIBS: u32 = 16;

/// One recorded GL call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum GlCall {
    CreateShader(ShaderStage, ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    DetachShader(ProgramId, ShaderId),
    BindAttribLocation { program: ProgramId, index: u32, name: String },
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData { target: BufferTarget, len: usize, usage: BufferUsage },
    DeleteBuffer(BufferId),
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribPointer { index: u32, size: i32, kind: ValueKind, normalized: bool, stride: i32, offset: i32 },
    Uniform { location: UniformLocation, values: UniformData },
    DrawElements { mode: PrimitiveMode, count: i32, kind: ValueKind, offset: i32 },
    ClearColor([f32; 4]),
    Clear(ClearMask),
    Enable(Capability),
    Disable(Capability),
    CullFace(CullFace),
    BlendEquation(BlendEquation),
    BlendFunc(BlendFactor, BlendFactor),
    DepthFunc(DepthFunc),
    Flush,
    Viewport(i32, i32, i32, i32),
}

/// Value stored into a uniform location
#[derive(Debug, Clone, PartialEq)]
pub enum UniformData {
    /// `glUniform*f`
    Floats(Vec<f32>),
    /// `glUniform*i`
    Ints(Vec<i32>),
    /// `glUniformMatrix*fv`
    Matrix(Vec<f32>),
}

/// A recorded draw with the pipeline state it saw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Current program
    pub program: Option<ProgramId>,
    /// Bound element array buffer
    pub index_buffer: Option<BufferId>,
    /// Enabled generic attributes, sorted
    pub enabled_attributes: Vec<u32>,
    /// Index count
    pub count: i32,
    /// Index element type
    pub kind: ValueKind,
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Default)]
struct ProgramObject {
    shaders: Vec<ShaderId>,
    linked: bool,
    info_log: String,
    pending_bindings: HashMap<String, u32>,
    attribute_bindings: HashMap<String, u32>,
    uniform_locations: HashMap<String, UniformLocation>,
    uniform_values: HashMap<UniformLocation, UniformData>,
}

struct HeadlessState {
    next_name: u32,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    buffers: HashMap<BufferId, Vec<u8>>,
    bindings: HashMap<BufferTarget, BufferId>,
    current_program: Option<ProgramId>,
    enabled_attributes: HashSet<u32>,
    capabilities: HashSet<Capability>,
    errors: VecDeque<u32>,
    calls: Vec<GlCall>,
    draws: Vec<DrawRecord>,
    uniform_uploads: usize,
    viewport: (i32, i32, i32, i32),
    clear_color: [f32; 4],
    max_vertex_attribs: u32,
    refuse_objects: bool,
    object_budget: Option<usize>,
}

/// GLES 2.0 emulation backed by plain Rust collections
pub struct HeadlessContext {
    state: RefCell<HeadlessState>,
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessContext {
    /// Fresh context with the default attribute limit
    pub fn new() -> Self {
        Self::with_max_vertex_attribs(DEFAULT_MAX_VERTEX_ATTRIBS)
    }

    /// Fresh context reporting `max` generic vertex attributes
    pub fn with_max_vertex_attribs(max: u32) -> Self {
        let mut capabilities = HashSet::new();
        // GL starts with dithering on and everything else off
        capabilities.insert(Capability::Dither);

        Self {
            state: RefCell::new(HeadlessState {
                next_name: 1,
                shaders: HashMap::new(),
                programs: HashMap::new(),
                buffers: HashMap::new(),
                bindings: HashMap::new(),
                current_program: None,
                enabled_attributes: HashSet::new(),
                capabilities,
                errors: VecDeque::new(),
                calls: Vec::new(),
                draws: Vec::new(),
                uniform_uploads: 0,
                viewport: (0, 0, 0, 0),
                clear_color: [0.0; 4],
                max_vertex_attribs: max,
                refuse_objects: false,
                object_budget: None,
            }),
        }
    }

    /// Make every subsequent `create_*` call fail, as a lost context would
    pub fn refuse_object_creation(&self, refuse: bool) {
        self.state.borrow_mut().refuse_objects = refuse;
    }

    /// Allow `count` more objects, then refuse every `create_*` call
    pub fn limit_object_creation(&self, count: usize) {
        self.state.borrow_mut().object_budget = Some(count);
    }

    /// Queue an error code for the next `get_error`
    pub fn raise_error(&self, code: u32) {
        self.state.borrow_mut().errors.push_back(code);
    }

    /// Every call recorded so far
    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    /// Forget recorded calls and draws
    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.clear();
        state.draws.clear();
        state.uniform_uploads = 0;
    }

    /// Every draw recorded so far
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.borrow().draws.clone()
    }

    /// Number of `glUniform*` calls since the last [`clear_log`](Self::clear_log)
    pub fn uniform_upload_count(&self) -> usize {
        self.state.borrow().uniform_uploads
    }

    /// Value last stored into a named uniform of `program`
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformData> {
        let state = self.state.borrow();
        let object = state.programs.get(&program)?;
        let location = object.uniform_locations.get(name)?;
        object.uniform_values.get(location).cloned()
    }

    /// Attribute index the linker assigned to `name`
    pub fn attribute_binding(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|object| object.attribute_bindings.get(name).copied())
    }

    /// Whether a capability is enabled
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    /// Current viewport rectangle
    pub fn current_viewport(&self) -> (i32, i32, i32, i32) {
        self.state.borrow().viewport
    }

    /// Current clear color
    pub fn current_clear_color(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    /// Current program
    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    /// Generic attributes currently enabled
    pub fn enabled_attributes(&self) -> Vec<u32> {
        let mut enabled: Vec<u32> = self.state.borrow().enabled_attributes.iter().copied().collect();
        enabled.sort_unstable();
        enabled
    }

    /// Live shader, program and buffer objects
    pub fn live_objects(&self) -> (usize, usize, usize) {
        let state = self.state.borrow();
        (state.shaders.len(), state.programs.len(), state.buffers.len())
    }

    fn record(&self, call: GlCall) {
        log::trace!("gl: {call:?}");
        self.state.borrow_mut().calls.push(call);
    }

    fn allocate_name(&self) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        if state.refuse_objects || state.object_budget == Some(0) {
            return None;
        }
        if let Some(budget) = state.object_budget.as_mut() {
            *budget -= 1;
        }
        let name = state.next_name;
        state.next_name += 1;
        Some(name)
    }

    fn store_uniform(&self, location: UniformLocation, values: UniformData) {
        self.record(GlCall::Uniform { location, values: values.clone() });

        let mut state = self.state.borrow_mut();
        let Some(program) = state.current_program else {
            state.errors.push_back(codes::INVALID_OPERATION);
            return;
        };
        state.uniform_uploads += 1;
        if let Some(object) = state.programs.get_mut(&program) {
            object.uniform_values.insert(location, values);
        }
    }
}

/// Compile a shader source the way a strict driver front end would report it
fn compile_source(source: &str) -> Result<(), String> {
    for (number, line) in source.lines().enumerate() {
        if let Some(message) = line.trim_start().strip_prefix("#error") {
            return Err(format!("ERROR: 0:{}: '#error' : {}", number + 1, message.trim()));
        }
    }
    if !source.contains("void main") {
        return Err("ERROR: 0:1: 'main' : function not defined".to_string());
    }
    Ok(())
}

/// Uniform names declared in `source` that are referenced outside their declaration
fn active_uniforms(source: &str) -> Vec<String> {
    let mut declared = Vec::new();
    let mut referenced = HashSet::new();

    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("uniform ") {
            let rest = rest.trim_end_matches(';');
            let mut words = rest.split_whitespace().peekable();
            // skip precision qualifier and type
            while let Some(word) = words.peek() {
                if matches!(*word, "lowp" | "mediump" | "highp") {
                    words.next();
                } else {
                    break;
                }
            }
            words.next();
            let names: String = words.collect::<Vec<_>>().join(" ");
            for name in names.split(',') {
                let name = name.split('[').next().unwrap_or_default().trim();
                if !name.is_empty() {
                    declared.push(name.to_string());
                }
            }
        } else {
            for word in trimmed.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
                if !word.is_empty() {
                    referenced.insert(word.to_string());
                }
            }
        }
    }

    declared.retain(|name| referenced.contains(name));
    declared
}

impl GlContext for HeadlessContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        let id = ShaderId(self.allocate_name()?);
        self.record(GlCall::CreateShader(stage, id));
        self.state.borrow_mut().shaders.insert(
            id,
            ShaderObject { stage, source: String::new(), compiled: false, info_log: String::new() },
        );
        Some(id)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(object) => object.source = source.to_string(),
            None => state.errors.push_back(codes::INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        self.record(GlCall::CompileShader(shader));
        let mut state = self.state.borrow_mut();
        let Some(object) = state.shaders.get_mut(&shader) else {
            state.errors.push_back(codes::INVALID_VALUE);
            return;
        };
        match compile_source(&object.source) {
            Ok(()) => {
                object.compiled = true;
                object.info_log.clear();
            }
            Err(log) => {
                object.compiled = false;
                object.info_log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.state.borrow().shaders.get(&shader).is_some_and(|object| object.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.record(GlCall::DeleteShader(shader));
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Option<ProgramId> {
        let id = ProgramId(self.allocate_name()?);
        self.record(GlCall::CreateProgram(id));
        self.state.borrow_mut().programs.insert(id, ProgramObject::default());
        Some(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.record(GlCall::AttachShader(program, shader));
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(object) => object.shaders.push(shader),
            None => state.errors.push_back(codes::INVALID_VALUE),
        }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.record(GlCall::DetachShader(program, shader));
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.shaders.retain(|attached| *attached != shader);
        }
    }

    fn bind_attrib_location(&self, program: ProgramId, index: u32, name: &str) {
        self.record(GlCall::BindAttribLocation { program, index, name: name.to_string() });
        let mut state = self.state.borrow_mut();
        if index >= state.max_vertex_attribs {
            state.errors.push_back(codes::INVALID_VALUE);
            return;
        }
        if let Some(object) = state.programs.get_mut(&program) {
            object.pending_bindings.insert(name.to_string(), index);
        }
    }

    fn link_program(&self, program: ProgramId) {
        self.record(GlCall::LinkProgram(program));
        let mut state = self.state.borrow_mut();
        let HeadlessState { programs, shaders, .. } = &mut *state;
        let Some(object) = programs.get_mut(&program) else {
            return;
        };

        let attached: Vec<&ShaderObject> =
            object.shaders.iter().filter_map(|id| shaders.get(id)).collect();
        let has_stage = |stage| attached.iter().any(|shader| shader.stage == stage && shader.compiled);

        object.linked = false;
        object.uniform_locations.clear();
        object.uniform_values.clear();

        if attached.iter().any(|shader| !shader.compiled) {
            object.info_log = "ERROR: One or more attached shaders not successfully compiled".to_string();
            return;
        }
        if !has_stage(ShaderStage::Vertex) || !has_stage(ShaderStage::Fragment) {
            object.info_log = "ERROR: Program needs a vertex and a fragment shader".to_string();
            return;
        }

        let mut next_location = 0;
        for shader in &attached {
            for name in active_uniforms(&shader.source) {
                object.uniform_locations.entry(name).or_insert_with(|| {
                    let location = UniformLocation(next_location);
                    next_location += 1;
                    location
                });
            }
        }

        object.attribute_bindings = object.pending_bindings.clone();
        object.info_log.clear();
        object.linked = true;
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.state.borrow().programs.get(&program).is_some_and(|object| object.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: ProgramId) {
        self.record(GlCall::DeleteProgram(program));
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let object = state.programs.get(&program)?;
        if !object.linked {
            return None;
        }
        object.uniform_locations.get(name).copied()
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.record(GlCall::UseProgram(program));
        let mut state = self.state.borrow_mut();
        if let Some(id) = program {
            if !state.programs.get(&id).is_some_and(|object| object.linked) {
                state.errors.push_back(codes::INVALID_OPERATION);
                return;
            }
        }
        state.current_program = program;
    }

    fn max_vertex_attribs(&self) -> u32 {
        self.state.borrow().max_vertex_attribs
    }

    fn create_buffer(&self) -> Option<BufferId> {
        let id = BufferId(self.allocate_name()?);
        self.record(GlCall::CreateBuffer(id));
        self.state.borrow_mut().buffers.insert(id, Vec::new());
        Some(id)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>) {
        self.record(GlCall::BindBuffer(target, buffer));
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(id) if !state.buffers.contains_key(&id) => {
                state.errors.push_back(codes::INVALID_VALUE);
            }
            Some(id) => {
                state.bindings.insert(target, id);
            }
            None => {
                state.bindings.remove(&target);
            }
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(GlCall::BufferData { target, len: data.len(), usage });
        let mut state = self.state.borrow_mut();
        let Some(id) = state.bindings.get(&target).copied() else {
            state.errors.push_back(codes::INVALID_OPERATION);
            return;
        };
        if let Some(contents) = state.buffers.get_mut(&id) {
            *contents = data.to_vec();
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.record(GlCall::DeleteBuffer(buffer));
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer);
        state.bindings.retain(|_, bound| *bound != buffer);
    }

    fn read_buffer_data(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
        let mut state = self.state.borrow_mut();
        if index >= state.max_vertex_attribs {
            state.errors.push_back(codes::INVALID_VALUE);
            return;
        }
        state.enabled_attributes.insert(index);
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::DisableVertexAttribArray(index));
        self.state.borrow_mut().enabled_attributes.remove(&index);
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
        self.record(GlCall::VertexAttribPointer { index, size, kind, normalized, stride, offset });
        let mut state = self.state.borrow_mut();
        if index >= state.max_vertex_attribs || !(1..=4).contains(&size) || stride < 0 {
            state.errors.push_back(codes::INVALID_VALUE);
        } else if !state.bindings.contains_key(&BufferTarget::ArrayBuffer) {
            state.errors.push_back(codes::INVALID_OPERATION);
        }
    }

    fn uniform_f32(&self, location: UniformLocation, components: usize, values: &[f32]) {
        let count = components.min(values.len());
        self.store_uniform(location, UniformData::Floats(values[..count].to_vec()));
    }

    fn uniform_i32(&self, location: UniformLocation, components: usize, values: &[i32]) {
        let count = components.min(values.len());
        self.store_uniform(location, UniformData::Ints(values[..count].to_vec()));
    }

    fn uniform_matrix(&self, location: UniformLocation, dimension: usize, values: &[f32]) {
        let count = (dimension * dimension).min(values.len());
        self.store_uniform(location, UniformData::Matrix(values[..count].to_vec()));
    }

    fn draw_elements(&self, mode: PrimitiveMode, count: i32, kind: ValueKind, offset: i32) {
        self.record(GlCall::DrawElements { mode, count, kind, offset });
        let mut state = self.state.borrow_mut();
        let index_buffer = state.bindings.get(&BufferTarget::ElementArrayBuffer).copied();
        if index_buffer.is_none() || state.current_program.is_none() {
            state.errors.push_back(codes::INVALID_OPERATION);
            return;
        }
        let mut enabled_attributes: Vec<u32> = state.enabled_attributes.iter().copied().collect();
        enabled_attributes.sort_unstable();
        let record = DrawRecord {
            program: state.current_program,
            index_buffer,
            enabled_attributes,
            count,
            kind,
        };
        state.draws.push(record);
    }

    fn get_error(&self) -> u32 {
        self.state.borrow_mut().errors.pop_front().unwrap_or(codes::NO_ERROR)
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(GlCall::ClearColor([r, g, b, a]));
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear(&self, mask: ClearMask) {
        self.record(GlCall::Clear(mask));
    }

    fn enable(&self, capability: Capability) {
        self.record(GlCall::Enable(capability));
        self.state.borrow_mut().capabilities.insert(capability);
    }

    fn disable(&self, capability: Capability) {
        self.record(GlCall::Disable(capability));
        self.state.borrow_mut().capabilities.remove(&capability);
    }

    fn cull_face(&self, face: CullFace) {
        self.record(GlCall::CullFace(face));
    }

    fn blend_equation(&self, equation: BlendEquation) {
        self.record(GlCall::BlendEquation(equation));
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        self.record(GlCall::BlendFunc(src, dst));
    }

    fn depth_func(&self, func: DepthFunc) {
        self.record(GlCall::DepthFunc(func));
    }

    fn flush(&self) {
        self.record(GlCall::Flush);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport(x, y, width, height));
        self.state.borrow_mut().viewport = (x, y, width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "attribute vec3 inputPosition;\nuniform mat4 projection;\nuniform mat4 unused;\nvoid main() {\n    gl_Position = projection * vec4(inputPosition, 1.0);\n}\n";
    const FRAGMENT: &str = "void main() {\n    gl_FragColor = vec4(1.0);\n}\n";

    fn compiled(gl: &HeadlessContext, stage: ShaderStage, source: &str) -> ShaderId {
        let shader = gl.create_shader(stage).unwrap();
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        shader
    }

    #[test]
    fn test_compile_reports_error_line() {
        let gl = HeadlessContext::new();
        let shader = compiled(&gl, ShaderStage::Vertex, "void main() {\n#error broken here\n}\n");

        assert!(!gl.shader_compile_status(shader));
        assert_eq!(gl.shader_info_log(shader), "ERROR: 0:2: '#error' : broken here");
    }

    #[test]
    fn test_link_resolves_only_referenced_uniforms() {
        let gl = HeadlessContext::new();
        let vs = compiled(&gl, ShaderStage::Vertex, VERTEX);
        let fs = compiled(&gl, ShaderStage::Fragment, FRAGMENT);
        let program = gl.create_program().unwrap();
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.bind_attrib_location(program, 3, "inputPosition");
        gl.link_program(program);

        assert!(gl.program_link_status(program));
        assert_eq!(gl.uniform_location(program, "projection"), Some(UniformLocation(0)));
        assert_eq!(gl.uniform_location(program, "unused"), None);
        assert_eq!(gl.attribute_binding(program, "inputPosition"), Some(3));
    }

    #[test]
    fn test_link_fails_without_fragment_stage() {
        let gl = HeadlessContext::new();
        let vs = compiled(&gl, ShaderStage::Vertex, VERTEX);
        let program = gl.create_program().unwrap();
        gl.attach_shader(program, vs);
        gl.link_program(program);

        assert!(!gl.program_link_status(program));
        assert!(!gl.program_info_log(program).is_empty());
    }

    #[test]
    fn test_buffer_contents_round_trip() {
        let gl = HeadlessContext::new();
        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(BufferTarget::ArrayBuffer, Some(buffer));
        gl.buffer_data(BufferTarget::ArrayBuffer, &[1, 2, 3, 4], BufferUsage::StaticDraw);
        gl.bind_buffer(BufferTarget::ArrayBuffer, None);

        assert_eq!(gl.read_buffer_data(buffer), Some(vec![1, 2, 3, 4]));
        assert_eq!(gl.get_error(), codes::NO_ERROR);
    }

    #[test]
    fn test_buffer_data_without_binding_raises_error() {
        let gl = HeadlessContext::new();
        gl.buffer_data(BufferTarget::ElementArrayBuffer, &[0; 4], BufferUsage::StaticDraw);
        assert_eq!(gl.get_error(), codes::INVALID_OPERATION);
    }

    #[test]
    fn test_refused_creation() {
        let gl = HeadlessContext::new();
        gl.refuse_object_creation(true);
        assert!(gl.create_buffer().is_none());
        assert!(gl.create_shader(ShaderStage::Vertex).is_none());
        assert!(gl.create_program().is_none());
    }

    #[test]
    fn test_object_budget() {
        let gl = HeadlessContext::new();
        gl.limit_object_creation(2);
        assert!(gl.create_buffer().is_some());
        assert!(gl.create_program().is_some());
        assert!(gl.create_buffer().is_none());
    }

    #[test]
    fn test_dither_enabled_initially() {
        let gl = HeadlessContext::new();
        assert!(gl.is_enabled(Capability::Dither));
        gl.disable(Capability::Dither);
        assert!(!gl.is_enabled(Capability::Dither));
    }
}
