//! Shared fixtures for render tests

use crate::assets::GeometryFile;
use crate::render::gl::HeadlessContext;
use crate::render::mesh::Mesh;
use crate::render::shader::{AttributeSlotAllocator, ShaderProgram};

pub const VERTEX: &str = "\
attribute vec3 inputPosition;
attribute vec3 inputNormal;
uniform mat4 projection, modelview;
uniform mat4 normalMat;
varying vec3 normal;
void main() {
    normal = (normalMat * vec4(inputNormal, 0.0)).xyz;
    gl_Position = projection * modelview * vec4(inputPosition, 1.0);
}
";

pub const FRAGMENT: &str = "\
precision mediump float;
varying vec3 normal;
void main() {
    gl_FragColor = vec4(normalize(normal) * 0.5 + 0.5, 1.0);
}
";

pub const TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
";

pub fn program(gl: &HeadlessContext) -> ShaderProgram {
    let mut allocator = AttributeSlotAllocator::for_context(gl);
    ShaderProgram::new(gl, &mut allocator, VERTEX, FRAGMENT).unwrap()
}

pub fn mesh(gl: &HeadlessContext) -> Mesh {
    let geometry = GeometryFile::parse("triangle.obj", TRIANGLE).unwrap();
    Mesh::build(gl, &geometry, None).unwrap()
}
