//! # Orbit Engine
//!
//! A small OpenGL ES 2.0 toolkit that displays a rotating, zoomable mesh
//! loaded from a Wavefront OBJ file.
//!
//! ## Features
//!
//! - **OBJ geometry**: positions, normals and triangular faces
//! - **Shader introspection**: attributes and uniforms discovered from GLSL source
//! - **State binding**: camera matrices routed into uniforms by type and name
//! - **Headless GL**: an in-memory GLES 2.0 emulation for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orbit_engine::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gl = HeadlessContext::new();
//!     let assets = AssetReader::new("assets");
//!     let mut slots = AttributeSlotAllocator::for_context(&gl);
//!     let program = ShaderProgram::from_assets(&gl, &mut slots, &assets, "shader.vert", "shader.frag")?;
//!     let geometry = GeometryFile::load(assets.resolve("ico.obj"))?;
//!     let mesh = Mesh::build(&gl, &geometry, None)?;
//!
//!     let camera = Arc::new(ViewableStateController::new(Projection::default(), RoleMatchers::default())?);
//!     let mapping = AttributeBufferMapping::new([("inputPosition", 0), ("inputNormal", 1)])?;
//!
//!     let mut renderer = Renderer::default();
//!     renderer.set_camera(camera.clone());
//!     renderer.add_drawable(Box::new(SimpleDrawable::with_parts(program, mesh, camera, mapping)));
//!     renderer.init_state(&gl)?;
//!     renderer.resize(&gl, 800, 600)?;
//!     renderer.render_frame(&gl)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;
pub mod system;

/// Common imports for applications
pub mod prelude {
    pub use crate::assets::{AssetReader, GeometryFile};
    pub use crate::core::{Config, ViewerConfig};
    pub use crate::foundation::math::{Mat4, Vec3};
    pub use crate::render::{
        AttributeBufferMapping, AttributeSlotAllocator, Drawable, GlContext, HeadlessContext, Mesh,
        RenderControl, Renderer, ShaderProgram, SimpleDrawable, StepLoadListener,
    };
    pub use crate::system::{
        AutoRotation, Projection, RoleMatchers, StateControllable, Viewable, ViewableStateController,
    };
}
