//! Frame driver
//!
//! The renderer owns the drawables, sets up fixed pipeline state once per
//! surface, keeps the camera's aspect ratio in step with the viewport and
//! draws every drawable once per frame.

use super::drawable::Drawable;
use super::gl::{
    check_gl_error, BlendEquation, BlendFactor, Capability, ClearMask, CullFace, DepthFunc,
    GlContext,
};
use super::RenderError;
use crate::foundation::time::Timer;
use crate::system::Viewable;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

slotmap::new_key_type! {
    /// Handle to a drawable owned by a [`Renderer`]
    pub struct DrawableKey;
}

/// Fixed pipeline state applied by [`Renderer::init_state`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// RGBA clear color
    pub clear_color: [f32; 4],
    /// Cull back faces
    pub cull_back_faces: bool,
    /// Alpha blending with `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`
    pub blend: bool,
    /// Depth testing with `LESS`
    pub depth_test: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            cull_back_faces: true,
            blend: true,
            depth_test: true,
        }
    }
}

/// Pause switch shared between the render loop and whoever drives it
#[derive(Debug, Clone, Default)]
pub struct RenderControl {
    paused: Arc<AtomicBool>,
}

impl RenderControl {
    /// Stop drawing frames
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume drawing frames
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Whether frames are currently skipped
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// Draws a set of drawables each frame
pub struct Renderer {
    drawables: SlotMap<DrawableKey, Box<dyn Drawable>>,
    order: Vec<DrawableKey>,
    camera: Option<Arc<dyn Viewable>>,
    settings: RenderSettings,
    control: RenderControl,
    timer: Timer,
    frames: u64,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl Renderer {
    /// Empty renderer
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            drawables: SlotMap::with_key(),
            order: Vec::new(),
            camera: None,
            settings,
            control: RenderControl::default(),
            timer: Timer::new(),
            frames: 0,
        }
    }

    /// Camera whose aspect ratio follows the viewport
    pub fn set_camera(&mut self, camera: Arc<dyn Viewable>) {
        self.camera = Some(camera);
    }

    /// Settings applied by [`init_state`](Self::init_state)
    pub const fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Pause switch for this renderer
    pub fn control(&self) -> RenderControl {
        self.control.clone()
    }

    /// Add a drawable; drawables render in insertion order
    pub fn add_drawable(&mut self, drawable: Box<dyn Drawable>) -> DrawableKey {
        let key = self.drawables.insert(drawable);
        self.order.push(key);
        key
    }

    /// Remove a drawable, handing it back to the caller
    pub fn remove_drawable(&mut self, key: DrawableKey) -> Option<Box<dyn Drawable>> {
        self.order.retain(|&k| k != key);
        self.drawables.remove(key)
    }

    /// Mutable access to a drawable
    pub fn drawable_mut(&mut self, key: DrawableKey) -> Option<&mut (dyn Drawable + 'static)> {
        self.drawables.get_mut(key).map(Box::as_mut)
    }

    /// Number of drawables
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Frames drawn so far
    pub const fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Average frames per second since the first frame
    pub fn average_frame_rate(&self) -> f32 {
        self.timer.average_rate()
    }

    /// Apply the fixed pipeline state; call once per new surface
    pub fn init_state(&self, gl: &dyn GlContext) -> Result<(), RenderError> {
        let [r, g, b, a] = self.settings.clear_color;
        gl.clear_color(r, g, b, a);

        if self.settings.cull_back_faces {
            gl.enable(Capability::CullFace);
            gl.cull_face(CullFace::Back);
        } else {
            gl.disable(Capability::CullFace);
        }

        if self.settings.blend {
            gl.enable(Capability::Blend);
            gl.blend_equation(BlendEquation::Add);
            gl.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        } else {
            gl.disable(Capability::Blend);
        }

        if self.settings.depth_test {
            gl.enable(Capability::DepthTest);
            gl.depth_func(DepthFunc::Less);
        } else {
            gl.disable(Capability::DepthTest);
        }

        gl.disable(Capability::Dither);
        gl.flush();

        check_gl_error(gl, "init_state")?;
        log::info!("Render state initialized: {:?}", self.settings);
        Ok(())
    }

    /// Resize the viewport and update the camera's aspect ratio
    ///
    /// A zero or negative dimension leaves everything untouched.
    pub fn resize(&self, gl: &dyn GlContext, width: i32, height: i32) -> Result<(), RenderError> {
        if height <= 0 || width <= 0 {
            log::warn!("Ignoring resize to {width}x{height}");
            return Ok(());
        }

        gl.viewport(0, 0, width, height);
        if let Some(camera) = &self.camera {
            camera.set_viewport_ratio(width as f32 / height as f32)?;
        }
        log::debug!("Viewport resized to {width}x{height}");
        Ok(())
    }

    /// Draw one frame
    ///
    /// Returns `Ok(false)` when paused. A failing drawable aborts the frame.
    pub fn render_frame(&mut self, gl: &dyn GlContext) -> Result<bool, RenderError> {
        if self.control.is_paused() {
            return Ok(false);
        }

        if !self.order.is_empty() {
            gl.clear(ClearMask::COLOR | ClearMask::DEPTH);
        }

        for key in &self.order {
            if let Some(drawable) = self.drawables.get_mut(*key) {
                drawable.render(gl)?;
            }
        }

        gl.flush();
        self.timer.update();
        self.frames += 1;
        if self.frames % 600 == 0 {
            log::debug!("{} frames drawn, {:.1} fps", self.frames, self.timer.average_rate());
        }
        Ok(true)
    }

    /// Check the GL error flag after a frame
    pub fn check_errors(&self, gl: &dyn GlContext) -> Result<(), RenderError> {
        Ok(check_gl_error(gl, "render_frame")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::drawable::{AttributeBufferMapping, SimpleDrawable};
    use crate::render::gl::headless::UniformData;
    use crate::render::gl::{codes, GlCall, HeadlessContext, GlError};
    use crate::render::test_support;
    use crate::system::{Projection, RoleMatchers, ViewableStateController};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counting(Rc<Cell<u32>>);

    impl Drawable for Counting {
        fn render(&mut self, _gl: &dyn GlContext) -> Result<(), RenderError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    struct Failing;

    impl Drawable for Failing {
        fn render(&mut self, _gl: &dyn GlContext) -> Result<(), RenderError> {
            Err(RenderError::NotConfigured("mesh"))
        }
    }

    #[test]
    fn test_init_state() {
        let gl = HeadlessContext::new();
        let renderer = Renderer::default();
        renderer.init_state(&gl).unwrap();

        assert!(gl.is_enabled(Capability::CullFace));
        assert!(gl.is_enabled(Capability::Blend));
        assert!(gl.is_enabled(Capability::DepthTest));
        assert!(!gl.is_enabled(Capability::Dither));
        assert_eq!(gl.current_clear_color(), [0.0, 0.0, 0.0, 1.0]);

        let calls = gl.calls();
        assert!(calls.contains(&GlCall::CullFace(CullFace::Back)));
        assert!(calls.contains(&GlCall::BlendFunc(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)));
        assert!(calls.contains(&GlCall::DepthFunc(DepthFunc::Less)));
        assert_eq!(calls.last(), Some(&GlCall::Flush));
    }

    #[test]
    fn test_init_state_reports_gl_error() {
        let gl = HeadlessContext::new();
        gl.raise_error(codes::OUT_OF_MEMORY);
        let err = Renderer::default().init_state(&gl).unwrap_err();
        assert!(matches!(err, RenderError::Gl(GlError::OutOfMemory(_))));
    }

    #[test]
    fn test_resize_updates_camera() {
        let gl = HeadlessContext::new();
        let camera = Arc::new(ViewableStateController::new(Projection::default(), RoleMatchers::default()).unwrap());
        let mut renderer = Renderer::default();
        renderer.set_camera(camera.clone());

        renderer.resize(&gl, 800, 600).unwrap();
        assert_eq!(gl.current_viewport(), (0, 0, 800, 600));
        approx::assert_relative_eq!(camera.viewport_ratio(), 800.0 / 600.0);

        renderer.resize(&gl, 800, 0).unwrap();
        assert_eq!(gl.current_viewport(), (0, 0, 800, 600));
        approx::assert_relative_eq!(camera.viewport_ratio(), 800.0 / 600.0);
    }

    #[test]
    fn test_zero_width_resize_is_ignored() {
        let gl = HeadlessContext::new();
        let camera = Arc::new(ViewableStateController::new(Projection::default(), RoleMatchers::default()).unwrap());
        let mut renderer = Renderer::default();
        renderer.set_camera(camera.clone());
        renderer.resize(&gl, 800, 600).unwrap();
        gl.clear_log();

        renderer.resize(&gl, 0, 600).unwrap();
        assert!(gl.calls().is_empty());
        assert_eq!(gl.current_viewport(), (0, 0, 800, 600));
        approx::assert_relative_eq!(camera.viewport_ratio(), 800.0 / 600.0);
    }

    #[test]
    fn test_empty_frame_skips_clear() {
        let gl = HeadlessContext::new();
        let mut renderer = Renderer::default();
        assert!(renderer.render_frame(&gl).unwrap());
        assert_eq!(gl.calls(), vec![GlCall::Flush]);
        assert_eq!(renderer.frame_count(), 1);
    }

    #[test]
    fn test_frame_renders_each_drawable() {
        let gl = HeadlessContext::new();
        let count = Rc::new(Cell::new(0));
        let mut renderer = Renderer::default();
        renderer.add_drawable(Box::new(Counting(count.clone())));
        let second = renderer.add_drawable(Box::new(Counting(count.clone())));

        renderer.render_frame(&gl).unwrap();
        assert_eq!(count.get(), 2);
        assert_eq!(gl.calls().first(), Some(&GlCall::Clear(ClearMask::COLOR | ClearMask::DEPTH)));

        assert!(renderer.remove_drawable(second).is_some());
        assert!(renderer.remove_drawable(second).is_none());
        renderer.render_frame(&gl).unwrap();
        assert_eq!(count.get(), 3);
        assert_eq!(renderer.drawable_count(), 1);
    }

    #[test]
    fn test_pause_and_resume() {
        let gl = HeadlessContext::new();
        let count = Rc::new(Cell::new(0));
        let mut renderer = Renderer::default();
        renderer.add_drawable(Box::new(Counting(count.clone())));
        let control = renderer.control();

        control.pause();
        assert!(!renderer.render_frame(&gl).unwrap());
        assert_eq!(count.get(), 0);
        assert!(gl.calls().is_empty());

        control.resume();
        assert!(renderer.render_frame(&gl).unwrap());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_failing_drawable_aborts_frame() {
        let gl = HeadlessContext::new();
        let mut renderer = Renderer::default();
        renderer.add_drawable(Box::new(Failing));
        assert!(matches!(renderer.render_frame(&gl), Err(RenderError::NotConfigured("mesh"))));
        assert_eq!(renderer.frame_count(), 0);
    }

    #[test]
    fn test_full_pipeline_draws_mesh() {
        let gl = HeadlessContext::new();
        let camera = Arc::new(ViewableStateController::new(Projection::default(), RoleMatchers::default()).unwrap());
        let mapping = AttributeBufferMapping::new([("inputPosition", 0), ("inputNormal", 1)]).unwrap();
        let drawable = SimpleDrawable::with_parts(test_support::program(&gl), test_support::mesh(&gl), camera.clone(), mapping);

        let mut renderer = Renderer::default();
        renderer.set_camera(camera);
        renderer.init_state(&gl).unwrap();
        renderer.resize(&gl, 640, 480).unwrap();
        let key = renderer.add_drawable(Box::new(drawable));
        assert!(renderer.drawable_mut(key).is_some());

        for _ in 0..3 {
            renderer.render_frame(&gl).unwrap();
        }
        renderer.check_errors(&gl).unwrap();
        assert_eq!(gl.draws().len(), 3);
        assert_eq!(renderer.frame_count(), 3);
    }

    #[test]
    fn test_drawables_sharing_a_camera_all_follow_it() {
        let gl = HeadlessContext::new();
        let camera = Arc::new(ViewableStateController::new(Projection::default(), RoleMatchers::default()).unwrap());
        let mut renderer = Renderer::default();
        renderer.set_camera(camera.clone());

        let mut programs = Vec::new();
        for _ in 0..2 {
            let program = test_support::program(&gl);
            programs.push(program.id());
            let mapping = AttributeBufferMapping::new([("inputPosition", 0), ("inputNormal", 1)]).unwrap();
            let drawable = SimpleDrawable::with_parts(program, test_support::mesh(&gl), camera.clone(), mapping);
            renderer.add_drawable(Box::new(drawable));
        }

        renderer.render_frame(&gl).unwrap();
        camera.zoom_camera(-6.0).unwrap();
        renderer.render_frame(&gl).unwrap();

        assert_eq!(gl.draws().len(), 4);
        for program in programs {
            let Some(UniformData::Matrix(modelview)) = gl.uniform_value(program, "modelview") else {
                panic!("modelview not uploaded");
            };
            approx::assert_relative_eq!(modelview[14], -6.0);
        }
    }
}
