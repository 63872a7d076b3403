//! Orbit viewer
//!
//! Loads a model and shader pair, spins the model in the background and
//! drives frames against the headless GL context, issuing the same camera
//! calls a touch UI would.
//!
//! Usage: `orbit_viewer [config.toml|config.ron] [frames]`

use orbit_engine::assets::AssetReader;
use orbit_engine::core::{Config, ViewerConfig};
use orbit_engine::foundation::logging;
use orbit_engine::prelude::*;
use orbit_engine::render::{check_gl_error, DrawableKey};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_FRAMES: u64 = 240;
const SURFACE: (i32, i32) = (800, 600);

#[derive(thiserror::Error, Debug)]
enum ViewerError {
    #[error("Frame count {0:?} is not a number")]
    BadFrameCount(String),

    #[error("Model {0} has no faces")]
    EmptyModel(String),
}

/// Logs model loading progress in ten percent steps
#[derive(Default)]
struct ProgressLog {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl StepLoadListener for ProgressLog {
    fn add_units(&self, count: usize) {
        let total = self.total.fetch_add(count, Ordering::Relaxed) + count;
        log::info!("Loading model: {total} vertices");
    }

    fn unit_done(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed).max(1);
        if done * 10 / total != (done - 1) * 10 / total {
            log::info!("Loading model: {}%", done * 100 / total);
        }
    }
}

struct ViewerApp {
    gl: HeadlessContext,
    renderer: Renderer,
    camera: Arc<ViewableStateController>,
    model: DrawableKey,
    pivot: Vec3,
    rotation: Option<AutoRotation>,
}

impl ViewerApp {
    fn new(config: &ViewerConfig, config_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let gl = HeadlessContext::new();
        let assets = AssetReader::new(config_dir.join(&config.assets.root));
        log::info!("Loading assets from {}", assets.root().display());

        let mut slots = AttributeSlotAllocator::for_context(&gl);
        let program = ShaderProgram::from_assets(
            &gl,
            &mut slots,
            &assets,
            &config.assets.vertex_shader,
            &config.assets.fragment_shader,
        )?;

        let geometry = GeometryFile::load(assets.resolve(&config.assets.model))?;
        let bounds = geometry
            .bounds()
            .ok_or_else(|| ViewerError::EmptyModel(config.assets.model.clone()))?;
        log::info!("Model bounds {:?} .. {:?}", bounds.min, bounds.max);

        let progress = ProgressLog::default();
        let mesh = Mesh::build(&gl, &geometry, Some(&progress as &dyn StepLoadListener))?;

        let camera = Arc::new(ViewableStateController::new(
            config.camera.projection(),
            config.bindings.role_matchers(),
        )?);
        camera.zoom_camera(config.camera.initial_zoom)?;

        let mapping = AttributeBufferMapping::new(
            config.assets.attribute_buffers.iter().map(|(name, &index)| (name.as_str(), index)),
        )?;

        let mut renderer = Renderer::new(config.render.clone());
        renderer.set_camera(camera.clone());
        let model = renderer.add_drawable(Box::new(SimpleDrawable::with_parts(program, mesh, camera.clone(), mapping)));

        let rotation = if config.animation.enabled {
            Some(AutoRotation::spawn(camera.clone(), config.animation.speed, config.animation.interval())?)
        } else {
            None
        };

        Ok(Self { gl, renderer, camera, model, pivot: bounds.center(), rotation })
    }

    fn run(&mut self, frames: u64) -> Result<(), Box<dyn std::error::Error>> {
        self.renderer.init_state(&self.gl)?;
        self.renderer.resize(&self.gl, SURFACE.0, SURFACE.1)?;
        let control = self.renderer.control();

        for frame in 0..frames {
            self.simulate_gestures(frame);

            // a backgrounded activity would pause here
            if frame == frames / 2 {
                control.pause();
                log::info!("Paused at frame {frame}");
            } else if frame == frames / 2 + 10 {
                control.resume();
                log::info!("Resumed at frame {frame}");
            }

            self.renderer.render_frame(&self.gl)?;
            if frame % 60 == 0 {
                check_gl_error(&self.gl, "frame")?;
            }
            std::thread::sleep(Duration::from_millis(4));
        }

        Ok(())
    }

    /// Drags, pinches and a rotation after the surface flips to portrait
    fn simulate_gestures(&self, frame: u64) {
        let result = match frame % 90 {
            20 => self.camera.rotate_camera_about(12.0, -4.0, self.pivot),
            45 => self.camera.zoom_camera(-0.5),
            60 => self.camera.zoom_camera(0.25),
            75 => self.camera.rotate_camera(0.0, 0.0),
            _ => Ok(()),
        };
        if let Err(err) = result {
            log::debug!("Gesture ignored at frame {frame}: {err}");
        }

        if frame == 120 {
            if let Err(err) = self.renderer.resize(&self.gl, SURFACE.1, SURFACE.0) {
                log::warn!("Resize failed: {err}");
            }
        }
    }

    fn shutdown(mut self) {
        if let Some(rotation) = self.rotation.take() {
            rotation.stop();
        }

        let (shaders, programs, buffers) = self.gl.live_objects();
        log::info!(
            "Drew {} frames ({:.1} fps), {} draw calls; live objects: {shaders} shaders, {programs} programs, {buffers} buffers",
            self.renderer.frame_count(),
            self.renderer.average_frame_rate(),
            self.gl.draws().len(),
        );
        log::info!("Final model-view matrix:{}", self.camera.modelview_matrix());

        if self.renderer.remove_drawable(self.model).is_some() {
            log::debug!("Released model drawable");
        }
    }
}

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("viewer.toml"), PathBuf::from)
}

fn frame_count() -> Result<u64, ViewerError> {
    match std::env::args().nth(2) {
        Some(arg) => arg.parse().map_err(|_| ViewerError::BadFrameCount(arg)),
        None => Ok(DEFAULT_FRAMES),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info");

    let path = config_path();
    let config = ViewerConfig::load_or_default(&path)?;
    config.validate()?;
    let config_dir = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let frames = frame_count()?;
    let mut app = ViewerApp::new(&config, &config_dir)?;
    let result = app.run(frames);
    app.shutdown();
    result
}
