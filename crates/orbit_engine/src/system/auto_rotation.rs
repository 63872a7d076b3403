//! Background camera rotation
//!
//! A worker thread turns the camera about the vertical axis at a fixed
//! angular speed, waking every `interval`. Rotation is scaled by the measured
//! elapsed time, so late wake-ups do not slow the animation down.

use super::{StateError, Viewable};
use crate::foundation::time::Timer;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default angular speed in degrees per second
pub const DEFAULT_SPEED: f32 = 10.0;

/// Default wake-up interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(16);

/// Handle to a running background rotation
///
/// Dropping the handle stops the thread; [`detach`](Self::detach) lets it run
/// until the process exits.
#[derive(Debug)]
pub struct AutoRotation {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AutoRotation {
    /// Start rotating `camera` by `speed` degrees per second
    ///
    /// Returns once the worker has taken its first time reading.
    pub fn spawn(camera: Arc<dyn Viewable>, speed: f32, interval: Duration) -> Result<Self, StateError> {
        let (started_tx, started_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("auto-rotation".to_string())
            .spawn(move || {
                let mut timer = Timer::new();
                timer.update();
                // the spawner may have given up waiting; nothing to report then
                let _ = started_tx.send(());

                let mut detached = false;
                loop {
                    if detached {
                        thread::sleep(interval);
                    } else {
                        match stop_rx.recv_timeout(interval) {
                            Ok(()) => break,
                            Err(RecvTimeoutError::Timeout) => {}
                            Err(RecvTimeoutError::Disconnected) => {
                                detached = true;
                                continue;
                            }
                        }
                    }

                    let Some(elapsed) = timer.update() else {
                        continue;
                    };
                    let degrees = elapsed * speed;
                    if degrees == 0.0 {
                        continue;
                    }
                    if let Err(err) = camera.rotate_camera(degrees, 0.0) {
                        log::warn!("Background rotation step rejected: {err}");
                    }
                }

                log::debug!(
                    "Background rotation stopped after {} ticks ({:.1} ticks/s)",
                    timer.tick_count(),
                    timer.average_rate()
                );
            })?;

        started_rx.recv().map_err(|_| {
            StateError::Spawn(std::io::Error::new(
                std::io::ErrorKind::Other,
                "rotation thread exited before starting",
            ))
        })?;

        log::info!("Background rotation running at {speed} deg/s every {interval:?}");
        Ok(Self { stop: Some(stop_tx), thread: Some(thread) })
    }

    /// Start with the default speed and interval
    pub fn spawn_default(camera: Arc<dyn Viewable>) -> Result<Self, StateError> {
        Self::spawn(camera, DEFAULT_SPEED, DEFAULT_INTERVAL)
    }

    /// Stop the thread and wait for it to finish
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Let the thread run until process exit
    pub fn detach(mut self) {
        // dropping the sender without a message leaves the worker running
        self.stop.take();
        self.thread.take();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Background rotation thread panicked");
            }
        }
    }
}

impl Drop for AutoRotation {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::system::{Projection, RoleMatchers, ViewableStateController};

    fn camera() -> Arc<ViewableStateController> {
        Arc::new(ViewableStateController::new(Projection::default(), RoleMatchers::default()).unwrap())
    }

    #[test]
    fn test_rotation_advances_and_stops() {
        let camera = camera();
        let rotation = AutoRotation::spawn(camera.clone(), 90.0, Duration::from_millis(2)).unwrap();
        thread::sleep(Duration::from_millis(60));
        rotation.stop();

        let stopped = camera.rotation_matrix();
        assert_ne!(stopped, Mat4::identity());
        // rotation is about the vertical axis only
        let up = stopped.transform_vector(&Vec3::y());
        approx::assert_relative_eq!(up, Vec3::y(), epsilon = 1e-4);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(camera.rotation_matrix(), stopped);
    }

    #[test]
    fn test_drop_stops_thread() {
        let camera = camera();
        {
            let _rotation = AutoRotation::spawn(camera.clone(), 45.0, Duration::from_millis(1)).unwrap();
            thread::sleep(Duration::from_millis(10));
        }
        let after_drop = camera.rotation_matrix();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(camera.rotation_matrix(), after_drop);
    }

    #[test]
    fn test_zero_speed_never_rotates() {
        let camera = camera();
        let rotation = AutoRotation::spawn(camera.clone(), 0.0, Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(10));
        rotation.stop();
        assert_eq!(camera.rotation_matrix(), Mat4::identity());
    }
}
