use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;

use crate::scene::SceneContext;
use crate::time::Time;

const STATS_INTERVAL_FRAMES: u64 = 600;

/// Draws a scene. Implemented by the GPU renderer and by test doubles.
pub trait SceneRenderer {
    fn render(&mut self, scene: &SceneContext) -> Result<()>;
}

/// Cloneable stop token for a [`RenderLoop`].
#[derive(Debug, Clone, Default)]
pub struct RenderLoopHandle {
    stopped: Rc<Cell<bool>>,
}

impl RenderLoopHandle {
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Self-rescheduling frame task. The host calls [`RenderLoop::step`] once per frame and keeps
/// scheduling while it returns `true`.
#[derive(Debug)]
pub struct RenderLoop {
    time: Time,
    handle: RenderLoopHandle,
    failed_frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self { time: Time::new(), handle: RenderLoopHandle::default(), failed_frames: 0 }
    }

    pub fn handle(&self) -> RenderLoopHandle {
        self.handle.clone()
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn failed_frames(&self) -> u64 {
        self.failed_frames
    }

    /// Advances control damping, renders one frame and reports whether to reschedule.
    ///
    /// A failed frame is logged and does not end the loop; only the stop handle does.
    pub fn step<R: SceneRenderer + ?Sized>(&mut self, scene: &mut SceneContext, renderer: &mut R) -> bool {
        if self.handle.is_stopped() {
            return false;
        }
        self.time.tick();
        scene.controls.update(&mut scene.camera);
        if let Err(err) = renderer.render(scene) {
            self.failed_frames += 1;
            log::warn!("frame {} failed: {err:#}", self.time.frame_count());
        }
        let frame = self.time.frame_count();
        log::trace!("frame {frame} dt={:.4}s", self.time.delta_seconds());
        if frame % STATS_INTERVAL_FRAMES == 0 {
            log::debug!("{frame} frames, {:.1} fps average", self.time.average_fps());
        }
        !self.handle.is_stopped()
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}
