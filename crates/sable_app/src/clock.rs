//! Frame pacing

use std::time::{Duration, Instant};

/// Paces frame production to a target rate and measures frame timing
#[derive(Debug, Clone)]
pub struct FrameClock {
    target_fps: u32,
    target_frame_time: Duration,
    /// Interval between the two most recent frame starts
    last_frame_time: Duration,
    /// Start of the current (or most recent) frame
    frame_start: Option<Instant>,
}

impl FrameClock {
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps,
            target_frame_time: frame_time_for(target_fps),
            last_frame_time: Duration::ZERO,
            frame_start: None,
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn target_frame_time(&self) -> Duration {
        self.target_frame_time
    }

    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.target_fps = target_fps;
        self.target_frame_time = frame_time_for(target_fps);
    }

    /// True on the first frame, when unthrottled, or once a full target
    /// frame time has passed since the last frame started
    pub fn frame_render_required(&self) -> bool {
        match self.frame_start {
            None => true,
            Some(_) if self.target_fps == 0 => true,
            Some(start) => start.elapsed() >= self.target_frame_time,
        }
    }

    pub fn time_until_next_frame(&self) -> Duration {
        match self.frame_start {
            Some(start) if self.target_fps > 0 => {
                self.target_frame_time.saturating_sub(start.elapsed())
            }
            _ => Duration::ZERO,
        }
    }

    pub fn start_frame(&mut self) {
        let now = Instant::now();
        if let Some(previous) = self.frame_start {
            self.last_frame_time = now.duration_since(previous);
        }
        self.frame_start = Some(now);
    }

    /// Time spent since [`start_frame`](Self::start_frame)
    pub fn end_frame(&self) -> Duration {
        self.frame_start
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }

    /// Frames per second estimated from the last frame interval
    pub fn approx_framerate(&self) -> f32 {
        let secs = self.last_frame_time.as_secs_f32();
        if secs > 0.0 {
            1.0 / secs
        } else {
            0.0
        }
    }

    /// Forget the previous frame so the next one renders immediately
    pub fn resync(&mut self) {
        self.frame_start = None;
        self.last_frame_time = Duration::ZERO;
    }
}

fn frame_time_for(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::ZERO
    } else {
        Duration::from_nanos(1_000_000_000 / u64::from(target_fps))
    }
}
