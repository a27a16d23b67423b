//! Frame driver
//!
//! Owns the render thread and the state machine around it:
//!
//! ```text
//! Uninitialized --attach_context--> ContextReady --start--> Running
//!        \______________________________\_________________\--terminate--> Terminating
//! ```
//!
//! The render thread owns the [`RenderDevice`] and a [`Batcher`]. Each
//! iteration it waits for a free swap slot, paces to the target rate, runs
//! the frame callback, submits the frame and publishes the slot through the
//! [`FrameHandoff`]. The main thread presents the newest published slot with
//! [`FrameDriver::present_latest`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sable_core::{Color, EventSink, InputEvent};
use sable_gpu::{Batcher, DrawBuffer, RenderDevice};

use crate::clock::FrameClock;
use crate::config::{BatchConfig, DriverConfig};
use crate::context::FrameContext;
use crate::error::{AppError, Result};
use crate::handoff::{CompletedFrame, FrameHandoff};

/// Longest single sleep while pacing, so termination stays responsive
const PACING_SLICE: Duration = Duration::from_millis(5);

pub const RENDER_THREAD_NAME: &str = "sable-render";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    ContextReady,
    Running,
    Terminating,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Uninitialized => "uninitialized",
            DriverState::ContextReady => "context-ready",
            DriverState::Running => "running",
            DriverState::Terminating => "terminating",
        };
        f.write_str(name)
    }
}

/// Reported after every published frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    pub sequence: u64,
    pub slot: usize,
    /// Time from frame start to submission
    pub duration: Duration,
}

type CompletionCallback = Box<dyn FnMut(FrameStats) + Send>;

/// State shared with the render thread
struct Shared {
    handoff: FrameHandoff,
    terminate: AtomicBool,
    target_fps: AtomicU32,
    /// `f64` bits of the window scale factor
    scale_factor: AtomicU64,
}

impl Shared {
    fn scale_factor(&self) -> f64 {
        f64::from_bits(self.scale_factor.load(Ordering::Relaxed))
    }
}

pub struct FrameDriver<D: RenderDevice> {
    config: DriverConfig,
    state: DriverState,
    shared: Arc<Shared>,
    device: Option<D>,
    on_complete: Option<CompletionCallback>,
    event_sink: Option<Box<dyn EventSink>>,
    render_thread: Option<JoinHandle<()>>,
}

impl<D: RenderDevice> FrameDriver<D> {
    pub fn new(config: DriverConfig) -> Self {
        let config = config.normalized();
        let shared = Arc::new(Shared {
            handoff: FrameHandoff::new(config.frame.swap_chain_depth),
            terminate: AtomicBool::new(false),
            target_fps: AtomicU32::new(config.frame.target_fps),
            scale_factor: AtomicU64::new(1.0f64.to_bits()),
        });
        Self {
            config,
            state: DriverState::Uninitialized,
            shared,
            device: None,
            on_complete: None,
            event_sink: None,
            render_thread: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn scale_factor(&self) -> f64 {
        self.shared.scale_factor()
    }

    fn expect_state(&self, expected: DriverState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AppError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, next: DriverState) {
        tracing::info!("Frame driver: {} -> {}", self.state, next);
        self.state = next;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Hand over the render device created on the main thread
    pub fn attach_context(&mut self, device: D, scale_factor: f64) -> Result<()> {
        self.expect_state(DriverState::Uninitialized, "attach a context")?;
        let (width, height) = device.target_size();
        tracing::info!(
            "Attached render device: {}x{} @ {:.2}x",
            width,
            height,
            scale_factor
        );
        self.device = Some(device);
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            tracing::warn!("Ignoring invalid scale factor {}", scale_factor);
        }
        self.set_scale_factor(scale_factor);
        self.transition(DriverState::ContextReady);
        Ok(())
    }

    /// Spawn the render thread; `frame_callback` runs once per frame on it
    pub fn start<F>(&mut self, frame_callback: F) -> Result<()>
    where
        F: FnMut(&mut FrameContext<'_, D>) + Send + 'static,
    {
        self.expect_state(DriverState::ContextReady, "start")?;
        let Some(device) = self.device.take() else {
            return Err(AppError::InvalidState {
                operation: "start without a device",
                state: self.state,
            });
        };

        let worker = RenderWorker {
            device,
            callback: frame_callback,
            on_complete: self.on_complete.take(),
            shared: Arc::clone(&self.shared),
            batch: self.config.batch.clone(),
            clear: self.config.frame.clear_color,
        };

        let handle = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || worker.run())
            .map_err(|e| {
                self.state = DriverState::Uninitialized;
                AppError::ThreadSpawn(e.to_string())
            })?;

        self.render_thread = Some(handle);
        self.transition(DriverState::Running);
        Ok(())
    }

    /// Stop and join the render thread
    ///
    /// Safe to call in any state and more than once.
    pub fn terminate(&mut self) {
        if self.state == DriverState::Terminating {
            return;
        }
        self.transition(DriverState::Terminating);
        self.shared.terminate.store(true, Ordering::Release);
        self.shared.handoff.wake();

        if let Some(handle) = self.render_thread.take() {
            if handle.join().is_err() {
                tracing::error!("Render thread panicked");
            }
        }
        self.device = None;
    }

    /// True once termination was requested from either thread
    pub fn is_terminate_requested(&self) -> bool {
        self.shared.terminate.load(Ordering::Acquire)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Presentation
    // ─────────────────────────────────────────────────────────────────────────

    /// Present the newest completed frame
    ///
    /// `present` runs outside the hand-off lock while the frame's slot is
    /// reserved. Returns the presented sequence, or `None` if no frame is
    /// available.
    pub fn present_latest(&self, present: impl FnOnce(CompletedFrame)) -> Option<u64> {
        let frame = self.shared.handoff.acquire_latest()?;
        present(frame);
        self.shared.handoff.release(frame.slot);
        Some(frame.sequence)
    }

    /// Sequence of the newest completed frame
    pub fn latest_sequence(&self) -> Option<u64> {
        self.shared.handoff.latest_sequence()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Callbacks, events and runtime settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Callback run on the render thread after each published frame
    ///
    /// Must be set before [`start`](Self::start).
    pub fn on_frame_complete<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(FrameStats) + Send + 'static,
    {
        match self.state {
            DriverState::Uninitialized | DriverState::ContextReady => {
                self.on_complete = Some(Box::new(callback));
                Ok(())
            }
            state => Err(AppError::InvalidState {
                operation: "set the frame completion callback",
                state,
            }),
        }
    }

    pub fn set_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.event_sink = Some(Box::new(sink));
    }

    /// Forward an input event to the event sink, if any
    pub fn dispatch_event(&mut self, event: &InputEvent) {
        if let Some(sink) = self.event_sink.as_mut() {
            sink.handle(event);
        }
    }

    /// Change the frame rate; takes effect on the next frame
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.config.frame.target_fps = target_fps;
        self.shared.target_fps.store(target_fps, Ordering::Relaxed);
    }

    pub fn target_fps(&self) -> u32 {
        self.shared.target_fps.load(Ordering::Relaxed)
    }

    /// Change the scale factor the frame callback sees; takes effect on the
    /// next frame. Non-finite or non-positive values are ignored.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.shared
                .scale_factor
                .store(scale_factor.to_bits(), Ordering::Relaxed);
        }
    }
}

impl<D: RenderDevice> Drop for FrameDriver<D> {
    fn drop(&mut self) {
        self.terminate();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Render thread
// ─────────────────────────────────────────────────────────────────────────────

struct RenderWorker<D, F> {
    device: D,
    callback: F,
    on_complete: Option<CompletionCallback>,
    shared: Arc<Shared>,
    batch: BatchConfig,
    clear: Color,
}

impl<D, F> RenderWorker<D, F>
where
    D: RenderDevice,
    F: FnMut(&mut FrameContext<'_, D>),
{
    fn terminating(&self) -> bool {
        self.shared.terminate.load(Ordering::Acquire)
    }

    /// Sleep until the clock allows a frame; false if terminated meanwhile
    fn pace(&self, clock: &mut FrameClock) -> bool {
        let target_fps = self.shared.target_fps.load(Ordering::Relaxed);
        if target_fps != clock.target_fps() {
            tracing::debug!("Target fps {} -> {}", clock.target_fps(), target_fps);
            clock.set_target_fps(target_fps);
        }
        while !clock.frame_render_required() {
            if self.terminating() {
                return false;
            }
            thread::sleep(clock.time_until_next_frame().min(PACING_SLICE));
        }
        !self.terminating()
    }

    fn run(mut self) {
        tracing::info!("Render thread started");
        let mut batcher = Batcher::new(DrawBuffer::new(
            self.batch.max_vertices,
            self.batch.texture_slots,
        ));
        let mut clock = FrameClock::new(self.shared.target_fps.load(Ordering::Relaxed));
        let mut frame_number = 0u64;

        while !self.terminating() {
            let Some(slot) = self.shared.handoff.acquire_write(&self.shared.terminate) else {
                break;
            };
            if !self.pace(&mut clock) {
                self.shared.handoff.abandon(slot);
                break;
            }

            clock.start_frame();
            self.device.begin_frame(slot, self.clear);
            batcher.start_frame(batcher.camera());
            {
                let mut ctx = FrameContext {
                    device: &mut self.device,
                    batcher: &mut batcher,
                    clock: &clock,
                    frame_number,
                    scale_factor: self.shared.scale_factor(),
                    terminate: &self.shared.terminate,
                };
                (self.callback)(&mut ctx);
            }
            batcher.finish_frame(&mut self.device);
            self.device.end_frame();
            let duration = clock.end_frame();

            if self.terminating() {
                self.shared.handoff.abandon(slot);
                break;
            }

            let sequence = self.shared.handoff.publish(slot);
            frame_number += 1;
            if let Some(on_complete) = self.on_complete.as_mut() {
                on_complete(FrameStats {
                    sequence,
                    slot,
                    duration,
                });
            }
        }

        tracing::info!("Render thread stopped after {} frames", frame_number);
    }
}
