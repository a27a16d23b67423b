//! Per-frame drawing context
//!
//! The frame callback receives a [`FrameContext`] on the render thread. It
//! wraps the device and batcher for the frame being produced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sable_gpu::{Batcher, Camera, Line, Quad, RenderDevice, ShaderId, TextureHandle};
use sable_paint::PixelBuffer;

use crate::clock::FrameClock;

pub struct FrameContext<'a, D: RenderDevice> {
    pub(crate) device: &'a mut D,
    pub(crate) batcher: &'a mut Batcher,
    pub(crate) clock: &'a FrameClock,
    pub(crate) frame_number: u64,
    pub(crate) scale_factor: f64,
    pub(crate) terminate: &'a AtomicBool,
}

impl<'a, D: RenderDevice> FrameContext<'a, D> {
    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    pub fn draw_quad(&mut self, quad: &Quad) -> bool {
        self.batcher.draw_quad(quad, &mut *self.device)
    }

    pub fn draw_line(&mut self, line: &Line) -> bool {
        self.batcher.draw_line(line, &mut *self.device)
    }

    /// Submit buffered vertices now
    pub fn flush(&mut self) -> bool {
        self.batcher.flush(&mut *self.device)
    }

    pub fn camera(&self) -> Camera {
        self.batcher.camera()
    }

    /// Camera for subsequent draws; persists into later frames
    pub fn set_camera(&mut self, camera: Camera) {
        self.batcher.set_camera(camera);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resources
    // ─────────────────────────────────────────────────────────────────────────

    pub fn upload(&mut self, buffer: &PixelBuffer) -> TextureHandle {
        self.device.upload(buffer)
    }

    pub fn create_texture(&mut self, width: u32, height: u32, bgra: &[u8]) -> TextureHandle {
        self.device.create_texture(width, height, bgra)
    }

    pub fn update_texture(&mut self, handle: TextureHandle, bgra: &[u8]) -> bool {
        self.device.update_texture(handle, bgra)
    }

    /// Destroy a texture, flushing first so pending vertices can still use it
    pub fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.batcher.buffer().textures().contains(&handle) {
            self.batcher.flush(&mut *self.device);
        }
        self.device.destroy_texture(handle);
    }

    pub fn register_shader(&mut self, name: &str, wgsl: &str) -> sable_gpu::Result<ShaderId> {
        self.device.register_shader(name, wgsl)
    }

    /// Id of a registered shader; unknown names fall back to the basic shader
    pub fn shader(&self, name: &str) -> ShaderId {
        self.device.shaders().lookup(name)
    }

    pub fn device(&mut self) -> &mut D {
        &mut *self.device
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Timing
    // ─────────────────────────────────────────────────────────────────────────

    /// Zero-based index of the frame being produced
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Interval between the previous two frame starts
    pub fn last_frame_time(&self) -> Duration {
        self.clock.last_frame_time()
    }

    pub fn approx_framerate(&self) -> f32 {
        self.clock.approx_framerate()
    }

    /// Target size in physical pixels
    pub fn target_size(&self) -> (u32, u32) {
        self.device.target_size()
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Stop the render loop after this frame; the frame is not published
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }
}
