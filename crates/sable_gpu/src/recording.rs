//! Headless render device
//!
//! [`RecordingDevice`] implements [`RenderDevice`] without a GPU. Frames,
//! batches and textures are written to a shared [`RecordingLog`] that tests
//! can inspect from another thread while the device lives on the render
//! thread. Long runs should cap the retained frames with
//! [`RecordingDevice::with_frame_limit`] or drain them periodically.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use slotmap::SlotMap;

use sable_core::Color;

use crate::blend::BlendMode;
use crate::device::{texture_byte_len, Batch, DrawSink, RenderDevice, TextureHandle, TextureId};
use crate::error::Result;
use crate::shader::{ShaderId, ShaderLibrary};
use crate::vertex::Vertex;

/// Owned copy of a submitted batch
#[derive(Clone, Debug)]
pub struct RecordedBatch {
    pub vertices: Vec<Vertex>,
    pub textures: Vec<TextureHandle>,
    pub blend: BlendMode,
    pub shader: ShaderId,
}

/// One `begin_frame`..`end_frame` span
#[derive(Clone, Debug)]
pub struct RecordedFrame {
    pub slot: usize,
    pub clear: Color,
    pub batches: Vec<RecordedBatch>,
}

#[derive(Default)]
struct Recording {
    frames: VecDeque<RecordedFrame>,
    frame_limit: Option<usize>,
    completed: usize,
    batches: usize,
    current: Option<RecordedFrame>,
    stray_batches: usize,
    textures: SlotMap<TextureId, Vec<u8>>,
}

/// Shared view of everything a [`RecordingDevice`] saw
#[derive(Clone, Default)]
pub struct RecordingLog(Arc<Mutex<Recording>>);

impl RecordingLog {
    /// Retained frames, oldest first
    pub fn frames(&self) -> Vec<RecordedFrame> {
        self.0.lock().frames.iter().cloned().collect()
    }

    /// Take the retained frames, oldest first
    pub fn drain_frames(&self) -> Vec<RecordedFrame> {
        self.0.lock().frames.drain(..).collect()
    }

    /// Frames completed so far, including dropped and drained ones
    pub fn frame_count(&self) -> usize {
        self.0.lock().completed
    }

    /// Batches submitted inside completed frames
    pub fn batch_count(&self) -> usize {
        self.0.lock().batches
    }

    /// True while a frame has begun but not ended
    pub fn frame_in_progress(&self) -> bool {
        self.0.lock().current.is_some()
    }

    /// Batches submitted outside any frame
    pub fn stray_batches(&self) -> usize {
        self.0.lock().stray_batches
    }

    pub fn live_textures(&self) -> usize {
        self.0.lock().textures.len()
    }

    /// Current bytes of a texture
    pub fn texture_data(&self, handle: TextureHandle) -> Option<Vec<u8>> {
        self.0.lock().textures.get(handle.id).cloned()
    }
}

pub struct RecordingDevice {
    size: (u32, u32),
    log: RecordingLog,
    shaders: ShaderLibrary,
    frame_delay: Option<Duration>,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            log: RecordingLog::default(),
            shaders: ShaderLibrary::new(),
            frame_delay: None,
        }
    }

    /// Keep only the newest `limit` frames in the log
    pub fn with_frame_limit(self, limit: usize) -> Self {
        self.log.0.lock().frame_limit = Some(limit);
        self
    }

    /// Sleep in every `end_frame`, simulating a slow GPU
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = Some(delay);
        self
    }

    pub fn log(&self) -> RecordingLog {
        self.log.clone()
    }
}

impl DrawSink for RecordingDevice {
    fn submit(&mut self, batch: &Batch<'_>) {
        let recorded = RecordedBatch {
            vertices: batch.vertices.to_vec(),
            textures: batch.textures.to_vec(),
            blend: batch.blend,
            shader: batch.shader,
        };
        let mut log = self.log.0.lock();
        match log.current.as_mut() {
            Some(frame) => frame.batches.push(recorded),
            None => {
                tracing::warn!("Batch submitted outside a frame");
                log.stray_batches += 1;
            }
        }
    }
}

impl RenderDevice for RecordingDevice {
    fn target_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_texture(&mut self, width: u32, height: u32, bgra: &[u8]) -> TextureHandle {
        let expected = texture_byte_len(width, height);
        let data = if bgra.len() == expected {
            bgra.to_vec()
        } else {
            tracing::warn!(
                "Texture data is {} bytes, expected {} for {}x{}",
                bgra.len(),
                expected,
                width,
                height
            );
            vec![0; expected]
        };
        let id = self.log.0.lock().textures.insert(data);
        TextureHandle { id, width, height }
    }

    fn update_texture(&mut self, handle: TextureHandle, bgra: &[u8]) -> bool {
        if bgra.len() != texture_byte_len(handle.width, handle.height) {
            return false;
        }
        match self.log.0.lock().textures.get_mut(handle.id) {
            Some(data) => {
                data.copy_from_slice(bgra);
                true
            }
            None => false,
        }
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.log.0.lock().textures.remove(handle.id);
    }

    fn register_shader(&mut self, name: &str, wgsl: &str) -> Result<ShaderId> {
        self.shaders.register(name, wgsl)
    }

    fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    fn begin_frame(&mut self, slot: usize, clear: Color) {
        let mut log = self.log.0.lock();
        if log.current.is_some() {
            tracing::warn!("begin_frame while a frame is open; dropping it");
        }
        log.current = Some(RecordedFrame {
            slot,
            clear,
            batches: Vec::new(),
        });
    }

    fn end_frame(&mut self) {
        if let Some(delay) = self.frame_delay {
            std::thread::sleep(delay);
        }
        let mut log = self.log.0.lock();
        if let Some(frame) = log.current.take() {
            log.completed += 1;
            log.batches += frame.batches.len();
            log.frames.push_back(frame);
            if let Some(limit) = log.frame_limit {
                while log.frames.len() > limit {
                    log.frames.pop_front();
                }
            }
        }
    }
}
