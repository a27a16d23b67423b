//! Device seam between the batcher and a GPU backend
//!
//! [`DrawSink`] receives flushed batches; [`RenderDevice`] adds the texture,
//! shader and frame operations a render thread needs. [`crate::WgpuDevice`]
//! is the real backend and [`crate::RecordingDevice`] is a headless one.

use sable_core::Color;
use sable_paint::PixelBuffer;

use crate::blend::BlendMode;
use crate::error::Result;
use crate::shader::{ShaderId, ShaderLibrary};
use crate::vertex::Vertex;

slotmap::new_key_type! {
    /// Opaque key of a device texture
    pub struct TextureId;
}

/// A texture owned by a device, with its pixel size
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureHandle {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One draw call worth of vertices and state
#[derive(Clone, Copy, Debug)]
pub struct Batch<'a> {
    pub vertices: &'a [Vertex],
    /// Texture bound to slot `i` is `textures[i]`
    pub textures: &'a [TextureHandle],
    pub blend: BlendMode,
    pub shader: ShaderId,
}

/// Receiver of flushed batches
pub trait DrawSink {
    fn submit(&mut self, batch: &Batch<'_>);
}

/// Everything the render thread does with a GPU
///
/// Texture data is packed `0xAARRGGBB`, i.e. BGRA bytes on little-endian
/// hosts, `width * height * 4` bytes long.
pub trait RenderDevice: DrawSink + Send + 'static {
    /// Size of the off-screen render targets in pixels
    fn target_size(&self) -> (u32, u32);

    fn create_texture(&mut self, width: u32, height: u32, bgra: &[u8]) -> TextureHandle;

    /// Upload a compositor buffer as a new texture
    fn upload(&mut self, buffer: &PixelBuffer) -> TextureHandle {
        let (width, height) = buffer.size();
        self.create_texture(width, height, buffer.as_bytes())
    }

    /// Replace the contents of an existing texture; false if the handle is stale
    /// or the data has the wrong length
    fn update_texture(&mut self, handle: TextureHandle, bgra: &[u8]) -> bool;

    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Validate and register a named WGSL shader
    fn register_shader(&mut self, name: &str, wgsl: &str) -> Result<ShaderId>;

    fn shaders(&self) -> &ShaderLibrary;

    /// Start recording into swap slot `slot`, cleared to `clear`
    fn begin_frame(&mut self, slot: usize, clear: Color);

    /// Finish and submit the current frame
    fn end_frame(&mut self);
}

/// Expected byte length of a `width x height` texture
pub(crate) fn texture_byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}
