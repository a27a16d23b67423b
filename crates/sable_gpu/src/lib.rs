//! Sable GPU
//!
//! Batching layer and wgpu backend.
//!
//! Draw requests ([`Quad`], [`Line`]) go through a [`Batcher`] into a bounded
//! [`DrawBuffer`]. Vertices that share blend mode, shader and texture slots
//! are submitted together as one [`Batch`] to a [`RenderDevice`]:
//!
//! - [`WgpuDevice`] renders batches into off-screen [`SwapTargets`], which a
//!   [`Presenter`] copies to the window surface
//! - [`RecordingDevice`] keeps every batch in memory for headless use

pub mod batch;
pub mod blend;
pub mod camera;
pub mod context;
pub mod device;
pub mod draw;
pub mod error;
pub mod present;
pub mod recording;
pub mod shader;
pub mod shaders;
pub mod swap_targets;
pub mod vertex;
pub mod wgpu_device;

pub use batch::{DrawBuffer, DEFAULT_MAX_VERTICES, MAX_TEXTURE_SLOTS};
pub use blend::BlendMode;
pub use camera::Camera;
pub use context::GpuContext;
pub use device::{Batch, DrawSink, RenderDevice, TextureHandle, TextureId};
pub use draw::{Batcher, Line, Quad};
pub use error::{GpuError, Result};
pub use present::Presenter;
pub use recording::{RecordedBatch, RecordedFrame, RecordingDevice, RecordingLog};
pub use shader::{validate_wgsl, ShaderId, ShaderLibrary, BASIC_SHADER_NAME};
pub use swap_targets::{SwapTargets, TARGET_FORMAT};
pub use vertex::{ShaderParams, Vertex, NO_PARAMS, NO_TEXTURE, VERTICES_PER_QUAD};
pub use wgpu_device::WgpuDevice;
