//! wgpu render device
//!
//! Executes flushed batches on the GPU. Each batch becomes one render pass
//! with one draw call into the current swap target; the first pass of a frame
//! clears the target. Pipelines are created lazily per (shader, blend) pair.

use std::borrow::Cow;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use sable_core::Color;

use crate::batch::MAX_TEXTURE_SLOTS;
use crate::blend::BlendMode;
use crate::device::{texture_byte_len, Batch, DrawSink, RenderDevice, TextureHandle, TextureId};
use crate::error::Result;
use crate::shader::{ShaderId, ShaderLibrary};
use crate::shaders::BASIC_SHADER;
use crate::swap_targets::{SwapTargets, TARGET_FORMAT};
use crate::vertex::Vertex;

/// Format of textures created from compositor pixels
pub const SOURCE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    viewport: [f32; 2],
    _padding: [f32; 2],
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct FrameEncoder {
    slot: usize,
    clear: Color,
    encoder: wgpu::CommandEncoder,
    cleared: bool,
    passes: usize,
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    let [r, g, b, a] = color.to_f32_array();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

fn create_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_string())),
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    tracing::debug!("Creating batch pipeline (blend={})", blend.label());
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("Sable Batch Pipeline ({})", blend.label())),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: Some(blend.to_wgpu()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

/// [`RenderDevice`] backed by wgpu
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    targets: Arc<SwapTargets>,

    shaders: ShaderLibrary,
    basic_module: wgpu::ShaderModule,
    modules: FxHashMap<ShaderId, wgpu::ShaderModule>,
    pipelines: FxHashMap<(ShaderId, BlendMode), wgpu::RenderPipeline>,
    pipeline_layout: wgpu::PipelineLayout,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    /// Bound to unused texture slots
    white: GpuTexture,
    textures: SlotMap<TextureId, GpuTexture>,

    frame: Option<FrameEncoder>,
}

impl WgpuDevice {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, targets: Arc<SwapTargets>) -> Self {
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sable Globals Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut texture_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS)
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: MAX_TEXTURE_SLOTS as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sable Texture Slots Layout"),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sable Batch Pipeline Layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let (width, height) = targets.size();
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sable Globals"),
            contents: bytemuck::bytes_of(&Globals {
                viewport: [width as f32, height as f32],
                _padding: [0.0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sable Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sable Texture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = Self::texture_with_data(&device, &queue, 1, 1, &[0xFF; 4], "Sable White Texture");
        let basic_module = create_module(&device, "Sable Basic Shader", BASIC_SHADER);

        Self {
            device,
            queue,
            targets,
            shaders: ShaderLibrary::new(),
            basic_module,
            modules: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            pipeline_layout,
            globals_buffer,
            globals_bind_group,
            texture_layout,
            sampler,
            white,
            textures: SlotMap::with_key(),
            frame: None,
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn targets(&self) -> &Arc<SwapTargets> {
        &self.targets
    }

    fn texture_with_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        bgra: &[u8],
        label: &str,
    ) -> GpuTexture {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SOURCE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bgra,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTexture { texture, view }
    }

    /// Pipeline key for a batch, creating the pipeline on first use
    fn ensure_pipeline(&mut self, shader: ShaderId, blend: BlendMode) -> (ShaderId, BlendMode) {
        let shader = if shader == ShaderId::BASIC || self.modules.contains_key(&shader) {
            shader
        } else {
            tracing::warn!("No module for {:?}, drawing with the basic shader", shader);
            ShaderId::BASIC
        };
        let key = (shader, blend);

        let Self {
            ref device,
            ref pipeline_layout,
            ref basic_module,
            ref modules,
            ref mut pipelines,
            ..
        } = *self;
        pipelines.entry(key).or_insert_with(|| {
            let module = modules.get(&shader).unwrap_or(basic_module);
            create_pipeline(device, pipeline_layout, module, blend)
        });
        key
    }

    fn texture_bind_group(&self, textures: &[TextureHandle]) -> wgpu::BindGroup {
        let views: Vec<&wgpu::TextureView> = (0..MAX_TEXTURE_SLOTS)
            .map(|slot| {
                textures
                    .get(slot)
                    .and_then(|handle| self.textures.get(handle.id))
                    .map_or(&self.white.view, |t| &t.view)
            })
            .collect();

        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(slot, view)| wgpu::BindGroupEntry {
                binding: slot as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: MAX_TEXTURE_SLOTS as u32,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sable Texture Slots"),
            layout: &self.texture_layout,
            entries: &entries,
        })
    }

    fn color_attachment<'a>(
        view: &'a wgpu::TextureView,
        frame: &FrameEncoder,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        let load = if frame.cleared {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(to_wgpu_color(frame.clear))
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        }
    }
}

impl DrawSink for WgpuDevice {
    fn submit(&mut self, batch: &Batch<'_>) {
        if batch.vertices.is_empty() {
            return;
        }
        let Some(mut frame) = self.frame.take() else {
            tracing::warn!("Batch submitted outside a frame, dropping it");
            return;
        };

        let key = self.ensure_pipeline(batch.shader, batch.blend);
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sable Batch Vertices"),
                contents: bytemuck::cast_slice(batch.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let texture_bind_group = self.texture_bind_group(batch.textures);

        if let (Some(pipeline), Some(view)) =
            (self.pipelines.get(&key), self.targets.view(frame.slot))
        {
            let attachment = Self::color_attachment(view, &frame);
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sable Batch Pass"),
                color_attachments: &[Some(attachment)],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            pass.set_bind_group(1, &texture_bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.draw(0..batch.vertices.len() as u32, 0..1);
            drop(pass);

            frame.cleared = true;
            frame.passes += 1;
        } else {
            tracing::warn!("Swap slot {} out of range, dropping batch", frame.slot);
        }

        self.frame = Some(frame);
    }
}

impl RenderDevice for WgpuDevice {
    fn target_size(&self) -> (u32, u32) {
        self.targets.size()
    }

    fn create_texture(&mut self, width: u32, height: u32, bgra: &[u8]) -> TextureHandle {
        let (w, h) = (width.max(1), height.max(1));
        let expected = texture_byte_len(w, h);
        let texture = if bgra.len() == expected {
            Self::texture_with_data(&self.device, &self.queue, w, h, bgra, "Sable Texture")
        } else {
            tracing::warn!(
                "Texture data is {} bytes, expected {} for {}x{}; creating a blank texture",
                bgra.len(),
                expected,
                w,
                h
            );
            Self::texture_with_data(&self.device, &self.queue, w, h, &vec![0; expected], "Sable Texture")
        };
        let id = self.textures.insert(texture);
        TextureHandle {
            id,
            width: w,
            height: h,
        }
    }

    fn update_texture(&mut self, handle: TextureHandle, bgra: &[u8]) -> bool {
        let Some(texture) = self.textures.get(handle.id) else {
            return false;
        };
        if bgra.len() != texture_byte_len(handle.width, handle.height) {
            tracing::warn!(
                "Texture update is {} bytes, expected {}x{}",
                bgra.len(),
                handle.width,
                handle.height
            );
            return false;
        }
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bgra,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(handle.width * 4),
                rows_per_image: Some(handle.height),
            },
            wgpu::Extent3d {
                width: handle.width,
                height: handle.height,
                depth_or_array_layers: 1,
            },
        );
        true
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.textures.remove(handle.id) {
            texture.texture.destroy();
        }
    }

    fn register_shader(&mut self, name: &str, wgsl: &str) -> Result<ShaderId> {
        let id = self.shaders.register(name, wgsl)?;
        let module = create_module(&self.device, name, wgsl);
        self.modules.insert(id, module);
        self.pipelines.retain(|(shader, _), _| *shader != id);
        Ok(id)
    }

    fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    fn begin_frame(&mut self, slot: usize, clear: Color) {
        if self.frame.is_some() {
            tracing::warn!("begin_frame while a frame is open; submitting it");
            self.end_frame();
        }

        #[cfg(debug_assertions)]
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let (width, height) = self.targets.size();
        self.queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals {
                viewport: [width as f32, height as f32],
                _padding: [0.0; 2],
            }),
        );

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sable Frame Encoder"),
            });
        self.frame = Some(FrameEncoder {
            slot,
            clear,
            encoder,
            cleared: false,
            passes: 0,
        });
    }

    fn end_frame(&mut self) {
        let Some(mut frame) = self.frame.take() else {
            return;
        };

        // A frame without batches still clears its target
        if !frame.cleared {
            if let Some(view) = self.targets.view(frame.slot) {
                let attachment = Self::color_attachment(view, &frame);
                let pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Sable Clear Pass"),
                    color_attachments: &[Some(attachment)],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                drop(pass);
            }
        }

        tracing::trace!("Submitting frame on slot {} ({} passes)", frame.slot, frame.passes);
        self.queue.submit(std::iter::once(frame.encoder.finish()));

        #[cfg(debug_assertions)]
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            tracing::error!("GPU validation error in frame: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::create_test_device;
    use crate::draw::{Batcher, Quad};
    use crate::error::GpuError;
    use crate::Camera;
    use sable_core::Rect;

    const SIZE: u32 = 64;

    fn read_back(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Vec<u8> {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback"),
            size: (SIZE * SIZE * 4) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(SIZE * 4),
                    rows_per_image: Some(SIZE),
                },
            },
            wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, |_| {});
        let _ = device.poll(wgpu::Maintain::Wait);
        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();
        data
    }

    #[test]
    fn renders_solid_quad_into_swap_target() {
        pollster::block_on(async {
            let Some((device, queue)) = create_test_device().await else {
                // Skip test if no GPU available
                return;
            };
            let device = Arc::new(device);
            let queue = Arc::new(queue);
            let targets = Arc::new(SwapTargets::new(&device, SIZE, SIZE, 2));
            let mut gpu = WgpuDevice::new(device.clone(), queue.clone(), targets.clone());
            let mut batcher = Batcher::default();

            gpu.begin_frame(1, Color::BLACK);
            batcher.start_frame(Camera::default());
            batcher.draw_quad(
                &Quad::solid(Rect::new(0.0, 0.0, 32.0, 64.0), Color::RED),
                &mut gpu,
            );
            batcher.finish_frame(&mut gpu);
            gpu.end_frame();

            let Some(texture) = targets.texture(1) else {
                panic!("slot 1 missing");
            };
            let pixels = read_back(&device, &queue, texture);
            let px = |x: u32, y: u32| {
                let i = ((y * SIZE + x) * 4) as usize;
                [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
            };
            // BGRA
            assert_eq!(px(4, 10), [0, 0, 255, 255]);
            assert_eq!(px(60, 10), [0, 0, 0, 255]);
        });
    }

    #[test]
    fn textures_can_be_updated_and_destroyed() {
        pollster::block_on(async {
            let Some((device, queue)) = create_test_device().await else {
                return;
            };
            let device = Arc::new(device);
            let targets = Arc::new(SwapTargets::new(&device, SIZE, SIZE, 2));
            let mut gpu = WgpuDevice::new(device, Arc::new(queue), targets);

            let handle = gpu.create_texture(2, 2, &[0x80; 16]);
            assert!(gpu.update_texture(handle, &[0xFF; 16]));
            assert!(!gpu.update_texture(handle, &[0xFF; 4]));
            gpu.destroy_texture(handle);
            assert!(!gpu.update_texture(handle, &[0xFF; 16]));
        });
    }

    #[test]
    fn invalid_shader_is_rejected_before_the_device() {
        pollster::block_on(async {
            let Some((device, queue)) = create_test_device().await else {
                return;
            };
            let device = Arc::new(device);
            let targets = Arc::new(SwapTargets::new(&device, SIZE, SIZE, 2));
            let mut gpu = WgpuDevice::new(device, Arc::new(queue), targets);
            assert!(matches!(
                gpu.register_shader("bad", "not wgsl"),
                Err(GpuError::Shader(_))
            ));
            assert_eq!(gpu.shaders().len(), 1);
        });
    }
}
