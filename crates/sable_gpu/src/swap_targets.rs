//! Off-screen render targets shared by the render and present threads
//!
//! The render thread draws a frame into one slot while the main thread
//! samples another slot onto the window surface. Which slot each side may
//! touch is decided by the frame hand-off, not here.

/// Format of every swap target
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Ring of `depth` equally sized color targets
pub struct SwapTargets {
    targets: Vec<Target>,
    width: u32,
    height: u32,
    sampler: wgpu::Sampler,
}

impl SwapTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, depth: usize) -> Self {
        let max_dim = device.limits().max_texture_dimension_2d;
        let width = width.clamp(1, max_dim);
        let height = height.clamp(1, max_dim);

        let targets = (0..depth.max(1))
            .map(|i| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("Swap Target {}", i)),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: TARGET_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                Target { texture, view }
            })
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Swap Target Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        tracing::debug!("Created {} swap targets at {}x{}", depth.max(1), width, height);

        Self {
            targets,
            width,
            height,
            sampler,
        }
    }

    /// View of slot `slot`, or `None` if out of range
    pub fn view(&self, slot: usize) -> Option<&wgpu::TextureView> {
        self.targets.get(slot).map(|t| &t.view)
    }

    /// Texture of slot `slot`, for copies out of a finished frame
    pub fn texture(&self, slot: usize) -> Option<&wgpu::Texture> {
        self.targets.get(slot).map(|t| &t.texture)
    }

    pub fn depth(&self) -> usize {
        self.targets.len()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
