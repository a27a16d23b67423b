//! Blend modes

/// How a batch is composited onto the render target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source-over: `src * a + dst * (1 - a)`
    #[default]
    Normal,
    /// Additive: `src * a + dst`
    Light,
}

impl BlendMode {
    pub fn to_wgpu(self) -> wgpu::BlendState {
        let color = match self {
            BlendMode::Normal => wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            BlendMode::Light => wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        wgpu::BlendState {
            color,
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Light => "light",
        }
    }
}
