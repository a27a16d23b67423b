//! GPU context acquisition
//!
//! Creates the wgpu instance, adapter, device and queue, optionally bound to
//! a window surface. The device and queue are shared (`Arc`) between the
//! render thread and the presenting thread.

use std::sync::Arc;

use crate::error::{GpuError, Result};

pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Preferred backend for the current platform
    ///
    /// Using the primary backend instead of all backends avoids initializing
    /// several GPU driver stacks.
    pub fn preferred_backends() -> wgpu::Backends {
        #[cfg(target_os = "macos")]
        {
            wgpu::Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            wgpu::Backends::DX12
        }
        #[cfg(target_os = "linux")]
        {
            wgpu::Backends::VULKAN
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            wgpu::Backends::PRIMARY
        }
    }

    fn instance() -> wgpu::Instance {
        wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        })
    }

    /// Context without a surface, for off-screen rendering
    pub async fn headless() -> Result<Self> {
        Self::create(Self::instance(), None).await
    }

    /// Context plus a surface for `window`
    pub async fn with_surface<W>(window: Arc<W>) -> Result<(Self, wgpu::Surface<'static>)>
    where
        W: raw_window_handle::HasWindowHandle
            + raw_window_handle::HasDisplayHandle
            + Send
            + Sync
            + 'static,
    {
        let instance = Self::instance();
        let surface = instance.create_surface(window)?;
        let context = Self::create(instance, Some(&surface)).await?;
        Ok((context, surface))
    }

    async fn create(instance: wgpu::Instance, surface: Option<&wgpu::Surface<'_>>) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::AdapterNotFound)?;

        let info = adapter.get_info();
        tracing::info!("Using GPU adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Sable GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        #[cfg(debug_assertions)]
        device.on_uncaptured_error(Box::new(|error| {
            tracing::error!("wgpu validation error: {}", error);
        }));

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Texture format for `surface`, preferring a non-sRGB one
    ///
    /// Compositor pixels are already display-encoded, so an sRGB surface
    /// would apply gamma twice.
    pub fn surface_format(&self, surface: &wgpu::Surface<'_>) -> wgpu::TextureFormat {
        let caps = surface.get_capabilities(&self.adapter);
        tracing::debug!("Surface capabilities - formats: {:?}", caps.formats);
        caps.formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8Unorm)
    }
}
