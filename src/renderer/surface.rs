use super::GpuContext;
use anyhow::anyhow;
use wgpu::{Surface, SurfaceConfiguration, TextureFormat};

pub struct RenderSurface {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
}

impl RenderSurface {
    pub fn new(
        gpu: &GpuContext,
        surface: Surface<'static>,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> crate::Result<Self> {
        let surface_caps = surface.get_capabilities(&gpu.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let present_mode = surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if config.width != 0 && config.height != 0 {
            surface.configure(&gpu.device, &config);
        }
        log::debug!("surface format {surface_format:?}, {present_mode:?}");
        Ok(Self { surface, config })
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        winit::dpi::PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn format(&self) -> TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, gpu: &GpuContext, new_size: winit::dpi::PhysicalSize<u32>) {
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        if new_size.width != 0 && new_size.height != 0 {
            self.surface.configure(&gpu.device, &self.config);
        }
    }

    /// Reapply the current configuration after the surface was lost.
    pub fn reconfigure(&self, gpu: &GpuContext) {
        self.surface.configure(&gpu.device, &self.config);
    }

    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}
