pub mod gpu;
pub mod raster;
pub mod surface;
pub mod text;

use std::sync::Arc;

use anyhow::Context as _;
use tiny_skia::Pixmap;
use wgpu::TextureFormat;

use crate::{op::Color, op::Ops, windowing::events::HitArea};

pub use gpu::GpuContext;
pub use raster::{Frame, Rasterizer};
pub use surface::RenderSurface;

/// What the event loop needs to know about a presented frame.
#[derive(Debug, Default)]
pub struct FrameOutput {
    pub hit_areas: Vec<HitArea>,
    pub invalidate: bool,
}

struct FrameTexture {
    texture: wgpu::Texture,
    bind: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// Rasterizes op lists on the CPU and presents the result through a
/// full-screen textured triangle.
pub struct Renderer {
    gpu: GpuContext,
    surface: RenderSurface,
    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    texture_format: TextureFormat,
    frame_tex: Option<FrameTexture>,
    raster: Rasterizer,
    background: Color,
}

impl Renderer {
    pub async fn new(window: Arc<winit::window::Window>, background: Color) -> crate::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let size = window.inner_size();
        let surface = instance
            .create_surface(window)
            .context("failed to create window surface")?;
        let gpu = GpuContext::new(instance, &surface).await?;
        let surface = RenderSurface::new(&gpu, surface, size)?;

        // The rasterizer writes sRGB-encoded bytes; let the texture decode
        // them when the surface re-encodes on write.
        let texture_format = if surface.format().is_srgb() {
            TextureFormat::Rgba8UnormSrgb
        } else {
            TextureFormat::Rgba8Unorm
        };

        let bind_layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("frame layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("frame sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let module = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("blit.wgsl"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
            });

        let pipe_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pipeline-layout"),
                bind_group_layouts: &[&bind_layout],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("blit"),
                layout: Some(&pipe_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: "vs_main",
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface.format(),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Ok(Self {
            gpu,
            surface,
            pipeline,
            bind_layout,
            sampler,
            texture_format,
            frame_tex: None,
            raster: Rasterizer::new(),
            background,
        })
    }

    pub fn resize(&mut self, new: winit::dpi::PhysicalSize<u32>) {
        log::debug!("resize to {}x{}", new.width, new.height);
        self.surface.resize(&self.gpu, new);
    }

    /// Rasterize `ops`, upload the pixels and present them.
    pub fn render(&mut self, ops: &Ops, scale: f32) -> crate::Result<FrameOutput> {
        let size = self.surface.size();
        if size.width == 0 || size.height == 0 {
            return Ok(FrameOutput::default());
        }

        let frame = self
            .raster
            .rasterize(ops, size.width, size.height, scale, self.background)?;
        let mut out = FrameOutput {
            hit_areas: frame.hit_areas,
            invalidate: frame.invalidate,
        };
        self.upload(&frame.pixmap);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("surface {e}, reconfiguring");
                self.surface.reconfigure(&self.gpu);
                out.invalidate = true;
                return Ok(out);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout, skipping frame");
                out.invalidate = true;
                return Ok(out);
            }
            Err(e) => return Err(e.into()),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut enc = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rp = enc.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(tex) = &self.frame_tex {
                rp.set_pipeline(&self.pipeline);
                rp.set_bind_group(0, &tex.bind, &[]);
                rp.draw(0..3, 0..1);
            }
        }
        self.gpu.queue.submit(std::iter::once(enc.finish()));
        output.present();
        Ok(out)
    }

    fn upload(&mut self, pixmap: &Pixmap) {
        let (width, height) = (pixmap.width(), pixmap.height());
        let stale = self
            .frame_tex
            .as_ref()
            .is_none_or(|t| t.width != width || t.height != height);
        if stale {
            self.frame_tex = Some(self.create_frame_texture(width, height));
        }
        let Some(tex) = &self.frame_tex else {
            return;
        };

        self.gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixmap.data(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_frame_texture(&self, width: u32, height: u32) -> FrameTexture {
        let texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.texture_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind = self
            .gpu
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("frame bind"),
                layout: &self.bind_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

        FrameTexture {
            texture,
            bind,
            width,
            height,
        }
    }
}
