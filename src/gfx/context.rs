use std::path::Path;
use std::sync::Arc;

use winit::window::Window;

use super::texture::{PendingTexture, TextureLoader};
use super::{Graphics, RenderContext, Viewport};
use crate::error::ContextError;
use crate::scene::CubeSea;
use crate::stats::GpuStats;
use crate::surface::SurfaceSize;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Creates rendering contexts on the window's surface.
pub struct WgpuGraphics {
    window: Arc<Window>,
    instance: wgpu::Instance,
}

impl WgpuGraphics {
    pub fn new(window: Arc<Window>) -> Self {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        Self { window, instance }
    }
}

impl Graphics for WgpuGraphics {
    type Context = WgpuContext;
    type Stats = GpuStats;
    type Scene = CubeSea;
    type Texture = PendingTexture;

    fn create_context(&mut self, size: SurfaceSize, clear_color: [f64; 4]) -> Result<WgpuContext, ContextError> {
        let surface = self
            .instance
            .create_surface(self.window.clone())
            .map_err(|e| ContextError::Unavailable(e.to_string()))?;

        let adapter = pollster::block_on(self.instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| ContextError::Unavailable("no compatible adapter".to_string()))?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| ContextError::Unavailable(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ContextError::Unavailable("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        log::debug!("Selected surface format: {:?}", format);

        let window_size = self.window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: window_size.width.max(1),
            height: window_size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(WgpuContext::new(
            self.window.clone(),
            Arc::new(device),
            Arc::new(queue),
            surface,
            config,
            size,
            clear_color,
        ))
    }

    fn load_texture(&mut self, _ctx: &WgpuContext, path: &Path) -> PendingTexture {
        TextureLoader::load_texture(path)
    }

    fn create_scene(&mut self, ctx: &WgpuContext, texture: PendingTexture, grid_size: u32) -> CubeSea {
        CubeSea::new(ctx, texture, grid_size)
    }

    fn create_stats(&mut self, ctx: &WgpuContext, perf_monitor: bool) -> GpuStats {
        GpuStats::new(ctx, perf_monitor)
    }
}

/// Offscreen color and depth targets at the drawing-buffer size.
struct Targets {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
}

struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    encoder: wgpu::CommandEncoder,
}

/// A wgpu device rendering into an offscreen drawing buffer that is scaled
/// onto the window on present, so the buffer size can differ from the
/// window size while presenting to a headset.
pub struct WgpuContext {
    window: Arc<Window>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: SurfaceSize,
    clear_color: wgpu::Color,
    viewport: Viewport,
    blit_pipeline: wgpu::RenderPipeline,
    blit_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    targets: Targets,
    frame: Option<Frame>,
    frame_index: u64,
}

impl WgpuContext {
    fn new(
        window: Arc<Window>,
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        size: SurfaceSize,
        clear_color: [f64; 4],
    ) -> Self {
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
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

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/blit.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&blit_layout],
            push_constant_ranges: &[],
        });

        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let targets = create_targets(&device, config.format, size, &blit_layout, &blit_sampler);

        Self {
            window,
            device,
            queue,
            surface,
            config,
            size,
            clear_color: wgpu::Color {
                r: clear_color[0],
                g: clear_color[1],
                b: clear_color[2],
                a: clear_color[3],
            },
            viewport: Viewport::full(size),
            blit_pipeline,
            blit_layout,
            blit_sampler,
            targets,
            frame: None,
            frame_index: 0,
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Increments with every cleared frame.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Color format of the drawing buffer.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Opens a pass that draws over what the frame holds so far, restricted
    /// to the current viewport. `None` outside of a frame.
    pub fn begin_pass(&mut self, label: &str) -> Option<wgpu::RenderPass<'_>> {
        let viewport = self.viewport;
        let frame = self.frame.as_mut()?;

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.targets.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let width = viewport.width.min(self.size.width as f32 - viewport.x);
        let height = viewport.height.min(self.size.height as f32 - viewport.y);
        if width >= 1.0 && height >= 1.0 {
            pass.set_viewport(viewport.x, viewport.y, width, height, 0.0, 1.0);
        }
        Some(pass)
    }

    /// Keeps the window surface in step with the window's current size.
    fn sync_surface(&mut self) {
        let window_size = self.window.inner_size();
        if window_size.width == 0 || window_size.height == 0 {
            return;
        }
        if window_size.width != self.config.width || window_size.height != self.config.height {
            self.config.width = window_size.width;
            self.config.height = window_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, ContextError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture().map_err(surface_error)
            }
            Err(e) => Err(surface_error(e)),
        }
    }
}

fn surface_error(e: wgpu::SurfaceError) -> ContextError {
    match e {
        wgpu::SurfaceError::Lost => ContextError::Lost,
        other => ContextError::Surface(other),
    }
}

fn create_targets(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: SurfaceSize,
    blit_layout: &wgpu::BindGroupLayout,
    blit_sampler: &wgpu::Sampler,
) -> Targets {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };

    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Drawing Buffer"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout: blit_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&color_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(blit_sampler),
            },
        ],
    });

    Targets {
        color_view,
        depth_view,
        blit_bind_group,
    }
}

impl RenderContext for WgpuContext {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size == self.size {
            return;
        }
        log::debug!("Resizing drawing buffer to {}x{}", size.width, size.height);
        // A frame in flight still targets the old buffers.
        self.frame = None;
        self.size = size;
        self.viewport = Viewport::full(size);
        self.targets = create_targets(&self.device, self.config.format, size, &self.blit_layout, &self.blit_sampler);
    }

    fn clear(&mut self) -> Result<(), ContextError> {
        self.frame = None;
        self.sync_surface();
        let surface_texture = self.acquire()?;

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        self.frame = Some(Frame {
            surface_texture,
            encoder,
        });
        self.frame_index += 1;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self) -> Result<(), ContextError> {
        let Some(Frame {
            surface_texture,
            mut encoder,
        }) = self.frame.take()
        else {
            return Ok(());
        };

        let window_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &window_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &self.targets.blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}
