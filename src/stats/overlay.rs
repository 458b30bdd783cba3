use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};

use super::{graph_vertices, FrameTimer, StatsVertex, MAX_GRAPH_VERTICES};
use crate::gfx::context::DEPTH_FORMAT;
use crate::gfx::{RenderContext, StatsOverlay, UniformRing, WgpuContext};

const TARGET_FPS: u32 = 90;
const PANEL_WIDTH: f32 = 240.0;
const PANEL_HEIGHT: f32 = 100.0;
const PANEL_MARGIN: f32 = 10.0;
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

impl StatsVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x4,
    ];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StatsVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Frame timing graph drawn with wgpu, either pinned to the top-left of
/// the viewport or on a panel in the world.
pub struct GpuStats {
    timer: FrameTimer,
    perf_monitor: bool,
    last_report: Instant,
    pipeline: wgpu::RenderPipeline,
    transforms: UniformRing<[[f32; 4]; 4]>,
    vertex_buffer: wgpu::Buffer,
    /// Frame the vertex buffer was last filled in, and its vertex count.
    graph: Option<(u64, u32)>,
}

impl GpuStats {
    pub fn new(ctx: &WgpuContext, perf_monitor: bool) -> Self {
        let device = ctx.device();

        let transforms = UniformRing::new(device, "Stats Transforms", wgpu::ShaderStages::VERTEX);
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Stats Vertex Buffer"),
            size: (MAX_GRAPH_VERTICES * std::mem::size_of::<StatsVertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Stats Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/stats.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Stats Pipeline Layout"),
            bind_group_layouts: &[transforms.layout()],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Stats Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[StatsVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            // Always on top of the scene.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if perf_monitor {
            log::info!("Performance monitoring enabled");
        }

        Self {
            timer: FrameTimer::new(TARGET_FPS),
            perf_monitor,
            last_report: Instant::now(),
            pipeline,
            transforms,
            vertex_buffer,
            graph: None,
        }
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Draws the graph with its unit square mapped through `transform`.
    pub fn render_panel(&mut self, ctx: &mut WgpuContext, transform: &Mat4) {
        let vertex_count = self.update_graph(ctx);
        let offsets = self.transforms.write(ctx, &[transform.to_cols_array_2d()]);
        let Some(&offset) = offsets.first() else {
            return;
        };

        let Some(mut pass) = ctx.begin_pass("Stats Pass") else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.transforms.bind_group(), &[offset]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..vertex_count, 0..1);
    }

    /// Refills the vertex buffer on the first draw of a frame.
    fn update_graph(&mut self, ctx: &WgpuContext) -> u32 {
        let frame = ctx.frame_index();
        if let Some((filled, count)) = self.graph {
            if filled == frame {
                return count;
            }
        }

        let vertices = graph_vertices(&self.timer.frame_times_ms(), self.timer.budget_ms());
        ctx.queue()
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        let count = vertices.len() as u32;
        self.graph = Some((frame, count));
        count
    }

    fn report(&mut self) {
        if !self.perf_monitor || self.last_report.elapsed() < REPORT_INTERVAL {
            return;
        }
        self.last_report = Instant::now();
        let stats = self.timer.stats();
        log::info!(
            "{:.1} fps, frame {:.2} ms avg ({:.2} min, {:.2} max), {} over budget",
            stats.fps,
            stats.average_frame_time_ms,
            stats.min_frame_time_ms,
            stats.max_frame_time_ms,
            stats.over_budget
        );
    }
}

/// Pixel-space transform placing the unit-square graph in the top-left
/// corner of a `width` × `height` viewport.
pub fn ortho_panel_transform(width: f32, height: f32) -> Mat4 {
    // Pixel coordinates with y down, origin at the top-left.
    let projection = Mat4::orthographic_rh(0.0, width, height, 0.0, -1.0, 1.0);
    let placement = Mat4::from_translation(Vec3::new(PANEL_MARGIN, PANEL_MARGIN + PANEL_HEIGHT, 0.0))
        * Mat4::from_scale(Vec3::new(PANEL_WIDTH, -PANEL_HEIGHT, 1.0));
    projection * placement
}

impl StatsOverlay<WgpuContext> for GpuStats {
    fn begin(&mut self) {
        self.timer.begin_frame();
    }

    fn end(&mut self) {
        self.timer.end_frame();
        self.report();
    }

    fn render_ortho(&mut self, ctx: &mut WgpuContext) {
        let viewport = ctx.viewport();
        let transform = ortho_panel_transform(viewport.width, viewport.height);
        self.render_panel(ctx, &transform);
    }
}
