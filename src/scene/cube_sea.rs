use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::transform::hero_ring;
use crate::gfx::context::DEPTH_FORMAT;
use crate::config::MAX_GRID_SIZE;
use crate::gfx::{PendingTexture, SceneRenderer, Texture, UniformRing, WgpuContext};
use crate::stats::GpuStats;

const CUBE_HALF_EXTENT: f32 = 0.4;
const HERO_COUNT: usize = 8;
const HERO_RADIUS: f32 = 0.8;
const HERO_SCALE: f32 = 0.1;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl CubeVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

impl SceneUniform {
    fn new(view_proj: Mat4, model: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
        }
    }
}

// Outward normal and the face's horizontal axis; the vertical axis is
// normal × horizontal so corners wind counter-clockwise seen from outside.
const FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_X, Vec3::Z),
    (Vec3::Y, Vec3::X),
    (Vec3::NEG_Y, Vec3::X),
    (Vec3::Z, Vec3::X),
    (Vec3::NEG_Z, Vec3::NEG_X),
];

/// Appends one textured cube (24 vertices, 36 indices).
pub fn push_cube(center: Vec3, half_extent: f32, vertices: &mut Vec<CubeVertex>, indices: &mut Vec<u32>) {
    for (normal, u) in FACES {
        let v = normal.cross(u);
        let base = vertices.len() as u32;
        let corners = [(-1.0, -1.0, [0.0, 1.0]), (1.0, -1.0, [1.0, 1.0]), (1.0, 1.0, [1.0, 0.0]), (-1.0, 1.0, [0.0, 0.0])];
        for (su, sv, tex_coords) in corners {
            let position = center + (normal + u * su + v * sv) * half_extent;
            vertices.push(CubeVertex {
                position: position.to_array(),
                tex_coords,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// A `grid_size`³ lattice of cubes one unit apart around the origin, with
/// the cell at the origin left empty for the viewer. `None` above
/// `MAX_GRID_SIZE`.
pub fn build_cube_grid(grid_size: u32, half_extent: f32) -> Option<(Vec<CubeVertex>, Vec<u32>)> {
    if grid_size > MAX_GRID_SIZE {
        return None;
    }
    let size = i32::try_from(grid_size).ok()?;
    let half = size / 2;
    let end = size - half;

    let cells = (grid_size as usize).pow(3);
    let mut vertices = Vec::with_capacity(cells * 24);
    let mut indices = Vec::with_capacity(cells * 36);

    for x in -half..end {
        for y in -half..end {
            for z in -half..end {
                if x == 0 && y == 0 && z == 0 {
                    continue;
                }
                let center = Vec3::new(x as f32, y as f32, z as f32);
                push_cube(center, half_extent, &mut vertices, &mut indices);
            }
        }
    }
    Some((vertices, indices))
}

struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

impl Mesh {
    fn new(device: &wgpu::Device, label: &str, vertices: &[CubeVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }
}

/// The cube sea: a static lattice plus a ring of spinning hero cubes, all
/// sharing one texture, with the stats graph on a panel below the ring.
pub struct CubeSea {
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformRing<SceneUniform>,
    texture_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    pending_texture: Option<PendingTexture>,
    grid: Mesh,
    hero: Mesh,
}

impl CubeSea {
    pub fn new(ctx: &WgpuContext, texture: PendingTexture, grid_size: u32) -> Self {
        let device = ctx.device();

        let uniforms = UniformRing::new(device, "Cube Sea Uniforms", wgpu::ShaderStages::VERTEX);

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cube Sea Texture Layout"),
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

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cube Sea Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/cube_sea.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube Sea Pipeline Layout"),
            bind_group_layouts: &[uniforms.layout(), &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube Sea Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[CubeVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let placeholder = Texture::checkerboard(device, ctx.queue(), 256);
        let texture_bind_group = create_texture_bind_group(device, &texture_layout, &placeholder);

        let grid_size = if grid_size > MAX_GRID_SIZE {
            log::warn!("Grid size {} too large, using {}", grid_size, MAX_GRID_SIZE);
            MAX_GRID_SIZE
        } else {
            grid_size
        };
        let (vertices, indices) = build_cube_grid(grid_size, CUBE_HALF_EXTENT).unwrap_or_default();
        log::debug!("Cube sea: {} cubes", indices.len() / 36);
        let grid = Mesh::new(device, "Cube Grid", &vertices, &indices);

        let (vertices, indices) = {
            let mut vertices = Vec::new();
            let mut indices = Vec::new();
            push_cube(Vec3::ZERO, 1.0, &mut vertices, &mut indices);
            (vertices, indices)
        };
        let hero = Mesh::new(device, "Hero Cube", &vertices, &indices);

        Self {
            pipeline,
            uniforms,
            texture_layout,
            texture_bind_group,
            pending_texture: Some(texture),
            grid,
            hero,
        }
    }

    /// Swaps in the real texture once its decode has finished.
    fn poll_texture(&mut self, ctx: &WgpuContext) {
        let Some(pending) = self.pending_texture.as_mut() else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };

        match result {
            Ok(image) => {
                let label = pending.path().display().to_string();
                let texture = Texture::from_image(ctx.device(), ctx.queue(), &image, Some(&label));
                self.texture_bind_group = create_texture_bind_group(ctx.device(), &self.texture_layout, &texture);
                log::info!("Loaded texture {}", label);
            }
            Err(e) => log::warn!("{:#}, keeping the placeholder texture", e),
        }
        self.pending_texture = None;
    }
}

fn create_texture_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, texture: &Texture) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Cube Sea Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

/// Where the stats panel hangs relative to the viewer.
fn stats_panel_model() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, -0.3, -0.5)) * Mat4::from_scale(Vec3::new(0.3, 0.15, 1.0))
}

impl SceneRenderer<WgpuContext, GpuStats> for CubeSea {
    fn render(&mut self, ctx: &mut WgpuContext, projection: &Mat4, view: &Mat4, stats: &mut GpuStats, t: f64) {
        self.poll_texture(ctx);

        let view_proj = *projection * *view;

        let draws: Vec<_> = std::iter::once(SceneUniform::new(view_proj, Mat4::IDENTITY))
            .chain(
                hero_ring(HERO_COUNT, HERO_RADIUS, HERO_SCALE, t)
                    .iter()
                    .map(|transform| SceneUniform::new(view_proj, transform.to_matrix())),
            )
            .collect();
        let offsets = self.uniforms.write(ctx, &draws);
        let Some((&grid_offset, hero_offsets)) = offsets.split_first() else {
            return;
        };

        {
            let Some(mut pass) = ctx.begin_pass("Cube Sea Pass") else {
                return;
            };
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(1, &self.texture_bind_group, &[]);

            pass.set_bind_group(0, self.uniforms.bind_group(), &[grid_offset]);
            pass.set_vertex_buffer(0, self.grid.vertex_buffer.slice(..));
            pass.set_index_buffer(self.grid.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.grid.num_indices, 0, 0..1);

            pass.set_vertex_buffer(0, self.hero.vertex_buffer.slice(..));
            pass.set_index_buffer(self.hero.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            for &offset in hero_offsets {
                pass.set_bind_group(0, self.uniforms.bind_group(), &[offset]);
                pass.draw_indexed(0..self.hero.num_indices, 0, 0..1);
            }
        }

        stats.render_panel(ctx, &(view_proj * stats_panel_model()));
    }
}
