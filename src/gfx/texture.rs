use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context, Result};

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
        label: Option<&str>,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    pub fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &image::RgbaImage, label: Option<&str>) -> Self {
        Self::from_rgba(device, queue, image.width(), image.height(), image.as_raw(), label)
    }

    /// Stand-in used while the real texture is still decoding.
    pub fn checkerboard(device: &wgpu::Device, queue: &wgpu::Queue, size: u32) -> Self {
        let data = checkerboard_pixels(size, 8);
        Self::from_rgba(device, queue, size, size, &data, Some("Checkerboard Texture"))
    }
}

pub fn checkerboard_pixels(size: u32, squares_per_side: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    let square_size = (size / squares_per_side).max(1);

    for y in 0..size {
        for x in 0..size {
            let square_x = x / square_size;
            let square_y = y / square_size;
            let is_light = (square_x + square_y) % 2 == 0;

            let color = if is_light {
                [200u8, 200u8, 200u8, 255u8]
            } else {
                [120u8, 120u8, 120u8, 255u8]
            };

            data.extend_from_slice(&color);
        }
    }
    data
}

/// Decodes images off the render thread.
pub struct TextureLoader;

impl TextureLoader {
    pub fn load_texture(path: &Path) -> PendingTexture {
        let (tx, rx) = mpsc::channel();
        let owned = path.to_path_buf();
        let spawned = thread::Builder::new()
            .name("texture-loader".to_string())
            .spawn(move || {
                let result = image::open(&owned)
                    .map(|img| img.to_rgba8())
                    .with_context(|| format!("Failed to load texture {}", owned.display()));
                // The receiver is gone if the context was torn down meanwhile.
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn texture loader: {}", e);
        }

        PendingTexture {
            path: path.to_path_buf(),
            receiver: Some(rx),
        }
    }
}

/// A texture decode in flight.
pub struct PendingTexture {
    path: PathBuf,
    receiver: Option<Receiver<Result<image::RgbaImage>>>,
}

impl PendingTexture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the decoded image once, when it becomes available.
    pub fn poll(&mut self) -> Option<Result<image::RgbaImage>> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.receiver = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                Some(Err(anyhow::anyhow!(
                    "Texture loader for {} exited without a result",
                    self.path.display()
                )))
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }

    /// Blocks until the decode finishes.
    pub fn wait(mut self) -> Result<image::RgbaImage> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| anyhow::anyhow!("Texture {} already resolved", self.path.display()))?;
        receiver
            .recv()
            .with_context(|| format!("Texture loader for {} exited without a result", self.path.display()))?
    }
}
