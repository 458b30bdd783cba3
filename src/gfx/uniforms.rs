use std::marker::PhantomData;
use std::mem::size_of;

use super::WgpuContext;

const INITIAL_CAPACITY: u32 = 32;

/// Hands out consecutive slots, starting over on every frame.
#[derive(Debug, Default)]
struct SlotCursor {
    frame: u64,
    next: u32,
}

impl SlotCursor {
    /// First of `count` slots reserved in `frame`.
    fn allocate(&mut self, frame: u64, count: u32) -> u32 {
        if frame != self.frame {
            self.frame = frame;
            self.next = 0;
        }
        let first = self.next;
        self.next += count;
        first
    }
}

fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Lays `values` out `stride` bytes apart, zero padded.
fn pack_slots<T: bytemuck::Pod>(values: &[T], stride: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len() * stride];
    for (slot, value) in bytes.chunks_mut(stride).zip(values) {
        slot[..size_of::<T>()].copy_from_slice(bytemuck::bytes_of(value));
    }
    bytes
}

/// One uniform buffer bound with dynamic offsets. Every draw of a frame gets
/// its own slot, so draws recorded before the submit keep their values.
pub struct UniformRing<T> {
    label: &'static str,
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u32,
    cursor: SlotCursor,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformRing<T> {
    pub fn new(device: &wgpu::Device, label: &'static str, visibility: wgpu::ShaderStages) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(size_of::<T>() as u64),
                },
                count: None,
            }],
        });
        let stride = aligned_stride(
            size_of::<T>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (buffer, bind_group) = create_slots::<T>(device, label, &layout, stride, INITIAL_CAPACITY);

        Self {
            label,
            layout,
            buffer,
            bind_group,
            stride,
            capacity: INITIAL_CAPACITY,
            cursor: SlotCursor::default(),
            _marker: PhantomData,
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Bind group for offsets returned by the latest `write`.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Queues `values` into fresh slots of the current frame and returns
    /// their dynamic offsets.
    pub fn write(&mut self, ctx: &WgpuContext, values: &[T]) -> Vec<u32> {
        let count = values.len() as u32;
        let first = self.cursor.allocate(ctx.frame_index(), count);
        let end = first + count;
        if end > self.capacity {
            // Passes already recorded keep the old buffer alive.
            self.capacity = end.max(self.capacity * 2);
            log::debug!("Growing {} to {} slots", self.label, self.capacity);
            let (buffer, bind_group) =
                create_slots::<T>(ctx.device(), self.label, &self.layout, self.stride, self.capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
        }

        let bytes = pack_slots(values, self.stride as usize);
        if !bytes.is_empty() {
            ctx.queue().write_buffer(&self.buffer, first as u64 * self.stride, &bytes);
        }
        (first..end).map(|slot| (slot as u64 * self.stride) as u32).collect()
    }
}

fn create_slots<T>(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: u32,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: stride * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(size_of::<T>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}
