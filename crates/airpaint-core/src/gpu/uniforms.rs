//! Uniform buffers and the store-to-GPU synchronizer

use std::rc::Rc;
use std::sync::Arc;

use bytemuck::Pod;
use wgpu::{Buffer, Device, Queue};

use crate::bindings;
use crate::error::PipelineError;
use crate::gpu::device::scoped;
use crate::store::{Store, Subscription};
use crate::world::World;
use crate::{BrushUniform, PointerUniform, SizeUniform, WindUniform};

/// One of the four uniform buffers read by the simulation kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSlot {
    Pointer,
    Brush,
    Wind,
    Size,
}

impl UniformSlot {
    pub const ALL: [UniformSlot; 4] = [
        UniformSlot::Pointer,
        UniformSlot::Brush,
        UniformSlot::Wind,
        UniformSlot::Size,
    ];

    /// Binding index inside the uniform group
    pub fn binding(self) -> u32 {
        match self {
            UniformSlot::Pointer => bindings::POINTER,
            UniformSlot::Brush => bindings::BRUSH,
            UniformSlot::Wind => bindings::WIND,
            UniformSlot::Size => bindings::SIZE,
        }
    }

    pub fn byte_size(self) -> u64 {
        bindings::UNIFORM_SIZES[self.binding() as usize]
    }

    fn label(self) -> &'static str {
        match self {
            UniformSlot::Pointer => "pointer_uniform",
            UniformSlot::Brush => "brush_uniform",
            UniformSlot::Wind => "wind_uniform",
            UniformSlot::Size => "size_uniform",
        }
    }
}

/// Destination for packed uniform bytes
pub trait UniformWriter {
    /// Overwrite the whole buffer for `slot`
    fn write_uniform(&self, slot: UniformSlot, bytes: &[u8]);
}

/// The four uniform buffers on the device
pub struct UniformBuffers {
    queue: Arc<Queue>,
    buffers: [Buffer; 4],
}

impl UniformBuffers {
    /// Create zeroed uniform buffers sized to their packed structs
    pub fn new(device: &Device, queue: Arc<Queue>) -> Result<Self, PipelineError> {
        let create = |slot: UniformSlot| {
            scoped(device, slot.label(), || {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(slot.label()),
                    size: slot.byte_size(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
        };

        let buffers = [
            create(UniformSlot::Pointer)?,
            create(UniformSlot::Brush)?,
            create(UniformSlot::Wind)?,
            create(UniformSlot::Size)?,
        ];

        Ok(Self { queue, buffers })
    }

    pub fn buffer(&self, slot: UniformSlot) -> &Buffer {
        &self.buffers[slot.binding() as usize]
    }

    /// Release the device memory; later writes are invalid
    pub fn destroy(&self) {
        for buffer in &self.buffers {
            buffer.destroy();
        }
    }
}

impl UniformWriter for UniformBuffers {
    fn write_uniform(&self, slot: UniformSlot, bytes: &[u8]) {
        self.queue.write_buffer(self.buffer(slot), 0, bytes);
    }
}

/// Mirror a store into one uniform slot.
///
/// The current value is written immediately, then again on every change,
/// until the returned subscription is dropped.
pub fn sync_uniform<T, U>(
    store: &Store<T>,
    writer: Rc<dyn UniformWriter>,
    slot: UniformSlot,
) -> Subscription
where
    T: Clone + 'static,
    U: Pod + for<'a> From<&'a T>,
{
    let write = move |value: &T| {
        let packed = U::from(value);
        writer.write_uniform(slot, bytemuck::bytes_of(&packed));
    };

    write(&store.read());
    store.subscribe(write)
}

/// Keeps all four uniform buffers in step with the world's stores
///
/// Registered once per session; dropping it (or calling
/// [`Synchronizer::detach`]) unregisters every listener exactly once.
pub struct Synchronizer {
    subscriptions: Vec<Subscription>,
}

impl Synchronizer {
    pub fn new(world: &World, writer: Rc<dyn UniformWriter>) -> Self {
        let subscriptions = vec![
            sync_uniform::<_, PointerUniform>(&world.pointer, Rc::clone(&writer), UniformSlot::Pointer),
            sync_uniform::<_, BrushUniform>(&world.brush, Rc::clone(&writer), UniformSlot::Brush),
            sync_uniform::<_, WindUniform>(&world.wind, Rc::clone(&writer), UniformSlot::Wind),
            sync_uniform::<_, SizeUniform>(&world.size, writer, UniformSlot::Size),
        ];
        Self { subscriptions }
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn detach(self) {
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
    }
}
