//! Canvas session: owns every GPU resource and listener of one canvas
//!
//! Initialization acquires, in order: surface configuration, resize
//! observer, input listeners, field textures, uniform buffers, presentation
//! pipeline, simulation pipeline and frame scheduler. Each acquisition
//! registers its release with a [`Teardown`], so [`Airpaint::dispose`] (or a
//! failed initialization) releases them in reverse.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use wgpu::{Device, Queue};

use crate::error::PipelineError;
use crate::frame::{FrameLoop, FramePlan, FrameScheduler, Parity};
use crate::gpu::layouts::Layouts;
use crate::gpu::pipelines::{PresentationStage, SimulationStage};
use crate::gpu::readback::read_texture_rgba8;
use crate::gpu::target::PresentTarget;
use crate::gpu::textures::{Field, ResourceManager, WgpuTextureFactory};
use crate::gpu::uniforms::{Synchronizer, UniformBuffers, UniformWriter};
use crate::input::{ContentRect, PointerEvent, PointerInput, Viewport};
use crate::teardown::Teardown;
use crate::world::World;
use crate::{bindings, CanvasSize};

type Shared<T> = Rc<RefCell<Option<T>>>;

fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(Some(value)))
}

/// Everything a host hands to a new session
pub struct Props {
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    pub target: Box<dyn PresentTarget>,
    pub scheduler: Box<dyn FrameScheduler>,
    pub world: World,
    /// Canvas content rectangle in surface coordinates
    pub rect: ContentRect,
    /// Device pixels per surface unit
    pub scale_factor: f64,
}

/// What one call to [`Airpaint::frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Simulation and presentation were submitted
    Submitted(FramePlan),
    /// Nothing was submitted; the next frame is already scheduled
    Skipped,
    /// The session has been disposed
    Disposed,
}

/// One live fluid-paint canvas
pub struct Airpaint {
    device: Arc<Device>,
    queue: Arc<Queue>,
    world: World,
    layouts: Layouts,
    viewport: Viewport,
    input: PointerInput,
    observing: Rc<Cell<bool>>,
    listening: Rc<Cell<bool>>,
    target: Shared<Box<dyn PresentTarget>>,
    textures: Shared<ResourceManager<WgpuTextureFactory>>,
    uniforms: Rc<UniformBuffers>,
    presentation: Shared<PresentationStage>,
    simulation: Shared<SimulationStage>,
    scheduler: Shared<Box<dyn FrameScheduler>>,
    frames: FrameLoop,
    teardown: Teardown,
}

impl Airpaint {
    /// Acquire all resources and schedule the first frame
    pub fn new(props: Props) -> Result<Self, PipelineError> {
        let Props {
            device,
            queue,
            mut target,
            scheduler,
            world,
            rect,
            scale_factor,
        } = props;

        // Dropping `teardown` on an early return releases what was acquired
        let mut teardown = Teardown::new();

        let viewport = Viewport::new(rect, scale_factor);
        let size = viewport.size();
        log::info!(
            "Initializing canvas {}x{} (scale factor {})",
            size.width,
            size.height,
            scale_factor
        );

        target.configure(&device, size)?;
        let format = target.format();
        let target = shared(target);
        teardown.push("surface configuration", {
            let target = Rc::clone(&target);
            move || {
                target.borrow_mut().take();
            }
        });

        let observing = Rc::new(Cell::new(true));
        world.size.write(size);
        teardown.push("resize observer", {
            let observing = Rc::clone(&observing);
            move || observing.set(false)
        });

        let listening = Rc::new(Cell::new(true));
        let input = PointerInput::new(world.pointer.clone());
        teardown.push("input listeners", {
            let listening = Rc::clone(&listening);
            move || listening.set(false)
        });

        let factory = WgpuTextureFactory::new(Arc::clone(&device), Arc::clone(&queue));
        let textures = shared(ResourceManager::new(factory, size)?);
        teardown.push("field textures", {
            let textures = Rc::clone(&textures);
            move || {
                let manager = textures.borrow_mut().take();
                if let Some(mut manager) = manager {
                    manager.release();
                }
            }
        });

        let reallocation = world.size.subscribe({
            let textures = Rc::clone(&textures);
            move |size: &CanvasSize| {
                if let Some(manager) = textures.borrow_mut().as_mut() {
                    manager.handle_resize(*size);
                }
            }
        });
        teardown.push("texture reallocation listener", move || reallocation.unsubscribe());

        let uniforms = Rc::new(UniformBuffers::new(&device, Arc::clone(&queue))?);
        teardown.push("uniform buffers", {
            let uniforms = Rc::clone(&uniforms);
            move || uniforms.destroy()
        });

        let writer: Rc<dyn UniformWriter> = uniforms.clone();
        let synchronizer = Synchronizer::new(&world, writer);
        teardown.push("state synchronizer", move || synchronizer.detach());

        bindings::log_binding_layouts();
        let layouts = Layouts::new(&device);

        let presentation = shared(PresentationStage::new(&device, &layouts, format));
        teardown.push("presentation pipeline", {
            let presentation = Rc::clone(&presentation);
            move || {
                presentation.borrow_mut().take();
            }
        });

        let simulation = shared(SimulationStage::new(&device, &layouts));
        teardown.push("simulation pipeline", {
            let simulation = Rc::clone(&simulation);
            move || {
                simulation.borrow_mut().take();
            }
        });

        let scheduler = shared(scheduler);
        if let Some(scheduler) = scheduler.borrow_mut().as_mut() {
            scheduler.schedule_next_frame();
        }
        teardown.push("frame scheduler", {
            let scheduler = Rc::clone(&scheduler);
            move || {
                let scheduler = scheduler.borrow_mut().take();
                if let Some(mut scheduler) = scheduler {
                    scheduler.cancel();
                }
            }
        });

        log::debug!("Canvas initialized with {} teardown steps", teardown.len());

        Ok(Self {
            device,
            queue,
            world,
            layouts,
            viewport,
            input,
            observing,
            listening,
            target,
            textures,
            uniforms,
            presentation,
            simulation,
            scheduler,
            frames: FrameLoop::new(),
            teardown,
        })
    }

    /// Run one simulate-then-present frame and re-arm the scheduler
    pub fn frame(&mut self) -> Result<FrameOutcome, PipelineError> {
        if self.teardown.is_completed() {
            return Ok(FrameOutcome::Disposed);
        }

        let textures = self.textures.borrow();
        let Some(manager) = textures.as_ref() else {
            return Ok(FrameOutcome::Disposed);
        };
        if let Some(fault) = manager.fault() {
            return Err(fault.clone());
        }

        let size = self.world.size.read();
        let pairs = match manager.pairs_for(size) {
            Ok(pairs) => pairs,
            Err(err) => {
                log::warn!("Skipping frame: {}", err);
                self.rearm();
                return Ok(FrameOutcome::Skipped);
            }
        };

        let simulation = self.simulation.borrow();
        let presentation = self.presentation.borrow();
        let mut target = self.target.borrow_mut();
        let (Some(simulation), Some(presentation), Some(target)) =
            (simulation.as_ref(), presentation.as_ref(), target.as_mut())
        else {
            return Ok(FrameOutcome::Disposed);
        };

        let Some(output) = target.acquire(&self.device)? else {
            self.rearm();
            return Ok(FrameOutcome::Skipped);
        };

        let plan = self.frames.plan();
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        simulation.encode(&self.device, &mut encoder, &self.layouts, pairs, &self.uniforms, plan);
        presentation.encode(&self.device, &mut encoder, &self.layouts, pairs, output.view(), plan);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.frames.commit(plan);
        self.rearm();
        Ok(FrameOutcome::Submitted(plan))
    }

    /// Resize observer: reconfigure the target and publish the new backing size
    pub fn handle_resize(&mut self, rect: ContentRect, scale_factor: f64) -> Result<(), PipelineError> {
        if !self.observing.get() {
            return Ok(());
        }

        let size = self.viewport.observe(rect, scale_factor);
        if let Some(target) = self.target.borrow_mut().as_mut() {
            target.configure(&self.device, size)?;
        }
        log::debug!("Canvas resized to {}x{}", size.width, size.height);
        self.world.size.write(size);
        self.input.refit(&self.viewport);

        match self.textures.borrow().as_ref().and_then(|manager| manager.fault()) {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    /// Input listener: translate one host pointer event
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.listening.get() {
            self.input.handle(event, &self.viewport);
        }
    }

    /// Blank the canvas without reallocating
    pub fn clear(&self) {
        if let Some(manager) = self.textures.borrow().as_ref() {
            manager.clear();
            log::info!("Canvas cleared");
        }
    }

    /// Release every resource and listener in reverse acquisition order; idempotent
    pub fn dispose(&mut self) {
        if !self.teardown.is_completed() {
            log::info!("Disposing canvas after {} frames", self.frames.submitted());
        }
        self.teardown.run();
    }

    /// Labels of the pending release steps, in the order dispose runs them
    pub fn teardown_steps(&self) -> Vec<&'static str> {
        self.teardown.labels()
    }

    pub fn is_disposed(&self) -> bool {
        self.teardown.is_completed()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Slot the next frame will read and present
    pub fn parity(&self) -> Parity {
        self.frames.parity()
    }

    pub fn submitted_frames(&self) -> u64 {
        self.frames.submitted()
    }

    /// RGBA8 copy of the most recently simulated pigment field (premultiplied)
    pub fn pigment_snapshot(&self) -> Result<Vec<u8>, PipelineError> {
        self.field_snapshot(Field::Pigment)
    }

    /// RGBA8 copy of the most recently simulated water field; water is in red
    pub fn water_snapshot(&self) -> Result<Vec<u8>, PipelineError> {
        self.field_snapshot(Field::Water)
    }

    fn field_snapshot(&self, field: Field) -> Result<Vec<u8>, PipelineError> {
        let textures = self.textures.borrow();
        let pairs = textures
            .as_ref()
            .and_then(|manager| manager.pairs())
            .ok_or_else(|| PipelineError::Readback("canvas has been disposed".into()))?;
        // After a commit the current parity names the slot last written
        let slot = self.frames.parity();
        let texture = match field {
            Field::Pigment => pairs.pigment(slot),
            Field::Water => pairs.water(slot),
        };
        read_texture_rgba8(&self.device, &self.queue, &texture.texture, texture.size)
    }

    /// RGBA8 copy of the last presented frame, for targets that support readback
    pub fn target_snapshot(&self) -> Result<Vec<u8>, PipelineError> {
        let target = self.target.borrow();
        let target = target
            .as_ref()
            .ok_or_else(|| PipelineError::Readback("canvas has been disposed".into()))?;
        let texture = target
            .readable_texture()
            .ok_or_else(|| PipelineError::Readback("presentation target cannot be read back".into()))?;
        read_texture_rgba8(&self.device, &self.queue, texture, target.size())
    }

    fn rearm(&self) {
        if let Some(scheduler) = self.scheduler.borrow_mut().as_mut() {
            scheduler.schedule_next_frame();
        }
    }
}

impl Drop for Airpaint {
    fn drop(&mut self) {
        self.dispose();
    }
}
