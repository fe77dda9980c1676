//! Interactive viewer hosting one canvas session in a winit window

use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use airpaint_core::{
    Airpaint, CanvasSize, ContentRect, FrameOutcome, FrameScheduler, GpuDevice, PipelineError,
    PointerEvent, PointerId, Props, SurfaceTarget, World,
};
use airpaint_params::AirpaintConfig;

use crate::controls::{self, KeyAction};

/// Pressure reported for a pressed mouse button
const MOUSE_PRESSURE: f32 = 0.5;

/// Re-arms frames through winit redraw requests; vsync paces them
pub struct WindowScheduler {
    window: Arc<Window>,
    cancelled: bool,
}

impl WindowScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window, cancelled: false }
    }
}

impl FrameScheduler for WindowScheduler {
    fn schedule_next_frame(&mut self) {
        if !self.cancelled {
            self.window.request_redraw();
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

/// Canvas rectangle in logical pixels: the whole window content area
fn content_rect(window: &Window) -> ContentRect {
    let size = window.inner_size().to_logical::<f32>(window.scale_factor());
    ContentRect::sized(size.width, size.height)
}

fn logical(position: PhysicalPosition<f64>, scale_factor: f64) -> Vec2 {
    let position = position.to_logical::<f32>(scale_factor);
    Vec2::new(position.x, position.y)
}

fn touch_event(touch: &Touch, scale_factor: f64) -> PointerEvent {
    let id = PointerId(touch.id);
    let position = logical(touch.location, scale_factor);
    let pressure = touch
        .force
        .map(|force| force.normalized() as f32)
        .unwrap_or(MOUSE_PRESSURE);

    match touch.phase {
        TouchPhase::Started => PointerEvent::Down { id, position, pressure },
        TouchPhase::Moved => PointerEvent::Move { id, position, pressure },
        TouchPhase::Ended | TouchPhase::Cancelled => PointerEvent::Up { id },
    }
}

/// Run the interactive viewer
pub async fn run_viewer(config: AirpaintConfig) -> Result<()> {
    println!("Creating event loop...");
    let event_loop = EventLoop::new()?;

    println!("Creating window...");
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(LogicalSize::new(config.window.width as f64, config.window.height as f64))
            .build(&event_loop)?,
    );

    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(window.clone()).map_err(PipelineError::from)?;
    let gpu = GpuDevice::request(instance, Some(&surface)).await?;
    println!("{}", gpu.info());

    let physical = window.inner_size();
    let target = SurfaceTarget::new(
        surface,
        &gpu.adapter,
        CanvasSize::new(physical.width, physical.height),
        config.window.vsync,
    );

    let world = World::new(config.brush, config.wind);
    let mut canvas = Airpaint::new(Props {
        device: Arc::clone(&gpu.device),
        queue: Arc::clone(&gpu.queue),
        target: Box::new(target),
        scheduler: Box::new(WindowScheduler::new(window.clone())),
        world,
        rect: content_rect(&window),
        scale_factor: window.scale_factor(),
    })?;
    println!("Canvas ready");

    let mut button_down = false;
    let mut cursor = Vec2::ZERO;

    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run(move |event, elwt| {
        let Event::WindowEvent { event, window_id } = event else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        let scale_factor = window.scale_factor();
        match event {
            WindowEvent::CloseRequested => {
                println!("Window close requested");
                canvas.dispose();
                elwt.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Err(e) = canvas.handle_resize(content_rect(&window), scale_factor) {
                    log::error!("Resize error: {}", e);
                    canvas.dispose();
                    elwt.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                cursor = logical(position, scale_factor);
                let pressure = if button_down { MOUSE_PRESSURE } else { 0.0 };
                canvas.handle_pointer(PointerEvent::Move {
                    id: PointerId::MOUSE,
                    position: cursor,
                    pressure,
                });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                button_down = state == ElementState::Pressed;
                let event = if button_down {
                    PointerEvent::Down {
                        id: PointerId::MOUSE,
                        position: cursor,
                        pressure: MOUSE_PRESSURE,
                    }
                } else {
                    PointerEvent::Up { id: PointerId::MOUSE }
                };
                canvas.handle_pointer(event);
            }
            WindowEvent::CursorLeft { .. } => {
                canvas.handle_pointer(PointerEvent::Leave { id: PointerId::MOUSE });
            }
            WindowEvent::Touch(touch) => {
                canvas.handle_pointer(touch_event(&touch, scale_factor));
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    logical_key,
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => match controls::handle_key(&logical_key, canvas.world()) {
                KeyAction::Quit => {
                    println!("Escape key pressed");
                    canvas.dispose();
                    elwt.exit();
                }
                KeyAction::Clear => canvas.clear(),
                KeyAction::Adjusted | KeyAction::Ignored => {}
            },
            WindowEvent::RedrawRequested => match canvas.frame() {
                Ok(FrameOutcome::Submitted(_)) | Ok(FrameOutcome::Skipped) => {}
                Ok(FrameOutcome::Disposed) => elwt.exit(),
                Err(e) => {
                    log::error!("Frame error: {}", e);
                    canvas.dispose();
                    elwt.exit();
                }
            },
            _ => {}
        }
    })?;

    Ok(())
}
