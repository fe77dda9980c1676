//! Canvas session tests on a real device.
//!
//! Each test returns early when no GPU adapter is available.

use airpaint_core::{
    Airpaint, BrushState, CanvasSize, Color, ContentRect, FrameOutcome, GpuDevice, ManualScheduler,
    OffscreenTarget, PointerEvent, PointerId, Props, WindState, World,
};
use glam::Vec2;

const SIDE: u32 = 64;

fn gpu() -> Option<GpuDevice> {
    pollster::block_on(GpuDevice::new()).ok()
}

fn session(gpu: &GpuDevice, world: World) -> (Airpaint, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let size = CanvasSize::new(SIDE, SIDE);
    let canvas = Airpaint::new(Props {
        device: gpu.device.clone(),
        queue: gpu.queue.clone(),
        target: Box::new(OffscreenTarget::new(&gpu.device, size).unwrap()),
        scheduler: Box::new(scheduler.clone()),
        world,
        rect: ContentRect::sized(SIDE as f32, SIDE as f32),
        scale_factor: 1.0,
    })
    .unwrap();
    (canvas, scheduler)
}

fn hard_white_brush() -> BrushState {
    BrushState {
        radius: 6.0,
        hardness: 1.0,
        noise: 0.0,
        color: Color::new(1.0, 1.0, 1.0, 1.0),
    }
}

/// Alpha-weighted centroid of an RGBA8 field
fn centroid(rgba: &[u8], width: u32) -> Vec2 {
    let mut sum = Vec2::ZERO;
    let mut mass = 0.0;
    for (index, texel) in rgba.chunks_exact(4).enumerate() {
        let alpha = texel[3] as f32;
        let x = (index as u32 % width) as f32 + 0.5;
        let y = (index as u32 / width) as f32 + 0.5;
        sum += Vec2::new(x, y) * alpha;
        mass += alpha;
    }
    assert!(mass > 0.0, "field carries no pigment");
    sum / mass
}

/// Dab at (16, 32), lift, then let the wind act for `frames` frames
fn paint_and_wait(wind: WindState, frames: u32) -> Option<Vec2> {
    let gpu = gpu()?;
    let (mut canvas, _scheduler) = session(&gpu, World::new(hard_white_brush(), wind));

    canvas.handle_pointer(PointerEvent::Down {
        id: PointerId(1),
        position: Vec2::new(16.0, 32.0),
        pressure: 1.0,
    });
    assert!(matches!(canvas.frame().unwrap(), FrameOutcome::Submitted(_)));
    canvas.handle_pointer(PointerEvent::Up { id: PointerId(1) });

    for _ in 0..frames {
        assert!(matches!(canvas.frame().unwrap(), FrameOutcome::Submitted(_)));
    }
    gpu.wait();

    let pigment = canvas.pigment_snapshot().unwrap();
    Some(centroid(&pigment, SIDE))
}

#[test]
fn teardown_releases_in_reverse_acquisition_order() {
    let Some(gpu) = gpu() else {
        println!("Skipped: No GPU");
        return;
    };
    let (mut canvas, scheduler) = session(&gpu, World::default());

    assert_eq!(
        canvas.teardown_steps(),
        vec![
            "frame scheduler",
            "simulation pipeline",
            "presentation pipeline",
            "state synchronizer",
            "uniform buffers",
            "texture reallocation listener",
            "field textures",
            "input listeners",
            "resize observer",
            "surface configuration",
        ]
    );
    assert!(scheduler.is_armed());

    canvas.dispose();
    canvas.dispose();

    assert!(canvas.is_disposed());
    assert!(canvas.teardown_steps().is_empty());
    assert!(scheduler.is_cancelled());
    assert_eq!(canvas.world().brush.subscriber_count(), 0);
    assert_eq!(canvas.world().size.subscriber_count(), 0);
    assert_eq!(canvas.frame().unwrap(), FrameOutcome::Disposed);
}

#[test]
fn parity_toggles_once_per_frame() {
    let Some(gpu) = gpu() else {
        println!("Skipped: No GPU");
        return;
    };
    let (mut canvas, scheduler) = session(&gpu, World::default());

    let before = canvas.parity();
    assert!(scheduler.take());
    let FrameOutcome::Submitted(plan) = canvas.frame().unwrap() else {
        panic!("frame was not submitted");
    };

    assert_eq!(plan.present, before);
    assert_eq!(canvas.parity(), before.flipped());
    assert_eq!(canvas.submitted_frames(), 1);
    assert!(scheduler.take());
}

#[test]
fn wind_carries_paint_at_full_diffusion() {
    let wind = WindState { angle: 0.0, speed: 1.0, diffusion: 1.0 };
    let Some(moved) = paint_and_wait(wind, 12) else {
        println!("Skipped: No GPU");
        return;
    };
    let still = paint_and_wait(WindState { speed: 0.0, ..wind }, 12).unwrap_or(Vec2::new(16.0, 32.0));

    assert!((still.x - 16.0).abs() < 1.5, "calm paint drifted to {:?}", still);
    assert!(moved.x > still.x + 6.0, "wind moved paint only to {:?}", moved);
    assert!((moved.y - 32.0).abs() < 1.5);
}

#[test]
fn shrinking_resize_reallocates_and_refits_pointer() {
    let Some(gpu) = gpu() else {
        println!("Skipped: No GPU");
        return;
    };
    let (mut canvas, _scheduler) = session(&gpu, World::default());

    canvas.handle_pointer(PointerEvent::Down {
        id: PointerId::MOUSE,
        position: Vec2::new(60.0, 50.0),
        pressure: 0.5,
    });
    canvas.handle_resize(ContentRect::sized(32.0, 32.0), 1.0).unwrap();

    let pointer = canvas.world().pointer.read();
    assert_eq!((pointer.x, pointer.y), (32.0, 32.0));
    assert_eq!(canvas.world().size.read(), CanvasSize::new(32, 32));
    assert!(matches!(canvas.frame().unwrap(), FrameOutcome::Submitted(_)));

    gpu.wait();
    assert_eq!(canvas.pigment_snapshot().unwrap().len(), 32 * 32 * 4);
}
