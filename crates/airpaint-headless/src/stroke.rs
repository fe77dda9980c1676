//! Pointer scripts for headless runs

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use airpaint_core::{PointerEvent, PointerId};
use airpaint_params::CanvasSize;

use crate::config::{StrokeConfig, StrokePoint};

/// Identifier for the scripted pointer
const STROKE_POINTER: PointerId = PointerId(1);

/// Share of each random segment spent drawing; the rest is a pause
const DRAW_SHARE: f32 = 0.75;

/// Sorted keyframes resolved into per-frame pointer events
#[derive(Debug, Clone)]
pub struct StrokePlan {
    points: Vec<StrokePoint>,
}

impl StrokePlan {
    pub fn new(mut points: Vec<StrokePoint>) -> Self {
        points.sort_by_key(|point| point.frame);
        Self { points }
    }

    pub fn from_config(config: &StrokeConfig, size: CanvasSize, frames: u32) -> Self {
        match config {
            StrokeConfig::Scripted { points } => Self::new(points.clone()),
            StrokeConfig::Random { seed, segments } => Self::random(*seed, *segments, size, frames),
        }
    }

    /// Straight strokes between random points, one per segment of the run
    pub fn random(seed: u64, segments: u32, size: CanvasSize, frames: u32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let segments = segments.max(1);
        let span = (frames / segments).max(2);
        let margin = 0.1;

        let random_point = |rng: &mut ChaCha8Rng| {
            Vec2::new(
                rng.gen_range(margin..1.0 - margin) * size.width as f32,
                rng.gen_range(margin..1.0 - margin) * size.height as f32,
            )
        };

        let mut points = Vec::with_capacity(segments as usize * 2);
        for segment in 0..segments {
            let start = segment * span;
            let end = start + ((span as f32 * DRAW_SHARE) as u32).max(1);
            let from = random_point(&mut rng);
            let to = random_point(&mut rng);
            let pressure = rng.gen_range(0.3..1.0);

            points.push(StrokePoint {
                frame: start,
                x: from.x,
                y: from.y,
                pressure,
                down: true,
            });
            points.push(StrokePoint {
                frame: end,
                x: to.x,
                y: to.y,
                pressure: 0.0,
                down: false,
            });
        }

        Self::new(points)
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    /// Pointer state at `frame`; while down, position and pressure move
    /// linearly toward the next keyframe
    pub fn state_at(&self, frame: u32) -> Option<StrokePoint> {
        let index = self.points.iter().rposition(|point| point.frame <= frame)?;
        let current = self.points[index];
        if !current.down {
            return Some(current);
        }

        let Some(next) = self.points.get(index + 1) else {
            return Some(current);
        };
        let t = (frame - current.frame) as f32 / (next.frame - current.frame).max(1) as f32;
        Some(StrokePoint {
            frame,
            x: current.x + (next.x - current.x) * t,
            y: current.y + (next.y - current.y) * t,
            pressure: if next.down {
                current.pressure + (next.pressure - current.pressure) * t
            } else {
                current.pressure
            },
            down: true,
        })
    }

    /// Events to feed the input translator before simulating `frame`
    pub fn events_for(&self, frame: u32) -> Vec<PointerEvent> {
        let Some(state) = self.state_at(frame) else {
            return Vec::new();
        };
        let was_down = frame
            .checked_sub(1)
            .and_then(|previous| self.state_at(previous))
            .map_or(false, |previous| previous.down);

        let id = STROKE_POINTER;
        let position = Vec2::new(state.x, state.y);
        match (was_down, state.down) {
            (false, true) => vec![PointerEvent::Down { id, position, pressure: state.pressure }],
            (true, true) => vec![PointerEvent::Move { id, position, pressure: state.pressure }],
            (true, false) => vec![
                PointerEvent::Move { id, position, pressure: 0.0 },
                PointerEvent::Up { id },
            ],
            (false, false) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(frame: u32, x: f32, y: f32, pressure: f32, down: bool) -> StrokePoint {
        StrokePoint { frame, x, y, pressure, down }
    }

    fn plan() -> StrokePlan {
        StrokePlan::new(vec![
            point(30, 230.0, 64.0, 0.9, true),
            point(0, 20.0, 64.0, 0.5, true),
            point(35, 230.0, 64.0, 0.5, false),
        ])
    }

    #[test]
    fn keyframes_are_sorted() {
        let frames: Vec<u32> = plan().points().iter().map(|p| p.frame).collect();
        assert_eq!(frames, vec![0, 30, 35]);
    }

    #[test]
    fn stroke_starts_with_down() {
        let events = plan().events_for(0);
        assert_eq!(
            events,
            vec![PointerEvent::Down {
                id: STROKE_POINTER,
                position: Vec2::new(20.0, 64.0),
                pressure: 0.5,
            }]
        );
    }

    #[test]
    fn position_is_interpolated_between_keyframes() {
        let state = plan().state_at(15).unwrap();
        assert_eq!(state.x, 125.0);
        assert_eq!(state.y, 64.0);
        assert!((state.pressure - 0.7).abs() < 1e-6);
        assert!(state.down);

        assert!(matches!(plan().events_for(15)[..], [PointerEvent::Move { .. }]));
    }

    #[test]
    fn lifting_emits_up_once() {
        let plan = plan();
        let events = plan.events_for(35);
        assert!(matches!(events.last(), Some(PointerEvent::Up { .. })));
        assert!(plan.events_for(36).is_empty());
    }

    #[test]
    fn nothing_happens_before_the_first_keyframe() {
        let plan = StrokePlan::new(vec![point(5, 1.0, 1.0, 0.5, true)]);
        assert!(plan.events_for(0).is_empty());
        assert!(matches!(plan.events_for(5)[..], [PointerEvent::Down { .. }]));
    }

    #[test]
    fn random_strokes_are_reproducible() {
        let size = CanvasSize::new(200, 100);
        let a = StrokePlan::random(42, 3, size, 90);
        let b = StrokePlan::random(42, 3, size, 90);
        let c = StrokePlan::random(43, 3, size, 90);

        assert_eq!(a.points(), b.points());
        assert_ne!(a.points(), c.points());
        assert_eq!(a.points().len(), 6);
    }

    #[test]
    fn random_strokes_stay_on_the_canvas() {
        let size = CanvasSize::new(200, 100);
        let plan = StrokePlan::random(9, 4, size, 100);
        for point in plan.points() {
            assert!(point.x >= 0.0 && point.x <= 200.0);
            assert!(point.y >= 0.0 && point.y <= 100.0);
            assert!(point.frame < 100);
        }
        // Every segment starts pressed and ends lifted
        for pair in plan.points().chunks(2) {
            assert!(pair[0].down);
            assert!(!pair[1].down);
            assert!(pair[1].frame > pair[0].frame);
        }
    }
}
