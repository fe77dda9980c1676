//! Keyboard bindings for brush and wind settings

use std::f32::consts::PI;
use winit::keyboard::{Key, NamedKey};

use airpaint_core::World;
use airpaint_params::{BrushState, Color, WindState};

pub const HELP: &str = "Keys: [ ] radius | - = hardness | n N noise | 1-6 color | \u{2190} \u{2192} wind angle | \u{2193} \u{2191} wind speed | d D diffusion | c clear | Esc quit";

/// Brush colors selectable with 1-6
pub const PALETTE: [Color; 6] = [
    Color::new(0.85, 0.20, 0.30, 1.0),
    Color::new(0.95, 0.60, 0.15, 1.0),
    Color::new(0.95, 0.85, 0.25, 1.0),
    Color::new(0.25, 0.65, 0.35, 1.0),
    Color::new(0.20, 0.40, 0.85, 1.0),
    Color::new(0.10, 0.10, 0.12, 1.0),
];

const RADIUS_STEP: f32 = 2.0;
const UNIT_STEP: f32 = 0.1;
const ANGLE_STEP: f32 = PI / 12.0; // 15 degrees
const SPEED_STEP: f32 = 0.5;
const DIFFUSION_STEP: f32 = 0.05;

/// What the viewer must do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// A store was updated
    Adjusted,
    Clear,
    Quit,
    Ignored,
}

pub fn handle_key(key: &Key, world: &World) -> KeyAction {
    match key {
        Key::Named(NamedKey::Escape) => KeyAction::Quit,
        Key::Named(NamedKey::ArrowLeft) => wind(world, |w| WindState { angle: w.angle - ANGLE_STEP, ..w }),
        Key::Named(NamedKey::ArrowRight) => wind(world, |w| WindState { angle: w.angle + ANGLE_STEP, ..w }),
        Key::Named(NamedKey::ArrowDown) => wind(world, |w| WindState { speed: w.speed - SPEED_STEP, ..w }),
        Key::Named(NamedKey::ArrowUp) => wind(world, |w| WindState { speed: w.speed + SPEED_STEP, ..w }),
        Key::Character(c) => match c.as_str() {
            "[" => brush(world, |b| BrushState { radius: b.radius - RADIUS_STEP, ..b }),
            "]" => brush(world, |b| BrushState { radius: b.radius + RADIUS_STEP, ..b }),
            "-" => brush(world, |b| BrushState { hardness: b.hardness - UNIT_STEP, ..b }),
            "=" => brush(world, |b| BrushState { hardness: b.hardness + UNIT_STEP, ..b }),
            "n" => brush(world, |b| BrushState { noise: b.noise - UNIT_STEP, ..b }),
            "N" => brush(world, |b| BrushState { noise: b.noise + UNIT_STEP, ..b }),
            "d" => wind(world, |w| WindState { diffusion: w.diffusion - DIFFUSION_STEP, ..w }),
            "D" => wind(world, |w| WindState { diffusion: w.diffusion + DIFFUSION_STEP, ..w }),
            "c" | "C" => KeyAction::Clear,
            digit => match digit.parse::<usize>() {
                Ok(n @ 1..=6) => brush(world, |b| BrushState { color: PALETTE[n - 1], ..b }),
                _ => KeyAction::Ignored,
            },
        },
        _ => KeyAction::Ignored,
    }
}

fn brush(world: &World, change: impl FnOnce(BrushState) -> BrushState) -> KeyAction {
    world.brush.update(|current| change(*current).clamped());
    let brush = world.brush.read();
    log::info!(
        "Brush: radius {:.0} hardness {:.2} noise {:.2}",
        brush.radius,
        brush.hardness,
        brush.noise
    );
    KeyAction::Adjusted
}

fn wind(world: &World, change: impl FnOnce(WindState) -> WindState) -> KeyAction {
    world.wind.update(|current| change(*current).clamped());
    let wind = world.wind.read();
    log::info!(
        "Wind: angle {:.0}\u{b0} speed {:.1} diffusion {:.2}",
        wind.display_angle().to_degrees(),
        wind.speed,
        wind.diffusion
    );
    KeyAction::Adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(text: &str) -> Key {
        Key::Character(text.into())
    }

    #[test]
    fn radius_is_clamped_to_range() {
        let world = World::default();
        for _ in 0..64 {
            handle_key(&character("]"), &world);
        }
        assert_eq!(world.brush.read().radius, airpaint_params::MAX_BRUSH_RADIUS);

        for _ in 0..64 {
            handle_key(&character("["), &world);
        }
        assert_eq!(world.brush.read().radius, 0.0);
    }

    #[test]
    fn digits_select_palette_colors() {
        let world = World::default();
        assert_eq!(handle_key(&character("5"), &world), KeyAction::Adjusted);
        assert_eq!(world.brush.read().color, PALETTE[4]);

        assert_eq!(handle_key(&character("7"), &world), KeyAction::Ignored);
        assert_eq!(handle_key(&character("0"), &world), KeyAction::Ignored);
    }

    #[test]
    fn arrows_turn_and_speed_up_the_wind() {
        let world = World::default();
        let before = world.wind.read();

        handle_key(&Key::Named(NamedKey::ArrowRight), &world);
        handle_key(&Key::Named(NamedKey::ArrowUp), &world);

        let after = world.wind.read();
        assert!((after.angle - before.angle - ANGLE_STEP).abs() < 1e-6);
        assert_eq!(after.speed, before.speed + SPEED_STEP);
    }

    #[test]
    fn brush_change_leaves_wind_untouched() {
        let world = World::default();
        let wind = world.wind.read();
        handle_key(&character("N"), &world);
        assert_eq!(world.wind.read(), wind);
    }

    #[test]
    fn clear_and_quit_are_reported() {
        let world = World::default();
        assert_eq!(handle_key(&character("c"), &world), KeyAction::Clear);
        assert_eq!(handle_key(&Key::Named(NamedKey::Escape), &world), KeyAction::Quit);
    }
}
