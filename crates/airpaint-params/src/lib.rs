//! Shared parameter types for the Airpaint canvas
//!
//! This crate holds the four pieces of externally-owned state (pointer, brush,
//! wind, canvas size), their fixed GPU uniform layouts and the configuration
//! structures used by the viewer and the headless runner, so the packing rules
//! live in exactly one place.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::TAU;

/// Largest brush radius the settings allow, in canvas pixels
pub const MAX_BRUSH_RADIUS: f32 = 64.0;

/// Largest wind speed the settings allow, in canvas pixels per frame
pub const MAX_WIND_SPEED: f32 = 16.0;

/// Pointer position and contact state in canvas (backing store) pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub down: bool,
}

/// Normalized RGBA color, every channel in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Brush settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrushState {
    pub radius: f32,   // Pixels
    pub hardness: f32, // 0 = soft falloff, 1 = hard edge
    pub noise: f32,    // Random perturbation of the falloff
    pub color: Color,
}

impl BrushState {
    /// Clamp every field into the range the settings allow
    pub fn clamped(self) -> Self {
        Self {
            radius: self.radius.clamp(0.0, MAX_BRUSH_RADIUS),
            hardness: self.hardness.clamp(0.0, 1.0),
            noise: self.noise.clamp(0.0, 1.0),
            color: self.color.clamped(),
        }
    }
}

impl Default for BrushState {
    fn default() -> Self {
        Self {
            radius: 16.0,
            hardness: 0.5,
            noise: 0.2,
            color: Color::new(0.85, 0.2, 0.3, 1.0),
        }
    }
}

/// Wind field driving advection and diffusion
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WindState {
    pub angle: f32,     // Radians, stored unwrapped
    pub speed: f32,     // Pixels per frame
    pub diffusion: f32, // 0..=1
}

impl WindState {
    /// Angle wrapped into [0, 2π) for display; the stored value stays unwrapped
    pub fn display_angle(&self) -> f32 {
        self.angle.rem_euclid(TAU)
    }

    pub fn clamped(self) -> Self {
        Self {
            angle: self.angle,
            speed: self.speed.clamp(0.0, MAX_WIND_SPEED),
            diffusion: self.diffusion.clamp(0.0, 1.0),
        }
    }
}

impl Default for WindState {
    fn default() -> Self {
        Self {
            angle: 0.0,
            speed: 1.0,
            diffusion: 0.1,
        }
    }
}

/// Canvas backing store size in device pixels, never smaller than 1x1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// GPU layout of [`PointerState`]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointerUniform {
    pub position: [f32; 2],
    pub pressure: f32,
    pub down: u32, // 1 = down, 0 = up
}

/// GPU layout of [`BrushState`]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BrushUniform {
    pub radius: f32,
    pub hardness: f32,
    pub noise: f32,
    pub _pad: f32, // Aligns color to 16 bytes
    pub color: [f32; 4],
}

/// GPU layout of [`WindState`]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WindUniform {
    pub angle: f32,
    pub speed: f32,
    pub diffusion: f32,
}

/// GPU layout of [`CanvasSize`]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SizeUniform {
    pub width: u32,
    pub height: u32,
}

const _: () = assert!(std::mem::size_of::<PointerUniform>() == 16);
const _: () = assert!(std::mem::size_of::<BrushUniform>() == 32);
const _: () = assert!(std::mem::size_of::<WindUniform>() == 12);
const _: () = assert!(std::mem::size_of::<SizeUniform>() == 8);

impl From<&PointerState> for PointerUniform {
    fn from(state: &PointerState) -> Self {
        Self {
            position: [state.x, state.y],
            pressure: state.pressure,
            down: state.down as u32,
        }
    }
}

impl From<&BrushState> for BrushUniform {
    fn from(state: &BrushState) -> Self {
        Self {
            radius: state.radius,
            hardness: state.hardness,
            noise: state.noise,
            _pad: 0.0,
            color: state.color.to_array(),
        }
    }
}

impl From<&WindState> for WindUniform {
    fn from(state: &WindState) -> Self {
        Self {
            angle: state.angle,
            speed: state.speed,
            diffusion: state.diffusion,
        }
    }
}

impl From<&CanvasSize> for SizeUniform {
    fn from(size: &CanvasSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

/// Window configuration for the interactive viewer
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WindowConfig {
    pub title: String,
    pub width: u32, // Logical pixels
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Airpaint".to_string(),
            width: 1024,
            height: 768,
            vsync: true,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AirpaintConfig {
    pub window: WindowConfig,
    pub brush: BrushState,
    pub wind: WindState,
}

impl AirpaintConfig {
    /// Clamp user supplied values into the ranges the settings allow
    pub fn sanitized(mut self) -> Self {
        self.brush = self.brush.clamped();
        self.wind = self.wind.clamped();
        self.window.width = self.window.width.max(1);
        self.window.height = self.window.height.max(1);
        self
    }
}

/// WGSL binding layout documentation and validation
///
/// The simulation kernel and the Rust uniform structs share this contract;
/// change both sides together.
pub mod bindings {
    use super::*;

    /// Simulation compute shader bindings
    ///
    /// ```wgsl
    /// @group(0) @binding(0) var pigment_in: texture_2d<f32>;
    /// @group(0) @binding(1) var pigment_out: texture_storage_2d<rgba8unorm, write>;
    /// @group(0) @binding(2) var water_in: texture_2d<f32>;
    /// @group(0) @binding(3) var water_out: texture_storage_2d<rgba8unorm, write>;
    /// @group(1) @binding(0) var<uniform> u_pointer: Pointer;
    /// @group(1) @binding(1) var<uniform> u_brush: Brush;
    /// @group(1) @binding(2) var<uniform> u_wind: Wind;
    /// @group(1) @binding(3) var<uniform> u_canvas: Canvas;
    /// ```
    pub const SIMULATE_BINDINGS: &str = "Simulate Group 0: pigment_in(tex2d), pigment_out(storage rgba8unorm), water_in(tex2d), water_out(storage rgba8unorm); Group 1: Pointer, Brush, Wind, Canvas (uniform)";

    /// Presentation render shader bindings
    ///
    /// ```wgsl
    /// @group(0) @binding(0) var pigment: texture_2d<f32>;
    /// @group(0) @binding(1) var pigment_sampler: sampler;
    /// ```
    pub const PRESENT_BINDINGS: &str = "Present Group 0: pigment(tex2d filterable), pigment_sampler(filtering)";

    pub const TEXTURE_GROUP: u32 = 0;
    pub const UNIFORM_GROUP: u32 = 1;

    pub const PIGMENT_IN: u32 = 0;
    pub const PIGMENT_OUT: u32 = 1;
    pub const WATER_IN: u32 = 2;
    pub const WATER_OUT: u32 = 3;

    pub const POINTER: u32 = 0;
    pub const BRUSH: u32 = 1;
    pub const WIND: u32 = 2;
    pub const SIZE: u32 = 3;

    /// Edge length of the square compute workgroup
    pub const WORKGROUP_SIZE: u32 = 16;

    /// Byte sizes of the four uniform buffers, in binding order
    pub const UNIFORM_SIZES: [u64; 4] = [
        std::mem::size_of::<PointerUniform>() as u64,
        std::mem::size_of::<BrushUniform>() as u64,
        std::mem::size_of::<WindUniform>() as u64,
        std::mem::size_of::<SizeUniform>() as u64,
    ];

    /// Validate that a packed size uniform agrees with the canvas it came from
    pub fn validate_size_uniform(uniform: &SizeUniform, expected: CanvasSize) -> Result<(), String> {
        if uniform.width != expected.width || uniform.height != expected.height {
            Err(format!(
                "Size mismatch: expected {}x{}, got {}x{}",
                expected.width, expected.height, uniform.width, uniform.height
            ))
        } else {
            Ok(())
        }
    }

    /// Log binding layout information for debugging
    pub fn log_binding_layouts() {
        log::debug!("Simulate bindings: {}", SIMULATE_BINDINGS);
        log::debug!("Present bindings: {}", PRESENT_BINDINGS);
        log::debug!("Uniform sizes (pointer, brush, wind, size): {:?}", UNIFORM_SIZES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_packs_down_flag_as_fourth_word() {
        let state = PointerState { x: 100.0, y: 100.0, pressure: 0.8, down: true };
        let uniform = PointerUniform::from(&state);
        let bytes = bytemuck::bytes_of(&uniform);

        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &100.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0.8f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &1u32.to_le_bytes());
    }

    #[test]
    fn brush_color_starts_at_sixteen_bytes() {
        let brush = BrushState {
            radius: 32.0,
            hardness: 0.25,
            noise: 0.5,
            color: Color::new(0.1, 0.2, 0.3, 0.4),
        };
        let uniform = BrushUniform::from(&brush);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniform));

        assert_eq!(floats, &[32.0, 0.25, 0.5, 0.0, 0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn canvas_size_never_drops_below_one() {
        assert_eq!(CanvasSize::new(0, 0), CanvasSize { width: 1, height: 1 });
        assert_eq!(CanvasSize::new(0, 7).height, 7);
    }

    #[test]
    fn display_angle_wraps_but_state_keeps_raw_value() {
        let wind = WindState { angle: -std::f32::consts::FRAC_PI_2, ..WindState::default() };
        assert!((wind.display_angle() - 3.0 * std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(wind.angle, -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn clamping_keeps_settings_in_range() {
        let brush = BrushState {
            radius: 500.0,
            hardness: -1.0,
            noise: 2.0,
            color: Color::new(1.5, 0.5, -0.5, 1.0),
        }
        .clamped();
        assert_eq!(brush.radius, MAX_BRUSH_RADIUS);
        assert_eq!(brush.hardness, 0.0);
        assert_eq!(brush.noise, 1.0);
        assert_eq!(brush.color, Color::new(1.0, 0.5, 0.0, 1.0));

        let wind = WindState { angle: 10.0, speed: 40.0, diffusion: 3.0 }.clamped();
        assert_eq!(wind.angle, 10.0);
        assert_eq!(wind.speed, MAX_WIND_SPEED);
        assert_eq!(wind.diffusion, 1.0);
    }
}
