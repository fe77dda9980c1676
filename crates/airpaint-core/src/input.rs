//! Pointer input translation
//!
//! Host pointer events arrive in surface coordinates (logical pixels relative
//! to the window content area). They are mapped through the content rectangle
//! observed at the last resize into backing-store pixels and written to the
//! pointer store.

use glam::Vec2;

use crate::store::Store;
use crate::{CanvasSize, PointerState};

/// Content rectangle of the canvas in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ContentRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Rectangle anchored at the origin
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    fn origin(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Last observed canvas geometry; the resize observer of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    rect: ContentRect,
    size: CanvasSize,
}

impl Viewport {
    pub fn new(rect: ContentRect, scale_factor: f64) -> Self {
        Self {
            rect,
            size: Self::backing_size(rect, scale_factor),
        }
    }

    /// Record a new content rectangle and return the backing-store size it implies
    pub fn observe(&mut self, rect: ContentRect, scale_factor: f64) -> CanvasSize {
        *self = Self::new(rect, scale_factor);
        self.size
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// Map a surface position into canvas pixels, clamped to the canvas
    pub fn to_canvas(&self, surface: Vec2) -> Vec2 {
        let extent = self.rect.extent();
        if extent.x <= 0.0 || extent.y <= 0.0 {
            return Vec2::ZERO;
        }
        let canvas = Vec2::new(self.size.width as f32, self.size.height as f32);
        self.clamp((surface - self.rect.origin()) / extent * canvas)
    }

    /// Clamp a canvas position into the current backing size
    pub fn clamp(&self, at: Vec2) -> Vec2 {
        at.clamp(Vec2::ZERO, Vec2::new(self.size.width as f32, self.size.height as f32))
    }

    fn backing_size(rect: ContentRect, scale_factor: f64) -> CanvasSize {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        let width = (rect.width as f64 * scale).round().max(1.0) as u32;
        let height = (rect.height as f64 * scale).round().max(1.0) as u32;
        CanvasSize::new(width, height)
    }
}

/// Identifies one pointing device or touch contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

impl PointerId {
    pub const MOUSE: PointerId = PointerId(u64::MAX);
}

/// Raw pointer event in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { id: PointerId, position: Vec2, pressure: f32 },
    Move { id: PointerId, position: Vec2, pressure: f32 },
    Up { id: PointerId },
    Leave { id: PointerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Up,
    Down,
}

/// Up/down state machine writing the pointer store
pub struct PointerInput {
    pointer: Store<PointerState>,
    phase: PointerPhase,
    captured: Option<PointerId>,
}

impl PointerInput {
    pub fn new(pointer: Store<PointerState>) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Up,
            captured: None,
        }
    }

    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    pub fn captured(&self) -> Option<PointerId> {
        self.captured
    }

    pub fn handle(&mut self, event: PointerEvent, viewport: &Viewport) {
        match event {
            PointerEvent::Down { id, position, pressure } => {
                if self.is_foreign(id) {
                    return;
                }
                self.captured = Some(id);
                self.phase = PointerPhase::Down;
                let at = viewport.to_canvas(position);
                self.pointer.write(PointerState {
                    x: at.x,
                    y: at.y,
                    pressure: pressure.clamp(0.0, 1.0),
                    down: true,
                });
            }
            PointerEvent::Move { id, position, pressure } => {
                if self.is_foreign(id) {
                    return;
                }
                let at = viewport.to_canvas(position);
                self.pointer.update(|state| PointerState {
                    x: at.x,
                    y: at.y,
                    pressure: pressure.clamp(0.0, 1.0),
                    down: state.down,
                });
            }
            PointerEvent::Up { id } => {
                if self.is_foreign(id) {
                    return;
                }
                self.captured = None;
                self.phase = PointerPhase::Up;
                self.pointer.update(|state| PointerState { down: false, ..*state });
            }
            PointerEvent::Leave { id } => {
                if self.is_foreign(id) {
                    return;
                }
                // Capture stays with this pointer until Up
                self.pointer.update(|state| PointerState { down: false, ..*state });
            }
        }
    }

    /// Pull the stored position back inside a resized canvas
    pub fn refit(&self, viewport: &Viewport) {
        let state = self.pointer.read();
        let at = viewport.clamp(Vec2::new(state.x, state.y));
        if at.x != state.x || at.y != state.y {
            self.pointer.write(PointerState { x: at.x, y: at.y, ..state });
        }
    }

    fn is_foreign(&self, id: PointerId) -> bool {
        matches!(self.captured, Some(captured) if captured != id)
    }
}
