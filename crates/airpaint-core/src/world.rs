use crate::store::Store;
use crate::{BrushState, CanvasSize, PointerState, WindState};

/// The four state cells a canvas session reads from.
///
/// The session never owns the values: settings widgets, key bindings and
/// scripted strokes write to these stores and the session mirrors them to
/// the GPU.
#[derive(Clone)]
pub struct World {
    pub pointer: Store<PointerState>,
    pub brush: Store<BrushState>,
    pub wind: Store<WindState>,
    pub size: Store<CanvasSize>,
}

impl World {
    pub fn new(brush: BrushState, wind: WindState) -> Self {
        Self {
            pointer: Store::new(PointerState::default()),
            brush: Store::new(brush),
            wind: Store::new(wind),
            size: Store::new(CanvasSize::default()),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(BrushState::default(), WindState::default())
    }
}
