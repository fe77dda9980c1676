//! Airpaint Core Engine
//!
//! GPU-resident fluid-paint canvas: subscribable state stores mirrored into
//! uniform buffers, double-buffered pigment and water fields, and a
//! simulate-then-present frame loop with ordered teardown.

pub mod error;
pub mod frame;
pub mod gpu;
pub mod input;
pub mod session;
pub mod shaders;
pub mod store;
pub mod teardown;
pub mod world;

// Re-export main types
pub use error::PipelineError;
pub use frame::{FrameLoop, FramePlan, FrameScheduler, ManualScheduler, Parity};
pub use gpu::*;
pub use input::{ContentRect, PointerEvent, PointerId, PointerInput, PointerPhase, Viewport};
pub use session::{Airpaint, FrameOutcome, Props};
pub use store::{Store, Subscription};
pub use teardown::Teardown;
pub use world::World;

// Re-export params from airpaint-params
pub use airpaint_params::*;
