//! Frame scheduling and ping-pong parity

use std::cell::Cell;
use std::rc::Rc;

/// Selector of the "current" slot in every double-buffered texture pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parity {
    #[default]
    Even = 0,
    Odd = 1,
}

impl Parity {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn flipped(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

/// Texture slots one frame touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Slot the simulation reads
    pub read: Parity,
    /// Slot the simulation writes
    pub write: Parity,
    /// Slot the presentation samples; always equal to `read`
    pub present: Parity,
}

/// Owns the parity bit and counts submitted frames
#[derive(Debug, Default)]
pub struct FrameLoop {
    parity: Parity,
    submitted: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Slots for the next frame
    pub fn plan(&self) -> FramePlan {
        FramePlan {
            read: self.parity,
            write: self.parity.flipped(),
            present: self.parity,
        }
    }

    /// Record a submission; toggles parity exactly once
    pub fn commit(&mut self, plan: FramePlan) {
        debug_assert_eq!(plan.read, self.parity, "committed a plan from another frame");
        self.parity = self.parity.flipped();
        self.submitted += 1;
    }
}

/// Host hook that re-arms the per-refresh callback
pub trait FrameScheduler {
    /// Ask the host for one more frame callback at the next display refresh
    fn schedule_next_frame(&mut self);

    /// Drop any pending callback; later `schedule_next_frame` calls are ignored
    fn cancel(&mut self);
}

/// Scheduler for hosts that poll instead of receiving refresh callbacks
///
/// Clones share state, so the host keeps one clone while the session owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    armed: Rc<Cell<bool>>,
    cancelled: Rc<Cell<bool>>,
    requests: Rc<Cell<u64>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a pending frame request
    pub fn take(&self) -> bool {
        self.armed.replace(false)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Number of accepted `schedule_next_frame` calls
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next_frame(&mut self) {
        if self.cancelled.get() {
            return;
        }
        self.armed.set(true);
        self.requests.set(self.requests.get() + 1);
    }

    fn cancel(&mut self) {
        self.cancelled.set(true);
        self.armed.set(false);
    }
}
