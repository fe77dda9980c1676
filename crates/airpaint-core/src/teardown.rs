/// Stack of release steps run in reverse acquisition order
///
/// Each acquisition pushes the step that undoes it. [`Teardown::run`] pops
/// and runs them last-in first-out; a second run finds the stack empty.
#[derive(Default)]
pub struct Teardown {
    steps: Vec<(&'static str, Box<dyn FnOnce()>)>,
    completed: bool,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: &'static str, step: impl FnOnce() + 'static) {
        if self.completed {
            // Acquired after teardown: release immediately
            log::warn!("Teardown step '{}' registered after teardown; running now", label);
            step();
            return;
        }
        self.steps.push((label, Box::new(step)));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Pending step labels, last acquired first
    pub fn labels(&self) -> Vec<&'static str> {
        self.steps.iter().rev().map(|(label, _)| *label).collect()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Release everything; idempotent
    pub fn run(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        while let Some((label, step)) = self.steps.pop() {
            log::debug!("teardown: {}", label);
            step();
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<_> = self.steps.iter().map(|(label, _)| *label).collect();
        f.debug_struct("Teardown")
            .field("steps", &labels)
            .field("completed", &self.completed)
            .finish()
    }
}
