//! Consume-once slot: every fill can be read exactly once.

use covenant_types::{ContractViolation, Enforce};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unique<T> {
    slot: Option<T>,
}

impl<T> Unique<T> {
    pub fn new(value: T) -> Self {
        Self { slot: Some(value) }
    }

    /// A slot that has nothing to hand out until it is filled.
    pub fn empty() -> Self {
        Self { slot: None }
    }

    /// Move the value out, leaving the slot empty.
    pub fn try_read(&mut self) -> Result<T, ContractViolation> {
        self.slot.take().ok_or(ContractViolation::AlreadyConsumed)
    }

    #[track_caller]
    pub fn read(&mut self) -> T {
        self.try_read().enforce()
    }

    /// Store `value`, replacing whatever the slot held.
    pub fn fill(&mut self, value: T) {
        if self.slot.is_some() {
            tracing::trace!("unique slot overwritten before it was read");
        }
        self.slot = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
