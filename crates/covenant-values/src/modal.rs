//! Values whose invariants switch on while the program runs.
//!
//! A [`Condition`] starts out pending. The first written value that matches
//! its trigger activates it, and from then on its check must pass on every
//! read and write, starting with the activating value itself. An active
//! condition whose discard predicate matches an accessed value is released
//! for good.
//!
//! Every access runs in two phases, in registration order:
//! 1. the checks of all active conditions, then the release of those whose
//!    discard predicate matches;
//! 2. on writes only, the triggers of pending conditions.
//!
//! Writes are all-or-nothing: if any check fails (including the check of a
//! condition the write would activate) neither the value nor the condition
//! sets change.

use std::fmt;

use covenant_types::{ContractViolation, Enforce, Predicate};

type Check<V> = Box<dyn Fn(&V) -> Result<(), String>>;

/// When an active condition stops being enforced.
pub enum Discard<V> {
    Never,
    When(Predicate<V>),
}

pub struct Condition<V> {
    description: String,
    trigger: Predicate<V>,
    check: Check<V>,
    discard: Discard<V>,
}

impl<V> Condition<V> {
    /// `check` returns the reason for rejecting a value as its error.
    pub fn new<F>(description: impl Into<String>, trigger: Predicate<V>, check: F) -> Self
    where
        F: Fn(&V) -> Result<(), String> + 'static,
    {
        Self {
            description: description.into(),
            trigger,
            check: Box::new(check),
            discard: Discard::Never,
        }
    }

    pub fn discard_when(mut self, discard: Predicate<V>) -> Self {
        self.discard = Discard::When(discard);
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn discards(&self, value: &V) -> bool {
        match &self.discard {
            Discard::Never => false,
            Discard::When(p) => p.test(value),
        }
    }
}

impl<V: 'static> Condition<V> {
    /// Condition whose check is a plain predicate.
    pub fn requiring(
        description: impl Into<String>,
        trigger: Predicate<V>,
        requirement: Predicate<V>,
    ) -> Self {
        Self::new(description, trigger, move |value: &V| {
            if requirement.test(value) {
                Ok(())
            } else {
                Err(format!("`{}` not satisfied", requirement.name()))
            }
        })
    }
}

impl<V: fmt::Debug> Condition<V> {
    fn enforce_on(&self, value: &V) -> Result<(), ContractViolation> {
        (self.check)(value).map_err(|reason| ContractViolation::ConditionViolated {
            condition: self.description.clone(),
            value: format!("{value:?}"),
            reason,
        })
    }
}

impl<V> fmt::Debug for Condition<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

pub struct Modal<V> {
    value: V,
    pending: Vec<Condition<V>>,
    active: Vec<Condition<V>>,
}

impl<V: fmt::Debug> Modal<V> {
    /// Every condition starts pending. The initial value triggers nothing:
    /// only writes activate conditions.
    pub fn new(value: V, conditions: impl IntoIterator<Item = Condition<V>>) -> Self {
        Self {
            value,
            pending: conditions.into_iter().collect(),
            active: Vec::new(),
        }
    }

    pub fn try_write(&mut self, value: V) -> Result<(), ContractViolation> {
        for condition in &self.active {
            condition.enforce_on(&value)?;
        }
        for condition in self.pending.iter().filter(|c| c.trigger.test(&value)) {
            condition.enforce_on(&value)?;
        }

        release(&mut self.active, &value);
        for condition in std::mem::take(&mut self.pending) {
            if condition.trigger.test(&value) {
                tracing::debug!(condition = %condition.description, value = ?value, "condition activated");
                self.active.push(condition);
            } else {
                self.pending.push(condition);
            }
        }
        self.value = value;
        Ok(())
    }

    #[track_caller]
    pub fn write(&mut self, value: V) {
        self.try_write(value).enforce()
    }

    /// Reads run the active checks too, and may release conditions.
    pub fn try_read(&mut self) -> Result<&V, ContractViolation> {
        for condition in &self.active {
            condition.enforce_on(&self.value)?;
        }
        let Self { value, active, .. } = self;
        release(active, value);
        Ok(&self.value)
    }

    #[track_caller]
    pub fn read(&mut self) -> &V {
        self.try_read().enforce()
    }
}

impl<V> Modal<V> {
    /// Register a condition after construction. It starts pending and is
    /// first considered on the next write.
    pub fn add_condition(&mut self, condition: Condition<V>) {
        self.pending.push(condition);
    }

    pub fn active_conditions(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(Condition::description)
    }

    pub fn pending_conditions(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(Condition::description)
    }
}

impl<V: fmt::Debug> fmt::Debug for Modal<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modal")
            .field("value", &self.value)
            .field("pending", &self.pending)
            .field("active", &self.active)
            .finish()
    }
}

fn release<V: fmt::Debug>(active: &mut Vec<Condition<V>>, value: &V) {
    active.retain(|condition| {
        let discarded = condition.discards(value);
        if discarded {
            tracing::debug!(condition = %condition.description, value = ?value, "condition discarded");
        }
        !discarded
    });
}
