//! Value containers that enforce a contract on every read and write.
//!
//! - [`Constrained`]: all registered predicates hold after every write.
//! - [`Linear`]: writes walk an ordered predicate sequence, one step each.
//! - [`Unique`]: each fill can be read exactly once.
//! - [`Modal`]: conditions switch on when a trigger matches and stay
//!   enforced until discarded.
//! - [`Stateful`]: writes follow a deterministic transition graph.
//!
//! Every fatal operation has a `try_*` counterpart that returns the
//! [`ContractViolation`](covenant_types::ContractViolation) instead of
//! failing fast. None of the wrappers synchronize: each one assumes a single
//! writer.

mod constrained;
mod linear;
mod modal;
pub mod stateful;
mod unique;

pub use constrained::Constrained;
pub use linear::{Linear, Strictness};
pub use modal::{Condition, Discard, Modal};
pub use stateful::{GraphBuilder, State, StateId, Stateful, TransitionGraph};
pub use unique::Unique;

#[cfg(test)]
pub(crate) mod test_support {
    use covenant_types::{EnforcementConfig, FailureMode};

    /// Fail-fast paths abort by default, which would take the test harness
    /// down with them.
    pub(crate) fn panic_on_violation() {
        EnforcementConfig::default()
            .failure_mode(FailureMode::Panic)
            .install();
    }
}
