pub mod enforcement;
pub mod error;
pub mod predicate;

pub use enforcement::{Enforce, EnforcementConfig, FailureMode, fail_fast, failure_mode};
pub use error::{ContractViolation, Violation, ViolationKind};
pub use predicate::Predicate;
