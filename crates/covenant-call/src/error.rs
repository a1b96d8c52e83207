use std::fmt;

use covenant_types::{Violation, ViolationKind};
use thiserror::Error;

/// Why a contracted call did not produce a value.
///
/// Returned by [`FunctionContract::try_invoke`](crate::FunctionContract::try_invoke).
/// `index` is the position of the failing predicate in registration order.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum CallError<E> {
    #[error("precondition #{index} `{predicate}` not satisfied")]
    Precondition { index: usize, predicate: String },
    #[error("postcondition #{index} `{predicate}` not satisfied")]
    Postcondition { index: usize, predicate: String },
    #[error("wrapped callable failed: {0}")]
    Target(E),
}

impl<E> CallError<E> {
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }

    pub fn is_postcondition(&self) -> bool {
        matches!(self, Self::Postcondition { .. })
    }

    /// The wrapped callable's own error, if that is what failed.
    pub fn into_target(self) -> Option<E> {
        match self {
            Self::Target(err) => Some(err),
            _ => None,
        }
    }
}

impl<E: fmt::Display> Violation for CallError<E> {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Call
    }
}
