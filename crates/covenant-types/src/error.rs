use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical category of a contract violation.
///
/// Coarse-grained on purpose: it decides the propagation policy and is the
/// dimension logged alongside every fail-fast diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// An initial value or a wrapper configuration fails the wrapper's own
    /// invariant at creation time.
    Construction,
    /// A read or write breaks a constraint, ordered predicate, consume-once
    /// slot or active condition.
    Access,
    /// Zero or several successor states accept a written value.
    Transition,
    /// A callable member is not wrapped by the contract type, or is invoked
    /// without its execution context.
    Declaration,
    /// Precondition, postcondition or wrapped-callable failure.
    ///
    /// The only category with a recoverable path.
    Call,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction => write!(f, "construction"),
            Self::Access => write!(f, "access"),
            Self::Transition => write!(f, "transition"),
            Self::Declaration => write!(f, "declaration"),
            Self::Call => write!(f, "call"),
        }
    }
}

/// Anything that can be routed through the fail-fast channel.
///
/// Implemented by [`ContractViolation`] and by the call pipeline's error
/// type, which is why the two channels share this trait and nothing else.
pub trait Violation: fmt::Display {
    fn kind(&self) -> ViolationKind;

    /// Whether the violation points at a defect in the wrapper's
    /// configuration rather than at the data that was written.
    fn is_configuration_defect(&self) -> bool {
        false
    }
}

/// A value-level contract violation.
///
/// Values are rendered with their `Debug` representation at the point of
/// failure so the diagnostic survives the value being dropped.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("{wrapper} rejected initial value {value}: `{predicate}` not satisfied")]
    Construction {
        wrapper: &'static str,
        predicate: String,
        value: String,
    },
    #[error("initial value {value} does not belong to initial state `{state}`")]
    InitialStateRejected { state: String, value: String },
    #[error("state `{name}` is already registered in this graph")]
    DuplicateState { name: String },
    /// `handle` is the `Debug` rendering of a handle minted by another
    /// builder, or of one this builder never issued.
    #[error("state handle {handle} was not registered with this graph builder")]
    UnknownState { handle: String },

    #[error("constraint `{predicate}` not satisfied by value {value}")]
    ConstraintUnsatisfied { predicate: String, value: String },
    /// `position` counts the predicates consumed before this one.
    #[error("sequence predicate #{position} `{predicate}` not satisfied by value {value}")]
    SequenceStepUnsatisfied {
        position: usize,
        predicate: String,
        value: String,
    },
    #[error("predicate sequence is exhausted and exact, write of {value} rejected")]
    SequenceExhausted { value: String },
    #[error("value has already been consumed and was not refilled")]
    AlreadyConsumed,
    #[error("active condition `{condition}` violated by value {value}: {reason}")]
    ConditionViolated {
        condition: String,
        value: String,
        reason: String,
    },

    #[error("no successor of state `{state}` accepts value {value}")]
    NoMatchingTransition { state: String, value: String },
    #[error(
        "ambiguous transition from state `{state}`: {count} successors accept value {value} ({names})",
        count = .candidates.len(),
        names = .candidates.join(", ")
    )]
    AmbiguousTransition {
        state: String,
        candidates: Vec<String>,
        value: String,
    },

    #[error("member `{member}` is callable but not wrapped as a behaviour")]
    UndeclaredBehaviour { member: String },
    #[error("behaviour `{member}` invoked before an execution context was injected")]
    MissingContext { member: String },
}

impl Violation for ContractViolation {
    fn kind(&self) -> ViolationKind {
        match self {
            Self::Construction { .. }
            | Self::InitialStateRejected { .. }
            | Self::DuplicateState { .. }
            | Self::UnknownState { .. } => ViolationKind::Construction,
            Self::ConstraintUnsatisfied { .. }
            | Self::SequenceStepUnsatisfied { .. }
            | Self::SequenceExhausted { .. }
            | Self::AlreadyConsumed
            | Self::ConditionViolated { .. } => ViolationKind::Access,
            Self::NoMatchingTransition { .. } | Self::AmbiguousTransition { .. } => {
                ViolationKind::Transition
            }
            Self::UndeclaredBehaviour { .. } | Self::MissingContext { .. } => {
                ViolationKind::Declaration
            }
        }
    }

    fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousTransition { .. }
                | Self::DuplicateState { .. }
                | Self::UnknownState { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_predicate_and_value() {
        let v = ContractViolation::ConstraintUnsatisfied {
            predicate: "age in 1..150".into(),
            value: "200".into(),
        };
        insta::assert_snapshot!(v.to_string(), @"constraint `age in 1..150` not satisfied by value 200");

        let v = ContractViolation::Construction {
            wrapper: "Constrained",
            predicate: "non-empty".into(),
            value: "\"\"".into(),
        };
        insta::assert_snapshot!(v.to_string(), @r#"Constrained rejected initial value "": `non-empty` not satisfied"#);

        let v = ContractViolation::InitialStateRejected {
            state: "empty string".into(),
            value: "\"Full\"".into(),
        };
        insta::assert_snapshot!(v.to_string(), @r#"initial value "Full" does not belong to initial state `empty string`"#);
    }

    #[test]
    fn ambiguous_transition_lists_every_candidate() {
        let v = ContractViolation::AmbiguousTransition {
            state: "start".into(),
            candidates: vec!["short".into(), "non-empty".into()],
            value: "\"a\"".into(),
        };
        insta::assert_snapshot!(v.to_string(), @r#"ambiguous transition from state `start`: 2 successors accept value "a" (short, non-empty)"#);
    }

    #[test]
    fn zero_and_multiple_matches_are_distinguishable() {
        let none = ContractViolation::NoMatchingTransition {
            state: "start".into(),
            value: "1".into(),
        };
        let many = ContractViolation::AmbiguousTransition {
            state: "start".into(),
            candidates: vec!["a".into(), "b".into()],
            value: "1".into(),
        };
        assert_eq!(none.kind(), ViolationKind::Transition);
        assert_eq!(many.kind(), ViolationKind::Transition);
        assert!(!none.is_configuration_defect());
        assert!(many.is_configuration_defect());
    }

    #[test]
    fn unknown_state_handle_is_a_configuration_defect() {
        let v = ContractViolation::UnknownState {
            handle: "StateId { graph: 3, index: 1 }".into(),
        };
        assert!(v.is_configuration_defect());
        insta::assert_snapshot!(v.to_string(), @"state handle StateId { graph: 3, index: 1 } was not registered with this graph builder");
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        let cases = [
            (
                ContractViolation::DuplicateState { name: "x".into() },
                ViolationKind::Construction,
            ),
            (
                ContractViolation::InitialStateRejected {
                    state: "idle".into(),
                    value: "1".into(),
                },
                ViolationKind::Construction,
            ),
            (
                ContractViolation::UnknownState {
                    handle: "StateId { graph: 9, index: 0 }".into(),
                },
                ViolationKind::Construction,
            ),
            (ContractViolation::AlreadyConsumed, ViolationKind::Access),
            (
                ContractViolation::SequenceExhausted { value: "1".into() },
                ViolationKind::Access,
            ),
            (
                ContractViolation::UndeclaredBehaviour {
                    member: "print".into(),
                },
                ViolationKind::Declaration,
            ),
        ];
        for (violation, kind) in cases {
            similar_asserts::assert_eq!(violation.kind(), kind);
        }
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ViolationKind::Construction).unwrap();
        assert_eq!(json, "\"construction\"");
        let kind: ViolationKind = serde_json::from_str("\"transition\"").unwrap();
        assert_eq!(kind, ViolationKind::Transition);
    }
}
