//! Values whose writes are gated by a deterministic finite automaton.
//!
//! The current state's predicate always holds for the stored value. A write
//! is legal only when exactly one successor of the current state accepts the
//! new value: zero matches is a data error, several matches is a defect in
//! the graph and is reported as such.

mod graph;

pub use graph::{GraphBuilder, State, StateId, TransitionGraph};

use std::fmt;

use covenant_types::{ContractViolation, Enforce};

pub struct Stateful<V> {
    value: V,
    current: StateId,
    graph: TransitionGraph<V>,
}

impl<V: fmt::Debug> Stateful<V> {
    /// Bind `value` to the graph's initial state, whose predicate it must
    /// satisfy.
    pub fn try_new(value: V, graph: TransitionGraph<V>) -> Result<Self, ContractViolation> {
        let initial = graph.node(graph.initial());
        if !initial.accepts(&value) {
            return Err(ContractViolation::InitialStateRejected {
                state: initial.name().to_string(),
                value: format!("{value:?}"),
            });
        }
        Ok(Self {
            value,
            current: graph.initial(),
            graph,
        })
    }

    #[track_caller]
    pub fn new(value: V, graph: TransitionGraph<V>) -> Self {
        Self::try_new(value, graph).enforce()
    }

    pub fn try_write(&mut self, value: V) -> Result<(), ContractViolation> {
        let from = self.graph.node(self.current);
        let matches: Vec<StateId> = from
            .successors()
            .filter(|&id| self.graph.node(id).accepts(&value))
            .collect();

        let next = match matches.as_slice() {
            [next] => *next,
            [] => {
                return Err(ContractViolation::NoMatchingTransition {
                    state: from.name().to_string(),
                    value: format!("{value:?}"),
                });
            }
            _ => {
                return Err(ContractViolation::AmbiguousTransition {
                    state: from.name().to_string(),
                    candidates: matches
                        .iter()
                        .map(|&id| self.graph.node(id).name().to_string())
                        .collect(),
                    value: format!("{value:?}"),
                });
            }
        };

        tracing::trace!(
            from = %from.name(),
            to = %self.graph.node(next).name(),
            "state transition"
        );
        self.current = next;
        self.value = value;
        Ok(())
    }

    #[track_caller]
    pub fn write(&mut self, value: V) {
        self.try_write(value).enforce()
    }
}

impl<V> Stateful<V> {
    pub fn read(&self) -> &V {
        &self.value
    }

    /// Name of the state the stored value belongs to.
    pub fn current_state(&self) -> &str {
        self.graph.node(self.current).name()
    }

    pub fn current_state_id(&self) -> StateId {
        self.current
    }

    pub fn graph(&self) -> &TransitionGraph<V> {
        &self.graph
    }
}

impl<V: fmt::Debug> fmt::Debug for Stateful<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stateful")
            .field("value", &self.value)
            .field("current", &self.current_state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use covenant_types::{Predicate, Violation};

    use super::*;
    use crate::test_support::panic_on_violation;

    fn is_empty() -> Predicate<String> {
        Predicate::new("empty", |s: &String| s.is_empty())
    }

    /// Two-state cycle: the string's emptiness alternates on every write.
    fn oscillator() -> TransitionGraph<String> {
        let mut builder = GraphBuilder::new();
        let empty = builder.add_state("empty string", is_empty()).unwrap();
        let full = builder
            .add_state("non empty string", is_empty().negate())
            .unwrap();
        builder
            .connect(empty, full)
            .unwrap()
            .connect(full, empty)
            .unwrap();
        builder.build(empty).unwrap()
    }

    #[test_log::test]
    fn oscillates_indefinitely_without_accumulating_state() {
        let mut text = Stateful::new(String::new(), oscillator());
        assert_eq!(text.current_state(), "empty string");

        for _ in 0..100 {
            text.write("Full".into());
            assert_eq!(text.current_state(), "non empty string");
            text.write(String::new());
            assert_eq!(text.current_state(), "empty string");
        }
        assert_eq!(text.graph().len(), 2);
    }

    #[test]
    fn initial_value_must_match_initial_state() {
        let err = Stateful::try_new("Full".to_string(), oscillator()).unwrap_err();
        similar_asserts::assert_eq!(
            err,
            ContractViolation::InitialStateRejected {
                state: "empty string".into(),
                value: "\"Full\"".into(),
            }
        );
        insta::assert_snapshot!(err.to_string(), @r#"initial value "Full" does not belong to initial state `empty string`"#);
        assert_eq!(err.kind(), covenant_types::ViolationKind::Construction);
    }

    #[test]
    fn no_matching_successor_leaves_state_unchanged() {
        let mut text = Stateful::new(String::new(), oscillator());
        let err = text.try_write(String::new()).unwrap_err();
        similar_asserts::assert_eq!(
            err,
            ContractViolation::NoMatchingTransition {
                state: "empty string".into(),
                value: "\"\"".into(),
            }
        );
        assert!(!err.is_configuration_defect());
        assert_eq!(text.current_state(), "empty string");
        assert_eq!(text.read(), "");
    }

    #[test]
    fn ambiguous_transition_is_a_configuration_defect() {
        let mut builder = GraphBuilder::new();
        let start = builder.add_state("start", is_empty()).unwrap();
        let short = builder
            .add_state("short", Predicate::new("len < 3", |s: &String| s.len() < 3))
            .unwrap();
        let full = builder
            .add_state("non-empty", is_empty().negate())
            .unwrap();
        builder
            .connect(start, short)
            .unwrap()
            .connect(start, full)
            .unwrap();
        let mut text = Stateful::new(String::new(), builder.build(start).unwrap());

        let err = text.try_write("a".into()).unwrap_err();
        similar_asserts::assert_eq!(
            err,
            ContractViolation::AmbiguousTransition {
                state: "start".into(),
                candidates: vec!["short".into(), "non-empty".into()],
                value: "\"a\"".into(),
            }
        );
        assert!(err.is_configuration_defect());
        assert_eq!(text.current_state(), "start");

        text.write("abcd".into());
        assert_eq!(text.current_state(), "non-empty");
    }

    #[test]
    fn reads_do_not_change_state() {
        let mut text = Stateful::new(String::new(), oscillator());
        text.write("x".into());
        let before = text.current_state_id();
        for _ in 0..3 {
            assert_eq!(text.read(), "x");
        }
        assert_eq!(text.current_state_id(), before);
    }

    #[test]
    #[should_panic(expected = "no successor of state `non empty string` accepts value \"again\"")]
    fn illegal_write_fails_fast() {
        panic_on_violation();
        let mut text = Stateful::new(String::new(), oscillator());
        text.write("Full".into());
        text.write("again".into());
    }
}
