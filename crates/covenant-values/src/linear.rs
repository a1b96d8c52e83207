//! A value whose legal evolution is a fixed, ordered sequence of shapes.
//!
//! Each successful write consumes the head of the predicate queue. Once the
//! queue is empty, [`Strictness`] decides between freezing the value
//! ([`Strictness::Exact`]) and accepting anything from then on
//! ([`Strictness::Inexact`]).

use std::collections::VecDeque;
use std::fmt;

use covenant_types::{ContractViolation, Enforce, Predicate};

/// Behaviour once every predicate of the sequence has been consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Every write after exhaustion is a violation.
    #[default]
    Exact,
    /// Every write after exhaustion is accepted without validation.
    Inexact,
}

pub struct Linear<T> {
    value: T,
    remaining: VecDeque<Predicate<T>>,
    consumed: usize,
    strictness: Strictness,
}

impl<T: fmt::Debug> Linear<T> {
    /// Wrap `value` without checking it. The first write is tested against
    /// the first predicate of `sequence`.
    pub fn new(
        value: T,
        strictness: Strictness,
        sequence: impl IntoIterator<Item = Predicate<T>>,
    ) -> Self {
        Self {
            value,
            remaining: sequence.into_iter().collect(),
            consumed: 0,
            strictness,
        }
    }

    /// Wrap `value` as the first step of `sequence`: it must satisfy, and
    /// consumes, the head predicate. Lets a lifecycle list its starting shape.
    pub fn try_entered(
        value: T,
        strictness: Strictness,
        sequence: impl IntoIterator<Item = Predicate<T>>,
    ) -> Result<Self, ContractViolation> {
        let mut linear = Self::new(value, strictness, sequence);
        if let Some(head) = linear.remaining.pop_front() {
            if !head.test(&linear.value) {
                return Err(ContractViolation::Construction {
                    wrapper: "Linear",
                    predicate: head.name().to_string(),
                    value: format!("{:?}", linear.value),
                });
            }
            linear.consumed = 1;
        }
        Ok(linear)
    }

    #[track_caller]
    pub fn entered(
        value: T,
        strictness: Strictness,
        sequence: impl IntoIterator<Item = Predicate<T>>,
    ) -> Self {
        Self::try_entered(value, strictness, sequence).enforce()
    }

    pub fn try_write(&mut self, value: T) -> Result<(), ContractViolation> {
        if self.remaining.is_empty() {
            return match self.strictness {
                Strictness::Exact => Err(ContractViolation::SequenceExhausted {
                    value: format!("{value:?}"),
                }),
                Strictness::Inexact => {
                    self.value = value;
                    Ok(())
                }
            };
        }

        let head = &self.remaining[0];
        if !head.test(&value) {
            return Err(ContractViolation::SequenceStepUnsatisfied {
                position: self.consumed,
                predicate: head.name().to_string(),
                value: format!("{value:?}"),
            });
        }

        tracing::trace!(position = self.consumed, value = ?value, "sequence step committed");
        self.remaining.pop_front();
        self.consumed += 1;
        self.value = value;
        Ok(())
    }

    #[track_caller]
    pub fn write(&mut self, value: T) {
        self.try_write(value).enforce()
    }
}

impl<T> Linear<T> {
    pub fn read(&self) -> &T {
        &self.value
    }

    /// Number of predicates still waiting to be consumed.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }
}

impl<T: fmt::Debug> fmt::Debug for Linear<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linear")
            .field("value", &self.value)
            .field("remaining", &self.remaining)
            .field("strictness", &self.strictness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::panic_on_violation;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Lifestep {
        Innocence,
        Adulthood,
        Maturity,
    }

    fn is(step: Lifestep) -> Predicate<Lifestep> {
        Predicate::new(format!("is {step:?}"), move |v: &Lifestep| *v == step)
    }

    fn lifecycle() -> [Predicate<Lifestep>; 3] {
        [
            is(Lifestep::Innocence),
            is(Lifestep::Adulthood),
            is(Lifestep::Maturity),
        ]
    }

    fn thresholds() -> [Predicate<i32>; 3] {
        [
            Predicate::new("> 1", |v: &i32| *v > 1),
            Predicate::new("> 10", |v: &i32| *v > 10),
            Predicate::new("> 100", |v: &i32| *v > 100),
        ]
    }

    #[test]
    fn exact_sequence_consumes_one_predicate_per_write_then_freezes() {
        let mut v = Linear::new(0, Strictness::Exact, thresholds());
        assert_eq!(v.remaining(), 3);

        v.try_write(5).unwrap();
        v.try_write(50).unwrap();
        v.try_write(500).unwrap();
        assert!(v.is_exhausted());

        let err = v.try_write(5000).unwrap_err();
        assert_eq!(
            err,
            ContractViolation::SequenceExhausted {
                value: "5000".into()
            }
        );
        assert_eq!(*v.read(), 500);
    }

    #[test]
    fn failed_step_leaves_queue_and_value_unchanged() {
        let mut v = Linear::new(0, Strictness::Exact, thresholds());
        v.try_write(5).unwrap();

        let err = v.try_write(6).unwrap_err();
        similar_asserts::assert_eq!(
            err,
            ContractViolation::SequenceStepUnsatisfied {
                position: 1,
                predicate: "> 10".into(),
                value: "6".into(),
            }
        );
        assert_eq!(*v.read(), 5);
        assert_eq!(v.remaining(), 2);

        v.try_write(11).unwrap();
        assert_eq!(v.remaining(), 1);
    }

    #[test]
    fn inexact_sequence_accepts_anything_after_exhaustion() {
        let mut v = Linear::new(0, Strictness::Inexact, thresholds());
        v.write(2);
        v.write(20);
        v.write(200);
        v.try_write(-7).unwrap();
        v.try_write(3).unwrap();
        assert_eq!(*v.read(), 3);
        assert_eq!(v.strictness(), Strictness::Inexact);
    }

    #[test]
    fn inexact_still_validates_before_exhaustion() {
        let mut v = Linear::new(0, Strictness::Inexact, thresholds());
        assert!(v.try_write(0).is_err());
    }

    #[test]
    fn initial_value_is_unchecked_by_default() {
        let mut life = Linear::new(Lifestep::Maturity, Strictness::Exact, lifecycle());
        life.write(Lifestep::Innocence);
        assert_eq!(life.remaining(), 2);
    }

    #[test]
    fn entered_lifecycle_starts_past_its_first_shape() {
        let mut life = Linear::entered(Lifestep::Innocence, Strictness::Exact, lifecycle());
        assert_eq!(life.remaining(), 2);

        life.write(Lifestep::Adulthood);
        life.write(Lifestep::Maturity);
        assert_eq!(*life.read(), Lifestep::Maturity);
        assert!(life.try_write(Lifestep::Innocence).is_err());
    }

    #[test]
    fn entered_rejects_a_wrong_starting_shape() {
        let err = Linear::try_entered(Lifestep::Adulthood, Strictness::Exact, lifecycle())
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Linear rejected initial value Adulthood: `is Innocence` not satisfied");
    }

    #[test]
    #[should_panic(expected = "predicate sequence is exhausted and exact")]
    fn exact_write_after_exhaustion_fails_fast() {
        panic_on_violation();
        let mut life = Linear::entered(Lifestep::Innocence, Strictness::Exact, lifecycle());
        life.write(Lifestep::Adulthood);
        life.write(Lifestep::Maturity);
        life.write(Lifestep::Maturity);
    }
}
