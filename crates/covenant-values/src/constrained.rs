//! A value gated by an unordered set of predicates.

use std::fmt;

use covenant_types::{ContractViolation, Enforce, Predicate};

/// Value that satisfies every registered constraint at all times.
///
/// Constraints are tested in registration order and the first one that fails
/// is named in the violation. Appending a constraint is forward-looking only:
/// the value already stored is not re-validated.
pub struct Constrained<T> {
    value: T,
    constraints: Vec<Predicate<T>>,
}

impl<T: fmt::Debug> Constrained<T> {
    /// Wrap `value`, validating it against `constraints` first.
    pub fn try_new(
        value: T,
        constraints: impl IntoIterator<Item = Predicate<T>>,
    ) -> Result<Self, ContractViolation> {
        let constraints: Vec<_> = constraints.into_iter().collect();
        if let Some(failed) = first_unsatisfied(&constraints, &value) {
            return Err(ContractViolation::Construction {
                wrapper: "Constrained",
                predicate: failed.name().to_string(),
                value: format!("{value:?}"),
            });
        }
        Ok(Self { value, constraints })
    }

    /// Fail-fast counterpart of [`Self::try_new`].
    #[track_caller]
    pub fn new(value: T, constraints: impl IntoIterator<Item = Predicate<T>>) -> Self {
        Self::try_new(value, constraints).enforce()
    }

    /// Commit `value` if every constraint accepts it. On failure the stored
    /// value is left untouched.
    pub fn try_write(&mut self, value: T) -> Result<(), ContractViolation> {
        if let Some(failed) = first_unsatisfied(&self.constraints, &value) {
            return Err(ContractViolation::ConstraintUnsatisfied {
                predicate: failed.name().to_string(),
                value: format!("{value:?}"),
            });
        }
        tracing::trace!(value = ?value, "constrained write committed");
        self.value = value;
        Ok(())
    }

    #[track_caller]
    pub fn write(&mut self, value: T) {
        self.try_write(value).enforce()
    }
}

impl<T> Constrained<T> {
    pub fn read(&self) -> &T {
        &self.value
    }

    pub fn add_constraint(&mut self, constraint: Predicate<T>) {
        self.constraints.push(constraint);
    }

    pub fn constraint_names(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(Predicate::name)
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Constrained<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constrained")
            .field("value", &self.value)
            .field("constraints", &self.constraints)
            .finish()
    }
}

fn first_unsatisfied<'a, T>(constraints: &'a [Predicate<T>], value: &T) -> Option<&'a Predicate<T>> {
    constraints.iter().find(|p| !p.test(value))
}
