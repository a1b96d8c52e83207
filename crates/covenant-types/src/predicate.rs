use std::any::type_name;
use std::borrow::Cow;
use std::fmt;

/// A named, pure boolean test over a value.
///
/// Every wrapper in the workspace is built out of predicates. The name is
/// carried into the violation raised when the test fails, so prefer
/// [`Predicate::new`] with a short description of what an accepted value
/// looks like. [`Predicate::from_fn`] falls back to the closure's type name.
///
/// Predicates are assumed to be pure: wrappers evaluate them any number of
/// times and rely on the same value always producing the same answer.
pub struct Predicate<T: ?Sized> {
    name: Cow<'static, str>,
    test: Box<dyn Fn(&T) -> bool>,
}

impl<T: ?Sized> Predicate<T> {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, test: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        Self {
            name: name.into(),
            test: Box::new(test),
        }
    }

    /// Anonymous predicate, named after the closure type.
    pub fn from_fn<F>(test: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        Self {
            name: Cow::Borrowed(type_name::<F>()),
            test: Box::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, value: &T) -> bool {
        (self.test)(value)
    }
}

impl<T: ?Sized + 'static> Predicate<T> {
    /// Holds when both `self` and `other` hold. `other` is not evaluated when
    /// `self` already fails.
    pub fn and(self, other: Predicate<T>) -> Self {
        let name = format!("{} && {}", self.name, other.name);
        Self::new(name, move |value: &T| self.test(value) && other.test(value))
    }

    pub fn negate(self) -> Self {
        let name = format!("!({})", self.name);
        Self::new(name, move |value: &T| !self.test(value))
    }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .finish()
    }
}
