use std::convert::Infallible;
use std::fmt;

use covenant_types::{Enforce, Predicate};

use crate::error::CallError;

type Target<Args, R, E> = Box<dyn Fn(&Args) -> Result<R, E>>;
type Hook<Args> = Box<dyn Fn(&Args)>;

/// A callable wrapped in a call-boundary contract.
///
/// Each invocation runs, in order:
/// 1. every before-hook (side effects only, they cannot reject the call);
/// 2. every precondition, stopping at the first that fails;
/// 3. the target, whose error is propagated as [`CallError::Target`];
/// 4. every postcondition on the result, stopping at the first that fails;
/// 5. every after-hook, exactly once, whichever of the above failed and
///    even if the target panicked.
///
/// [`try_invoke`](Self::try_invoke) surfaces failures as a [`CallError`];
/// [`invoke`](Self::invoke) trusts the contract and fails fast instead.
pub struct FunctionContract<Args, R, E = Infallible> {
    target: Target<Args, R, E>,
    preconditions: Vec<Predicate<Args>>,
    postconditions: Vec<Predicate<R>>,
    before: Vec<Hook<Args>>,
    after: Vec<Hook<Args>>,
}

impl<Args, R, E> FunctionContract<Args, R, E> {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&Args) -> Result<R, E> + 'static,
    {
        Self {
            target: Box::new(target),
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Swap the wrapped callable, keeping every hook and predicate.
    pub fn replace_target<F>(&mut self, target: F)
    where
        F: Fn(&Args) -> Result<R, E> + 'static,
    {
        self.target = Box::new(target);
    }

    pub fn before_call<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Args) + 'static,
    {
        self.before.push(Box::new(hook));
        self
    }

    pub fn after_call<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Args) + 'static,
    {
        self.after.push(Box::new(hook));
        self
    }

    pub fn add_precondition(&mut self, precondition: Predicate<Args>) -> &mut Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn add_postcondition(&mut self, postcondition: Predicate<R>) -> &mut Self {
        self.postconditions.push(postcondition);
        self
    }

    /// Run the call pipeline, reporting any violation to the caller.
    pub fn try_invoke(&self, args: Args) -> Result<R, CallError<E>> {
        let _after = AfterCall {
            hooks: &self.after,
            args: &args,
        };

        for hook in &self.before {
            hook(&args);
        }

        if let Some((index, failed)) = first_unsatisfied(&self.preconditions, &args) {
            tracing::debug!(index, predicate = failed.name(), "precondition rejected call");
            return Err(CallError::Precondition {
                index,
                predicate: failed.name().to_string(),
            });
        }

        let result = (self.target)(&args).map_err(CallError::Target)?;

        if let Some((index, failed)) = first_unsatisfied(&self.postconditions, &result) {
            tracing::debug!(index, predicate = failed.name(), "postcondition rejected result");
            return Err(CallError::Postcondition {
                index,
                predicate: failed.name().to_string(),
            });
        }

        Ok(result)
    }

    /// Run the call pipeline and fail fast on any violation, including a
    /// failure of the target itself.
    #[track_caller]
    pub fn invoke(&self, args: Args) -> R
    where
        E: fmt::Display,
    {
        self.try_invoke(args).enforce()
    }
}

impl<Args: 'static, R: 'static> FunctionContract<Args, R, Infallible> {
    /// Wrap a target that cannot fail on its own.
    pub fn infallible<F>(target: F) -> Self
    where
        F: Fn(&Args) -> R + 'static,
    {
        Self::new(move |args: &Args| Ok(target(args)))
    }
}

impl<Args, R, E> fmt::Debug for FunctionContract<Args, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionContract")
            .field("preconditions", &self.preconditions)
            .field("postconditions", &self.postconditions)
            .field("before_hooks", &self.before.len())
            .field("after_hooks", &self.after.len())
            .finish_non_exhaustive()
    }
}

/// Runs the after-hooks when dropped, so every exit path of
/// [`FunctionContract::try_invoke`] triggers them once.
struct AfterCall<'a, Args> {
    hooks: &'a [Hook<Args>],
    args: &'a Args,
}

impl<Args> Drop for AfterCall<'_, Args> {
    fn drop(&mut self) {
        for hook in self.hooks {
            hook(self.args);
        }
    }
}

fn first_unsatisfied<'a, T>(
    predicates: &'a [Predicate<T>],
    value: &T,
) -> Option<(usize, &'a Predicate<T>)> {
    predicates.iter().enumerate().find(|(_, p)| !p.test(value))
}
