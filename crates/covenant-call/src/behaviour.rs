//! Callables that only run inside an injected serial execution context.
//!
//! An owning type hands every callable member it exposes to a
//! [`Declaration`], either as a [`Behaviour`] or as a bare callable.
//! [`Declaration::finalize`] rejects the first bare member, then injects one
//! shared [`SerialContext`] into every behaviour. Invoking a behaviour that
//! never received a context is a declaration violation too.

use std::sync::{Arc, Mutex, PoisonError};

use covenant_types::{ContractViolation, Enforce};

/// Runs jobs one at a time.
pub trait SerialContext: Send + Sync {
    /// Run `job` to completion before returning. Jobs of the same context
    /// never overlap.
    fn run(&self, job: &mut dyn FnMut());
}

/// Runs every job directly on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineContext;

impl SerialContext for InlineContext {
    fn run(&self, job: &mut dyn FnMut()) {
        job();
    }
}

/// Serializes jobs from any number of threads behind a mutex.
#[derive(Debug, Default)]
pub struct LockedContext {
    lock: Mutex<()>,
}

impl SerialContext for LockedContext {
    fn run(&self, job: &mut dyn FnMut()) {
        // A panicking job poisons nothing we rely on: the guarded data is `()`.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        job();
    }
}

pub struct Behaviour<Args> {
    name: String,
    body: Box<dyn Fn(Args)>,
    context: Option<Arc<dyn SerialContext>>,
}

impl<Args> Behaviour<Args> {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args) + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(body),
            context: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inject_context(&mut self, context: Arc<dyn SerialContext>) {
        self.context = Some(context);
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Run the body inside the injected context.
    pub fn try_invoke(&self, args: Args) -> Result<(), ContractViolation> {
        let context = self
            .context
            .as_ref()
            .ok_or_else(|| ContractViolation::MissingContext {
                member: self.name.clone(),
            })?;
        let mut args = Some(args);
        context.run(&mut || {
            if let Some(args) = args.take() {
                (self.body)(args);
            }
        });
        Ok(())
    }

    #[track_caller]
    pub fn invoke(&self, args: Args) {
        self.try_invoke(args).enforce()
    }
}

impl<Args> std::fmt::Debug for Behaviour<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behaviour")
            .field("name", &self.name)
            .field("has_context", &self.has_context())
            .finish()
    }
}

trait ContextTarget {
    fn receive(&mut self, context: Arc<dyn SerialContext>);
}

impl<Args> ContextTarget for Behaviour<Args> {
    fn receive(&mut self, context: Arc<dyn SerialContext>) {
        self.inject_context(context);
    }
}

enum Member<'a> {
    Behaviour(&'a mut dyn ContextTarget),
    Bare(String),
}

/// Explicit list of the callable members an owner exposes.
#[derive(Default)]
pub struct Declaration<'a> {
    members: Vec<Member<'a>>,
}

impl<'a> Declaration<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn behaviour<Args: 'a>(&mut self, behaviour: &'a mut Behaviour<Args>) -> &mut Self {
        self.members.push(Member::Behaviour(behaviour));
        self
    }

    /// Record a callable member that is not wrapped. Finalizing fails on it.
    pub fn bare_callable(&mut self, name: impl Into<String>) -> &mut Self {
        self.members.push(Member::Bare(name.into()));
        self
    }

    /// Validate the declaration, then share `context` with every behaviour.
    ///
    /// Nothing is injected unless every member is a behaviour. Returns the
    /// number of behaviours that received the context.
    pub fn finalize(self, context: Arc<dyn SerialContext>) -> Result<usize, ContractViolation> {
        if let Some(member) = self.members.iter().find_map(|m| match m {
            Member::Bare(name) => Some(name),
            Member::Behaviour(_) => None,
        }) {
            tracing::warn!(member = %member, "callable member is not wrapped as a behaviour");
            return Err(ContractViolation::UndeclaredBehaviour {
                member: member.clone(),
            });
        }

        let mut injected = 0;
        for member in self.members {
            if let Member::Behaviour(target) = member {
                target.receive(Arc::clone(&context));
                injected += 1;
            }
        }
        Ok(injected)
    }
}

/// Implemented by types that expose callable members.
pub trait DeclaresBehaviours {
    /// The context every behaviour of this owner runs in.
    fn context(&self) -> Arc<dyn SerialContext>;

    /// Register every callable member, wrapped or not.
    fn declare<'a>(&'a mut self, declaration: &mut Declaration<'a>);
}

/// Validate `owner`'s declaration and inject its context into its
/// behaviours.
pub fn try_finalize<T: DeclaresBehaviours>(owner: &mut T) -> Result<usize, ContractViolation> {
    let context = owner.context();
    let mut declaration = Declaration::new();
    owner.declare(&mut declaration);
    declaration.finalize(context)
}

/// Fail-fast counterpart of [`try_finalize`].
#[track_caller]
pub fn finalize<T: DeclaresBehaviours>(owner: &mut T) -> usize {
    try_finalize(owner).enforce()
}
