//! Arena-backed transition graphs.
//!
//! States live in a `Vec` and refer to their successors by [`StateId`], so
//! cycles (an empty/non-empty oscillator, say) need no shared ownership.
//! Names are unique within a graph and index the arena for lookups.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use covenant_types::{ContractViolation, Predicate};

static NEXT_GRAPH: AtomicUsize = AtomicUsize::new(0);

/// Handle to a state inside the graph that minted it.
///
/// Carries the minting builder's id, so a handle from another graph is
/// refused even when its index happens to be in range. Within one graph,
/// ordered by registration, which is also the order successors are tried in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId {
    graph: usize,
    index: usize,
}

pub struct State<V> {
    name: String,
    predicate: Predicate<V>,
    successors: BTreeSet<StateId>,
}

impl<V> State<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `value` belongs to this state.
    pub fn accepts(&self, value: &V) -> bool {
        self.predicate.test(value)
    }

    pub fn successors(&self) -> impl Iterator<Item = StateId> + '_ {
        self.successors.iter().copied()
    }
}

impl<V> fmt::Debug for State<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("predicate", &self.predicate)
            .field("successors", &self.successors)
            .finish()
    }
}

/// Incremental construction of a [`TransitionGraph`].
pub struct GraphBuilder<V> {
    id: usize,
    states: Vec<State<V>>,
    index: HashMap<String, StateId>,
}

impl<V> Default for GraphBuilder<V> {
    fn default() -> Self {
        Self {
            id: NEXT_GRAPH.fetch_add(1, Ordering::Relaxed),
            states: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> GraphBuilder<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state recognising the values `predicate` accepts.
    ///
    /// Returns `Err(DuplicateState)` if the name is already taken: state
    /// identity is the name, so two states sharing one would make
    /// transitions ambiguous in a way no value could resolve.
    pub fn add_state(
        &mut self,
        name: impl Into<String>,
        predicate: Predicate<V>,
    ) -> Result<StateId, ContractViolation> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(ContractViolation::DuplicateState { name });
        }
        let id = StateId {
            graph: self.id,
            index: self.states.len(),
        };
        self.index.insert(name.clone(), id);
        self.states.push(State {
            name,
            predicate,
            successors: BTreeSet::new(),
        });
        Ok(id)
    }

    /// Make `to` a successor of `from`. Connecting twice is a no-op, and a
    /// state may be its own successor.
    ///
    /// Both handles must come from this builder; otherwise nothing is
    /// connected and `Err(UnknownState)` names the foreign handle.
    pub fn connect(
        &mut self,
        from: StateId,
        to: StateId,
    ) -> Result<&mut Self, ContractViolation> {
        self.check_owned(from)?;
        self.check_owned(to)?;
        self.states[from.index].successors.insert(to);
        Ok(self)
    }

    pub fn build(self, initial: StateId) -> Result<TransitionGraph<V>, ContractViolation> {
        self.check_owned(initial)?;
        tracing::debug!(
            states = self.states.len(),
            initial = %self.states[initial.index].name,
            "transition graph built"
        );
        Ok(TransitionGraph {
            id: self.id,
            states: self.states,
            index: self.index,
            initial,
        })
    }

    fn check_owned(&self, id: StateId) -> Result<(), ContractViolation> {
        if id.graph == self.id && id.index < self.states.len() {
            return Ok(());
        }
        tracing::warn!(handle = ?id, graph = self.id, "state handle from another graph");
        Err(ContractViolation::UnknownState {
            handle: format!("{id:?}"),
        })
    }
}

/// A finished state graph: every state, plus the one a value starts in.
pub struct TransitionGraph<V> {
    id: usize,
    states: Vec<State<V>>,
    index: HashMap<String, StateId>,
    initial: StateId,
}

impl<V> TransitionGraph<V> {
    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// The state behind `id`, or `None` for a handle minted by another
    /// graph.
    pub fn state(&self, id: StateId) -> Option<&State<V>> {
        if id.graph == self.id {
            self.states.get(id.index)
        } else {
            None
        }
    }

    /// Lookup for handles this graph handed out itself.
    pub(super) fn node(&self, id: StateId) -> &State<V> {
        &self.states[id.index]
    }

    pub fn state_named(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// Successors of `id` in the order writes try them. Empty for a
    /// foreign handle.
    pub fn successors_of(&self, id: StateId) -> impl Iterator<Item = &State<V>> + '_ {
        self.state(id)
            .into_iter()
            .flat_map(|state| state.successors())
            .map(|s| self.node(s))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<V> fmt::Debug for TransitionGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionGraph")
            .field("initial", &self.node(self.initial).name)
            .field("states", &self.states)
            .finish()
    }
}
