//! State Machine Runtime
//!
//! Value-guarded state machines for interaction states that carry payloads
//! (e.g. a pull fraction). Supports:
//! - Pure transition functions via [`StateTransitions`]
//! - Forced transitions for programmatic begin/end
//! - Bounded transition history for debugging
//!
//! A transition only happens when the next state differs from the current
//! one by value, so a stream of identical inputs never re-notifies.

use std::collections::VecDeque;
use std::fmt::Debug;

/// Default number of transitions remembered by [`StateMachine::history`]
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

/// Trait for state types that map inputs to transitions
///
/// Implementations must be pure: the next state depends only on the
/// current state and the input.
///
/// # Example
///
/// ```rust
/// use riffle_core::fsm::{StateMachine, StateTransitions};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// enum Door {
///     Closed,
///     Open,
/// }
///
/// impl StateTransitions for Door {
///     type Input = bool;
///
///     fn on_input(&self, push: &bool) -> Option<Self> {
///         match (self, push) {
///             (Door::Closed, true) => Some(Door::Open),
///             (Door::Open, false) => Some(Door::Closed),
///             _ => None,
///         }
///     }
/// }
///
/// let mut fsm = StateMachine::new(Door::Closed);
/// assert_eq!(fsm.send(&true), Some((Door::Closed, Door::Open)));
/// assert_eq!(fsm.send(&true), None);
/// ```
pub trait StateTransitions: Clone + PartialEq + Debug + Send + 'static {
    /// Input that drives the machine
    type Input;

    /// Handle an input and return the new state, or None if no transition
    fn on_input(&self, input: &Self::Input) -> Option<Self>;
}

/// A state machine instance
#[derive(Debug, Clone)]
pub struct StateMachine<S: StateTransitions> {
    current_state: S,
    /// History of state transitions (for debugging)
    history: VecDeque<(S, S)>,
    history_limit: usize,
}

impl<S: StateTransitions> StateMachine<S> {
    /// Create a new state machine in its initial state
    pub fn new(initial_state: S) -> Self {
        Self::with_history_limit(initial_state, DEFAULT_HISTORY_LIMIT)
    }

    /// Create a state machine remembering at most `limit` transitions
    pub fn with_history_limit(initial_state: S, limit: usize) -> Self {
        Self {
            current_state: initial_state,
            history: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            history_limit: limit,
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> &S {
        &self.current_state
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: &S) -> bool {
        self.current_state == *state
    }

    /// Get transition history, oldest first
    pub fn history(&self) -> impl Iterator<Item = &(S, S)> {
        self.history.iter()
    }

    /// Clear transition history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Check if an input would trigger a transition from the current state
    pub fn can_send(&self, input: &S::Input) -> bool {
        self.current_state
            .on_input(input)
            .is_some_and(|next| next != self.current_state)
    }

    /// Send an input, returning `(previous, next)` if the state changed
    pub fn send(&mut self, input: &S::Input) -> Option<(S, S)> {
        let next = self.current_state.on_input(input)?;
        self.force(next)
    }

    /// Move to `next` unconditionally, unless it equals the current state
    pub fn force(&mut self, next: S) -> Option<(S, S)> {
        if next == self.current_state {
            return None;
        }

        let previous = std::mem::replace(&mut self.current_state, next.clone());

        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back((previous.clone(), next.clone()));
        }

        Some((previous, next))
    }
}
