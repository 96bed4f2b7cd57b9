use crate::{env::Environment, error::Result};

/// Represents a single experience or transition in the environment
pub struct Exp<E: Environment> {
    /// The state of the environment before taking the action
    pub state: E::State,
    /// The action taken in the given state
    pub action: E::Action,
    /// The reward received after taking the action
    pub reward: f64,
    /// The state of the environment after the action is taken
    pub next_state: E::State,
    /// Whether the action ended the episode
    pub done: bool,
}

impl<E: Environment> Clone for Exp<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Environment> Copy for Exp<E> {}

/// A learner that can be driven by a [`Trainer`](crate::runner::Trainer)
pub trait Agent<E: Environment> {
    /// Pick one of `actions` for `state`
    ///
    /// **Panics** if `actions` is empty
    fn act(&mut self, state: &E::State, actions: &[E::Action]) -> E::Action;

    /// Learn from a single transition
    fn learn(&mut self, exp: Exp<E>);

    /// Called once after every training episode
    fn end_episode(&mut self) {}

    /// Current probability of picking a random action
    fn exploration(&self) -> f64;

    /// Override the probability of picking a random action
    fn set_exploration(&mut self, epsilon: f64);

    /// Check that the agent can act in every state of `env`
    fn check(&self, _env: &E) -> Result<()> {
        Ok(())
    }
}
