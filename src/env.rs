/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Copy;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Copy;

    /// Update the environment in response to an action taken by an agent
    ///
    /// Actions that cannot be carried out must still produce a [`Step`] rather than panic.
    fn step(&mut self, action: Self::Action) -> Step<Self::State>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// An environment whose legal actions can be enumerated per state
pub trait DiscreteActionSpace: Environment {
    /// Get the legal actions available from `state`, in a stable order
    ///
    /// May be empty if the state is a dead end.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;
}

/// The result of a single call to [`Environment::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<S> {
    pub next_state: S,
    pub reward: f64,
    pub done: bool,
}

impl<S> From<(S, f64, bool)> for Step<S> {
    fn from((next_state, reward, done): (S, f64, bool)) -> Self {
        Self {
            next_state,
            reward,
            done,
        }
    }
}
