/// Agent interface and experience records
pub mod agent;

/// Implemented RL algorithms
pub mod algo;

/// Strategies for decaying hyperparameters between episodes
pub mod decay;

/// Environment
pub mod env;

/// Configuration errors
pub mod error;

/// Exploration policies
pub mod exploration;

/// Testing environments
pub mod gym;

/// Training and evaluation loop
pub mod runner;

/// Terminal visualization
#[cfg(feature = "viz")]
pub mod viz;

mod util;
