use thiserror::Error;

use crate::gym::grid_world::Pos;

/// Raised when an environment or agent is constructed with invalid parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for `{name}`: {value} is not in the interval {interval}")]
    OutOfInterval {
        name: &'static str,
        value: f64,
        interval: String,
    },

    #[error("exploration floor {floor} is greater than the starting rate {start}")]
    FloorAboveStart { start: f64, floor: f64 },

    #[error("grid size must be at least 1")]
    EmptyGrid,

    #[error("{feature} at {pos:?} lies outside a {size}x{size} grid")]
    OutOfBounds {
        feature: &'static str,
        pos: Pos,
        size: usize,
    },

    #[error("{first} and {second} overlap at {pos:?}")]
    Overlap {
        first: &'static str,
        second: &'static str,
        pos: Pos,
    },

    #[error("agent is sized for a {agent}x{agent} grid but the environment is {env}x{env}")]
    SizeMismatch { env: usize, agent: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
