//! Error types for cartpole_core.
//!
//! Physics stepping is deterministic and pure, so every error here signals a
//! programming or configuration defect rather than a recoverable runtime
//! condition; nothing in the core retries.

use thiserror::Error;

/// Main error type for simulation-core operations.
#[derive(Error, Debug)]
pub enum SimError {
    /// `advance` or `step` was called on a cart-pole that already failed.
    /// Correct callers never hit this: the population removes terminal
    /// agents before the next tick.
    #[error("cannot advance a terminal cart-pole (survived {ticks} ticks)")]
    InvalidState { ticks: u64 },

    /// A decision source produced something outside the closed action set,
    /// e.g. a scoring function with the wrong arity or non-finite scores.
    #[error("invalid action from decision source: {0}")]
    InvalidAction(String),
}

/// Result type alias for simulation-core operations.
pub type Result<T> = std::result::Result<T, SimError>;
