//! Core data structures shared across the cartpole workspace.

pub mod action;
pub mod state;

pub use action::Action;
pub use state::{AgentId, Observation, StateSnapshot, VisualToken};
