//! Simulation core for the cart-pole balancing environment.
//!
//! The crate is organized leaves-first: [`physics`] holds the deterministic
//! state-update rule for a single cart-pole system, [`agent`] pairs a
//! physics state with a pluggable decision source, [`population`] steps many
//! independent agents in lockstep, and [`session`] drives generations at a
//! fixed tick rate until every agent has failed.

pub mod agent;
pub mod config;
pub mod error;
pub mod physics;
pub mod population;
pub mod reward;
pub mod session;

pub use agent::{
    Agent, DecisionSource, HeldKeys, Key, ScoredPolicy, StepContext, StepOutcome, ThresholdPolicy,
};
pub use config::{AppConfig, IdleResponse, PhysicsConfig, ResetConfig, RewardConfig, WorldConfig};
pub use error::{Result, SimError};
pub use physics::CartPole;
pub use population::{AgentView, Population, Retired, TickReport};
pub use reward::RewardPolicy;
pub use session::{CancelToken, GenerationReport, GenerationState, Pacing, Session};
