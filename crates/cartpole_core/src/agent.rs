//! Agents and the decision-source boundary.
//!
//! An agent owns one cart-pole system, a pluggable decision source, and a
//! fitness accumulator. Decision sources are anything that can turn an
//! observation into an action: a human's held keys, an arg-max over a
//! 3-output scoring function, or a scalar threshold test.

use crate::config::{PhysicsConfig, ResetConfig, WorldConfig};
use crate::error::{Result, SimError};
use crate::physics::CartPole;
use crate::reward::RewardPolicy;
use cartpole_data::{Action, AgentId, Observation, StateSnapshot, VisualToken};
use rand::Rng;

/// Capability consumed by the stepping loop: observation in, action out.
///
/// Implementations may keep internal state (held keys, recurrent network
/// activations) but must never touch any agent's physics.
pub trait DecisionSource: Send {
    fn decide(&mut self, observation: &Observation) -> Result<Action>;
}

/// Key identifiers for human play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
}

/// Adapter turning discrete key-down/key-up edge events into the level
/// state the physics wants. One held side pushes; both or neither idle.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeldKeys {
    left: bool,
    right: bool,
}

impl HeldKeys {
    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::Left => self.left = true,
            Key::Right => self.right = true,
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::Left => self.left = false,
            Key::Right => self.right = false,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        match (self.left, self.right) {
            (true, false) => Action::Left,
            (false, true) => Action::Right,
            _ => Action::Idle,
        }
    }
}

impl DecisionSource for HeldKeys {
    fn decide(&mut self, _observation: &Observation) -> Result<Action> {
        Ok(self.action())
    }
}

/// Arg-max policy over a 3-output scoring function.
///
/// Score index order is `[Left, Idle, Right]`; ties go to the lowest index.
/// Wrong arity or non-finite scores surface as [`SimError::InvalidAction`]
/// rather than being coerced.
pub struct ScoredPolicy<F> {
    scorer: F,
}

impl<F> ScoredPolicy<F>
where
    F: FnMut(&Observation) -> Vec<f64> + Send,
{
    pub fn new(scorer: F) -> Self {
        Self { scorer }
    }
}

impl<F> DecisionSource for ScoredPolicy<F>
where
    F: FnMut(&Observation) -> Vec<f64> + Send,
{
    fn decide(&mut self, observation: &Observation) -> Result<Action> {
        let scores = (self.scorer)(observation);
        if scores.len() != Action::SCORED.len() {
            return Err(SimError::InvalidAction(format!(
                "expected {} scores, got {}",
                Action::SCORED.len(),
                scores.len()
            )));
        }
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if !score.is_finite() {
                return Err(SimError::InvalidAction(format!(
                    "non-finite score {score} at index {i}"
                )));
            }
            if *score > scores[best] {
                best = i;
            }
        }
        Ok(Action::SCORED[best])
    }
}

/// Threshold policy over a single-scalar provider, for binary-action
/// controllers: at or above the threshold picks `above`, otherwise `below`.
pub struct ThresholdPolicy<F> {
    scalar: F,
    threshold: f64,
    above: Action,
    below: Action,
}

impl<F> ThresholdPolicy<F>
where
    F: FnMut(&Observation) -> f64 + Send,
{
    pub fn new(scalar: F, threshold: f64, above: Action, below: Action) -> Self {
        Self {
            scalar,
            threshold,
            above,
            below,
        }
    }
}

impl<F> DecisionSource for ThresholdPolicy<F>
where
    F: FnMut(&Observation) -> f64 + Send,
{
    fn decide(&mut self, observation: &Observation) -> Result<Action> {
        let value = (self.scalar)(observation);
        if !value.is_finite() {
            return Err(SimError::InvalidAction(format!(
                "non-finite scalar output {value}"
            )));
        }
        Ok(if value >= self.threshold {
            self.above
        } else {
            self.below
        })
    }
}

/// Immutable per-tick context shared by every agent's step.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub world: &'a WorldConfig,
    pub physics: &'a PhysicsConfig,
    pub reward: &'a RewardPolicy,
}

/// Outcome of stepping one agent for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The agent was already terminal; nothing happened.
    AlreadyTerminal,
    Stepped {
        snapshot: StateSnapshot,
        /// True only on the single tick the agent became terminal.
        just_terminated: bool,
    },
}

/// One cart-pole system paired with its decision source and score.
pub struct Agent {
    id: AgentId,
    token: VisualToken,
    physics: CartPole,
    decision: Box<dyn DecisionSource>,
    fitness: f64,
}

impl Agent {
    #[must_use]
    pub fn new(decision: Box<dyn DecisionSource>, world: &WorldConfig) -> Self {
        let id = AgentId::new();
        Self {
            id,
            token: VisualToken::from_id(&id),
            physics: CartPole::upright(world),
            decision,
            fitness: 0.0,
        }
    }

    /// Fresh physics and zeroed fitness for a new generation.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        reset: &ResetConfig,
        world: &WorldConfig,
    ) {
        self.physics.reset(rng, reset, world);
        self.fitness = 0.0;
    }

    /// One tick: observe, decide, advance, score.
    ///
    /// Reads only this agent's own state, so concurrent steps across agents
    /// are safe. Decision-source failures propagate before any state
    /// mutation, keeping the update atomic.
    pub fn step(&mut self, ctx: &StepContext<'_>) -> Result<StepOutcome> {
        if self.physics.is_terminal() {
            return Ok(StepOutcome::AlreadyTerminal);
        }
        let observation = self.physics.observe(ctx.world);
        let action = self.decision.decide(&observation)?;
        let prev = self.physics.snapshot();
        let snapshot = self.physics.advance(action, ctx.physics, ctx.world)?;
        let just_terminated = snapshot.terminal;
        self.fitness += ctx
            .reward
            .evaluate(&prev, action, &snapshot, just_terminated, ctx.world);
        Ok(StepOutcome::Stepped {
            snapshot,
            just_terminated,
        })
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn token(&self) -> VisualToken {
        self.token
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.physics.is_terminal()
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        self.physics.snapshot()
    }

    /// Test and demo hook: direct access to the physics state.
    pub fn physics_mut(&mut self) -> &mut CartPole {
        &mut self.physics
    }
}
