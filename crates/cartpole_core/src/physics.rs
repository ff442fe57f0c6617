//! Deterministic state-update rule for a single cart-pole system.
//!
//! One `advance` call is one fixed-time-step integration: the cart drifts by
//! its velocity, the pole picks up angle from its angular velocity plus the
//! coupling term from cart motion, gravity torques the angular velocity, and
//! only then does the tick's action accelerate the cart. The term order is
//! load-bearing: the angle update must see the pre-action velocity of the
//! current tick. Identical inputs yield bit-identical outputs.

use crate::config::{IdleResponse, PhysicsConfig, ResetConfig, WorldConfig};
use crate::error::{Result, SimError};
use cartpole_data::{Action, Observation, StateSnapshot};
use rand::Rng;
use std::f64::consts::FRAC_PI_2;

/// Observation scale divisor for cart velocity.
pub const VELOCITY_SCALE: f64 = 5.0;
/// Observation scale divisor for pole angular velocity.
pub const ANGULAR_VELOCITY_SCALE: f64 = 5.0;

/// Mutable numeric state of one cart-pole system.
///
/// Owned exclusively by its agent; only immutable configuration is shared
/// between systems.
#[derive(Debug, Clone, PartialEq)]
pub struct CartPole {
    /// Cart center, world coordinates. Always within
    /// `[cart_width/2, world_width - cart_width/2]`.
    pub position: f64,
    pub velocity: f64,
    /// Pole deviation from upright, radians.
    pub angle: f64,
    pub angular_velocity: f64,
    /// Live ticks survived; increments by exactly one per `advance`.
    pub ticks: u64,
    /// Monotonic: transitions false -> true once and never reverts.
    pub terminal: bool,
}

impl CartPole {
    /// A perfectly balanced system centered in the world.
    #[must_use]
    pub fn upright(world: &WorldConfig) -> Self {
        Self {
            position: world.center(),
            velocity: 0.0,
            angle: 0.0,
            angular_velocity: 0.0,
            ticks: 0,
            terminal: false,
        }
    }

    /// Reinitializes the system with the configured perturbation ranges.
    /// The sampled position is clamped into the wall bounds, so a wide
    /// spread on a narrow world cannot spawn a cart inside a wall.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        reset: &ResetConfig,
        world: &WorldConfig,
    ) {
        self.terminal = false;
        self.ticks = 0;
        self.position = if reset.position_spread > 0.0 {
            let spread = reset.position_spread * world.width;
            rng.gen_range(world.center() - spread..=world.center() + spread)
                .clamp(world.min_position(), world.max_position())
        } else {
            world.center()
        };
        self.velocity = if reset.velocity_spread > 0.0 {
            rng.gen_range(-reset.velocity_spread..=reset.velocity_spread)
        } else {
            0.0
        };
        self.angle = if reset.angle_spread > 0.0 {
            rng.gen_range(-reset.angle_spread..=reset.angle_spread)
        } else {
            0.0
        };
        self.angular_velocity = 0.0;
    }

    /// Advances the system by one tick under `action`.
    ///
    /// Fails with [`SimError::InvalidState`] if the system already failed;
    /// the state is untouched in that case, so an aborted caller never sees
    /// a half-applied update.
    pub fn advance(
        &mut self,
        action: Action,
        physics: &PhysicsConfig,
        world: &WorldConfig,
    ) -> Result<StateSnapshot> {
        if self.terminal {
            return Err(SimError::InvalidState { ticks: self.ticks });
        }

        self.ticks += 1;
        self.position += self.velocity;

        // The cart stops dead against the walls.
        let mut pinned = false;
        if self.position <= world.min_position() {
            self.position = world.min_position();
            self.velocity = 0.0;
            pinned = true;
        } else if self.position >= world.max_position() {
            self.position = world.max_position();
            self.velocity = 0.0;
            pinned = true;
        }

        // Angle picks up the angular velocity plus the coupling term from
        // cart motion, using this tick's pre-action velocity.
        self.angle +=
            self.angular_velocity + self.velocity * self.angle.cos() / world.pendulum_length;
        self.angular_velocity += physics.gravity * self.angle.sin() / world.pendulum_length;

        match action {
            Action::Left => self.velocity -= physics.cart_accel,
            Action::Right => self.velocity += physics.cart_accel,
            Action::Idle => match physics.idle_response {
                IdleResponse::HardStop => self.velocity = 0.0,
                IdleResponse::Friction { factor } => self.velocity *= factor,
            },
        }

        if self.angle.abs() >= physics.angle_limit || (physics.wall_death && pinned) {
            self.terminal = true;
        }

        Ok(self.snapshot())
    }

    /// Observation vector for decision sources:
    /// `[offset/halfwidth, v/5, angle/(pi/2), angular_velocity/5]`.
    #[must_use]
    pub fn observe(&self, world: &WorldConfig) -> Observation {
        let half = world.width / 2.0;
        Observation([
            (self.position - half) / half,
            self.velocity / VELOCITY_SCALE,
            self.angle / FRAC_PI_2,
            self.angular_velocity / ANGULAR_VELOCITY_SCALE,
        ])
    }

    /// Read-only snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            ticks: self.ticks,
            position: self.position,
            velocity: self.velocity,
            angle: self.angle,
            angular_velocity: self.angular_velocity,
            terminal: self.terminal,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}
