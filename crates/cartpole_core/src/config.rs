//! Configuration management for simulation parameters.
//!
//! Strongly-typed configuration structures that map to the `config.toml`
//! file. Defaults reproduce the reference deployment: a 1200x600 world, a
//! 50x10 cart, a 200-unit pole, gravity 0.13 and cart acceleration 0.15 at
//! 100 ticks per second.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [physics]
//! gravity = 0.13
//! cart_accel = 0.15
//! wall_death = false
//!
//! [physics.idle_response]
//! kind = "friction"
//! factor = 0.07
//!
//! [run]
//! tick_rate = 100
//! population = 50
//! generations = 10
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// World and cart geometry.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    pub cart_width: f64,
    pub cart_height: f64,
    pub pendulum_width: f64,
    pub pendulum_length: f64,
}

impl WorldConfig {
    /// Horizontal center of the world.
    #[must_use]
    pub fn center(&self) -> f64 {
        self.width / 2.0
    }

    /// Leftmost reachable cart-center position.
    #[must_use]
    pub fn min_position(&self) -> f64 {
        self.cart_width / 2.0
    }

    /// Rightmost reachable cart-center position.
    #[must_use]
    pub fn max_position(&self) -> f64 {
        self.width - self.cart_width / 2.0
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 600.0,
            cart_width: 50.0,
            cart_height: 10.0,
            pendulum_width: 6.0,
            pendulum_length: 200.0,
        }
    }
}

/// Behavior of the cart when the action for a tick is `Idle`.
///
/// The two variants are alternative deployments, never mixed mid-run: the
/// choice is fixed in [`PhysicsConfig`] for the lifetime of a session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdleResponse {
    /// Velocity resets to zero (the strict variant).
    HardStop,
    /// Velocity decays by a multiplicative factor in `(0, 1)` each idle
    /// tick (the lenient variant).
    Friction { factor: f64 },
}

/// Physical constants and failure rules.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PhysicsConfig {
    pub gravity: f64,
    pub cart_accel: f64,
    /// Pole deviation at which the system fails, radians.
    pub angle_limit: f64,
    /// When enabled, getting pinned against a wall is also fatal.
    pub wall_death: bool,
    pub idle_response: IdleResponse,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.13,
            cart_accel: 0.15,
            angle_limit: FRAC_PI_2,
            wall_death: false,
            idle_response: IdleResponse::HardStop,
        }
    }
}

/// Initial-perturbation ranges applied by `Agent::reset`.
///
/// All spreads are half-widths of symmetric uniform ranges; a spread of zero
/// pins the component to its centered value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ResetConfig {
    /// Cart position spread as a fraction of world width around center.
    pub position_spread: f64,
    /// Cart velocity spread.
    pub velocity_spread: f64,
    /// Pole angle spread, radians.
    pub angle_spread: f64,
}

impl ResetConfig {
    /// Human-play profile: barely perturbed upright start.
    #[must_use]
    pub fn human() -> Self {
        Self {
            position_spread: 0.0,
            velocity_spread: 0.0,
            angle_spread: 0.01,
        }
    }

    /// Multi-agent profile: scattered starts so a population explores
    /// different regions of the state space from tick one.
    #[must_use]
    pub fn swarm() -> Self {
        Self {
            position_spread: 0.1,
            velocity_spread: 1.0,
            angle_spread: FRAC_PI_4,
        }
    }
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self::human()
    }
}

/// Reward-policy coefficients. See [`crate::reward::RewardPolicy`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct RewardConfig {
    /// Flat reward for surviving a tick.
    pub survival_bonus: f64,
    /// Multiplier on `|angle|` subtracted each tick.
    pub angle_penalty: f64,
    /// Divisor applied to the absolute offset from world center.
    pub offset_divisor: f64,
    /// One-time penalty at the tick an agent fails.
    pub death_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            survival_bonus: 1.0,
            angle_penalty: 2.0,
            offset_divisor: 200.0,
            death_penalty: 20.0,
        }
    }
}

/// Run-level parameters for the generation loop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct RunConfig {
    /// Fixed tick rate in Hz; also the seconds-per-tick conversion base.
    pub tick_rate: u64,
    /// Optional per-generation tick budget; `None` runs to exhaustion.
    pub max_ticks: Option<u64>,
    pub population: usize,
    pub generations: u32,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick_rate: 100,
            max_ticks: None,
            population: 50,
            generations: 10,
            seed: None,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub physics: PhysicsConfig,
    pub reset: ResetConfig,
    pub reward: RewardConfig,
    pub run: RunConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a
    /// description of the first validation failure. Called before any tick
    /// executes; a run never starts on invalid parameters.
    pub fn validate(&self) -> anyhow::Result<()> {
        // World validation
        anyhow::ensure!(self.world.width > 0.0, "World width must be positive");
        anyhow::ensure!(self.world.height > 0.0, "World height must be positive");
        anyhow::ensure!(self.world.cart_width > 0.0, "Cart width must be positive");
        anyhow::ensure!(
            self.world.cart_width < self.world.width,
            "Cart width must be smaller than world width"
        );
        anyhow::ensure!(
            self.world.pendulum_length > 0.0,
            "Pendulum length must be positive"
        );

        // Physics validation
        anyhow::ensure!(self.physics.gravity > 0.0, "Gravity must be positive");
        anyhow::ensure!(
            self.physics.cart_accel > 0.0,
            "Cart acceleration must be positive"
        );
        anyhow::ensure!(
            self.physics.angle_limit > 0.0 && self.physics.angle_limit <= PI,
            "Angle limit must be in (0, pi]"
        );
        if let IdleResponse::Friction { factor } = self.physics.idle_response {
            anyhow::ensure!(
                factor > 0.0 && factor < 1.0,
                "Friction factor must be in (0.0, 1.0)"
            );
        }

        // Reset validation
        anyhow::ensure!(
            self.reset.position_spread >= 0.0 && self.reset.position_spread < 0.5,
            "Position spread must be in [0.0, 0.5)"
        );
        anyhow::ensure!(
            self.reset.velocity_spread >= 0.0,
            "Velocity spread must be non-negative"
        );
        anyhow::ensure!(
            self.reset.angle_spread >= 0.0 && self.reset.angle_spread < self.physics.angle_limit,
            "Angle spread must be non-negative and below the angle limit"
        );

        // Reward validation
        anyhow::ensure!(
            self.reward.offset_divisor > 0.0,
            "Offset divisor must be positive"
        );

        // Run validation
        anyhow::ensure!(self.run.tick_rate > 0, "Tick rate must be positive");
        anyhow::ensure!(self.run.tick_rate <= 1000, "Tick rate too high (max 1000)");
        anyhow::ensure!(self.run.population > 0, "Population must be non-empty");
        anyhow::ensure!(
            self.run.population <= 100_000,
            "Population too large (max 100000)"
        );
        anyhow::ensure!(
            self.run.generations > 0,
            "Generation count must be positive"
        );

        Ok(())
    }

    /// Loads and validates configuration from TOML content.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stable digest of every physics-relevant parameter, logged at session
    /// start so runs can be compared for reproducibility.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.physics).as_bytes());
        hasher.update(format!("{:?}", self.reset).as_bytes());
        hasher.update(format!("{:?}", self.reward).as_bytes());
        hex::encode(hasher.finalize())
    }
}
