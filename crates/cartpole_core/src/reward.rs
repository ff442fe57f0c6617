//! Per-tick fitness shaping.
//!
//! A reward is a pure function of one agent's own transition, evaluated
//! exactly once per live tick. The reference shaping pays a flat survival
//! bonus, charges continuously for leaning and for drifting off-center, and
//! charges the death penalty exactly once, at the tick the agent fails.

use crate::config::{RewardConfig, WorldConfig};
use cartpole_data::{Action, StateSnapshot};

/// Configurable reward function applied by `Agent::step`.
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    config: RewardConfig,
}

impl RewardPolicy {
    #[must_use]
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Fitness delta for one transition.
    ///
    /// The continuous penalties read the pre-update state: the agent is
    /// charged for the situation it acted in, not the one it produced.
    #[must_use]
    pub fn evaluate(
        &self,
        prev: &StateSnapshot,
        _action: Action,
        _next: &StateSnapshot,
        just_died: bool,
        world: &WorldConfig,
    ) -> f64 {
        let mut delta = self.config.survival_bonus;
        delta -= prev.angle.abs() * self.config.angle_penalty;
        delta -= (prev.position - world.center()).abs() / self.config.offset_divisor;
        if just_died {
            delta -= self.config.death_penalty;
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn snapshot(position: f64, angle: f64) -> StateSnapshot {
        StateSnapshot {
            ticks: 1,
            position,
            velocity: 0.0,
            angle,
            angular_velocity: 0.0,
            terminal: false,
        }
    }

    #[test]
    fn test_centered_upright_earns_survival_bonus() {
        let config = AppConfig::default();
        let policy = RewardPolicy::new(config.reward);
        let prev = snapshot(config.world.center(), 0.0);
        let delta = policy.evaluate(&prev, Action::Idle, &prev, false, &config.world);
        assert_eq!(delta, config.reward.survival_bonus);
    }

    #[test]
    fn test_lean_and_offset_penalties() {
        let config = AppConfig::default();
        let policy = RewardPolicy::new(config.reward);
        let prev = snapshot(config.world.center() + 100.0, 0.25);
        let delta = policy.evaluate(&prev, Action::Idle, &prev, false, &config.world);
        let expected = 1.0 - 0.25 * 2.0 - 100.0 / 200.0;
        assert_eq!(delta, expected);
    }

    #[test]
    fn test_death_penalty_charged_only_when_flagged() {
        let config = AppConfig::default();
        let policy = RewardPolicy::new(config.reward);
        let prev = snapshot(config.world.center(), 0.0);
        let alive = policy.evaluate(&prev, Action::Left, &prev, false, &config.world);
        let dead = policy.evaluate(&prev, Action::Left, &prev, true, &config.world);
        assert_eq!(dead, alive - config.reward.death_penalty);
    }

    #[test]
    fn test_fitness_may_go_negative() {
        let config = AppConfig::default();
        let policy = RewardPolicy::new(config.reward);
        let prev = snapshot(config.world.center(), 1.5);
        let delta = policy.evaluate(&prev, Action::Idle, &prev, true, &config.world);
        assert!(delta < 0.0);
    }
}
