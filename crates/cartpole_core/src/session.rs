//! Generation-level simulation driver.
//!
//! A [`Session`] owns everything that used to be per-run global state in
//! ancestral implementations (generation counter, high score, RNG), so
//! multiple sessions can run side by side without interference. One
//! `run_generation` call drives a population from fully-live to
//! `Exhausted`, at a fixed wall-clock rate or as fast as the machine
//! allows, with identical physics either way.

use crate::agent::StepContext;
use crate::config::AppConfig;
use crate::population::{Population, Retired};
use crate::reward::RewardPolicy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wall-clock behavior of the tick loop. Pacing only ever sleeps between
/// ticks; it never skips or coalesces them, so both modes produce the same
/// physics for the same action sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// As fast as possible (headless/batch).
    Fast,
    /// Fixed-rate ticks for render-synced runs, in Hz.
    Paced { tick_rate: u64 },
}

/// Where a generation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationState {
    /// At least one agent is still live (budget hit or run aborted).
    Running,
    /// Every agent failed.
    Exhausted,
}

/// Cooperative cancellation handle, checked at tick boundaries so an abort
/// never interrupts an agent's update mid-flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of one completed (or aborted) generation.
#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub generation: u32,
    /// Ticks executed this generation.
    pub ticks: u64,
    pub state: GenerationState,
    pub aborted: bool,
    /// Final score of every agent: the fallen in removal order, then any
    /// agents still live when the run stopped early.
    pub results: Vec<Retired>,
    pub best_fitness: f64,
    pub best_ticks: u64,
}

/// Per-run simulation context: configuration, seeded RNG, generation
/// counter and running high score.
pub struct Session {
    config: AppConfig,
    reward: RewardPolicy,
    rng: ChaCha8Rng,
    generation: u32,
    /// Best survival time seen across generations, in seconds.
    high_score: f64,
    cancel: CancelToken,
}

impl Session {
    /// Validates the configuration and seeds the session RNG. Never starts
    /// a run on invalid parameters.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let seed = config.run.seed.unwrap_or(0);
        let reward = RewardPolicy::new(config.reward);
        Ok(Self {
            config,
            reward,
            rng: ChaCha8Rng::seed_from_u64(seed),
            generation: 0,
            high_score: 0.0,
            cancel: CancelToken::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn high_score(&self) -> f64 {
        self.high_score
    }

    /// Handle for aborting the run from another thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Converts a tick count to seconds at the configured tick rate.
    #[must_use]
    pub fn time_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.config.run.tick_rate as f64
    }

    /// Runs one generation of `population` until every agent fails, the
    /// tick budget runs out, or the session is cancelled.
    ///
    /// Every agent gets a freshly perturbed physics state before the first
    /// tick. Per-tick render views are available through
    /// [`Population::views`] between calls when driving tick-by-tick; this
    /// method is the batch driver.
    pub fn run_generation(
        &mut self,
        population: &mut Population,
        pacing: Pacing,
    ) -> anyhow::Result<GenerationReport> {
        anyhow::ensure!(
            !population.is_empty(),
            "cannot start a generation with an empty population"
        );
        if let Pacing::Paced { tick_rate } = pacing {
            anyhow::ensure!(tick_rate > 0, "paced runs need a positive tick rate");
        }

        self.generation += 1;
        population.reset_all(&mut self.rng, &self.config.reset, &self.config.world);

        let ctx = StepContext {
            world: &self.config.world,
            physics: &self.config.physics,
            reward: &self.reward,
        };
        let tick_interval = match pacing {
            Pacing::Fast => None,
            Pacing::Paced { tick_rate } => Some(Duration::from_secs_f64(1.0 / tick_rate as f64)),
        };

        tracing::info!(
            generation = self.generation,
            agents = population.len(),
            ?pacing,
            "generation start"
        );

        let mut results: Vec<Retired> = Vec::with_capacity(population.len());
        let mut ticks: u64 = 0;
        let mut aborted = false;

        while !population.is_empty() {
            if self.cancel.is_cancelled() {
                aborted = true;
                break;
            }
            if let Some(budget) = self.config.run.max_ticks {
                if ticks >= budget {
                    break;
                }
            }

            let started = Instant::now();
            let report = population.step_all(&ctx)?;
            ticks += 1;

            if !report.newly_terminal.is_empty() {
                tracing::debug!(
                    tick = ticks,
                    died = report.newly_terminal.len(),
                    live = report.live,
                    "agents retired"
                );
            }
            results.extend(report.newly_terminal);

            if let Some(interval) = tick_interval {
                let elapsed = started.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
        }

        let state = if population.is_empty() {
            GenerationState::Exhausted
        } else {
            GenerationState::Running
        };
        results.extend(population.survivors());

        let best_fitness = results
            .iter()
            .map(|r| r.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let best_ticks = results.iter().map(|r| r.ticks).max().unwrap_or(0);
        let best_seconds = self.time_seconds(best_ticks);
        if best_seconds > self.high_score {
            self.high_score = best_seconds;
        }

        tracing::info!(
            generation = self.generation,
            ticks,
            best_fitness,
            best_ticks,
            high_score = self.high_score,
            aborted,
            "generation finished"
        );

        Ok(GenerationReport {
            generation: self.generation,
            ticks,
            state,
            aborted,
            results,
            best_fitness,
            best_ticks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ScoredPolicy;
    use cartpole_data::Observation;

    fn always_left(config: &AppConfig) -> Population {
        Population::spawn(config.run.population, &config.world, |_| {
            Box::new(ScoredPolicy::new(|_: &Observation| vec![1.0, 0.0, 0.0]))
        })
    }

    #[test]
    fn test_empty_population_rejected_before_ticks() {
        let config = AppConfig::default();
        let mut session = Session::new(config).unwrap();
        let mut population = Population::default();
        assert!(session
            .run_generation(&mut population, Pacing::Fast)
            .is_err());
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_zero_tick_rate_rejected_before_ticks() {
        let mut config = AppConfig::default();
        config.run.population = 2;
        config.run.seed = Some(7);
        let mut session = Session::new(config.clone()).unwrap();
        let mut population = always_left(&config);
        let err = session
            .run_generation(&mut population, Pacing::Paced { tick_rate: 0 })
            .unwrap_err();
        assert!(err.to_string().contains("tick rate"));
        // Rejected before any state changed.
        assert_eq!(session.generation(), 0);
        assert!(population.iter().all(|a| !a.is_terminal()));
    }

    #[test]
    fn test_cancel_before_first_tick_aborts_cleanly() {
        let mut config = AppConfig::default();
        config.run.population = 3;
        config.run.seed = Some(7);
        let mut session = Session::new(config.clone()).unwrap();
        session.cancel_token().cancel();
        let mut population = always_left(&config);
        let report = session
            .run_generation(&mut population, Pacing::Fast)
            .unwrap();
        assert!(report.aborted);
        assert_eq!(report.ticks, 0);
        assert_eq!(report.state, GenerationState::Running);
        // Every agent is intact and still live.
        assert_eq!(report.results.len(), 3);
        assert!(population.iter().all(|a| !a.is_terminal()));
    }

    #[test]
    fn test_tick_budget_stops_run() {
        let mut config = AppConfig::default();
        config.run.population = 2;
        config.run.max_ticks = Some(5);
        config.run.seed = Some(7);
        let mut session = Session::new(config.clone()).unwrap();
        // Idle policy on an upright start never dies on its own.
        let mut population = Population::spawn(2, &config.world, |_| {
            Box::new(ScoredPolicy::new(|_: &Observation| vec![0.0, 1.0, 0.0]))
        });
        let report = session
            .run_generation(&mut population, Pacing::Fast)
            .unwrap();
        assert_eq!(report.ticks, 5);
        assert_eq!(report.state, GenerationState::Running);
        assert!(!report.aborted);
    }

    #[test]
    fn test_time_seconds_conversion() {
        let config = AppConfig::default();
        let session = Session::new(config).unwrap();
        assert_eq!(session.time_seconds(250), 2.5);
    }
}
