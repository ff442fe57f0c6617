//! Ordered collection of live agents stepped in lockstep.
//!
//! A tick is two phases, mirroring the data-parallel/sequential split of
//! the update loop: every live agent steps on the rayon pool (each touches
//! only its own state), then, after the implicit join, a single-threaded
//! pass partitions out the newly-terminal agents and removes them. No
//! terminal agent survives a completed tick.

use crate::agent::{Agent, DecisionSource, StepContext, StepOutcome};
use crate::config::{ResetConfig, WorldConfig};
use crate::error::Result;
use cartpole_data::{AgentId, StateSnapshot, VisualToken};
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

/// Read-only per-agent view exposed to rendering collaborators.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub token: VisualToken,
    pub state: StateSnapshot,
}

/// Final record of an agent that left the live set (or was still live when
/// a generation ended early).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Retired {
    pub id: AgentId,
    pub fitness: f64,
    pub ticks: u64,
}

/// Result of advancing the whole population by one tick.
#[derive(Debug)]
pub struct TickReport {
    /// Agents still live after removal.
    pub live: usize,
    /// Agents that failed on this tick, in population order.
    pub newly_terminal: Vec<Retired>,
}

/// The live agents of one generation, in stable creation order.
///
/// Order affects iteration and display only, never physics.
#[derive(Default)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    #[must_use]
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    /// Builds `count` agents from a decision-source factory.
    pub fn spawn<F>(count: usize, world: &WorldConfig, mut factory: F) -> Self
    where
        F: FnMut(usize) -> Box<dyn DecisionSource>,
    {
        let agents = (0..count)
            .map(|i| Agent::new(factory(i), world))
            .collect();
        Self { agents }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Resets every agent for a new generation. Sequential so the RNG draw
    /// order (and therefore every perturbation) is reproducible.
    pub fn reset_all<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        reset: &ResetConfig,
        world: &WorldConfig,
    ) {
        for agent in &mut self.agents {
            agent.reset(rng, reset, world);
        }
    }

    /// Advances every live agent by one tick, then removes the casualties.
    ///
    /// The parallel phase has no ordering requirement; the removal phase
    /// runs after the join and keeps population order, so removal order
    /// among simultaneous deaths is stable within a run.
    pub fn step_all(&mut self, ctx: &StepContext<'_>) -> Result<TickReport> {
        let outcomes = self
            .agents
            .par_iter_mut()
            .map(|agent| agent.step(ctx))
            .collect::<Result<Vec<StepOutcome>>>()?;

        let mut newly_terminal = Vec::new();
        for (agent, outcome) in self.agents.iter().zip(&outcomes) {
            if matches!(
                outcome,
                StepOutcome::Stepped {
                    just_terminated: true,
                    ..
                }
            ) {
                newly_terminal.push(Retired {
                    id: agent.id(),
                    fitness: agent.fitness(),
                    ticks: agent.snapshot().ticks,
                });
            }
        }
        self.agents.retain(|agent| !agent.is_terminal());

        Ok(TickReport {
            live: self.agents.len(),
            newly_terminal,
        })
    }

    /// Per-tick render boundary: read-only snapshots of every live agent.
    #[must_use]
    pub fn views(&self) -> Vec<AgentView> {
        self.agents
            .iter()
            .map(|agent| AgentView {
                id: agent.id(),
                token: agent.token(),
                state: agent.snapshot(),
            })
            .collect()
    }

    /// Records for agents still live, used when a run ends before
    /// exhaustion (budget or abort).
    #[must_use]
    pub fn survivors(&self) -> Vec<Retired> {
        self.agents
            .iter()
            .map(|agent| Retired {
                id: agent.id(),
                fitness: agent.fitness(),
                ticks: agent.snapshot().ticks,
            })
            .collect()
    }
}
