use anyhow::{Context, Result};
use cartpole_core::agent::{DecisionSource, ScoredPolicy};
use cartpole_core::config::{AppConfig, IdleResponse, ResetConfig};
use cartpole_core::population::Population;
use cartpole_core::session::{Pacing, Session};
use cartpole_data::Observation;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mode to run the simulation in
    #[arg(short, long, value_enum, default_value = "headless")]
    mode: Mode,

    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the number of generations
    #[arg(long)]
    generations: Option<u32>,

    /// Override the population size
    #[arg(long)]
    population: Option<usize>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print a JSON report per generation on stdout
    #[arg(long)]
    json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// As fast as possible, no wall-clock pacing
    Headless,
    /// Fixed-rate ticks at the configured tick rate
    Paced,
}

/// Seeded linear controller: three scores, each a dot product of random
/// weights with the observation. Stands in for an external learner so the
/// demo exercises a real heterogeneous population.
fn linear_policy(rng: &mut ChaCha8Rng) -> Box<dyn DecisionSource> {
    let mut weights = [[0.0f64; 4]; 3];
    for row in &mut weights {
        for w in row.iter_mut() {
            *w = rng.gen_range(-1.0..=1.0);
        }
    }
    Box::new(ScoredPolicy::new(move |obs: &Observation| {
        weights
            .iter()
            .map(|row| row.iter().zip(obs.0.iter()).map(|(w, x)| w * x).sum())
            .collect()
    }))
}

fn load_config(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            AppConfig::from_toml(&content).with_context(|| format!("invalid config file {path}"))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path, "config file not found, using the swarm demo profile");
            let mut config = AppConfig::default();
            config.reset = ResetConfig::swarm();
            config.physics.idle_response = IdleResponse::Friction { factor: 0.07 };
            // A lucky linear controller can balance indefinitely; cap the
            // generation so the demo always terminates.
            config.run.max_ticks = Some(10_000);
            Ok(config)
        }
        Err(err) => Err(err).with_context(|| format!("failed to read config file {path}")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(generations) = args.generations {
        config.run.generations = generations;
    }
    if let Some(population) = args.population {
        config.run.population = population;
    }
    if let Some(seed) = args.seed {
        config.run.seed = Some(seed);
    }
    config.validate()?;

    tracing::info!(fingerprint = %config.fingerprint(), "configuration loaded");

    let pacing = match args.mode {
        Mode::Headless => Pacing::Fast,
        Mode::Paced => Pacing::Paced {
            tick_rate: config.run.tick_rate,
        },
    };

    let mut session = Session::new(config.clone())?;
    // Policy weights draw from their own stream so changing the population
    // size cannot perturb the physics RNG.
    let mut policy_rng = ChaCha8Rng::seed_from_u64(config.run.seed.unwrap_or(0).wrapping_add(1));

    for _ in 0..config.run.generations {
        let mut population = Population::spawn(config.run.population, &config.world, |_| {
            linear_policy(&mut policy_rng)
        });

        let report = session.run_generation(&mut population, pacing)?;

        tracing::info!(
            generation = report.generation,
            ticks = report.ticks,
            best_fitness = report.best_fitness,
            best_seconds = session.time_seconds(report.best_ticks),
            high_score = session.high_score(),
            "generation summary"
        );
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        }
        if report.aborted {
            break;
        }
    }

    Ok(())
}
