use cartpole_core::agent::{DecisionSource, ScoredPolicy};
use cartpole_core::config::{AppConfig, IdleResponse, ResetConfig};
use cartpole_core::population::Population;
use cartpole_core::session::{Pacing, Session};
use cartpole_data::Observation;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn swarm_config(seed: u64, population: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.reset = ResetConfig::swarm();
    config.physics.idle_response = IdleResponse::Friction { factor: 0.07 };
    config.run.seed = Some(seed);
    config.run.population = population;
    config.run.max_ticks = Some(20_000);
    config
}

fn linear_population(config: &AppConfig, policy_seed: u64) -> Population {
    let mut rng = ChaCha8Rng::seed_from_u64(policy_seed);
    Population::spawn(config.run.population, &config.world, |_| {
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
        })) as Box<dyn DecisionSource>
    })
}

#[test]
fn test_identically_seeded_sessions_match() {
    let config = swarm_config(12345, 25);

    let mut session1 = Session::new(config.clone()).unwrap();
    let mut population1 = linear_population(&config, 777);
    let report1 = session1
        .run_generation(&mut population1, Pacing::Fast)
        .unwrap();

    let mut session2 = Session::new(config.clone()).unwrap();
    let mut population2 = linear_population(&config, 777);
    let report2 = session2
        .run_generation(&mut population2, Pacing::Fast)
        .unwrap();

    assert_eq!(report1.ticks, report2.ticks, "Tick counts should match");
    assert_eq!(report1.state, report2.state);
    assert_eq!(
        report1.results.len(),
        report2.results.len(),
        "Result counts should match"
    );
    for (i, (r1, r2)) in report1.results.iter().zip(&report2.results).enumerate() {
        assert_eq!(r1.ticks, r2.ticks, "Survival ticks should match at {i}");
        // Bit-identical floats: same state, same operations, same order.
        assert_eq!(r1.fitness, r2.fitness, "Fitness should match at {i}");
    }
    assert_eq!(report1.best_fitness, report2.best_fitness);
    assert_eq!(session1.high_score(), session2.high_score());
}

#[test]
fn test_fast_and_paced_modes_agree_on_physics() {
    let mut config = swarm_config(999, 5);
    // Keep the paced run short; pacing only sleeps, it never skips ticks.
    config.run.max_ticks = Some(300);
    config.run.tick_rate = 1000;

    let mut fast_session = Session::new(config.clone()).unwrap();
    let mut fast_population = linear_population(&config, 31);
    let fast = fast_session
        .run_generation(&mut fast_population, Pacing::Fast)
        .unwrap();

    let mut paced_session = Session::new(config.clone()).unwrap();
    let mut paced_population = linear_population(&config, 31);
    let paced = paced_session
        .run_generation(&mut paced_population, Pacing::Paced { tick_rate: 1000 })
        .unwrap();

    assert_eq!(fast.ticks, paced.ticks);
    assert_eq!(fast.results.len(), paced.results.len());
    for (r1, r2) in fast.results.iter().zip(&paced.results) {
        assert_eq!(r1.ticks, r2.ticks);
        assert_eq!(r1.fitness, r2.fitness);
    }
}

#[test]
fn test_reseeded_session_differs() {
    let config_a = swarm_config(1, 10);
    let config_b = swarm_config(2, 10);

    let mut session_a = Session::new(config_a.clone()).unwrap();
    let mut population_a = linear_population(&config_a, 5);
    let report_a = session_a
        .run_generation(&mut population_a, Pacing::Fast)
        .unwrap();

    let mut session_b = Session::new(config_b.clone()).unwrap();
    let mut population_b = linear_population(&config_b, 5);
    let report_b = session_b
        .run_generation(&mut population_b, Pacing::Fast)
        .unwrap();

    // Different perturbation seeds should not replay the same run.
    let same = report_a.ticks == report_b.ticks
        && report_a.best_fitness == report_b.best_fitness
        && report_a.best_ticks == report_b.best_ticks;
    assert!(!same, "Different seeds produced an identical generation");
}
