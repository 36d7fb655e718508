//! Monte-Carlo simulation of adaptive sessions.
//!
//! Simulated test-takers with a known ability answer each administered item
//! correctly with the model probability. Batches run in parallel with
//! deterministic per-task seeds, so results are reproducible for a given
//! seed regardless of thread scheduling.

use std::time::Duration;

use anyhow::Result;
use rand::prelude::*;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::irt::probability_correct;
use crate::model::Item;
use crate::session::{AdaptiveEngine, NoopObserver, Responder, Response};
use crate::termination::StopReason;

/// Answers items as a test-taker of ability `true_theta` would.
pub struct SimulatedResponder {
    true_theta: f64,
    response_time: Duration,
    rng: Pcg64,
}

impl SimulatedResponder {
    pub fn new(true_theta: f64, seed: u64) -> Self {
        Self {
            true_theta,
            response_time: Duration::from_secs(30),
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response_time = response_time;
        self
    }
}

impl Responder for SimulatedResponder {
    fn respond(&mut self, item: &Item, _turn: usize) -> Result<Response> {
        let p = probability_correct(self.true_theta, &item.params);
        Ok(Response {
            correct: self.rng.random::<f64>() < p,
            response_time: self.response_time,
        })
    }
}

/// Outcome of one simulated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub true_theta: f64,
    pub replication: usize,
    pub estimated_theta: f64,
    pub confidence: f64,
    pub items_administered: usize,
    pub score: f64,
    pub stop_reason: StopReason,
}

/// Simulate a single session for a test-taker of ability `true_theta`.
pub fn simulate_session(
    engine: &AdaptiveEngine,
    pool: &[Item],
    true_theta: f64,
    seed: u64,
) -> Result<SimulationRun> {
    let mut responder = SimulatedResponder::new(true_theta, seed);
    let outcome = engine.run(pool, &mut responder, &NoopObserver)?;
    Ok(SimulationRun {
        true_theta,
        replication: 0,
        estimated_theta: outcome.session.ability.theta,
        confidence: outcome.session.ability.confidence,
        items_administered: outcome.session.questions_answered(),
        score: outcome.result.score,
        stop_reason: outcome.stop_reason,
    })
}

/// Seed for one task, offset by its flat index so no two tasks share a stream.
fn task_seed(seed: u64, theta_idx: usize, replications: usize, replication: usize) -> u64 {
    seed.wrapping_add((theta_idx * replications + replication) as u64)
}

/// Run `replications` sessions for every ability in `true_thetas`.
///
/// Results are ordered by theta, then replication.
pub fn simulate_batch(
    engine: &AdaptiveEngine,
    pool: &[Item],
    true_thetas: &[f64],
    replications: usize,
    seed: u64,
) -> Result<Vec<SimulationRun>> {
    let tasks: Vec<(usize, usize)> = (0..true_thetas.len())
        .flat_map(|t| (0..replications).map(move |r| (t, r)))
        .collect();

    tracing::debug!(
        thetas = true_thetas.len(),
        replications,
        pool = pool.len(),
        "starting simulation batch"
    );

    tasks
        .par_iter()
        .map(|&(theta_idx, replication)| {
            let mut run = simulate_session(
                engine,
                pool,
                true_thetas[theta_idx],
                task_seed(seed, theta_idx, replications, replication),
            )?;
            run.replication = replication;
            Ok(run)
        })
        .collect()
}

/// Recovery statistics for one true ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalStats {
    pub true_theta: f64,
    pub replications: usize,
    /// Mean of `estimated - true`.
    pub bias: f64,
    pub rmse: f64,
    pub mean_items: f64,
    pub mean_score: f64,
}

/// Group runs by true theta (in first-seen order) and summarize each group.
pub fn conditional_summary(runs: &[SimulationRun]) -> Vec<ConditionalStats> {
    let mut groups: Vec<(f64, Vec<&SimulationRun>)> = Vec::new();
    for run in runs {
        match groups.iter_mut().find(|(theta, _)| *theta == run.true_theta) {
            Some((_, group)) => group.push(run),
            None => groups.push((run.true_theta, vec![run])),
        }
    }

    groups
        .into_iter()
        .map(|(true_theta, group)| {
            let n = group.len() as f64;
            let bias = group
                .iter()
                .map(|r| r.estimated_theta - true_theta)
                .sum::<f64>()
                / n;
            let mse = group
                .iter()
                .map(|r| (r.estimated_theta - true_theta).powi(2))
                .sum::<f64>()
                / n;
            ConditionalStats {
                true_theta,
                replications: group.len(),
                bias,
                rmse: mse.sqrt(),
                mean_items: group.iter().map(|r| r.items_administered as f64).sum::<f64>() / n,
                mean_score: group.iter().map(|r| r.score).sum::<f64>() / n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfidenceScale, EngineConfig};
    use crate::model::ItemParameters;

    fn bank() -> Vec<Item> {
        (0..60)
            .map(|i| {
                let b = -3.0 + i as f64 * 0.1;
                Item::new(format!("q{i}"), ItemParameters::new(b, 1.2, 0.0))
            })
            .collect()
    }

    fn engine() -> AdaptiveEngine {
        let mut config = EngineConfig::default();
        config.estimation.confidence_scale = ConfidenceScale::Precision;
        AdaptiveEngine::new(config)
    }

    #[test]
    fn same_seed_same_runs() {
        let engine = engine();
        let items = bank();
        let a = simulate_batch(&engine, &items, &[-1.0, 1.0], 4, 7).unwrap();
        let b = simulate_batch(&engine, &items, &[-1.0, 1.0], 4, 7).unwrap();
        assert_eq!(a.len(), 8);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.estimated_theta, y.estimated_theta);
            assert_eq!(x.items_administered, y.items_administered);
        }
        assert_eq!(a[0].true_theta, -1.0);
        assert_eq!(a[7].true_theta, 1.0);
        assert_eq!(a[7].replication, 3);
    }

    #[test]
    fn task_seeds_are_distinct_for_large_batches() {
        let replications = 10_001;
        let seeds: std::collections::HashSet<u64> = (0..3)
            .flat_map(|t| (0..replications).map(move |r| (t, r)))
            .map(|(t, r)| task_seed(42, t, replications, r))
            .collect();
        assert_eq!(seeds.len(), 3 * replications);
        assert_ne!(
            task_seed(42, 0, replications, 10_000),
            task_seed(42, 1, replications, 0)
        );
    }

    #[test]
    fn certain_responders_move_estimates_apart() {
        let engine = engine();
        let items = bank();
        let strong = simulate_session(&engine, &items, 30.0, 1).unwrap();
        let weak = simulate_session(&engine, &items, -30.0, 1).unwrap();
        assert!(strong.estimated_theta > 0.0);
        assert!(weak.estimated_theta < 0.0);
        assert!(strong.score > weak.score);
    }

    #[test]
    fn sessions_respect_question_bounds() {
        let engine = engine();
        let items = bank();
        let runs = simulate_batch(&engine, &items, &[0.0], 10, 42).unwrap();
        let max = engine.config().termination.max_questions as usize;
        let min = engine.config().termination.min_questions as usize;
        for run in &runs {
            assert!(run.items_administered >= min);
            assert!(run.items_administered <= max);
        }
    }

    #[test]
    fn summary_groups_by_theta() {
        let run = |true_theta: f64, estimated_theta: f64, items: usize| SimulationRun {
            true_theta,
            replication: 0,
            estimated_theta,
            confidence: 0.5,
            items_administered: items,
            score: 50.0 + estimated_theta * 15.0,
            stop_reason: StopReason::TargetPrecision,
        };
        let runs = vec![run(0.0, 0.5, 6), run(0.0, -0.5, 8), run(1.0, 1.0, 10)];
        let stats = conditional_summary(&runs);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].true_theta, 0.0);
        assert_eq!(stats[0].replications, 2);
        assert!(stats[0].bias.abs() < 1e-12);
        assert!((stats[0].rmse - 0.5).abs() < 1e-12);
        assert_eq!(stats[0].mean_items, 7.0);
        assert_eq!(stats[1].rmse, 0.0);
    }
}
