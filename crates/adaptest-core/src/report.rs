//! Session and simulation reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::model::{AssessmentResult, BankSummary};
use crate::session::SessionOutcome;
use crate::simulation::{conditional_summary, ConditionalStats, SimulationRun};
use crate::termination::StopReason;

/// A completed adaptive session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier.
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub bank: BankSummary,
    pub stop_reason: StopReason,
    pub result: AssessmentResult,
    /// Every administered item in order.
    pub turns: Vec<TurnTrace>,
    /// Wall-clock time from session start to the stopping decision.
    pub duration_ms: u64,
}

/// One administered item as seen in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnTrace {
    pub turn: usize,
    pub item_id: String,
    pub difficulty: f64,
    pub correct: bool,
    pub response_time_secs: f64,
}

impl SessionReport {
    pub fn from_outcome(bank: BankSummary, outcome: &SessionOutcome) -> Self {
        let created_at = Utc::now();
        let duration_ms = (outcome.finished_at - outcome.session.started_at)
            .num_milliseconds()
            .max(0) as u64;
        let turns = outcome
            .session
            .responses
            .iter()
            .enumerate()
            .map(|(i, r)| TurnTrace {
                turn: i + 1,
                item_id: r.item_id.clone(),
                difficulty: r.params.difficulty,
                correct: r.correct,
                response_time_secs: r.response_time_secs,
            })
            .collect();

        Self {
            id: outcome.session.id,
            created_at,
            bank,
            stop_reason: outcome.stop_reason,
            result: outcome.result.clone(),
            turns,
            duration_ms,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

/// Results of a batch simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub bank: BankSummary,
    pub seed: u64,
    pub config: EngineConfig,
    pub summary: Vec<ConditionalStats>,
    pub runs: Vec<SimulationRun>,
}

impl SimulationReport {
    pub fn new(bank: BankSummary, seed: u64, config: EngineConfig, runs: Vec<SimulationRun>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            bank,
            seed,
            config,
            summary: conditional_summary(&runs),
            runs,
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report from {}", path.display()))?;
    serde_json::from_str(&content).context("failed to parse report JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemParameters};
    use crate::session::AdaptiveEngine;

    fn outcome() -> SessionOutcome {
        let engine = AdaptiveEngine::default();
        let items: Vec<Item> = [-1.0, 0.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, &b)| Item::new(format!("q{i}"), ItemParameters::new(b, 1.0, 0.0)))
            .collect();
        let mut session = engine.start_session();
        for (i, item) in items.iter().enumerate() {
            engine.record_response(&mut session, item, i % 2 == 0, 15.0);
        }
        let result = engine.finalize(&session);
        let finished_at = session.started_at + chrono::Duration::milliseconds(1250);
        SessionOutcome {
            session,
            stop_reason: StopReason::PoolExhausted,
            result,
            finished_at,
        }
    }

    fn summary() -> BankSummary {
        BankSummary {
            id: "b".into(),
            name: "Bank".into(),
            item_count: 3,
        }
    }

    #[test]
    fn session_report_traces_turns() {
        let outcome = outcome();
        let report = SessionReport::from_outcome(summary(), &outcome);
        assert_eq!(report.id, outcome.session.id);
        assert_eq!(report.turns.len(), 3);
        assert_eq!(report.turns[0].turn, 1);
        assert_eq!(report.turns[1].item_id, "q1");
        assert!(!report.turns[1].correct);
        assert_eq!(report.stop_reason, StopReason::PoolExhausted);
    }

    #[test]
    fn duration_ends_at_the_stopping_decision() {
        let outcome = outcome();
        let report = SessionReport::from_outcome(summary(), &outcome);
        assert_eq!(report.duration_ms, 1250);
    }

    #[test]
    fn session_report_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("session.json");
        let report = SessionReport::from_outcome(summary(), &outcome());
        report.save_json(&path).unwrap();

        let loaded = SessionReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.result.proficiency_band, report.result.proficiency_band);
        assert_eq!(loaded.turns.len(), 3);
    }

    #[test]
    fn simulation_report_includes_summary() {
        let runs = vec![SimulationRun {
            true_theta: 0.0,
            replication: 0,
            estimated_theta: 0.2,
            confidence: 0.6,
            items_administered: 7,
            score: 53.0,
            stop_reason: StopReason::TargetPrecision,
        }];
        let report = SimulationReport::new(summary(), 9, EngineConfig::default(), runs);
        assert_eq!(report.summary.len(), 1);
        assert_eq!(report.summary[0].mean_items, 7.0);
    }

    #[test]
    fn load_missing_report_fails_with_path() {
        let err = SessionReport::load_json(Path::new("/no/such/report.json")).unwrap_err();
        assert!(err.to_string().contains("/no/such/report.json"));
    }
}
