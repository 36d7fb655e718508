//! Turn-by-turn orchestration of an adaptive session.
//!
//! [`AdaptiveEngine`] holds only immutable configuration; all per-test-taker
//! state lives in an [`AssessmentSession`] owned by the caller. Independent
//! sessions can be driven in parallel against one shared engine.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::estimation::estimate_ability;
use crate::model::{AbilityEstimate, AssessmentResult, Item, ResponseRecord};
use crate::scoring;
use crate::selection::select_next;
use crate::termination::{self, StopReason, TurnDecision};

/// State of one test-taker's adaptive attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ability: AbilityEstimate,
    pub responses: Vec<ResponseRecord>,
    pub answered_item_ids: HashSet<String>,
}

impl AssessmentSession {
    pub fn new(initial_theta: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            ability: AbilityEstimate::seed(initial_theta),
            responses: Vec::new(),
            answered_item_ids: HashSet::new(),
        }
    }

    pub fn questions_answered(&self) -> usize {
        self.responses.len()
    }
}

/// Result of asking the engine for the next item.
#[derive(Debug, Clone, Copy)]
pub enum NextItem<'a> {
    Present(&'a Item),
    /// Every pool item has been answered; the caller must stop.
    PoolExhausted,
}

/// A test-taker's answer to one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Response {
    pub correct: bool,
    pub response_time: Duration,
}

/// Source of answers for [`AdaptiveEngine::run`].
pub trait Responder {
    fn respond(&mut self, item: &Item, turn: usize) -> Result<Response>;
}

/// Progress hooks for [`AdaptiveEngine::run`].
pub trait SessionObserver {
    fn on_item_presented(&self, item: &Item, turn: usize);
    fn on_response_recorded(&self, record: &ResponseRecord, ability: &AbilityEstimate);
    fn on_session_complete(&self, outcome: &SessionOutcome);
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_item_presented(&self, _: &Item, _: usize) {}
    fn on_response_recorded(&self, _: &ResponseRecord, _: &AbilityEstimate) {}
    fn on_session_complete(&self, _: &SessionOutcome) {}
}

/// Everything a finished session produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session: AssessmentSession,
    pub stop_reason: StopReason,
    pub result: AssessmentResult,
    /// When the stopping decision was made.
    pub finished_at: DateTime<Utc>,
}

/// Stateless driver for the adaptive loop.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveEngine {
    config: EngineConfig,
}

impl AdaptiveEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open a session seeded at the configured initial ability.
    pub fn start_session(&self) -> AssessmentSession {
        AssessmentSession::new(self.config.initial_theta)
    }

    /// Pick the next item for `session` from `pool`.
    pub fn next_item<'a>(&self, session: &AssessmentSession, pool: &'a [Item]) -> NextItem<'a> {
        match select_next(
            pool,
            &session.ability,
            &session.answered_item_ids,
            &self.config.selection,
        ) {
            Some(item) => NextItem::Present(item),
            None => NextItem::PoolExhausted,
        }
    }

    /// Record an answer, re-estimate ability, and decide whether to continue.
    pub fn record_response(
        &self,
        session: &mut AssessmentSession,
        item: &Item,
        correct: bool,
        response_time_secs: f64,
    ) -> TurnDecision {
        session.responses.push(ResponseRecord::new(
            item.id.clone(),
            item.params,
            correct,
            response_time_secs,
        ));
        session.answered_item_ids.insert(item.id.clone());
        session.ability = estimate_ability(
            &session.responses,
            self.config.initial_theta,
            &self.config.estimation,
        );

        let answered = u32::try_from(session.questions_answered()).unwrap_or(u32::MAX);
        termination::evaluate(&session.ability, answered, &self.config.termination)
    }

    /// Score the session's current ability estimate.
    pub fn finalize(&self, session: &AssessmentSession) -> AssessmentResult {
        scoring::finalize(&session.ability, &self.config.scoring)
    }

    /// Drive a complete session against `pool`, asking `responder` for answers.
    pub fn run(
        &self,
        pool: &[Item],
        responder: &mut dyn Responder,
        observer: &dyn SessionObserver,
    ) -> Result<SessionOutcome> {
        let mut session = self.start_session();

        let stop_reason = loop {
            let item = match self.next_item(&session, pool) {
                NextItem::Present(item) => item,
                NextItem::PoolExhausted => break StopReason::PoolExhausted,
            };

            let turn = session.questions_answered() + 1;
            observer.on_item_presented(item, turn);
            let response = responder.respond(item, turn)?;

            let decision = self.record_response(
                &mut session,
                item,
                response.correct,
                response.response_time.as_secs_f64(),
            );
            if let Some(record) = session.responses.last() {
                observer.on_response_recorded(record, &session.ability);
            }

            if let TurnDecision::Stop(reason) = decision {
                break reason;
            }
        };

        let finished_at = Utc::now();
        let result = self.finalize(&session);
        tracing::info!(
            session_id = %session.id,
            questions = session.questions_answered(),
            theta = session.ability.theta,
            score = result.score,
            band = %result.proficiency_band,
            "session stopped: {stop_reason}"
        );

        let outcome = SessionOutcome {
            session,
            stop_reason,
            result,
            finished_at,
        };
        observer.on_session_complete(&outcome);
        Ok(outcome)
    }
}
