//! Stopping rules for the adaptive loop.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::TerminationConfig;
use crate::model::AbilityEstimate;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The question cap was reached.
    MaxQuestions,
    /// Confidence reached the target precision.
    TargetPrecision,
    /// Confidence reached the relaxed precision bar.
    RelaxedPrecision,
    /// No unanswered items remain. Not a policy decision.
    PoolExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxQuestions => write!(f, "maximum questions reached"),
            StopReason::TargetPrecision => write!(f, "target precision reached"),
            StopReason::RelaxedPrecision => write!(f, "relaxed precision reached"),
            StopReason::PoolExhausted => write!(f, "item pool exhausted"),
        }
    }
}

/// Outcome of evaluating the stopping rules after a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum TurnDecision {
    Continue,
    Stop(StopReason),
}

impl TurnDecision {
    pub fn is_stop(&self) -> bool {
        matches!(self, TurnDecision::Stop(_))
    }
}

/// Evaluate the stopping rules, in order:
///
/// 1. `questions_answered >= max_questions` stops.
/// 2. Fewer than `min_questions` answered continues.
/// 3. `confidence >= target_precision` stops.
/// 4. `confidence >= relaxed_precision` stops.
/// 5. Otherwise continue.
pub fn evaluate(
    ability: &AbilityEstimate,
    questions_answered: u32,
    config: &TerminationConfig,
) -> TurnDecision {
    if questions_answered >= config.max_questions {
        return TurnDecision::Stop(StopReason::MaxQuestions);
    }
    if questions_answered < config.min_questions {
        return TurnDecision::Continue;
    }
    if ability.confidence >= config.target_precision {
        return TurnDecision::Stop(StopReason::TargetPrecision);
    }
    if ability.confidence >= config.relaxed_precision {
        return TurnDecision::Stop(StopReason::RelaxedPrecision);
    }
    TurnDecision::Continue
}

/// `true` while the session should keep administering items.
pub fn should_continue(
    ability: &AbilityEstimate,
    questions_answered: u32,
    config: &TerminationConfig,
) -> bool {
    !evaluate(ability, questions_answered, config).is_stop()
}
