//! Core data model types for adaptest.
//!
//! These are the shapes the engine reads and produces: item parameters under
//! the three-parameter logistic model, administered responses, ability
//! estimates, and the final assessment result.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ItemError;

/// Smallest discrimination the numeric routines will ever use.
pub const MIN_DISCRIMINATION: f64 = 0.1;

/// Largest guessing value the numeric routines will ever use.
pub const MAX_GUESSING: f64 = 0.999;

/// Per-item IRT parameters under the 3PL model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemParameters {
    /// Ability at which the item is answered correctly half the time (ignoring guessing).
    pub difficulty: f64,
    /// Slope of the response curve around `difficulty`. Must stay > 0.
    #[serde(default = "default_discrimination")]
    pub discrimination: f64,
    /// Lower asymptote: chance of a correct blind guess.
    #[serde(default)]
    pub guessing: f64,
}

fn default_discrimination() -> f64 {
    1.0
}

impl Default for ItemParameters {
    fn default() -> Self {
        Self {
            difficulty: 0.0,
            discrimination: default_discrimination(),
            guessing: 0.0,
        }
    }
}

impl ItemParameters {
    pub fn new(difficulty: f64, discrimination: f64, guessing: f64) -> Self {
        Self {
            difficulty,
            discrimination,
            guessing,
        }
    }

    /// Check the 3PL invariants, naming `item_id` in the error.
    pub fn validate(&self, item_id: &str) -> Result<(), ItemError> {
        for (field, value) in [
            ("difficulty", self.difficulty),
            ("discrimination", self.discrimination),
            ("guessing", self.guessing),
        ] {
            if !value.is_finite() {
                return Err(ItemError::NonFinite {
                    item_id: item_id.to_string(),
                    field,
                    value,
                });
            }
        }
        if self.discrimination <= 0.0 {
            return Err(ItemError::NonPositiveDiscrimination {
                item_id: item_id.to_string(),
                value: self.discrimination,
            });
        }
        if !(0.0..1.0).contains(&self.guessing) {
            return Err(ItemError::GuessingOutOfRange {
                item_id: item_id.to_string(),
                value: self.guessing,
            });
        }
        Ok(())
    }

    /// Clamp every parameter into the range the numeric routines accept.
    ///
    /// Valid parameters come back unchanged (apart from discrimination below
    /// [`MIN_DISCRIMINATION`]), so this is safe to call on every use.
    pub fn sanitized(&self) -> Self {
        let difficulty = if self.difficulty.is_finite() {
            self.difficulty
        } else {
            0.0
        };
        let discrimination = if self.discrimination.is_finite() {
            self.discrimination.max(MIN_DISCRIMINATION)
        } else {
            MIN_DISCRIMINATION
        };
        let guessing = if self.guessing.is_finite() {
            self.guessing.clamp(0.0, MAX_GUESSING)
        } else {
            0.0
        };
        Self {
            difficulty,
            discrimination,
            guessing,
        }
    }
}

/// A question in an item bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within the bank.
    pub id: String,
    /// Text presented to the test-taker.
    #[serde(default)]
    pub prompt: String,
    /// Answer key, compared case-insensitively by interactive front ends.
    #[serde(default)]
    pub answer: Option<String>,
    /// Free-form tags (topic, skill, source).
    #[serde(default)]
    pub tags: Vec<String>,
    /// IRT parameters.
    pub params: ItemParameters,
}

impl Item {
    pub fn new(id: impl Into<String>, params: ItemParameters) -> Self {
        Self {
            id: id.into(),
            prompt: String::new(),
            answer: None,
            tags: Vec::new(),
            params,
        }
    }

    /// Whether `response` matches the answer key. Items without a key never match.
    pub fn is_correct(&self, response: &str) -> bool {
        self.answer
            .as_deref()
            .is_some_and(|key| key.trim().eq_ignore_ascii_case(response.trim()))
    }
}

/// A named pool of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl ItemBank {
    pub fn summary(&self) -> BankSummary {
        BankSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            item_count: self.items.len(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Summary of a bank without the items themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub item_count: usize,
}

/// One administered item and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub item_id: String,
    /// Parameters as they were when the item was administered.
    pub params: ItemParameters,
    pub correct: bool,
    pub response_time_secs: f64,
    pub answered_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(
        item_id: impl Into<String>,
        params: ItemParameters,
        correct: bool,
        response_time_secs: f64,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            params,
            correct,
            response_time_secs,
            answered_at: Utc::now(),
        }
    }
}

/// Current estimate of a test-taker's latent ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    /// Ability on the same scale as item difficulty.
    pub theta: f64,
    /// Precision-derived confidence in `[0, 1]`.
    pub confidence: f64,
    /// Correctness flags of the responses that produced this estimate, in order.
    pub history: Vec<bool>,
    /// Fisher information at `theta` summed over the history.
    #[serde(default)]
    pub information: f64,
    /// Newton steps taken to reach `theta`.
    #[serde(default)]
    pub iterations: u32,
}

impl AbilityEstimate {
    /// The state before any response: `theta` as given, zero confidence.
    pub fn seed(theta: f64) -> Self {
        Self {
            theta,
            confidence: 0.0,
            history: Vec::new(),
            information: 0.0,
            iterations: 0,
        }
    }

    /// Standard error implied by the accumulated information, if any.
    pub fn standard_error(&self) -> Option<f64> {
        (self.information > 0.0).then(|| 1.0 / self.information.sqrt())
    }
}

impl Default for AbilityEstimate {
    fn default() -> Self {
        Self::seed(0.0)
    }
}

/// Reportable proficiency category, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProficiencyBand {
    NeedsImprovement,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ProficiencyBand {
    pub const ALL: [ProficiencyBand; 5] = [
        ProficiencyBand::NeedsImprovement,
        ProficiencyBand::Beginner,
        ProficiencyBand::Intermediate,
        ProficiencyBand::Advanced,
        ProficiencyBand::Expert,
    ];
}

impl fmt::Display for ProficiencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProficiencyBand::NeedsImprovement => write!(f, "NEEDS_IMPROVEMENT"),
            ProficiencyBand::Beginner => write!(f, "BEGINNER"),
            ProficiencyBand::Intermediate => write!(f, "INTERMEDIATE"),
            ProficiencyBand::Advanced => write!(f, "ADVANCED"),
            ProficiencyBand::Expert => write!(f, "EXPERT"),
        }
    }
}

impl FromStr for ProficiencyBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "NEEDS_IMPROVEMENT" => Ok(ProficiencyBand::NeedsImprovement),
            "BEGINNER" => Ok(ProficiencyBand::Beginner),
            "INTERMEDIATE" => Ok(ProficiencyBand::Intermediate),
            "ADVANCED" => Ok(ProficiencyBand::Advanced),
            "EXPERT" => Ok(ProficiencyBand::Expert),
            other => Err(format!("unknown proficiency band: {other}")),
        }
    }
}

/// Final outcome of an adaptive session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Score on a 0–100 scale.
    pub score: f64,
    pub proficiency_band: ProficiencyBand,
    pub confidence_percent: u32,
    pub recommendations: Vec<String>,
    /// Ability the score was derived from.
    pub theta: f64,
    pub questions_answered: usize,
}
