//! adaptest-core: IRT-driven adaptive assessment engine.
//!
//! This crate holds the numerical core (3PL response model, Newton-Raphson
//! ability estimation, maximum-information item selection, stopping rules,
//! scoring) together with the caller-side session driver, item-bank loading,
//! out-of-band item calibration, and Monte-Carlo simulation.

pub mod bank;
pub mod calibration;
pub mod config;
pub mod error;
pub mod estimation;
pub mod irt;
pub mod model;
pub mod report;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod simulation;
pub mod termination;

pub use config::EngineConfig;
pub use estimation::estimate_ability;
pub use irt::probability_correct;
pub use model::{
    AbilityEstimate, AssessmentResult, Item, ItemBank, ItemParameters, ProficiencyBand,
    ResponseRecord,
};
pub use scoring::finalize;
pub use selection::select_next;
pub use session::{AdaptiveEngine, AssessmentSession, NextItem};
pub use termination::{should_continue, StopReason, TurnDecision};
