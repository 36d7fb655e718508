//! Maximum-likelihood ability estimation.
//!
//! A bounded single-parameter Newton-Raphson search. Per response the score
//! contribution is `a · (u - p)` and the curvature contribution is
//! `-a² · p · (1 - p)`; neither divides by `p · (1 - p)`, so probabilities
//! near 0 or 1 cannot amplify rounding error. The iteration cap bounds the
//! cost of every call.

use crate::config::{ConfidenceScale, EstimationConfig};
use crate::irt::probability_correct;
use crate::model::{AbilityEstimate, ResponseRecord};

/// Re-estimate ability from the full response history.
///
/// An empty history is the valid starting state and returns
/// [`AbilityEstimate::seed`] of `initial_theta`.
pub fn estimate_ability(
    responses: &[ResponseRecord],
    initial_theta: f64,
    config: &EstimationConfig,
) -> AbilityEstimate {
    if responses.is_empty() {
        return AbilityEstimate::seed(initial_theta);
    }

    let mut theta = initial_theta;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        let mut gradient = 0.0;
        let mut curvature = 0.0;
        for r in responses {
            let params = r.params.sanitized();
            let p = probability_correct(theta, &params);
            let observed = if r.correct { 1.0 } else { 0.0 };
            let a = params.discrimination;
            gradient += a * (observed - p);
            curvature -= a * a * p * (1.0 - p);
        }

        if curvature.abs() < config.curvature_epsilon {
            tracing::debug!(
                theta,
                curvature,
                iterations,
                "curvature vanished, stopping estimation"
            );
            break;
        }

        let step = gradient / curvature;
        let next = theta - step;
        if !next.is_finite() {
            break;
        }
        theta = next;
        iterations += 1;

        if step.abs() < config.convergence_threshold {
            break;
        }
    }

    let information = fisher_information(responses, theta);
    let estimate = AbilityEstimate {
        theta,
        confidence: confidence_from_information(information, config.confidence_scale),
        history: responses.iter().map(|r| r.correct).collect(),
        information,
        iterations,
    };

    tracing::debug!(
        theta = estimate.theta,
        confidence = estimate.confidence,
        information,
        iterations,
        responses = responses.len(),
        "ability re-estimated"
    );

    estimate
}

/// Fisher information of the administered items at `theta`.
pub fn fisher_information(responses: &[ResponseRecord], theta: f64) -> f64 {
    crate::irt::test_information(theta, responses.iter().map(|r| &r.params))
}

/// Map accumulated information to a confidence value in `[0, 1]`.
///
/// Zero (or non-finite) information always maps to zero confidence.
pub fn confidence_from_information(information: f64, scale: ConfidenceScale) -> f64 {
    if !(information.is_finite() && information > 0.0) {
        return 0.0;
    }
    let inverse_se = (1.0 / information.sqrt()).min(1.0);
    match scale {
        ConfidenceScale::InverseSqrtInformation => inverse_se,
        ConfidenceScale::Precision => 1.0 - inverse_se,
    }
}
