//! Three-parameter logistic response model.
//!
//! `P(correct | theta) = c + (1 - c) / (1 + exp(-a * (theta - b)))`
//!
//! Every function here is total: parameters go through
//! [`ItemParameters::sanitized`] and the logistic exponent is clamped, so any
//! finite theta yields a finite probability.

use crate::model::ItemParameters;

/// Bound on `|a * (theta - b)|` before exponentiating.
pub const EXPONENT_LIMIT: f64 = 35.0;

#[inline]
fn logistic(z: f64) -> f64 {
    let z = z.clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT);
    1.0 / (1.0 + (-z).exp())
}

/// Probability of a correct response at ability `theta`.
///
/// The result lies in `[guessing, 1]` and is non-decreasing in `theta`.
#[inline]
pub fn probability_correct(theta: f64, item: &ItemParameters) -> f64 {
    let item = item.sanitized();
    let z = item.discrimination * (theta - item.difficulty);
    let p = item.guessing + (1.0 - item.guessing) * logistic(z);
    p.clamp(0.0, 1.0)
}

/// Fisher information contributed by one item at `theta`: `a² · p · (1 - p)`.
#[inline]
pub fn item_information(theta: f64, item: &ItemParameters) -> f64 {
    let a = item.sanitized().discrimination;
    let p = probability_correct(theta, item);
    a * a * p * (1.0 - p)
}

/// Total information of a set of items at `theta`.
pub fn test_information<'a, I>(theta: f64, items: I) -> f64
where
    I: IntoIterator<Item = &'a ItemParameters>,
{
    items
        .into_iter()
        .map(|item| item_information(theta, item))
        .sum()
}
