//! Maximum-information item selection.

use std::collections::HashSet;

use crate::config::SelectionConfig;
use crate::irt::item_information;
use crate::model::{AbilityEstimate, Item};

/// A pool item scored at the current ability.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub item: &'a Item,
    pub item_id: &'a str,
    /// Fisher information at the current theta.
    pub information: f64,
    /// `|difficulty - theta|`.
    pub proximity: f64,
}

/// Score every item not yet answered.
pub fn candidates<'a>(
    pool: &'a [Item],
    ability: &AbilityEstimate,
    answered: &HashSet<String>,
) -> Vec<Candidate<'a>> {
    pool.iter()
        .filter(|item| !answered.contains(&item.id))
        .map(|item| {
            let params = item.params.sanitized();
            Candidate {
                item,
                item_id: &item.id,
                information: item_information(ability.theta, &params),
                proximity: (params.difficulty - ability.theta).abs(),
            }
        })
        .collect()
}

/// Pick the next item to administer, or `None` when every item is answered.
///
/// The item with maximum information wins, except that any item whose
/// information is within `information_tolerance` of the maximum competes on
/// proximity: among those, the one whose difficulty is closest to theta is
/// chosen. Remaining ties go to higher information, then pool order.
pub fn select_next<'a>(
    pool: &'a [Item],
    ability: &AbilityEstimate,
    answered: &HashSet<String>,
    config: &SelectionConfig,
) -> Option<&'a Item> {
    let scored = candidates(pool, ability, answered);
    let best = pick(&scored, config.information_tolerance)?;

    tracing::debug!(
        item_id = best.item_id,
        information = best.information,
        proximity = best.proximity,
        theta = ability.theta,
        remaining = scored.len(),
        "selected next item"
    );

    Some(best.item)
}

fn pick<'c, 'a>(scored: &'c [Candidate<'a>], tolerance: f64) -> Option<&'c Candidate<'a>> {
    let max_info = scored
        .iter()
        .map(|c| c.information)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut best: Option<&Candidate<'a>> = None;
    for candidate in scored.iter().filter(|c| max_info - c.information < tolerance) {
        best = match best {
            None => Some(candidate),
            Some(current) if closer(candidate, current) => Some(candidate),
            keep => keep,
        };
    }

    // Tolerance 0 (or NaN information) leaves no tie group; fall back to the maximum.
    best.or_else(|| {
        scored
            .iter()
            .reduce(|a, b| if b.information > a.information { b } else { a })
    })
}

fn closer(candidate: &Candidate<'_>, current: &Candidate<'_>) -> bool {
    if candidate.proximity != current.proximity {
        candidate.proximity < current.proximity
    } else {
        candidate.information > current.information
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemParameters;

    fn pool(difficulties: &[f64]) -> Vec<Item> {
        difficulties
            .iter()
            .enumerate()
            .map(|(i, &b)| Item::new(format!("q{i}"), ItemParameters::new(b, 1.0, 0.0)))
            .collect()
    }

    fn answered(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_item_at_current_ability() {
        let items = pool(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        let chosen = select_next(
            &items,
            &AbilityEstimate::seed(0.0),
            &HashSet::new(),
            &SelectionConfig::default(),
        )
        .unwrap();
        assert_eq!(chosen.params.difficulty, 0.0);
    }

    #[test]
    fn never_returns_answered_items() {
        let items = pool(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        let done = answered(&["q2", "q3"]);
        let chosen = select_next(
            &items,
            &AbilityEstimate::seed(0.0),
            &done,
            &SelectionConfig::default(),
        )
        .unwrap();
        assert!(!done.contains(&chosen.id));
        assert_eq!(chosen.id, "q1");
    }

    #[test]
    fn exhausted_pool_yields_none() {
        let items = pool(&[0.0, 1.0]);
        let done = answered(&["q0", "q1"]);
        let config = SelectionConfig::default();
        assert!(select_next(&items, &AbilityEstimate::seed(0.0), &done, &config).is_none());
        assert!(select_next(&[], &AbilityEstimate::seed(0.0), &HashSet::new(), &config).is_none());
    }

    #[test]
    fn proximity_breaks_information_ties() {
        // A highly discriminating item far from theta carries the most
        // information; two ordinary items fall inside the tolerance and the
        // one closer to theta wins.
        let items = vec![
            Item::new("sharp", ItemParameters::new(0.9, 1.3, 0.0)),
            Item::new("near", ItemParameters::new(0.1, 1.0, 0.0)),
            Item::new("far", ItemParameters::new(-0.6, 1.0, 0.0)),
        ];
        let ability = AbilityEstimate::seed(0.0);
        let scored = candidates(&items, &ability, &HashSet::new());
        let sharp = scored[0].information;
        assert!(scored.iter().all(|c| sharp - c.information < 0.1));
        assert!(scored[1].information < sharp);

        let chosen = select_next(&items, &ability, &HashSet::new(), &SelectionConfig::default())
            .unwrap();
        assert_eq!(chosen.id, "near");
    }

    #[test]
    fn clear_information_gap_beats_proximity() {
        let items = vec![
            Item::new("weak-near", ItemParameters::new(0.0, 0.3, 0.0)),
            Item::new("strong-off", ItemParameters::new(0.5, 2.0, 0.0)),
        ];
        let chosen = select_next(
            &items,
            &AbilityEstimate::seed(0.0),
            &HashSet::new(),
            &SelectionConfig::default(),
        )
        .unwrap();
        assert_eq!(chosen.id, "strong-off");
    }

    #[test]
    fn zero_tolerance_is_pure_max_information() {
        let items = vec![
            Item::new("near", ItemParameters::new(0.05, 1.0, 0.0)),
            Item::new("sharp", ItemParameters::new(0.3, 1.5, 0.0)),
        ];
        let config = SelectionConfig {
            information_tolerance: 0.0,
        };
        let chosen =
            select_next(&items, &AbilityEstimate::seed(0.0), &HashSet::new(), &config).unwrap();
        assert_eq!(chosen.id, "sharp");
    }
}
