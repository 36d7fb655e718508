//! Final scoring: theta to a 0–100 score, a proficiency band, and advice.

use crate::config::ScoringConfig;
use crate::model::{AbilityEstimate, AssessmentResult, ProficiencyBand};

/// Map theta onto the reporting scale, clamped to `[0, 100]`.
pub fn score_from_theta(theta: f64, config: &ScoringConfig) -> f64 {
    let score = config.center + theta * config.scale;
    if score.is_nan() {
        return config.center.clamp(0.0, 100.0);
    }
    score.clamp(0.0, 100.0)
}

/// Band for a score. Lower bounds are inclusive.
pub fn band_for_score(score: f64) -> ProficiencyBand {
    if score >= 90.0 {
        ProficiencyBand::Expert
    } else if score >= 80.0 {
        ProficiencyBand::Advanced
    } else if score >= 70.0 {
        ProficiencyBand::Intermediate
    } else if score >= 60.0 {
        ProficiencyBand::Beginner
    } else {
        ProficiencyBand::NeedsImprovement
    }
}

pub fn recommendations(band: ProficiencyBand) -> &'static [&'static str] {
    match band {
        ProficiencyBand::NeedsImprovement => &[
            "Review the foundational material before retaking the assessment",
            "Work through guided practice problems with worked solutions",
            "Schedule time with an instructor or tutor",
        ],
        ProficiencyBand::Beginner => &[
            "Strengthen core concepts with targeted practice",
            "Revisit the topics of the questions you missed",
            "Retake the assessment after a focused study session",
        ],
        ProficiencyBand::Intermediate => &[
            "Practice applying concepts to unfamiliar problems",
            "Focus on the harder questions in your weaker topics",
            "Explore intermediate-to-advanced material",
        ],
        ProficiencyBand::Advanced => &[
            "Take on challenging, open-ended problems",
            "Study edge cases and advanced techniques",
            "Consider helping peers to consolidate your understanding",
        ],
        ProficiencyBand::Expert => &[
            "Pursue expert-level or specialized material",
            "Mentor others in this subject",
            "Contribute new questions to the item bank",
        ],
    }
}

/// Produce the final report for a session's last ability estimate.
pub fn finalize(ability: &AbilityEstimate, config: &ScoringConfig) -> AssessmentResult {
    let score = score_from_theta(ability.theta, config);
    let band = band_for_score(score);
    let confidence_percent = (ability.confidence.clamp(0.0, 1.0) * 100.0).round() as u32;

    AssessmentResult {
        score,
        proficiency_band: band,
        confidence_percent,
        recommendations: recommendations(band).iter().map(|r| r.to_string()).collect(),
        theta: ability.theta,
        questions_answered: ability.history.len(),
    }
}
