//! The `adaptest score` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::config::load_config_from;
use adaptest_core::model::AbilityEstimate;
use adaptest_core::scoring::finalize;

pub fn execute(theta: f64, confidence: f64, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(theta.is_finite(), "theta must be a finite number");
    anyhow::ensure!(
        (0.0..=1.0).contains(&confidence),
        "confidence must be between 0.0 and 1.0"
    );

    let config = load_config_from(config_path.as_deref())?;
    let ability = AbilityEstimate {
        confidence,
        ..AbilityEstimate::seed(theta)
    };
    let result = finalize(&ability, &config.scoring);

    println!("Theta:      {theta:.3}");
    println!("Score:      {:.1}", result.score);
    println!("Band:       {}", result.proficiency_band);
    println!("Confidence: {}%", result.confidence_percent);
    println!("\nRecommendations:");
    for r in &result.recommendations {
        println!("  - {r}");
    }

    Ok(())
}
