//! The `adaptest simulate` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};

use adaptest_core::bank::parse_bank;
use adaptest_core::config::load_config_from;
use adaptest_core::report::SimulationReport;
use adaptest_core::session::AdaptiveEngine;
use adaptest_core::simulation::{simulate_batch, ConditionalStats};

pub fn execute(
    bank_path: PathBuf,
    thetas_str: String,
    replications: usize,
    seed: u64,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let thetas = parse_thetas(&thetas_str)?;
    anyhow::ensure!(replications > 0, "replications must be at least 1");

    let config = load_config_from(config_path.as_deref())?;
    let bank = parse_bank(&bank_path)?;
    anyhow::ensure!(!bank.items.is_empty(), "item bank '{}' has no items", bank.id);

    eprintln!(
        "Simulating {} session(s) against {} ({} items)",
        thetas.len() * replications,
        bank.name,
        bank.items.len()
    );

    let start = Instant::now();
    let engine = AdaptiveEngine::new(config.clone());
    let runs = simulate_batch(&engine, &bank.items, &thetas, replications, seed)?;
    let report = SimulationReport::new(bank.summary(), seed, config, runs);

    print_summary(&report.summary);
    eprintln!("Done in {:.2}s", start.elapsed().as_secs_f64());

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn parse_thetas(s: &str) -> Result<Vec<f64>> {
    let thetas = s
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            let theta: f64 = t
                .parse()
                .with_context(|| format!("invalid theta value: '{t}'"))?;
            anyhow::ensure!(theta.is_finite(), "theta must be finite: '{t}'");
            Ok(theta)
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!thetas.is_empty(), "no theta values given");
    Ok(thetas)
}

fn print_summary(summary: &[ConditionalStats]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["True θ", "Bias", "RMSE", "Mean items", "Mean score"]);

    for stats in summary {
        table.add_row(vec![
            Cell::new(format!("{:+.2}", stats.true_theta)),
            Cell::new(format!("{:+.3}", stats.bias)),
            Cell::new(format!("{:.3}", stats.rmse)),
            Cell::new(format!("{:.1}", stats.mean_items)),
            Cell::new(format!("{:.1}", stats.mean_score)),
        ]);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_and_spaced_thetas() {
        assert_eq!(parse_thetas("-2, -0.5,1").unwrap(), vec![-2.0, -0.5, 1.0]);
    }

    #[test]
    fn rejects_garbage_thetas() {
        assert!(parse_thetas("1,abc").is_err());
        assert!(parse_thetas(" , ").is_err());
        assert!(parse_thetas("inf").is_err());
    }
}
