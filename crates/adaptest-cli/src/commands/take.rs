//! The `adaptest take` command.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use adaptest_core::bank::{parse_bank, write_bank};
use adaptest_core::calibration::{CalibrationJob, CalibrationQueue, InMemoryItemStore};
use adaptest_core::config::{load_config_from, CalibrationConfig};
use adaptest_core::model::{AbilityEstimate, Item, ItemBank, ResponseRecord};
use adaptest_core::report::SessionReport;
use adaptest_core::session::{AdaptiveEngine, Responder, Response, SessionObserver, SessionOutcome};

/// Reads answers line by line and grades them against the item's key.
struct ConsoleResponder<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Responder for ConsoleResponder<R, W> {
    fn respond(&mut self, item: &Item, turn: usize) -> Result<Response> {
        writeln!(self.output, "\nQuestion {turn}: {}", item.prompt)?;
        write!(self.output, "> ")?;
        self.output.flush()?;

        let start = Instant::now();
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read answer")?;
        if read == 0 {
            anyhow::bail!("input closed before the session finished");
        }
        let elapsed = start.elapsed();

        Ok(Response {
            correct: item.is_correct(&line),
            response_time: elapsed.max(Duration::from_millis(1)),
        })
    }
}

/// Console progress observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_item_presented(&self, item: &Item, turn: usize) {
        tracing::debug!(item_id = %item.id, turn, "presenting item");
    }

    fn on_response_recorded(&self, record: &ResponseRecord, ability: &AbilityEstimate) {
        let verdict = if record.correct { "Correct" } else { "Incorrect" };
        eprintln!(
            "  {verdict}. Estimate now θ={:.2} (confidence {:.2})",
            ability.theta, ability.confidence
        );
    }

    fn on_session_complete(&self, outcome: &SessionOutcome) {
        eprintln!(
            "\nSession complete after {} question(s): {}",
            outcome.session.questions_answered(),
            outcome.stop_reason
        );
    }
}

pub async fn execute(
    bank_path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    calibrate_out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = parse_bank(&bank_path)?;
    anyhow::ensure!(!bank.items.is_empty(), "item bank '{}' has no items", bank.id);

    println!("{} ({} items)", bank.name, bank.items.len());
    if !bank.description.is_empty() {
        println!("{}", bank.description);
    }

    let engine = AdaptiveEngine::new(config.clone());
    let stdin = std::io::stdin();
    let mut responder = ConsoleResponder {
        input: stdin.lock(),
        output: std::io::stdout(),
    };
    let outcome = engine.run(&bank.items, &mut responder, &ConsoleObserver)?;

    print_result(&outcome);

    if let Some(path) = output {
        SessionReport::from_outcome(bank.summary(), &outcome).save_json(&path)?;
        eprintln!("Session report saved to: {}", path.display());
    }

    if let Some(path) = calibrate_out {
        recalibrate(&bank, &outcome, config.calibration, &path).await?;
    }

    Ok(())
}

fn print_result(outcome: &SessionOutcome) {
    let result = &outcome.result;
    println!("\nScore:      {:.1}", result.score);
    println!("Band:       {}", result.proficiency_band);
    println!("Confidence: {}%", result.confidence_percent);
    println!("Questions:  {}", result.questions_answered);
    println!("\nRecommendations:");
    for r in &result.recommendations {
        println!("  - {r}");
    }
}

/// Feed the session's responses through the calibration queue and write the
/// adjusted bank to `path`.
async fn recalibrate(
    bank: &ItemBank,
    outcome: &SessionOutcome,
    config: CalibrationConfig,
    path: &Path,
) -> Result<()> {
    let store = Arc::new(InMemoryItemStore::from_items(
        bank.items.iter().map(|i| (i.id.clone(), i.params)),
    ));
    let mut queue = CalibrationQueue::spawn(store.clone(), config);
    for record in &outcome.session.responses {
        queue.submit(CalibrationJob::from(record));
    }
    let stats = queue.shutdown().await?;

    let snapshot = store.snapshot().await;
    let mut updated = bank.clone();
    for item in &mut updated.items {
        if let Some(v) = snapshot.get(&item.id) {
            item.params = v.params;
        }
    }
    write_bank(&updated, path)?;

    eprintln!(
        "Recalibrated {} item(s) ({} conflicts, {} failed, {} dropped) -> {}",
        stats.applied,
        stats.conflicts,
        stats.failed,
        stats.dropped,
        path.display()
    );
    Ok(())
}
