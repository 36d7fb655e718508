//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::bank::{load_banks, validate_bank};
use adaptest_core::config::load_config_from;

pub fn execute(bank_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let banks = load_banks(&bank_path)?;

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Item bank: {} ({} items)", bank.name, bank.items.len());

        let warnings = validate_bank(bank, config.termination.min_questions);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if banks.is_empty() {
        println!("No item banks found.");
    } else if total_warnings == 0 {
        println!("All item banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
