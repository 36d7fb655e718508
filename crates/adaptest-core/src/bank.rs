//! TOML item-bank parser.
//!
//! Loads item banks from TOML files and directories, rejects items whose IRT
//! parameters the engine cannot use, and flags suspicious-but-usable content.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Item, ItemBank, ItemParameters};

/// On-disk layout of an item-bank file.
#[derive(Debug, Serialize, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlItem {
    id: String,
    #[serde(default)]
    prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    difficulty: f64,
    #[serde(default = "default_discrimination")]
    discrimination: f64,
    #[serde(default)]
    guessing: f64,
}

fn default_discrimination() -> f64 {
    1.0
}

/// Parse a single TOML file into an `ItemBank`.
pub fn parse_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into an `ItemBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<ItemBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .map(|i| {
            let params = ItemParameters::new(i.difficulty, i.discrimination, i.guessing);
            params
                .validate(&i.id)
                .with_context(|| format!("invalid item in {}", source_path.display()))?;
            Ok(Item {
                id: i.id,
                prompt: i.prompt,
                answer: i.answer,
                tags: i.tags,
                params,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ItemBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        items,
    })
}

/// Recursively load all `.toml` item banks from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<ItemBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a single file, or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<ItemBank>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_bank(path)?])
    }
}

/// Serialize a bank back to the on-disk TOML layout.
pub fn bank_to_toml(bank: &ItemBank) -> Result<String> {
    let file = TomlBankFile {
        bank: TomlBankHeader {
            id: bank.id.clone(),
            name: bank.name.clone(),
            description: bank.description.clone(),
        },
        items: bank
            .items
            .iter()
            .map(|i| TomlItem {
                id: i.id.clone(),
                prompt: i.prompt.clone(),
                answer: i.answer.clone(),
                tags: i.tags.clone(),
                difficulty: i.params.difficulty,
                discrimination: i.params.discrimination,
                guessing: i.params.guessing,
            })
            .collect(),
    };
    toml::to_string_pretty(&file).context("failed to serialize item bank")
}

/// Write a bank to `path`, creating parent directories as needed.
pub fn write_bank(bank: &ItemBank, path: &Path) -> Result<()> {
    let content = bank_to_toml(bank)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write item bank to {}", path.display()))
}

/// A warning from item-bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for content that parses but will behave poorly.
pub fn validate_bank(bank: &ItemBank, min_questions: u32) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |item: &Item, message: String| {
        warnings.push(ValidationWarning {
            item_id: Some(item.id.clone()),
            message,
        })
    };

    let mut seen_ids = HashSet::new();
    for item in &bank.items {
        if !seen_ids.insert(&item.id) {
            warn(item, format!("duplicate item ID: {}", item.id));
        }
        if item.prompt.trim().is_empty() {
            warn(item, "prompt is empty".into());
        }
        if item.answer.is_none() {
            warn(item, "no answer key; interactive sessions will score it incorrect".into());
        }

        let p = &item.params;
        if p.difficulty.abs() > 3.0 {
            warn(
                item,
                format!("difficulty {} is outside the usual [-3, 3] range", p.difficulty),
            );
        }
        if p.discrimination > 3.0 {
            warn(
                item,
                format!("discrimination {} is unusually high (> 3)", p.discrimination),
            );
        }
        if p.guessing > 0.5 {
            warn(
                item,
                format!("guessing {} is above 0.5; the item is mostly chance", p.guessing),
            );
        }
    }

    if bank.items.len() < min_questions as usize {
        warnings.push(ValidationWarning {
            item_id: None,
            message: format!(
                "bank has {} items, fewer than the {} required before a precision stop",
                bank.items.len(),
                min_questions
            ),
        });
    }

    warnings
}
