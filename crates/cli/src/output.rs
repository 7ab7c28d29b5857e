//! Printing view models to the terminal, as text or JSON.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use xcs_engine::Outcome;
use xcs_types::{Banner, Dialog, ErrorModal, Table};
use xcs_util::render::{render_banner, render_dialog, render_error, render_table};

const DEFAULT_WIDTH: usize = 100;

/// JSON form of a change, kept as one document so `--json` output parses.
#[derive(Debug, Serialize)]
struct OutcomeReport<'a> {
    banner: &'a Banner,
    #[serde(skip_serializing_if = "Option::is_none")]
    refreshed: Option<&'a Table>,
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
    width: usize,
}

impl Output {
    pub fn new(json: bool) -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|columns| columns.trim().parse().ok())
            .filter(|columns: &usize| *columns > 0)
            .unwrap_or(DEFAULT_WIDTH);
        Self { json, width }
    }

    pub fn table(&self, table: &Table) -> Result<()> {
        if self.json {
            return self.value(table);
        }
        print!("{}", render_table(table));
        Ok(())
    }

    pub fn dialog(&self, dialog: &Dialog) -> Result<()> {
        if self.json {
            return self.value(dialog);
        }
        print!("{}", render_dialog(dialog, self.width));
        Ok(())
    }

    pub fn banner(&self, banner: &Banner) -> Result<()> {
        if self.json {
            return self.value(banner);
        }
        println!("{}", render_banner(banner));
        Ok(())
    }

    /// The banner of a change, followed by the re-fetched table it changed.
    pub fn outcome(&self, outcome: &Outcome, refreshed: Option<&Table>) -> Result<()> {
        if self.json {
            return self.value(&OutcomeReport {
                banner: &outcome.banner,
                refreshed,
            });
        }
        println!("{}", render_banner(&outcome.banner));
        if let Some(table) = refreshed {
            print!("{}", render_table(table));
        }
        Ok(())
    }

    /// Plain values print as their JSON form in both modes.
    pub fn value<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("could not serialize output")?;
        println!("{text}");
        Ok(())
    }

    pub fn error(&self, modal: &ErrorModal) {
        if self.json {
            if let Ok(text) = serde_json::to_string_pretty(modal) {
                eprintln!("{text}");
                return;
            }
        }
        eprintln!("{}", render_error(modal));
    }
}

/// Ask a yes/no question on stdin. `assume_yes` answers without asking.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    eprint!("{prompt} [y/N] ");
    io::stderr().flush().ok();
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("could not read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
