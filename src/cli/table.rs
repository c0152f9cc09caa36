//! Row rendering for the opportunities table.

use std::io::Write;

use clap::ValueEnum;
use opportunities::{Config, Opportunity, Stage};
use serde::Serialize;

use crate::cli::terminal::{self, Colorize};

const EMPTY_MESSAGE: &str = "No opportunities found";

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SerializableRow<'a> {
    display_id: String,
    #[serde(flatten)]
    opportunity: &'a Opportunity,
}

/// The visible opportunities, ready to print.
pub struct Table<'a> {
    config: &'a Config,
    rows: Vec<&'a Opportunity>,
}

impl<'a> Table<'a> {
    pub const fn new(config: &'a Config, rows: Vec<&'a Opportunity>) -> Self {
        Self { config, rows }
    }

    pub fn render(&self, out: &mut impl Write, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Table => self.render_table(out, !terminal::is_narrow()),
            OutputFormat::Json => self.render_json(out),
        }
    }

    fn render_json(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let rows: Vec<_> = self
            .rows
            .iter()
            .map(|opportunity| SerializableRow {
                display_id: self.config.display_id(opportunity.id()).to_string(),
                opportunity,
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        Ok(())
    }

    fn render_table(&self, out: &mut impl Write, with_closing: bool) -> anyhow::Result<()> {
        if self.rows.is_empty() {
            writeln!(out, "{}", EMPTY_MESSAGE.dim())?;
            return Ok(());
        }

        let mut headers = vec!["Opp ID", "Customer", "Value", "Stage"];
        if with_closing {
            headers.push("Closing");
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|opportunity| {
                let mut row = vec![
                    self.config.display_id(opportunity.id()).to_string(),
                    opportunity.customer.clone(),
                    format!("${}", opportunity.value),
                    opportunity.stage.to_string(),
                ];
                if with_closing {
                    row.push(opportunity.closing_date.clone().unwrap_or_default());
                }
                row
            })
            .collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                cells
                    .iter()
                    .map(|row| row[column].chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect();

        let header_line = headers
            .iter()
            .zip(&widths)
            .map(|(header, &width)| format!("{header:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(out, "{}", header_line.trim_end().dim())?;

        for (opportunity, row) in self.rows.iter().zip(&cells) {
            let line = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(column, (cell, &width))| {
                    let padded = format!("{cell:<width$}");
                    if column == 3 {
                        colour_stage(opportunity.stage, &padded)
                    } else {
                        padded
                    }
                })
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(out, "{}", line.trim_end())?;
        }

        Ok(())
    }
}

/// Open stages are highlighted; closed ones show the outcome.
fn colour_stage(stage: Stage, text: &str) -> String {
    if !stage.is_closed() {
        return text.info();
    }
    if stage == Stage::ClosedWon {
        text.success()
    } else {
        text.warning()
    }
}
