//! The interactive session.
//!
//! The session owns the store together with the transient search text and
//! stage selector. Each input line is one command; after any command that
//! changes the store or the filters, the visible rows are recomputed and
//! printed.

use std::{
    io::{BufRead, Write},
    num::NonZeroUsize,
};

use anyhow::Context;
use clap::Parser;
use opportunities::{
    Config, Draft, FilteredView, Opportunity, OpportunityStore, Query, StageFilter, Submission,
};
use tracing::{debug, info, instrument};

use crate::cli::{
    table::{OutputFormat, Table},
    terminal::Colorize,
};

const PROMPT: &str = "opps> ";

#[derive(Debug, Parser)]
#[command(
    no_binary_name = true,
    disable_version_flag = true,
    subcommand_required = true
)]
struct Line {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Debug, clap::Subcommand)]
enum SessionCommand {
    /// Show the visible opportunities
    #[command(alias = "ls")]
    List {
        /// Output format (default: table)
        #[arg(long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Search by opp ID, customer, or value (no text clears the search)
    Search {
        /// Text to search for
        text: Vec<String>,
    },

    /// Filter by stage ("All" or a stage name)
    Stage {
        /// Stage name, e.g. Closed Won
        #[arg(required = true)]
        stage: Vec<String>,
    },

    /// Reset the search text and stage filter
    Clear,

    /// Add an opportunity
    Add(DraftArgs),

    /// Edit an opportunity
    ///
    /// Fields that are not given keep their current value. Pass an empty
    /// string to clear the closing date or notes.
    Edit {
        /// Opportunity ID, e.g. 7 or O-007
        id: String,

        #[command(flatten)]
        fields: DraftArgs,
    },

    /// Delete an opportunity
    #[command(alias = "rm")]
    Delete {
        /// Opportunity ID, e.g. 7 or O-007
        id: String,
    },

    /// Show every field of an opportunity
    Show {
        /// Opportunity ID, e.g. 7 or O-007
        id: String,
    },

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

/// Form fields for `add` and `edit`.
#[derive(Debug, clap::Args)]
struct DraftArgs {
    /// Customer name
    #[arg(long)]
    customer: Option<String>,

    /// Expected value
    #[arg(long)]
    value: Option<String>,

    /// Stage name (default: Prospecting)
    #[arg(long)]
    stage: Option<String>,

    /// Expected closing date
    #[arg(long)]
    closing_date: Option<String>,

    /// Notes
    #[arg(long)]
    notes: Option<String>,
}

impl DraftArgs {
    fn fill(self, draft: &mut Draft) {
        let Self {
            customer,
            value,
            stage,
            closing_date,
            notes,
        } = self;

        let fields = [
            (customer, &mut draft.customer),
            (value, &mut draft.value),
            (stage, &mut draft.stage),
            (closing_date, &mut draft.closing_date),
            (notes, &mut draft.notes),
        ];
        for (input, field) in fields {
            if let Some(input) = input {
                *field = input;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    config: Config,
    store: OpportunityStore,
    query: Query,
    view: FilteredView,
}

impl Session {
    pub fn new(config: Config, store: OpportunityStore) -> Self {
        let query = Query::with_config("", StageFilter::All, &config);
        Self {
            config,
            store,
            query,
            view: FilteredView::new(),
        }
    }

    /// Run commands from `input` until it is exhausted or `quit` is read.
    pub fn run(mut self, input: impl BufRead, mut out: impl Write) -> anyhow::Result<()> {
        info!(
            records = self.store.len(),
            id_policy = ?self.store.id_policy(),
            "session started"
        );
        writeln!(
            out,
            "{}",
            "Opportunities: type `help` for commands, `quit` to leave".info()
        )?;
        self.render(&mut out, OutputFormat::Table)?;

        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            let line = line.context("failed to read input")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.execute(line, &mut out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(err) => writeln!(out, "{}", format!("error: {err:#}").warning())?,
            }
        }

        out.flush()?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, out))]
    fn execute(&mut self, line: &str, out: &mut impl Write) -> anyhow::Result<Flow> {
        let words = shell_words::split(line).context("could not split the command line")?;
        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                // also covers `help` and `--help`
                write!(out, "{}", err.render())?;
                return Ok(Flow::Continue);
            }
        };
        debug!(?command, "executing");

        match command {
            SessionCommand::List { output } => self.render(out, output)?,
            SessionCommand::Search { text } => {
                self.query.set_text(&text.join(" "));
                self.render(out, OutputFormat::Table)?;
            }
            SessionCommand::Stage { stage } => {
                let stage: StageFilter = stage.join(" ").parse()?;
                self.query.set_stage(stage);
                self.render(out, OutputFormat::Table)?;
            }
            SessionCommand::Clear => {
                self.query = Query::with_config("", StageFilter::All, &self.config);
                self.render(out, OutputFormat::Table)?;
            }
            SessionCommand::Add(fields) => {
                let mut draft = Draft::default();
                fields.fill(&mut draft);
                self.submit(&draft, None, out)?;
            }
            SessionCommand::Edit { id, fields } => {
                let id = self.config.parse_id(&id)?;
                let Some(existing) = self.store.get(id) else {
                    self.report_missing(id, out)?;
                    return Ok(Flow::Continue);
                };
                let mut draft = Draft::from(existing);
                fields.fill(&mut draft);
                self.submit(&draft, Some(id), out)?;
            }
            SessionCommand::Delete { id } => {
                let id = self.config.parse_id(&id)?;
                let display_id = self.config.display_id(id).to_string();
                if self.store.remove(id) {
                    writeln!(out, "{}", format!("Deleted {display_id}").success())?;
                    self.render(out, OutputFormat::Table)?;
                } else {
                    self.report_missing(id, out)?;
                }
            }
            SessionCommand::Show { id } => {
                let id = self.config.parse_id(&id)?;
                match self.store.get(id) {
                    Some(opportunity) => self.show(opportunity, out)?,
                    None => self.report_missing(id, out)?,
                }
            }
            SessionCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn submit(
        &mut self,
        draft: &Draft,
        editing: Option<NonZeroUsize>,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        match draft.submit(&mut self.store, editing)? {
            Submission::Skipped => {
                writeln!(
                    out,
                    "{}",
                    "Nothing saved: customer and value are required".dim()
                )?;
            }
            Submission::Created(created) => {
                let display_id = self.config.display_id(created.id()).to_string();
                writeln!(out, "{}", format!("Added {display_id}").success())?;
                self.render(out, OutputFormat::Table)?;
            }
            Submission::Updated(updated) => {
                let display_id = self.config.display_id(updated.id()).to_string();
                writeln!(out, "{}", format!("Saved {display_id}").success())?;
                self.render(out, OutputFormat::Table)?;
            }
            Submission::NotFound(id) => self.report_missing(id, out)?,
        }
        Ok(())
    }

    fn render(&mut self, out: &mut impl Write, format: OutputFormat) -> anyhow::Result<()> {
        let rows = self.view.rows(&self.store, &self.query);

        let filtered = !self.query.text().is_empty() || self.query.stage() != StageFilter::All;
        if filtered && format == OutputFormat::Table {
            let summary = format!(
                "Showing {} of {} (search: \"{}\", stage: {})",
                rows.len(),
                self.store.len(),
                self.query.text(),
                self.query.stage()
            );
            writeln!(out, "{}", summary.dim())?;
        }

        Table::new(&self.config, rows).render(out, format)
    }

    fn show(&self, opportunity: &Opportunity, out: &mut impl Write) -> anyhow::Result<()> {
        let display_id = self.config.display_id(opportunity.id()).to_string();
        writeln!(out, "{}", display_id.info())?;
        writeln!(out, "  Customer:     {}", opportunity.customer)?;
        writeln!(out, "  Value:        ${}", opportunity.value)?;
        writeln!(out, "  Stage:        {}", opportunity.stage)?;
        writeln!(
            out,
            "  Closing date: {}",
            opportunity.closing_date.as_deref().unwrap_or("-")
        )?;
        writeln!(
            out,
            "  Notes:        {}",
            opportunity.notes.as_deref().unwrap_or("-")
        )?;
        Ok(())
    }

    fn report_missing(&self, id: NonZeroUsize, out: &mut impl Write) -> anyhow::Result<()> {
        let display_id = self.config.display_id(id).to_string();
        writeln!(out, "{}", format!("{display_id} not found").warning())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use opportunities::{IdPolicy, NewOpportunity, Stage, Value};

    use super::*;

    fn sample_session() -> Session {
        let store = OpportunityStore::from_records(
            IdPolicy::Count,
            [
                NewOpportunity::new("ABC Ltd", 20000),
                NewOpportunity::new("XYZ Corp", 50000).with_stage(Stage::Negotiation),
            ],
        );
        Session::new(Config::default(), store)
    }

    fn exec(session: &mut Session, line: &str) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = session.execute(line, &mut out).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    fn ids(session: &Session) -> Vec<usize> {
        session.store.list().iter().map(|o| o.id().get()).collect()
    }

    #[test]
    fn add_appends_record_and_renders() {
        let mut session = sample_session();
        let (_, output) = exec(
            &mut session,
            r#"add --customer "New Co" --value 1500 --stage "Closed Won" --notes "signed""#,
        );

        assert!(output.contains("Added O-003"));
        assert!(output.contains("New Co"));
        let created = session.store.list().last().unwrap();
        assert_eq!(created.stage, Stage::ClosedWon);
        assert_eq!(created.value, Value::from("1500"));
        assert_eq!(created.notes.as_deref(), Some("signed"));
    }

    #[test]
    fn add_without_value_is_skipped() {
        let mut session = sample_session();
        let (_, output) = exec(&mut session, "add --customer Nobody");

        assert!(output.contains("Nothing saved"));
        assert_eq!(session.store.len(), 2);
    }

    #[test]
    fn add_with_bad_stage_is_an_error() {
        let mut session = sample_session();
        let mut out = Vec::new();
        let err = session
            .execute("add --customer A --value 1 --stage Won", &mut out)
            .unwrap_err();

        assert!(err.to_string().contains("Invalid stage 'Won'"));
        assert_eq!(session.store.len(), 2);
    }

    #[test]
    fn search_narrows_the_view() {
        let mut session = sample_session();
        let (_, output) = exec(&mut session, "search o-002");

        assert!(output.contains("Showing 1 of 2"));
        assert!(output.contains("XYZ Corp"));
        assert!(!output.contains("ABC Ltd"));

        let (_, output) = exec(&mut session, "search");
        assert!(output.contains("ABC Ltd"));
        assert!(output.contains("XYZ Corp"));
    }

    #[test]
    fn stage_filter_accepts_unquoted_labels() {
        let mut session = sample_session();
        exec(&mut session, "edit 1 --stage \"Closed Lost\"");

        let (_, output) = exec(&mut session, "stage Closed Lost");
        assert!(output.contains("ABC Ltd"));
        assert!(!output.contains("XYZ Corp"));

        let (_, output) = exec(&mut session, "stage All");
        assert!(output.contains("XYZ Corp"));
    }

    #[test]
    fn unknown_stage_filter_is_an_error() {
        let mut session = sample_session();
        let mut out = Vec::new();
        assert!(session.execute("stage Won", &mut out).is_err());
        assert_eq!(session.query.stage(), StageFilter::All);
    }

    #[test]
    fn search_and_stage_combine_until_cleared() {
        let mut session = sample_session();
        exec(&mut session, "search abc");
        let (_, output) = exec(&mut session, "stage Negotiation");
        assert!(output.contains("No opportunities found"));

        let (_, output) = exec(&mut session, "clear");
        assert!(output.contains("ABC Ltd"));
        assert!(output.contains("XYZ Corp"));
    }

    #[test]
    fn edit_merges_fields_and_keeps_id() {
        let mut session = sample_session();
        let (_, output) = exec(&mut session, "edit O-001 --value 99999");

        assert!(output.contains("Saved O-001"));
        let updated = session.store.list().first().unwrap();
        assert_eq!(updated.id().get(), 1);
        assert_eq!(updated.customer, "ABC Ltd");
        assert_eq!(updated.value, Value::from("99999"));
        assert_eq!(updated.stage, Stage::Prospecting);
    }

    #[test]
    fn edit_notes_keeps_numeric_value() {
        let mut session = sample_session();
        exec(&mut session, "edit 1 --notes \"call Friday\"");

        let (_, output) = exec(&mut session, "list --output json");
        let rows: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(rows[0]["value"], 20000.0);
        assert_eq!(rows[0]["notes"], "call Friday");
    }

    #[test]
    fn delete_refreshes_a_filtered_view() {
        let mut session = sample_session();
        exec(&mut session, "add --customer QQQ --value 1");
        exec(&mut session, "search xyz");

        let (_, output) = exec(&mut session, "delete 1");
        assert!(output.contains("Showing 1 of 2"));
        assert!(output.contains("XYZ Corp"));
        assert!(!output.contains("QQQ"));
    }

    #[test]
    fn edit_missing_record_reports_not_found() {
        let mut session = sample_session();
        let (_, output) = exec(&mut session, "edit 9 --value 1");

        assert!(output.contains("O-009 not found"));
        assert_eq!(session.store.revision(), 0);
    }

    #[test]
    fn delete_then_add_reuses_id() {
        let mut session = sample_session();
        let (_, output) = exec(&mut session, "delete O-002");
        assert!(output.contains("Deleted O-002"));

        let (_, output) = exec(&mut session, "rm 2");
        assert!(output.contains("O-002 not found"));

        exec(&mut session, "add --customer Next --value 10");
        assert_eq!(ids(&session), vec![1, 2]);
    }

    #[test]
    fn show_prints_every_field() {
        let mut session = sample_session();
        exec(
            &mut session,
            "edit 2 --closing-date 2025-12-01 --notes \"final round\"",
        );
        let (_, output) = exec(&mut session, "show o-2");

        assert!(output.contains("O-002"));
        assert!(output.contains("XYZ Corp"));
        assert!(output.contains("$50000"));
        assert!(output.contains("2025-12-01"));
        assert!(output.contains("final round"));
    }

    #[test]
    fn invalid_id_is_an_error() {
        let mut session = sample_session();
        let mut out = Vec::new();
        assert!(session.execute("delete X-1", &mut out).is_err());
        assert_eq!(session.store.len(), 2);
    }

    #[test]
    fn unknown_command_prints_usage() {
        let mut session = sample_session();
        let (flow, output) = exec(&mut session, "frobnicate");
        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("frobnicate"));
    }

    #[test]
    fn list_json_outputs_rows() {
        let mut session = sample_session();
        let (_, output) = exec(&mut session, "list --output json");
        let rows: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[1]["displayId"], "O-002");
    }

    #[test]
    fn run_stops_at_quit() {
        let input = "search xyz\nquit\nadd --customer Late --value 1\n";
        let mut out = Vec::new();
        let session = sample_session();
        session.run(input.as_bytes(), &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Showing 1 of 2"));
        assert!(!output.contains("Added"));
    }

    #[test]
    fn run_reports_errors_and_continues() {
        let input = "delete nope\nadd --customer Later --value 5\n";
        let mut out = Vec::new();
        sample_session().run(input.as_bytes(), &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("error:"));
        assert!(output.contains("Added O-003"));
    }
}
