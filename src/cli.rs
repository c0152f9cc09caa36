use std::{
    io::{self, Write},
    path::PathBuf,
};

mod session;
mod table;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use opportunities::{
    Config, FilteredView, NewOpportunity, OpportunityStore, Query, Stage, StageFilter,
};
use session::Session;
use table::{OutputFormat, Table};
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Start without the sample opportunities
    #[arg(long, global = true)]
    empty: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        let store = if self.empty {
            OpportunityStore::new(config.id_policy)
        } else {
            OpportunityStore::from_records(config.id_policy, sample_records())
        };

        match self.command.unwrap_or_default() {
            Command::Session => {
                let stdin = io::stdin();
                Session::new(config, store).run(stdin.lock(), io::stdout().lock())
            }
            Command::List(command) => command.run(&config, &store),
        }
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout belongs to the session
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// The records every session starts with unless `--empty` is given.
fn sample_records() -> [NewOpportunity; 2] {
    [
        NewOpportunity::new("ABC Ltd", 20000),
        NewOpportunity::new("XYZ Corp", 50000).with_stage(Stage::Negotiation),
    ]
}

#[derive(Debug, Default, clap::Subcommand)]
pub enum Command {
    /// Start an interactive session (default)
    ///
    /// Commands are read line by line from standard input. Type `help` for
    /// the list of session commands.
    #[default]
    Session,

    /// List the starting opportunities and exit
    List(List),
}

#[derive(Debug, clap::Parser)]
pub struct List {
    /// Case-insensitive search over id, customer and value
    #[arg(short, long, default_value = "")]
    query: String,

    /// Stage to show ("All" or a stage name)
    #[arg(short, long, default_value = StageFilter::ALL_LABEL)]
    stage: StageFilter,

    /// Output format (default: table)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl List {
    #[instrument(level = "debug", skip_all)]
    fn run(self, config: &Config, store: &OpportunityStore) -> anyhow::Result<()> {
        let query = Query::with_config(&self.query, self.stage, config);
        let rows = FilteredView::new().rows(store, &query);

        let mut out = io::stdout().lock();
        Table::new(config, rows).render(&mut out, self.output)?;
        out.flush()?;
        Ok(())
    }
}
