pub mod dashboard;
pub mod export;
pub mod init;
pub mod report;
pub mod status;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::bindings::{Binding, Inputs, Signal, ViewId};
use crate::error::{Result, RetailError};
use crate::loader::DataStore;
use crate::settings::{resolve_data_file, Settings};

#[derive(Parser)]
#[command(
    name = "tillroll",
    version,
    about = "Terminal analytics dashboard for retail invoice spreadsheets."
)]
pub struct Cli {
    /// Invoice spreadsheet (.csv, .xlsx, .xls, .ods). Overrides the saved default.
    #[arg(long, global = true)]
    pub file: Option<String>,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (the default).
    Dashboard,
    /// Print one chart's summary table.
    Report {
        /// View to print
        #[arg(value_enum)]
        view: ViewId,
        #[command(flatten)]
        filters: FilterArgs,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write every view to files.
    Export {
        /// Output directory (default: ./tillroll-export-YYYY-MM-DD)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Also write the cleaned invoice lines as records.csv
        #[arg(long)]
        records: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the periods the range slider moves over.
    Periods,
    /// List the countries offered by the country selector.
    Countries,
    /// Show the configured data file and load summary.
    Status,
    /// Save the data file (given with --file) and dashboard defaults.
    Init {
        /// Default country selection; repeatable (default: United Kingdom)
        #[arg(long = "country")]
        countries: Vec<String>,
        /// Quiet interval before an input change recomputes the charts
        #[arg(long = "debounce-ms")]
        debounce_ms: Option<u64>,
    },
    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Command-line stand-ins for the dashboard's two controls.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First period, YYYY-MM (default: earliest)
    #[arg(long)]
    pub from: Option<String>,
    /// Last period, YYYY-MM (default: latest)
    #[arg(long)]
    pub to: Option<String>,
    /// Country to include; repeatable (default: saved selection)
    #[arg(long = "country")]
    pub countries: Vec<String>,
}

impl FilterArgs {
    /// Reject a flag for the control the view does not listen to.
    pub fn check_applies(&self, binding: &Binding) -> Result<()> {
        let flag = match binding.input {
            Signal::DateRange if !self.countries.is_empty() => "--country",
            Signal::Countries if self.from.is_some() || self.to.is_some() => "--from/--to",
            _ => return Ok(()),
        };
        Err(RetailError::FilterNotApplicable {
            view: binding.view.key(),
            signal: binding.input.name(),
            flag,
        })
    }

    pub fn to_inputs(&self, store: &DataStore, settings: &Settings) -> Result<Inputs> {
        let range = store
            .periods()
            .resolve_labels(self.from.as_deref(), self.to.as_deref())?;
        let countries = if self.countries.is_empty() {
            settings.default_countries.iter().cloned().collect()
        } else {
            self.countries.iter().cloned().collect()
        };
        Ok(Inputs { range, countries })
    }
}

pub(crate) fn open_store(file: Option<&str>, settings: &Settings) -> Result<DataStore> {
    let path = resolve_data_file(file, settings)?;
    info!(path = %path.display(), "loading invoice data");
    Ok(DataStore::load(&path)?)
}
