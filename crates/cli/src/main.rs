// slipsort CLI - reorder shipping labels and packing slips from extracted
// CSV data.

mod exit_codes;
mod input;
mod output;
mod reorder;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use slipsort_recon::canonical::SuffixRule;
use slipsort_recon::ReconError;

use exit_codes::{EXIT_INPUT, EXIT_PROFILE, EXIT_SUCCESS, EXIT_USAGE};
use reorder::{ProfileCommands, RunArgs};

#[derive(Parser)]
#[command(name = "slipsort")]
#[command(about = "Put printed labels and packing slips back in pick-list order")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Order documents by where their key appears in a reference list
    #[command(after_help = "\
Examples:
  slipsort sort --reference pick-list.csv --documents labels.csv
  slipsort sort --reference pick-list.csv --documents labels.csv --aliases upc.xlsx --json
  slipsort sort --reference pick-list.csv --documents labels.csv --order-csv order.csv --strict")]
    Sort {
        /// Extracted reference list (CSV with a key column)
        #[arg(long)]
        reference: PathBuf,

        /// Extracted document keys (CSV with a key column, optional page column)
        #[arg(long)]
        documents: PathBuf,

        /// Alias table (.csv, .xlsx, .xls, .ods): canonical key, alias
        #[arg(long)]
        aliases: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Pair records with documents by identifier, then by name
    #[command(after_help = "\
Examples:
  slipsort pair --references target_slips.csv --documents target_labels.csv
  slipsort pair --references slips.csv --documents labels.csv --profile hsn --json
  slipsort pair --references wh-slips.csv --documents wh-labels.csv --profiles warehouse.toml")]
    Pair {
        /// Extracted records to reorder (slips); also used to detect the profile
        #[arg(long)]
        references: PathBuf,

        /// Extracted documents giving the target order (labels)
        #[arg(long)]
        documents: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the canonical form of one or more keys
    #[command(after_help = "\
Examples:
  slipsort canon 'OQ-1S 5'
  slipsort canon TRX-77| --rule trailing_i_to_l
  slipsort canon WB-100-BLK --profile pick-list --json")]
    Canon {
        /// Keys to canonicalize
        #[arg(required = true)]
        text: Vec<String>,

        /// Suffix rule to apply (repeatable)
        #[arg(long = "rule", value_parser = reorder::parse_rule)]
        rules: Vec<SuffixRule>,

        /// Apply this profile's suffix rules as well
        #[arg(long)]
        profile: Option<String>,

        /// Profile table to use instead of the built-in one
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Inspect document profile tables
    #[command(subcommand)]
    Profiles(ProfileCommands),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };

    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sort { reference, documents, aliases, run } => {
            reorder::cmd_sort(reference, documents, aliases, run)
        }
        Commands::Pair { references, documents, run } => {
            reorder::cmd_pair(references, documents, run)
        }
        Commands::Canon { text, rules, profile, profiles, json } => {
            reorder::cmd_canon(text, rules, profile, profiles, json)
        }
        Commands::Profiles(cmd) => reorder::cmd_profiles(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PROFILE, message: msg.into(), hint: None }
    }

    /// Engine errors: profile problems are exit 4, data problems exit 3.
    pub fn from_recon(err: ReconError) -> Self {
        let code = match &err {
            ReconError::ProfileParse(_)
            | ReconError::ProfileValidation(_)
            | ReconError::UnknownProfile(_)
            | ReconError::StrategyMismatch { .. } => EXIT_PROFILE,
            ReconError::MissingColumn { .. }
            | ReconError::IndexParse { .. }
            | ReconError::DuplicateIndex { .. }
            | ReconError::Io(_) => EXIT_INPUT,
        };
        Self { code, message: err.to_string(), hint: None }
    }

    /// Prefix the message with the file it came from.
    pub fn with_path(mut self, path: &std::path::Path) -> Self {
        self.message = format!("{}: {}", path.display(), self.message);
        self
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
