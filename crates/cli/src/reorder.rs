//! `slipsort sort|pair|canon|profiles`: drive the reorder engine from
//! extracted CSV files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use slipsort_recon::canonical::{Canonicalizer, SuffixRule};
use slipsort_recon::engine::{load_document_keys, load_party_records, load_reference_rows};
use slipsort_recon::model::{PairedInput, RankedInput};
use slipsort_recon::{
    run_paired, run_ranked, DocumentProfile, OutputMode, ProfileTable, ReorderResult, Strategy,
};

use crate::exit_codes::{EXIT_ERROR, EXIT_PROFILE, EXIT_UNMATCHED};
use crate::input::{load_aliases, load_profiles, read_text};
use crate::output::{default_output_path, order_csv, write_file, RetryPolicy};
use crate::CliError;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Unmatched records go to the end of the order
    Sink,
    /// Unmatched records are left out of the order
    Exclude,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sink => OutputMode::Sink,
            ModeArg::Exclude => OutputMode::Exclude,
        }
    }
}

/// Options shared by `sort` and `pair`.
#[derive(Args)]
pub struct RunArgs {
    /// Profile name (or a string containing one of its detect markers)
    #[arg(long)]
    pub profile: Option<String>,

    /// Profile table to use instead of the built-in one
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// Override the profile's handling of unmatched records
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output JSON to stdout instead of writing the default output file
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file [default: <documents>_reordered.json]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the ordered indices as CSV (position,index)
    #[arg(long)]
    pub order_csv: Option<PathBuf>,

    /// Exit non-zero when any record is unmatched
    #[arg(long)]
    pub strict: bool,

    /// Extra write attempts when an output file is locked
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Delay between write attempts
    #[arg(long, default_value_t = 500)]
    pub retry_delay_ms: u64,
}

impl RunArgs {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List the profiles in a table
    #[command(after_help = "\
Examples:
  slipsort profiles list
  slipsort profiles list --profiles warehouse.profiles.toml --json")]
    List {
        /// Profile table to list instead of the built-in one
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a profile table without running anything
    #[command(after_help = "\
Examples:
  slipsort profiles validate
  slipsort profiles validate warehouse.profiles.toml")]
    Validate {
        /// Profile table file (built-in table when omitted)
        file: Option<PathBuf>,
    },
}

// ============================================================================
// sort / pair
// ============================================================================

pub fn cmd_sort(
    reference: PathBuf,
    documents: PathBuf,
    aliases: Option<PathBuf>,
    run: RunArgs,
) -> Result<(), CliError> {
    let table = load_profiles(run.profiles.as_deref())?;
    let profile = pick_profile(&table, run.profile.as_deref(), &reference, Strategy::Ranked)?;
    let profile = with_mode(profile, run.mode);

    let input = RankedInput {
        references: load_reference_rows(&read_text(&reference)?, &profile.columns)
            .map_err(|e| CliError::from_recon(e).with_path(&reference))?,
        documents: load_document_keys(&read_text(&documents)?, &profile.columns)
            .map_err(|e| CliError::from_recon(e).with_path(&documents))?,
        aliases: match &aliases {
            Some(path) => load_aliases(path, &profile.columns)?,
            None => Vec::new(),
        },
    };

    let result = run_ranked(&profile, &input).map_err(CliError::from_recon)?;
    finish(&result, &documents, &run)
}

pub fn cmd_pair(references: PathBuf, documents: PathBuf, run: RunArgs) -> Result<(), CliError> {
    let table = load_profiles(run.profiles.as_deref())?;
    let profile = pick_profile(&table, run.profile.as_deref(), &references, Strategy::Paired)?;
    let profile = with_mode(profile, run.mode);

    let input = PairedInput {
        references: load_party_records("references", &read_text(&references)?, &profile.columns)
            .map_err(|e| CliError::from_recon(e).with_path(&references))?,
        documents: load_party_records("documents", &read_text(&documents)?, &profile.columns)
            .map_err(|e| CliError::from_recon(e).with_path(&documents))?,
    };

    let result = run_paired(&profile, &input).map_err(CliError::from_recon)?;
    finish(&result, &documents, &run)
}

/// An explicit `--profile` is looked up as given. Otherwise the profile is
/// detected from the input path; ranked runs fall back to the first ranked
/// profile without suffix rules, or failing that the first ranked profile.
fn pick_profile(
    table: &ProfileTable,
    requested: Option<&str>,
    path: &Path,
    strategy: Strategy,
) -> Result<DocumentProfile, CliError> {
    if let Some(name) = requested {
        return table.select(name).cloned().map_err(|e| {
            CliError::from_recon(e).with_hint(format!("known profiles: {}", known(table)))
        });
    }

    let hint = path.to_string_lossy();
    if let Some(p) = table.select(&hint).ok().filter(|p| p.strategy == strategy) {
        log::info!("profile '{}' detected from {}", p.name, path.display());
        return Ok(p.clone());
    }

    if strategy == Strategy::Ranked {
        let ranked = || table.profiles.iter().filter(move |p| p.strategy == strategy);
        let fallback = ranked().find(|p| p.suffix_rules.is_empty()).or_else(|| ranked().next());
        if let Some(p) = fallback {
            if p.suffix_rules.is_empty() {
                log::info!("no profile detected from {}; using '{}'", path.display(), p.name);
            } else {
                let rules: Vec<_> = p.suffix_rules.iter().map(|r| r.name()).collect();
                log::warn!(
                    "no profile detected from {}; using '{}' with suffix rules {}",
                    path.display(),
                    p.name,
                    rules.join(", "),
                );
            }
            return Ok(p.clone());
        }
    }

    Err(CliError {
        code: EXIT_PROFILE,
        message: format!("no {strategy} profile detected from '{}'", path.display()),
        hint: Some(format!("pass --profile NAME; known profiles: {}", known(table))),
    })
}

fn known(table: &ProfileTable) -> String {
    table.names().collect::<Vec<_>>().join(", ")
}

fn with_mode(mut profile: DocumentProfile, mode: Option<ModeArg>) -> DocumentProfile {
    if let Some(mode) = mode {
        profile.output = Some(mode.into());
    }
    profile
}

fn finish(result: &ReorderResult, documents: &Path, run: &RunArgs) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(result).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;

    let policy = run.retry_policy();
    let output_file = run
        .output
        .clone()
        .or_else(|| (!run.json).then(|| default_output_path(documents)));

    if let Some(ref path) = output_file {
        write_file(path, json_str.as_bytes(), policy)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = run.order_csv {
        write_file(path, &order_csv(&result.order)?, policy)?;
        eprintln!("wrote {}", path.display());
    }

    if run.json {
        println!("{json_str}");
    }

    print_summary(result);

    let unmatched = result.summary.unmatched;
    if run.strict && unmatched > 0 {
        return Err(CliError {
            code: EXIT_UNMATCHED,
            message: format!("{unmatched} record(s) could not be placed"),
            hint: Some("the unmatched list and diagnostics are in the JSON output".into()),
        });
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReorderResult) {
    let s = &result.summary;
    match result.meta.strategy {
        Strategy::Ranked => eprintln!(
            "{}: {} document(s), {} placed, {} unmatched ({} via alias table)",
            result.meta.profile, s.total, s.matched, s.unmatched, s.conversion_hits,
        ),
        Strategy::Paired => eprintln!(
            "{}: {} record(s), {} by identifier, {} by name, {} unmatched",
            result.meta.profile, s.total, s.matched_by_identifier, s.matched_by_name, s.unmatched,
        ),
    }

    for dup in &result.diagnostics.duplicate_names {
        eprintln!(
            "warning: name '{}' appears on {} documents ({:?}); name matches for it may be wrong",
            dup.name, dup.count, dup.document_indices,
        );
    }
    if !result.diagnostics.unreadable_documents.is_empty() {
        eprintln!(
            "warning: no readable name on document(s) {:?}",
            result.diagnostics.unreadable_documents,
        );
    }
    if !result.diagnostics.unclaimed_documents.is_empty() {
        eprintln!(
            "warning: document(s) {:?} were not paired with any record",
            result.diagnostics.unclaimed_documents,
        );
    }
    if !result.unmatched.is_empty() {
        eprintln!("unmatched: {:?}", result.unmatched);
    }
}

// ============================================================================
// canon
// ============================================================================

pub fn parse_rule(name: &str) -> Result<SuffixRule, String> {
    SuffixRule::from_name(name).ok_or_else(|| {
        let known: Vec<_> = SuffixRule::ALL.iter().map(|r| r.name()).collect();
        format!("unknown rule '{name}' (expected one of: {})", known.join(", "))
    })
}

pub fn cmd_canon(
    texts: Vec<String>,
    rules: Vec<SuffixRule>,
    profile: Option<String>,
    profiles: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let canon = match profile {
        Some(name) => {
            let table = load_profiles(profiles.as_deref())?;
            let p = table.select(&name).map_err(CliError::from_recon)?;
            let mut all = p.suffix_rules.clone();
            all.extend(rules);
            Canonicalizer::new(&all)
        }
        None => Canonicalizer::new(&rules),
    };

    if json {
        let items: Vec<serde_json::Value> = texts
            .iter()
            .map(|t| serde_json::json!({ "input": t, "canonical": canon.apply(&t.to_uppercase()) }))
            .collect();
        println!("{}", serde_json::Value::Array(items));
    } else {
        for t in &texts {
            println!("{}\t{}", t, canon.apply(&t.to_uppercase()));
        }
    }
    Ok(())
}

// ============================================================================
// profiles
// ============================================================================

pub fn cmd_profiles(cmd: ProfileCommands) -> Result<(), CliError> {
    match cmd {
        ProfileCommands::List { profiles, json } => cmd_profiles_list(profiles, json),
        ProfileCommands::Validate { file } => cmd_profiles_validate(file),
    }
}

fn cmd_profiles_list(profiles: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let table = load_profiles(profiles.as_deref())?;

    if json {
        let items: Vec<serde_json::Value> = table
            .profiles
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "strategy": p.strategy,
                    "output_mode": p.output_mode(),
                    "detect": p.detect,
                    "suffix_rules": p.suffix_rules,
                    "name_match": p.name_match,
                    "regions": p.regions,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(items));
        return Ok(());
    }

    for p in &table.profiles {
        let rules: Vec<_> = p.suffix_rules.iter().map(|r| r.name()).collect();
        println!(
            "{:<16} {:<7} {:<8} detect=[{}] rules=[{}] names={}",
            p.name,
            p.strategy.to_string(),
            p.output_mode().to_string(),
            p.detect.join(", "),
            rules.join(", "),
            p.name_match,
        );
    }
    Ok(())
}

fn cmd_profiles_validate(file: Option<PathBuf>) -> Result<(), CliError> {
    let table = load_profiles(file.as_deref())?;
    let ranked = table.profiles.iter().filter(|p| p.strategy == Strategy::Ranked).count();
    eprintln!(
        "valid: {} profile(s) ({} ranked, {} paired)",
        table.profiles.len(),
        ranked,
        table.profiles.len() - ranked,
    );
    Ok(())
}
