use serde::{Deserialize, Serialize};

use crate::canonical::{Canonicalizer, SuffixRule};
use crate::error::ReconError;
use crate::pairing::NameMatch;

/// Profile table shipped with the crate.
pub const DEFAULT_PROFILES: &str = include_str!("profiles.toml");

// ---------------------------------------------------------------------------
// Top-level table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileTable {
    #[serde(rename = "profile", default)]
    pub profiles: Vec<DocumentProfile>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Everything that varies between document families: how to match, which
/// columns hold which role, per-side identifier offsets, OCR suffix fixes
/// and the scan regions an external extractor should crop.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentProfile {
    pub name: String,
    /// Substrings that select this profile when found in a lookup hint.
    #[serde(default)]
    pub detect: Vec<String>,
    pub strategy: Strategy,
    #[serde(default)]
    pub output: Option<OutputMode>,
    #[serde(default)]
    pub suffix_rules: Vec<SuffixRule>,
    #[serde(default)]
    pub columns: ColumnRoles,
    #[serde(default)]
    pub reference_identifier: FieldTransforms,
    #[serde(default)]
    pub document_identifier: FieldTransforms,
    /// Name-tier rule for paired runs.
    #[serde(default)]
    pub name_match: NameMatch,
    #[serde(default)]
    pub regions: ScanRegions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Strategy A: rank documents by a flat reference key list.
    Ranked,
    /// Strategy B: pair records by identifier, then by name.
    Paired,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ranked => write!(f, "ranked"),
            Self::Paired => write!(f, "paired"),
        }
    }
}

/// What happens to records that could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Keep them at the end of the ordered output.
    Sink,
    /// Leave them out of the ordered output; report them separately.
    Exclude,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sink => write!(f, "sink"),
            Self::Exclude => write!(f, "exclude"),
        }
    }
}

impl DocumentProfile {
    /// Ranked runs keep every document by default; paired runs split.
    pub fn output_mode(&self) -> OutputMode {
        self.output.unwrap_or(match self.strategy {
            Strategy::Ranked => OutputMode::Sink,
            Strategy::Paired => OutputMode::Exclude,
        })
    }

    pub fn canonicalizer(&self) -> Canonicalizer {
        Canonicalizer::new(&self.suffix_rules)
    }
}

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// Header names of the extracted CSV columns the engine reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRoles {
    #[serde(default = "default_index_column")]
    pub index: String,
    #[serde(default = "default_key_column")]
    pub key: String,
    #[serde(default = "default_identifier_column")]
    pub identifier: String,
    #[serde(default = "default_name_column")]
    pub name: String,
    #[serde(default)]
    pub address: Vec<String>,
    #[serde(default = "default_alias_column")]
    pub alias: usize,
    #[serde(default)]
    pub alias_target: usize,
}

fn default_index_column() -> String {
    "page".into()
}

fn default_key_column() -> String {
    "key".into()
}

fn default_identifier_column() -> String {
    "identifier".into()
}

fn default_name_column() -> String {
    "name".into()
}

fn default_alias_column() -> usize {
    1
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            index: default_index_column(),
            key: default_key_column(),
            identifier: default_identifier_column(),
            name: default_name_column(),
            address: Vec::new(),
            alias: default_alias_column(),
            alias_target: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Field transforms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldTransforms {
    #[serde(default)]
    pub transforms: Vec<FieldTransform>,
}

/// Positional cleanup of an extracted identifier, applied before
/// normalization. Counts are in characters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldTransform {
    KeepLast { count: usize },
    DropLast { count: usize },
    AfterLast { delimiter: String },
    BeforeLetters,
}

impl FieldTransform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::KeepLast { count } => {
                let len = value.chars().count();
                value.chars().skip(len.saturating_sub(*count)).collect()
            }
            Self::DropLast { count } => {
                let len = value.chars().count();
                value.chars().take(len.saturating_sub(*count)).collect()
            }
            Self::AfterLast { delimiter } => match value.rsplit_once(delimiter.as_str()) {
                Some((_, tail)) => tail.to_string(),
                None => value.to_string(),
            },
            Self::BeforeLetters => value
                .chars()
                .take_while(|c| !c.is_alphabetic())
                .collect(),
        }
    }
}

impl FieldTransforms {
    pub fn apply(&self, value: &str) -> String {
        let trimmed = value.trim();
        if self.transforms.is_empty() {
            return trimmed.to_string();
        }
        self.transforms
            .iter()
            .fold(trimmed.to_string(), |acc, t| t.apply(acc.trim()))
            .trim()
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Scan regions
// ---------------------------------------------------------------------------

/// Crop rectangles `[x0, y0, x1, y1]` for the external extractors. The
/// engine only validates and carries them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanRegions {
    #[serde(default)]
    pub scan: Option<[u32; 4]>,
    #[serde(default)]
    pub scan_secondary: Option<[u32; 4]>,
    #[serde(default)]
    pub ship: Option<[u32; 4]>,
    #[serde(default)]
    pub order: Option<[u32; 4]>,
    #[serde(default)]
    pub label: Vec<[u32; 4]>,
    #[serde(default)]
    pub reference_number: Option<[u32; 4]>,
}

impl ScanRegions {
    fn all(&self) -> impl Iterator<Item = (&'static str, &[u32; 4])> {
        let singles = [
            ("scan", &self.scan),
            ("scan_secondary", &self.scan_secondary),
            ("ship", &self.ship),
            ("order", &self.order),
            ("reference_number", &self.reference_number),
        ];
        singles
            .into_iter()
            .filter_map(|(n, r)| r.as_ref().map(|r| (n, r)))
            .chain(self.label.iter().map(|r| ("label", r)))
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate + Select
// ---------------------------------------------------------------------------

impl ProfileTable {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let table: ProfileTable =
            toml::from_str(input).map_err(|e| ReconError::ProfileParse(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn builtin() -> Result<Self, ReconError> {
        Self::from_toml(DEFAULT_PROFILES)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.profiles.is_empty() {
            return Err(ReconError::ProfileValidation(
                "at least one profile is required".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for profile in &self.profiles {
            let name = profile.name.trim();
            if name.is_empty() {
                return Err(ReconError::ProfileValidation("profile name is empty".into()));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ReconError::ProfileValidation(format!(
                    "duplicate profile '{name}'"
                )));
            }

            for (region, [x0, y0, x1, y1]) in profile.regions.all() {
                if x0 >= x1 || y0 >= y1 {
                    return Err(ReconError::ProfileValidation(format!(
                        "profile '{name}': {region} region [{x0}, {y0}, {x1}, {y1}] is empty"
                    )));
                }
            }

            let transforms = profile
                .reference_identifier
                .transforms
                .iter()
                .chain(&profile.document_identifier.transforms);
            for t in transforms {
                match t {
                    FieldTransform::KeepLast { count: 0 } | FieldTransform::DropLast { count: 0 } => {
                        return Err(ReconError::ProfileValidation(format!(
                            "profile '{name}': transform count must be positive"
                        )));
                    }
                    FieldTransform::AfterLast { delimiter } if delimiter.is_empty() => {
                        return Err(ReconError::ProfileValidation(format!(
                            "profile '{name}': after_last delimiter is empty"
                        )));
                    }
                    _ => {}
                }
            }

            match profile.name_match {
                NameMatch::TokenOverlap { min_tokens: 0 } | NameMatch::LeadingPhrase { tokens: 0 } => {
                    return Err(ReconError::ProfileValidation(format!(
                        "profile '{name}': name_match needs at least one token"
                    )));
                }
                _ => {}
            }

            if profile.columns.alias == profile.columns.alias_target {
                return Err(ReconError::ProfileValidation(format!(
                    "profile '{name}': alias and alias_target columns are the same"
                )));
            }
        }

        Ok(())
    }

    /// Look a profile up by exact name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&DocumentProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Exact name first, then the first profile in table order with a
    /// `detect` substring contained in the lower-cased hint.
    pub fn select(&self, hint: &str) -> Result<&DocumentProfile, ReconError> {
        if let Some(p) = self.get(hint) {
            return Ok(p);
        }
        let hint_lower = hint.to_lowercase();
        self.profiles
            .iter()
            .find(|p| {
                p.detect
                    .iter()
                    .any(|d| !d.is_empty() && hint_lower.contains(&d.to_lowercase()))
            })
            .ok_or_else(|| ReconError::UnknownProfile(hint.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
