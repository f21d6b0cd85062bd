use serde::Serialize;

use crate::config::{OutputMode, Strategy};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One extracted reference line. `key` is `None` when the extractor did not
/// produce text for the key column (header artifacts, numeric cells, blanks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub index: usize,
    pub key: Option<String>,
}

/// One extracted document identifier (Strategy A).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentKey {
    pub index: usize,
    pub text: String,
}

/// One alias table row. Either side may be missing in malformed rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasRow {
    pub alias: Option<String>,
    pub canonical: Option<String>,
}

impl AliasRow {
    pub fn new(alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            canonical: Some(canonical.into()),
        }
    }
}

/// A record carrying name and address alongside its identifier (Strategy B).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PartyRecord {
    pub index: usize,
    pub identifier: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,
}

/// Pre-extracted input for a ranked (Strategy A) run.
#[derive(Debug, Clone, Default)]
pub struct RankedInput {
    pub references: Vec<ReferenceRow>,
    pub documents: Vec<DocumentKey>,
    pub aliases: Vec<AliasRow>,
}

/// Pre-extracted input for a paired (Strategy B) run.
///
/// `references` are the records being reordered; `documents` is the pool
/// whose original order they are placed into.
#[derive(Debug, Clone, Default)]
pub struct PairedInput {
    pub references: Vec<PartyRecord>,
    pub documents: Vec<PartyRecord>,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Sort position of a record. `Unmatched` orders after every concrete rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    At(usize),
    Unmatched,
}

impl Rank {
    pub fn from_lookup(rank: Option<usize>) -> Self {
        rank.map_or(Rank::Unmatched, Rank::At)
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Rank::At(_))
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::At(n) => write!(f, "{n}"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// A document after Strategy A resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub index: usize,
    pub raw_key: String,
    pub canonical_key: String,
    pub rank: Option<usize>,
}

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Identifier,
    Name,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Name => write!(f, "name"),
        }
    }
}

/// Reference record `reference` paired with pool document `document`
/// (both original indices).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pairing {
    pub reference: usize,
    pub document: usize,
    pub tier: MatchTier,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// How one document key travelled through canonicalization, conversion and
/// ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionTrace {
    pub index: usize,
    pub raw_key: String,
    pub canonical_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_key: Option<String>,
    pub rank: Rank,
}

/// A normalized name shared by several documents in the name-tier pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateName {
    /// First spelling seen, as extracted.
    pub name: String,
    pub normalized: String,
    pub count: usize,
    pub document_indices: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<ResolutionTrace>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_names: Vec<DuplicateName>,
    /// Documents whose canonical key had no alias entry (Strategy A).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversion_misses: Vec<usize>,
    /// Pool documents with no name and no claimable identifier (Strategy B).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unreadable_documents: Vec<usize>,
    /// Pool documents no record was paired with (Strategy B).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unclaimed_documents: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReorderSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub matched_by_identifier: usize,
    pub matched_by_name: usize,
    pub conversion_hits: usize,
    pub conversion_misses: usize,
    pub skipped_reference_rows: usize,
    pub skipped_alias_rows: usize,
    pub duplicate_name_warnings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderMeta {
    pub profile: String,
    pub strategy: Strategy,
    pub output_mode: OutputMode,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderResult {
    pub meta: ReorderMeta,
    pub summary: ReorderSummary,
    /// Original indices in output order.
    pub order: Vec<usize>,
    /// Original indices that could not be placed.
    pub unmatched: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<Pairing>,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_sorts_last() {
        let mut ranks = vec![Rank::Unmatched, Rank::At(usize::MAX), Rank::At(0)];
        ranks.sort();
        assert_eq!(ranks, vec![Rank::At(0), Rank::At(usize::MAX), Rank::Unmatched]);
    }

    #[test]
    fn from_lookup() {
        assert_eq!(Rank::from_lookup(Some(3)), Rank::At(3));
        assert_eq!(Rank::from_lookup(None), Rank::Unmatched);
        assert!(!Rank::Unmatched.is_matched());
    }
}
