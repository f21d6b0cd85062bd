//! Two-tier consuming match (Strategy B).
//!
//! Each reference record claims at most one pool document: first by exact
//! identifier, then by name under the profile's [`NameMatch`] rule. Matching
//! is first-found in reference order, not a global optimum, so the same input
//! always yields the same pairs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ambiguity::detect_duplicate_names;
use crate::model::{DuplicateName, MatchTier, Pairing, PartyRecord};
use crate::sort::Placement;

/// Upper-case and drop all whitespace. Table extraction merges and splits
/// tokens unpredictably, so spacing carries no signal.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Identifiers get the same treatment as names.
pub fn normalize_identifier(identifier: &str) -> String {
    normalize_name(identifier)
}

/// How the name tier decides that a reference names a document.
///
/// The containment rules compare against the document's whole text (name
/// plus address lines), case-insensitively, for layouts where the label
/// name cannot be isolated reliably.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum NameMatch {
    /// Normalized names are equal.
    #[default]
    Exact,
    /// At least `min_tokens` of the reference name's words occur in the
    /// document text.
    TokenOverlap { min_tokens: usize },
    /// The reference name's first `tokens` words, joined by single spaces,
    /// occur in the document text.
    LeadingPhrase { tokens: usize },
}

impl NameMatch {
    fn matches(&self, reference_name: &str, candidate: &Candidate<'_>) -> bool {
        match self {
            Self::Exact => {
                let name = normalize_name(reference_name);
                !name.is_empty() && candidate.name == name
            }
            Self::TokenOverlap { min_tokens } => {
                let found = reference_name
                    .split_whitespace()
                    .filter(|w| candidate.text.contains(&w.to_lowercase()))
                    .count();
                found > 0 && found >= *min_tokens
            }
            Self::LeadingPhrase { tokens } => {
                let words: Vec<&str> = reference_name.split_whitespace().take(*tokens).collect();
                if words.is_empty() || words.len() < *tokens {
                    return false;
                }
                candidate.text.contains(&words.join(" ").to_lowercase())
            }
        }
    }
}

impl std::fmt::Display for NameMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::TokenOverlap { min_tokens } => write!(f, "token_overlap({min_tokens})"),
            Self::LeadingPhrase { tokens } => write!(f, "leading_phrase({tokens})"),
        }
    }
}

/// Lower-cased name and address lines with runs of whitespace collapsed.
fn document_text(record: &PartyRecord) -> String {
    std::iter::once(record.name.as_str())
        .chain(record.address.iter().map(String::as_str))
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct TwoTierOutcome {
    /// Paired references, in reference order.
    pub pairs: Vec<Pairing>,
    /// References no document could be found for, in reference order.
    pub non_matching: Vec<usize>,
    /// Pool documents left unconsumed.
    pub unclaimed: Vec<usize>,
    pub duplicate_names: Vec<DuplicateName>,
    /// Unclaimable pool documents with a blank name.
    pub unreadable: Vec<usize>,
}

impl TwoTierOutcome {
    /// One placement per reference; a paired reference ranks at its
    /// document's original index.
    pub fn placements(&self, references: &[PartyRecord]) -> Vec<Placement> {
        references
            .iter()
            .map(|r| Placement {
                index: r.index,
                rank: self
                    .pairs
                    .iter()
                    .find(|p| p.reference == r.index)
                    .map(|p| p.document),
            })
            .collect()
    }

    pub fn count_tier(&self, tier: MatchTier) -> usize {
        self.pairs.iter().filter(|p| p.tier == tier).count()
    }
}

struct Candidate<'a> {
    record: &'a PartyRecord,
    identifier: String,
    name: String,
    text: String,
    /// Identifier equals some reference identifier; reserved for tier 1.
    claimable: bool,
}

/// Pair `references` against a pool built from `documents`, with exact
/// name matching in the second tier.
pub fn match_two_tier(references: &[PartyRecord], documents: &[PartyRecord]) -> TwoTierOutcome {
    match_two_tier_with(references, documents, &NameMatch::Exact)
}

/// Pair `references` against a pool built from `documents`.
///
/// A document whose identifier matches any reference identifier is only
/// ever taken by the identifier tier. Blank identifiers and blank names
/// never match.
pub fn match_two_tier_with(
    references: &[PartyRecord],
    documents: &[PartyRecord],
    name_match: &NameMatch,
) -> TwoTierOutcome {
    let reference_ids: HashSet<String> = references
        .iter()
        .map(|r| normalize_identifier(&r.identifier))
        .filter(|id| !id.is_empty())
        .collect();

    let mut pool: Vec<Candidate<'_>> = documents
        .iter()
        .map(|d| {
            let identifier = normalize_identifier(&d.identifier);
            let claimable = reference_ids.contains(&identifier);
            Candidate {
                record: d,
                identifier,
                name: normalize_name(&d.name),
                text: document_text(d),
                claimable,
            }
        })
        .collect();

    let mut resolved: Vec<Option<(usize, MatchTier)>> = vec![None; references.len()];

    // Identifier tier
    for (slot, reference) in resolved.iter_mut().zip(references) {
        let id = normalize_identifier(&reference.identifier);
        if id.is_empty() {
            continue;
        }
        if let Some(pos) = pool.iter().position(|c| c.identifier == id) {
            let taken = pool.remove(pos);
            *slot = Some((taken.record.index, MatchTier::Identifier));
        }
    }

    let duplicate_names =
        detect_duplicate_names(pool.iter().filter(|c| !c.claimable).map(|c| c.record));

    let unreadable: Vec<usize> = pool
        .iter()
        .filter(|c| !c.claimable && c.name.is_empty())
        .map(|c| c.record.index)
        .collect();

    // Name tier
    for (slot, reference) in resolved.iter_mut().zip(references) {
        if slot.is_some() {
            continue;
        }
        if let Some(pos) = pool
            .iter()
            .position(|c| !c.claimable && name_match.matches(&reference.name, c))
        {
            let taken = pool.remove(pos);
            *slot = Some((taken.record.index, MatchTier::Name));
        }
    }

    let mut outcome = TwoTierOutcome {
        duplicate_names,
        unreadable,
        unclaimed: pool.iter().map(|c| c.record.index).collect(),
        ..Default::default()
    };

    for (reference, slot) in references.iter().zip(resolved) {
        match slot {
            Some((document, tier)) => {
                log::debug!("reference {} paired with document {document} by {tier}", reference.index);
                outcome.pairs.push(Pairing { reference: reference.index, document, tier });
            }
            None => {
                log::warn!(
                    "reference {} ({:?}, id {:?}) has no matching document",
                    reference.index,
                    reference.name,
                    reference.identifier,
                );
                outcome.non_matching.push(reference.index);
            }
        }
    }

    outcome
}
