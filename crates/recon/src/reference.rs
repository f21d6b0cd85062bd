use std::collections::HashMap;

use crate::canonical::Canonicalizer;

/// Canonical reference key → zero-based rank in the reference ordering.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    ranks: HashMap<String, usize>,
    accepted: usize,
    skipped: usize,
}

impl ReferenceIndex {
    /// Build an index from reference rows in document order.
    ///
    /// Rows for which `extract_key` yields `None` or an empty string are
    /// skipped and do not consume a rank. A key seen again takes the later
    /// rank.
    pub fn build<T, F>(rows: &[T], canon: &Canonicalizer, extract_key: F) -> Self
    where
        F: Fn(&T) -> Option<&str>,
    {
        let mut ranks = HashMap::new();
        let mut accepted = 0;
        let mut skipped = 0;

        for row in rows {
            match extract_key(row) {
                Some(raw) if !raw.is_empty() => {
                    let key = canon.apply(raw);
                    if let Some(previous) = ranks.insert(key, accepted) {
                        log::debug!("reference key repeated: rank {previous} replaced by {accepted}");
                    }
                    accepted += 1;
                }
                _ => skipped += 1,
            }
        }

        Self { ranks, accepted, skipped }
    }

    pub fn lookup(&self, key: &str) -> Option<usize> {
        self.ranks.get(key).copied()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Rows that received a rank, including ones later overwritten.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
