use std::collections::HashMap;

use crate::canonical::Canonicalizer;
use crate::model::AliasRow;

/// Alias key → canonical reference key, both sides canonicalized.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    entries: HashMap<String, String>,
    skipped: usize,
}

impl ConversionTable {
    /// Build from alias rows. Rows with a missing or blank side are skipped;
    /// a repeated alias keeps its last target.
    pub fn build(rows: &[AliasRow], canon: &Canonicalizer) -> Self {
        let mut entries = HashMap::new();
        let mut skipped = 0;

        for row in rows {
            let (Some(alias), Some(target)) = (row.alias.as_deref(), row.canonical.as_deref())
            else {
                skipped += 1;
                continue;
            };
            let alias = canon.apply(alias.to_uppercase().trim());
            let target = canon.apply(target.to_uppercase().trim());
            if alias.is_empty() || target.is_empty() {
                skipped += 1;
                continue;
            }
            entries.insert(alias, target);
        }

        if skipped > 0 {
            log::debug!("conversion table: skipped {skipped} malformed alias row(s)");
        }

        Self { entries, skipped }
    }

    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows rejected at build time.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::SuffixRule;

    #[test]
    fn normalizes_both_sides() {
        let rows = vec![AliasRow::new(" upc-0s1 ", "sku-1o")];
        let table = ConversionTable::build(&rows, &Canonicalizer::default());
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("UPC05I"), Some("5KUI0"));
    }

    #[test]
    fn skips_malformed_rows() {
        let rows = vec![
            AliasRow { alias: None, canonical: Some("X".into()) },
            AliasRow { alias: Some("Y".into()), canonical: None },
            AliasRow::new("   ", "Z"),
            AliasRow::new("A", "B"),
        ];
        let table = ConversionTable::build(&rows, &Canonicalizer::default());
        assert_eq!(table.len(), 1);
        assert_eq!(table.skipped(), 3);
        assert_eq!(table.resolve("A"), Some("B"));
    }

    #[test]
    fn miss_is_none() {
        let table = ConversionTable::build(&[], &Canonicalizer::default());
        assert!(table.is_empty());
        assert_eq!(table.resolve("ANY"), None);
    }

    #[test]
    fn later_alias_wins() {
        let rows = vec![AliasRow::new("A", "FIRST"), AliasRow::new("A", "SECOND")];
        let table = ConversionTable::build(&rows, &Canonicalizer::default());
        assert_eq!(table.resolve("A"), Some("5EC0ND"));
    }

    #[test]
    fn suffix_rules_reach_both_sides() {
        let canon = Canonicalizer::new(&[SuffixRule::TrailingIToL]);
        let rows = vec![AliasRow::new("ab1", "cd1")];
        let table = ConversionTable::build(&rows, &canon);
        assert_eq!(table.resolve("ABL"), Some("CDL"));
    }
}
