use crate::canonical::Canonicalizer;
use crate::conversion::ConversionTable;
use crate::model::{DocumentKey, Rank, Record, ResolutionTrace};
use crate::reference::ReferenceIndex;
use crate::sort::Placement;

/// Strategy A output: one record and one trace entry per document, in input
/// order.
#[derive(Debug, Clone, Default)]
pub struct DirectResolution {
    pub records: Vec<Record>,
    pub trace: Vec<ResolutionTrace>,
    /// Documents whose canonical key had no alias entry.
    pub conversion_misses: Vec<usize>,
}

impl DirectResolution {
    pub fn placements(&self) -> Vec<Placement> {
        self.records
            .iter()
            .map(|r| Placement { index: r.index, rank: r.rank })
            .collect()
    }

    pub fn conversion_hits(&self) -> usize {
        self.trace.iter().filter(|t| t.converted_key.is_some()).count()
    }
}

/// Strategy A: canonicalize each document key, swap in its alias target when
/// the conversion table knows it, then read the rank.
///
/// Several documents may land on the same rank; nothing is consumed.
pub fn resolve_direct(
    documents: &[DocumentKey],
    conversions: &ConversionTable,
    index: &ReferenceIndex,
    canon: &Canonicalizer,
) -> DirectResolution {
    let mut out = DirectResolution::default();

    for doc in documents {
        let canonical_key = canon.apply(doc.text.to_uppercase().trim());
        let converted_key = conversions.resolve(&canonical_key).map(str::to_string);
        if converted_key.is_none() {
            out.conversion_misses.push(doc.index);
        }

        let lookup_key = converted_key.as_deref().unwrap_or(&canonical_key);
        let rank = index.lookup(lookup_key);

        log::debug!(
            "document {}: raw={:?} canonical={} converted={} rank={}",
            doc.index,
            doc.text,
            canonical_key,
            converted_key.as_deref().unwrap_or("-"),
            Rank::from_lookup(rank),
        );

        out.trace.push(ResolutionTrace {
            index: doc.index,
            raw_key: doc.text.clone(),
            canonical_key: canonical_key.clone(),
            converted_key,
            rank: Rank::from_lookup(rank),
        });
        out.records.push(Record {
            index: doc.index,
            raw_key: doc.text.clone(),
            canonical_key,
            rank,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AliasRow, ReferenceRow};

    fn reference(keys: &[&str]) -> ReferenceIndex {
        let rows: Vec<ReferenceRow> = keys
            .iter()
            .enumerate()
            .map(|(index, k)| ReferenceRow { index, key: Some(k.to_string()) })
            .collect();
        ReferenceIndex::build(&rows, &Canonicalizer::default(), |r| r.key.as_deref())
    }

    fn docs(texts: &[&str]) -> Vec<DocumentKey> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| DocumentKey { index, text: t.to_string() })
            .collect()
    }

    #[test]
    fn direct_lookup_without_aliases() {
        let index = reference(&["ABC123", "XYZ789", "ABC123"]);
        let out = resolve_direct(
            &docs(&["XYZ789", "ABC123", "QQQ999"]),
            &ConversionTable::default(),
            &index,
            &Canonicalizer::default(),
        );
        let ranks: Vec<_> = out.records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), None]);
        assert_eq!(out.conversion_misses, vec![0, 1, 2]);
        assert_eq!(out.trace[2].rank, Rank::Unmatched);
    }

    #[test]
    fn alias_substitutes_canonical_key() {
        let index = reference(&["SKU-A", "SKU-B"]);
        let canon = Canonicalizer::default();
        let table = ConversionTable::build(&[AliasRow::new("0123", "SKU-B")], &canon);
        let out = resolve_direct(&docs(&["o123", "SKU-A"]), &table, &index, &canon);

        assert_eq!(out.records[0].rank, Some(1));
        assert_eq!(out.trace[0].converted_key.as_deref(), Some("5KUB"));
        assert_eq!(out.records[1].rank, Some(0));
        assert_eq!(out.conversion_hits(), 1);
        assert_eq!(out.conversion_misses, vec![1]);
    }

    #[test]
    fn ocr_noise_is_absorbed() {
        let index = reference(&["SO-100"]);
        let out = resolve_direct(
            &docs(&[" s0 1|0q "]),
            &ConversionTable::default(),
            &index,
            &Canonicalizer::default(),
        );
        assert_eq!(out.records[0].canonical_key, "50I00");
        assert_eq!(out.records[0].rank, Some(0));
    }

    #[test]
    fn placements_mirror_records() {
        let index = reference(&["A"]);
        let out = resolve_direct(
            &docs(&["B", "A"]),
            &ConversionTable::default(),
            &index,
            &Canonicalizer::default(),
        );
        assert_eq!(
            out.placements(),
            vec![Placement { index: 0, rank: None }, Placement { index: 1, rank: Some(0) }]
        );
    }
}
