use crate::config::OutputMode;
use crate::conversion::ConversionTable;
use crate::model::{MatchTier, ReorderSummary};
use crate::pairing::TwoTierOutcome;
use crate::reference::ReferenceIndex;
use crate::resolve::DirectResolution;
use crate::sort::SortedOutput;

/// Summary of a ranked run.
pub fn summarize_ranked(
    resolution: &DirectResolution,
    sorted: &SortedOutput,
    index: &ReferenceIndex,
    conversions: &ConversionTable,
    conversion_misses: usize,
) -> ReorderSummary {
    let total = resolution.records.len();
    ReorderSummary {
        total,
        matched: total - sorted.unmatched.len(),
        unmatched: sorted.unmatched.len(),
        conversion_hits: resolution.conversion_hits(),
        conversion_misses,
        skipped_reference_rows: index.skipped(),
        skipped_alias_rows: conversions.skipped(),
        ..Default::default()
    }
}

/// Summary of a paired run. `total` counts the records being reordered.
pub fn summarize_paired(total: usize, outcome: &TwoTierOutcome, sorted: &SortedOutput) -> ReorderSummary {
    ReorderSummary {
        total,
        matched: outcome.pairs.len(),
        unmatched: sorted.unmatched.len(),
        matched_by_identifier: outcome.count_tier(MatchTier::Identifier),
        matched_by_name: outcome.count_tier(MatchTier::Name),
        duplicate_name_warnings: outcome.duplicate_names.len(),
        ..Default::default()
    }
}

/// Every input index lands in exactly one place: the ordered output, the
/// unmatched set, or (sink mode) both with the unmatched ones at the tail.
pub fn is_complete(total: usize, sorted: &SortedOutput, mode: OutputMode) -> bool {
    match mode {
        OutputMode::Sink => {
            let matched = sorted.ordered.len() - sorted.unmatched.len().min(sorted.ordered.len());
            sorted.ordered.len() == total
                && sorted.unmatched.iter().all(|u| sorted.ordered[matched..].contains(u))
        }
        OutputMode::Exclude => {
            sorted.ordered.len() + sorted.unmatched.len() == total
                && sorted.unmatched.iter().all(|u| !sorted.ordered.contains(u))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_sink() {
        let sorted = SortedOutput { ordered: vec![2, 0, 1], unmatched: vec![1] };
        assert!(is_complete(3, &sorted, OutputMode::Sink));
        // Unmatched index not at the tail.
        let sorted = SortedOutput { ordered: vec![1, 2, 0], unmatched: vec![1] };
        assert!(!is_complete(3, &sorted, OutputMode::Sink));
    }

    #[test]
    fn complete_exclude() {
        let sorted = SortedOutput { ordered: vec![2, 0], unmatched: vec![1] };
        assert!(is_complete(3, &sorted, OutputMode::Exclude));
        let sorted = SortedOutput { ordered: vec![2, 0], unmatched: vec![] };
        assert!(!is_complete(3, &sorted, OutputMode::Exclude));
    }

    #[test]
    fn paired_summary_counts_tiers() {
        use crate::model::Pairing;
        let outcome = TwoTierOutcome {
            pairs: vec![
                Pairing { reference: 0, document: 1, tier: MatchTier::Identifier },
                Pairing { reference: 1, document: 0, tier: MatchTier::Name },
                Pairing { reference: 2, document: 2, tier: MatchTier::Identifier },
            ],
            non_matching: vec![3],
            ..Default::default()
        };
        let sorted = SortedOutput { ordered: vec![1, 0, 2], unmatched: vec![3] };
        let s = summarize_paired(4, &outcome, &sorted);
        assert_eq!(s.total, 4);
        assert_eq!(s.matched, 3);
        assert_eq!(s.unmatched, 1);
        assert_eq!(s.matched_by_identifier, 2);
        assert_eq!(s.matched_by_name, 1);
    }
}
