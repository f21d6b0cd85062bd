use crate::config::OutputMode;
use crate::model::Rank;

/// The two fields the sorter reads from a resolved record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    pub rank: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedOutput {
    pub ordered: Vec<usize>,
    pub unmatched: Vec<usize>,
}

/// Order placements by `(rank, index)`, unmatched last.
///
/// In [`OutputMode::Sink`] the unmatched indices stay at the tail of
/// `ordered` and are also listed in `unmatched`; in [`OutputMode::Exclude`]
/// they appear only in `unmatched`. Either way `unmatched` keeps original
/// index order.
pub fn order(placements: &[Placement], mode: OutputMode) -> SortedOutput {
    let mut keyed: Vec<(Rank, usize)> = placements
        .iter()
        .map(|p| (Rank::from_lookup(p.rank), p.index))
        .collect();
    keyed.sort();

    let unmatched: Vec<usize> = keyed
        .iter()
        .filter(|(rank, _)| !rank.is_matched())
        .map(|(_, index)| *index)
        .collect();

    let ordered = keyed
        .iter()
        .filter(|(rank, _)| mode == OutputMode::Sink || rank.is_matched())
        .map(|(_, index)| *index)
        .collect();

    SortedOutput { ordered, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(index: usize, rank: Option<usize>) -> Placement {
        Placement { index, rank }
    }

    #[test]
    fn sink_mode_keeps_everything() {
        let out = order(&[p(0, Some(1)), p(1, Some(2)), p(2, None)], OutputMode::Sink);
        assert_eq!(out.ordered, vec![0, 1, 2]);
        assert_eq!(out.unmatched, vec![2]);
    }

    #[test]
    fn exclude_mode_splits() {
        let out = order(&[p(0, None), p(1, Some(5)), p(2, Some(0))], OutputMode::Exclude);
        assert_eq!(out.ordered, vec![2, 1]);
        assert_eq!(out.unmatched, vec![0]);
    }

    #[test]
    fn equal_ranks_keep_original_order() {
        let out = order(&[p(4, Some(1)), p(2, Some(1)), p(3, Some(0))], OutputMode::Sink);
        assert_eq!(out.ordered, vec![3, 2, 4]);
    }

    #[test]
    fn unmatched_tail_in_index_order() {
        let out = order(&[p(3, None), p(0, None), p(1, Some(9))], OutputMode::Sink);
        assert_eq!(out.ordered, vec![1, 0, 3]);
        assert_eq!(out.unmatched, vec![0, 3]);
    }

    #[test]
    fn empty() {
        assert_eq!(order(&[], OutputMode::Exclude), SortedOutput::default());
    }
}
