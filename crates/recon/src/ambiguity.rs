use std::collections::HashMap;

use crate::model::{DuplicateName, PartyRecord};
use crate::pairing::normalize_name;

/// Report names shared by more than one record in a name-tier pool.
///
/// One entry per duplicated normalized name, in order of first appearance.
/// Blank names are ignored since they never name-match.
pub fn detect_duplicate_names<'a, I>(pool: I) -> Vec<DuplicateName>
where
    I: IntoIterator<Item = &'a PartyRecord>,
{
    let mut order: Vec<String> = Vec::new();
    let mut seen: HashMap<String, DuplicateName> = HashMap::new();

    for record in pool {
        let normalized = normalize_name(&record.name);
        if normalized.is_empty() {
            continue;
        }
        let entry = seen.entry(normalized.clone()).or_insert_with(|| {
            order.push(normalized.clone());
            DuplicateName {
                name: record.name.trim().to_string(),
                normalized,
                count: 0,
                document_indices: Vec::new(),
            }
        });
        entry.count += 1;
        entry.document_indices.push(record.index);
    }

    let duplicates: Vec<DuplicateName> = order
        .into_iter()
        .filter_map(|key| seen.remove(&key))
        .filter(|d| d.count > 1)
        .collect();

    for d in &duplicates {
        log::warn!(
            "{} documents share the name {:?} and have no usable identifier; name matching may swap them (documents {:?})",
            d.count,
            d.name,
            d.document_indices,
        );
    }

    duplicates
}
