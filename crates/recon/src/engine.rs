use std::collections::HashSet;

use crate::config::{ColumnRoles, DocumentProfile, Strategy};
use crate::conversion::ConversionTable;
use crate::error::ReconError;
use crate::evidence::{is_complete, summarize_paired, summarize_ranked};
use crate::model::{
    AliasRow, Diagnostics, DocumentKey, PairedInput, PartyRecord, RankedInput, ReferenceRow,
    ReorderMeta, ReorderResult,
};
use crate::pairing::match_two_tier_with;
use crate::reference::ReferenceIndex;
use crate::resolve::resolve_direct;
use crate::sort::order;

/// Strategy A: order documents by where their key sits in the reference
/// list.
pub fn run_ranked(profile: &DocumentProfile, input: &RankedInput) -> Result<ReorderResult, ReconError> {
    ensure_strategy(profile, Strategy::Ranked)?;
    ensure_unique_indices("documents", input.documents.iter().map(|d| d.index))?;

    let canon = profile.canonicalizer();
    let conversions = ConversionTable::build(&input.aliases, &canon);
    let index = ReferenceIndex::build(&input.references, &canon, |r| r.key.as_deref());
    let resolution = resolve_direct(&input.documents, &conversions, &index, &canon);

    let mode = profile.output_mode();
    let sorted = order(&resolution.placements(), mode);
    debug_assert!(is_complete(input.documents.len(), &sorted, mode));

    // Without an alias table every key is a "miss"; only report misses
    // against a table that was actually supplied.
    let conversion_misses = if conversions.is_empty() {
        Vec::new()
    } else {
        resolution.conversion_misses.clone()
    };

    for record in resolution.records.iter().filter(|r| r.rank.is_none()) {
        log::warn!(
            "document {} ({:?} -> {}) matches no reference entry",
            record.index,
            record.raw_key,
            record.canonical_key,
        );
    }

    let summary =
        summarize_ranked(&resolution, &sorted, &index, &conversions, conversion_misses.len());
    log::info!(
        "ranked {} document(s) against {} reference key(s): {} placed, {} unmatched",
        summary.total,
        index.len(),
        summary.matched,
        summary.unmatched,
    );

    Ok(ReorderResult {
        meta: meta(profile),
        summary,
        order: sorted.ordered,
        unmatched: sorted.unmatched,
        pairs: Vec::new(),
        diagnostics: Diagnostics {
            trace: resolution.trace,
            conversion_misses,
            ..Default::default()
        },
    })
}

/// Strategy B: pair each reference with a pool document, then order the
/// references by their document's position.
pub fn run_paired(profile: &DocumentProfile, input: &PairedInput) -> Result<ReorderResult, ReconError> {
    ensure_strategy(profile, Strategy::Paired)?;
    ensure_unique_indices("references", input.references.iter().map(|r| r.index))?;
    ensure_unique_indices("documents", input.documents.iter().map(|d| d.index))?;

    let references: Vec<PartyRecord> = input
        .references
        .iter()
        .map(|r| PartyRecord {
            identifier: profile.reference_identifier.apply(&r.identifier),
            ..r.clone()
        })
        .collect();
    let documents: Vec<PartyRecord> = input
        .documents
        .iter()
        .map(|d| PartyRecord {
            identifier: profile.document_identifier.apply(&d.identifier),
            ..d.clone()
        })
        .collect();

    let outcome = match_two_tier_with(&references, &documents, &profile.name_match);

    let mode = profile.output_mode();
    let sorted = order(&outcome.placements(&references), mode);
    debug_assert!(is_complete(references.len(), &sorted, mode));

    let summary = summarize_paired(references.len(), &outcome, &sorted);
    log::info!(
        "paired {} record(s) against {} document(s): {} by identifier, {} by name, {} unmatched",
        summary.total,
        documents.len(),
        summary.matched_by_identifier,
        summary.matched_by_name,
        summary.unmatched,
    );

    Ok(ReorderResult {
        meta: meta(profile),
        summary,
        order: sorted.ordered,
        unmatched: sorted.unmatched,
        pairs: outcome.pairs,
        diagnostics: Diagnostics {
            duplicate_names: outcome.duplicate_names,
            unreadable_documents: outcome.unreadable,
            unclaimed_documents: outcome.unclaimed,
            ..Default::default()
        },
    })
}

fn ensure_strategy(profile: &DocumentProfile, expected: Strategy) -> Result<(), ReconError> {
    if profile.strategy != expected {
        return Err(ReconError::StrategyMismatch {
            profile: profile.name.clone(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

/// Placements and pairs are keyed by index; a repeated index would let one
/// record take another's slot.
fn ensure_unique_indices(input: &str, indices: impl IntoIterator<Item = usize>) -> Result<(), ReconError> {
    let mut seen = HashSet::new();
    for index in indices {
        if !seen.insert(index) {
            return Err(ReconError::DuplicateIndex { input: input.into(), index });
        }
    }
    Ok(())
}

fn meta(profile: &DocumentProfile) -> ReorderMeta {
    ReorderMeta {
        profile: profile.name.clone(),
        strategy: profile.strategy,
        output_mode: profile.output_mode(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
    }
}

// ---------------------------------------------------------------------------
// CSV loaders
// ---------------------------------------------------------------------------

struct Table {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn parse(csv_data: &str) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(csv_data.as_bytes());

        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    fn column(&self, input: &str, name: &str) -> Result<usize, ReconError> {
        self.optional_column(name).ok_or_else(|| ReconError::MissingColumn {
            input: input.into(),
            column: name.into(),
        })
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }
}

/// Line number of data row `i` (header is line 1).
fn line_of(i: usize) -> u64 {
    i as u64 + 2
}

fn parse_index(
    input: &str,
    row: &csv::StringRecord,
    i: usize,
    index_col: Option<usize>,
) -> Result<usize, ReconError> {
    let Some(col) = index_col else {
        return Ok(i);
    };
    let value = row.get(col).unwrap_or("").trim();
    value.parse().map_err(|_| ReconError::IndexParse {
        input: input.into(),
        line: line_of(i),
        value: value.into(),
    })
}

/// Reference rows in file order. Blank key cells become `None`; the rank
/// position of a row is its position among non-blank rows.
pub fn load_reference_rows(csv_data: &str, columns: &ColumnRoles) -> Result<Vec<ReferenceRow>, ReconError> {
    let table = Table::parse(csv_data)?;
    let key_col = table.column("reference", &columns.key)?;

    Ok(table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| ReferenceRow {
            index,
            key: row
                .get(key_col)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string),
        })
        .collect())
}

/// Document keys for a ranked run. The index column is optional; without
/// it documents are numbered in file order.
pub fn load_document_keys(csv_data: &str, columns: &ColumnRoles) -> Result<Vec<DocumentKey>, ReconError> {
    let table = Table::parse(csv_data)?;
    let key_col = table.column("documents", &columns.key)?;
    let index_col = table.optional_column(&columns.index);

    let keys = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(DocumentKey {
                index: parse_index("documents", row, i, index_col)?,
                text: row.get(key_col).unwrap_or("").to_string(),
            })
        })
        .collect::<Result<Vec<_>, ReconError>>()?;
    ensure_unique_indices("documents", keys.iter().map(|k| k.index))?;
    Ok(keys)
}

/// Name/identifier/address records for a paired run.
pub fn load_party_records(
    input: &str,
    csv_data: &str,
    columns: &ColumnRoles,
) -> Result<Vec<PartyRecord>, ReconError> {
    let table = Table::parse(csv_data)?;
    let identifier_col = table.column(input, &columns.identifier)?;
    let name_col = table.column(input, &columns.name)?;
    let address_cols = columns
        .address
        .iter()
        .map(|c| table.column(input, c))
        .collect::<Result<Vec<_>, _>>()?;
    let index_col = table.optional_column(&columns.index);

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(PartyRecord {
                index: parse_index(input, row, i, index_col)?,
                identifier: row.get(identifier_col).unwrap_or("").to_string(),
                name: row.get(name_col).unwrap_or("").to_string(),
                address: address_cols
                    .iter()
                    .filter_map(|&c| row.get(c))
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, ReconError>>()?;
    ensure_unique_indices(input, records.iter().map(|r| r.index))?;
    Ok(records)
}

/// Alias rows from CSV text. The first line is a header and is skipped;
/// columns are positional. Short rows yield `None` for the missing side.
pub fn load_alias_rows(csv_data: &str, columns: &ColumnRoles) -> Result<Vec<AliasRow>, ReconError> {
    let table = Table::parse(csv_data)?;
    Ok(table
        .rows
        .iter()
        .map(|row| AliasRow {
            alias: row.get(columns.alias).map(str::to_string),
            canonical: row.get(columns.alias_target).map(str::to_string),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileTable;
    use crate::model::MatchTier;

    const PROFILES: &str = r#"
[[profile]]
name = "picks"
strategy = "ranked"

[[profile]]
name = "slips"
strategy = "paired"
[profile.columns]
identifier = "reference"
address = ["address"]
[profile.reference_identifier]
transforms = [{ op = "keep_last", count = 4 }]
"#;

    fn profiles() -> ProfileTable {
        ProfileTable::from_toml(PROFILES).unwrap()
    }

    #[test]
    fn load_reference_with_blanks() {
        let csv = "key,qty\nABC123,1\n,2\n  ,3\nXYZ789,4\n";
        let rows = load_reference_rows(csv, &ColumnRoles::default()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].key.as_deref(), Some("ABC123"));
        assert_eq!(rows[1].key, None);
        assert_eq!(rows[2].key, None);
        assert_eq!(rows[3].index, 3);
    }

    #[test]
    fn load_reference_missing_column() {
        let err = load_reference_rows("sku\nA\n", &ColumnRoles::default()).unwrap_err();
        assert_eq!(err.to_string(), "reference: missing column 'key'");
    }

    #[test]
    fn load_documents_with_and_without_index() {
        let with = load_document_keys("page,key\n7,A\n3,B\n", &ColumnRoles::default()).unwrap();
        assert_eq!(with[0], DocumentKey { index: 7, text: "A".into() });
        assert_eq!(with[1].index, 3);

        let without = load_document_keys("key\nA\nB\n", &ColumnRoles::default()).unwrap();
        assert_eq!(without[1].index, 1);
    }

    #[test]
    fn load_documents_bad_index() {
        let err = load_document_keys("page,key\nx,A\n", &ColumnRoles::default()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn load_party_records_collects_address() {
        let table = profiles();
        let cols = &table.get("slips").unwrap().columns;
        let csv = "page,reference,name,address\n0,PO-1234,Ann Poe,1 Main St\n1,,Bob Roe,\n";
        let recs = load_party_records("references", csv, cols).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].address, vec!["1 Main St"]);
        assert!(recs[1].address.is_empty());
        assert_eq!(recs[1].identifier, "");
    }

    #[test]
    fn load_party_records_missing_name() {
        let cols = ColumnRoles::default();
        let err = load_party_records("documents", "identifier\nA\n", &cols).unwrap_err();
        assert_eq!(err.to_string(), "documents: missing column 'name'");
    }

    #[test]
    fn load_aliases_positional_and_short_rows() {
        let csv = "Item,UPC\nSKU-1,0001\nSKU-2\n";
        let rows = load_alias_rows(csv, &ColumnRoles::default()).unwrap();
        assert_eq!(rows[0], AliasRow::new("0001", "SKU-1"));
        assert_eq!(rows[1].alias, None);
        assert_eq!(rows[1].canonical.as_deref(), Some("SKU-2"));
    }

    #[test]
    fn ranked_run_sink_mode() {
        let table = profiles();
        let profile = table.get("picks").unwrap();
        let input = RankedInput {
            references: load_reference_rows("key\nABC123\nXYZ789\nABC123\n", &profile.columns).unwrap(),
            documents: load_document_keys("page,key\n0,XYZ789\n1,ABC123\n2,QQQ999\n", &profile.columns)
                .unwrap(),
            aliases: Vec::new(),
        };
        let result = run_ranked(profile, &input).unwrap();
        assert_eq!(result.order, vec![0, 1, 2]);
        assert_eq!(result.unmatched, vec![2]);
        assert_eq!(result.summary.matched, 2);
        assert!(result.diagnostics.conversion_misses.is_empty());
        assert_eq!(result.diagnostics.trace.len(), 3);
    }

    #[test]
    fn paired_run_applies_transforms_and_excludes() {
        let table = profiles();
        let profile = table.get("slips").unwrap();
        let input = PairedInput {
            references: vec![
                PartyRecord { index: 0, identifier: "PO-009912".into(), name: "Z".into(), ..Default::default() },
                PartyRecord { index: 1, identifier: "".into(), name: "Jane Doe".into(), ..Default::default() },
                PartyRecord { index: 2, identifier: "".into(), name: "Nobody".into(), ..Default::default() },
            ],
            documents: vec![
                PartyRecord { index: 0, identifier: "".into(), name: "JANEDOE".into(), ..Default::default() },
                PartyRecord { index: 1, identifier: "9912".into(), name: "Y".into(), ..Default::default() },
            ],
        };
        let result = run_paired(profile, &input).unwrap();
        assert_eq!(result.order, vec![1, 0]);
        assert_eq!(result.unmatched, vec![2]);
        assert_eq!(result.pairs[0].tier, MatchTier::Identifier);
        assert_eq!(result.pairs[1].tier, MatchTier::Name);
        assert_eq!(result.summary.matched_by_identifier, 1);
        assert_eq!(result.summary.matched_by_name, 1);
        assert!(result.diagnostics.unclaimed_documents.is_empty());
    }

    #[test]
    fn load_rejects_repeated_index() {
        let err = load_document_keys("page,key\n4,A\n4,B\n", &ColumnRoles::default()).unwrap_err();
        assert_eq!(err.to_string(), "documents: index 4 appears more than once");

        let csv = "page,identifier,name\n0,A1,Ann Poe\n0,,Nobody\n";
        let err = load_party_records("references", csv, &ColumnRoles::default()).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateIndex { index: 0, .. }));
    }

    #[test]
    fn paired_run_rejects_repeated_reference_index() {
        // The unpaired "Nobody" would otherwise inherit Ann Poe's slot and
        // vanish from the unmatched list.
        let table = profiles();
        let input = PairedInput {
            references: vec![
                PartyRecord { index: 0, identifier: "A1".into(), name: "Ann Poe".into(), ..Default::default() },
                PartyRecord { index: 0, identifier: "".into(), name: "Nobody".into(), ..Default::default() },
            ],
            documents: vec![
                PartyRecord { index: 5, identifier: "A1".into(), name: "".into(), ..Default::default() },
            ],
        };
        let err = run_paired(table.get("slips").unwrap(), &input).unwrap_err();
        assert_eq!(err.to_string(), "references: index 0 appears more than once");
    }

    #[test]
    fn ranked_run_rejects_repeated_document_index() {
        let table = profiles();
        let input = RankedInput {
            references: Vec::new(),
            documents: vec![
                DocumentKey { index: 1, text: "A".into() },
                DocumentKey { index: 1, text: "B".into() },
            ],
            aliases: Vec::new(),
        };
        let err = run_ranked(table.get("picks").unwrap(), &input).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateIndex { index: 1, .. }));
    }

    #[test]
    fn strategy_mismatch() {
        let table = profiles();
        let err = run_paired(table.get("picks").unwrap(), &PairedInput::default()).unwrap_err();
        assert_eq!(err.to_string(), "profile 'picks' is not a paired profile");
    }
}
