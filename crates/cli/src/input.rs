//! Reading input files: profile tables, extracted CSVs, alias workbooks.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use slipsort_recon::config::ColumnRoles;
use slipsort_recon::model::AliasRow;
use slipsort_recon::ProfileTable;

use crate::CliError;

pub fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| {
        CliError::input(format!("cannot read {}: {e}", path.display()))
    })
}

/// The table from `--profiles FILE`, or the built-in one.
pub fn load_profiles(path: Option<&Path>) -> Result<ProfileTable, CliError> {
    let table = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| {
                CliError::profile(format!("cannot read profile table {}: {e}", p.display()))
            })?;
            ProfileTable::from_toml(&text)
        }
        None => ProfileTable::builtin(),
    };
    table.map_err(|e| CliError::from_recon(e).with_hint("check the table with `slipsort profiles validate FILE`"))
}

/// Alias rows from a CSV or spreadsheet file, chosen by extension.
pub fn load_aliases(path: &Path, columns: &ColumnRoles) -> Result<Vec<AliasRow>, CliError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_aliases_workbook(path, columns),
        _ => {
            let text = read_text(path)?;
            slipsort_recon::engine::load_alias_rows(&text, columns)
                .map_err(|e| CliError::from_recon(e).with_path(path))
        }
    }
}

/// First sheet, header row skipped, columns positional.
fn load_aliases_workbook(path: &Path, columns: &ColumnRoles) -> Result<Vec<AliasRow>, CliError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| CliError::input(format!("cannot open {}: {e}", path.display())))?;

    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(CliError::input(format!("{}: workbook has no sheets", path.display())));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| CliError::input(format!("{}: cannot read sheet '{sheet}': {e}", path.display())))?;

    let rows: Vec<AliasRow> = range
        .rows()
        .skip(1)
        .map(|row| AliasRow {
            alias: row.get(columns.alias).and_then(cell_text),
            canonical: row.get(columns.alias_target).and_then(cell_text),
        })
        .collect();

    log::debug!("{}: {} alias row(s) from sheet '{sheet}'", path.display(), rows.len());
    Ok(rows)
}

/// Cell text as the alias table sees it. Whole floats lose their `.0` so
/// numeric UPCs compare as digits.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
        Data::Float(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => {
            log::debug!("alias cell {other:?} ignored");
            None
        }
    }
}
