//! Writing results: JSON documents and the page-order CSV.
//!
//! A single write attempt reports a locked target as
//! [`WriteResult::ResourceBusy`] instead of failing; the caller decides how
//! long to keep trying.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exit_codes::{EXIT_ERROR, EXIT_OUTPUT_BUSY};
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    /// Target is held open by another process.
    ResourceBusy,
}

// Windows sharing/lock violations.
#[cfg(windows)]
const BUSY_OS_ERRORS: &[i32] = &[32, 33];
// EBUSY, ETXTBSY.
#[cfg(not(windows))]
const BUSY_OS_ERRORS: &[i32] = &[16, 26];

fn is_busy(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
        || err.raw_os_error().is_some_and(|code| BUSY_OS_ERRORS.contains(&code))
}

/// One attempt at replacing `path` with `bytes`.
pub fn write_output(path: &Path, bytes: &[u8]) -> io::Result<WriteResult> {
    match std::fs::write(path, bytes) {
        Ok(()) => Ok(WriteResult::Written),
        Err(e) if is_busy(&e) => {
            log::debug!("{} busy: {e}", path.display());
            Ok(WriteResult::ResourceBusy)
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    pub delay: Duration,
}

/// Run `attempt` until it writes, fails, or the retries run out.
pub fn with_retry<F>(label: &Path, policy: RetryPolicy, mut attempt: F) -> Result<(), CliError>
where
    F: FnMut() -> io::Result<WriteResult>,
{
    for n in 0..=policy.retries {
        match attempt() {
            Ok(WriteResult::Written) => return Ok(()),
            Ok(WriteResult::ResourceBusy) => {
                if n < policy.retries {
                    log::warn!(
                        "{} is in use; retrying in {}ms ({}/{})",
                        label.display(),
                        policy.delay.as_millis(),
                        n + 1,
                        policy.retries,
                    );
                    std::thread::sleep(policy.delay);
                }
            }
            Err(e) => {
                return Err(CliError {
                    code: EXIT_ERROR,
                    message: format!("cannot write {}: {e}", label.display()),
                    hint: None,
                });
            }
        }
    }

    Err(CliError {
        code: EXIT_OUTPUT_BUSY,
        message: format!(
            "{} is still in use after {} attempt(s)",
            label.display(),
            policy.retries + 1
        ),
        hint: Some("close the file in any viewer, or raise --retries / --retry-delay-ms".into()),
    })
}

pub fn write_file(path: &Path, bytes: &[u8], policy: RetryPolicy) -> Result<(), CliError> {
    with_retry(path, policy, || write_output(path, bytes))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// `position,index` rows for a page-reordering writer.
pub fn order_csv(order: &[usize]) -> Result<Vec<u8>, CliError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| CliError {
        code: EXIT_ERROR,
        message: format!("cannot encode order CSV: {e}"),
        hint: None,
    };
    writer.write_record(["position", "index"]).map_err(csv_err)?;
    for (position, index) in order.iter().enumerate() {
        writer
            .write_record([position.to_string(), index.to_string()])
            .map_err(csv_err)?;
    }
    writer.into_inner().map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("cannot encode order CSV: {e}"),
        hint: None,
    })
}

/// `<stem>_reordered.json` next to the documents file.
pub fn default_output_path(documents: &Path) -> PathBuf {
    let stem = documents
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("documents");
    documents.with_file_name(format!("{stem}_reordered.json"))
}
