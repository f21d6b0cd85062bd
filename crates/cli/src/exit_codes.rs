//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: print-room scripts branch on
//! them to decide whether a batch can go to the printer.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified, output write failure)         |
//! | 2    | CLI usage error (bad args, unknown rule name)             |
//! | 3    | Input file could not be read or parsed                    |
//! | 4    | Profile table invalid, or no profile matched              |
//! | 5    | Unmatched records present (only with `--strict`)          |
//! | 6    | Output file still busy after all retries                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments that clap could not reject itself.
pub const EXIT_USAGE: u8 = 2;

/// An input file is missing, unreadable, or lacks a required column.
pub const EXIT_INPUT: u8 = 3;

/// Profile table failed to parse or validate, no profile matched the
/// requested name or path, or the profile's strategy is wrong for the
/// command.
pub const EXIT_PROFILE: u8 = 4;

/// Run completed but some records could not be placed (`--strict`).
/// Outputs are still written before exiting.
pub const EXIT_UNMATCHED: u8 = 5;

/// Output target stayed locked (typically open in a viewer) after every
/// retry.
pub const EXIT_OUTPUT_BUSY: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_INPUT,
            EXIT_PROFILE,
            EXIT_UNMATCHED,
            EXIT_OUTPUT_BUSY,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
