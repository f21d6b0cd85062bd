//! `slipsort-recon`: OCR-tolerant reconciliation and ordering engine.
//!
//! Pure engine crate: receives already-extracted strings and rows, returns
//! an ordering plus an explicit unmatched set. No PDF, OCR or file IO.

pub mod ambiguity;
pub mod canonical;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod pairing;
pub mod reference;
pub mod resolve;
pub mod sort;

pub use canonical::{canonical, Canonicalizer, SuffixRule};
pub use config::{DocumentProfile, OutputMode, ProfileTable, Strategy};
pub use engine::{run_paired, run_ranked};
pub use error::ReconError;
pub use model::{PairedInput, RankedInput, ReorderResult};
pub use pairing::NameMatch;
