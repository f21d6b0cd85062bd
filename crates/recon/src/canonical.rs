//! OCR-tolerant key canonicalization.
//!
//! The core pipeline folds glyphs that OCR engines routinely confuse
//! (`O`/`Q` vs `0`, `S` vs `5`, vertical strokes vs `1`/`I`) and drops
//! segmentation artifacts (hyphens, whitespace). Suffix rules are separate,
//! opt-in corrections that only some document families need.

use serde::{Deserialize, Serialize};

/// Optional post-processing corrections, applied after the core pipeline.
///
/// Declaration order is application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixRule {
    /// `B00` becomes `B0`, repeated until no `B00` remains.
    CollapseB00,
    /// A trailing `I` becomes `L`.
    TrailingIToL,
    /// A trailing `Z2` becomes `20`.
    #[serde(rename = "trailing_z2_to_20")]
    TrailingZ2To20,
}

impl SuffixRule {
    pub const ALL: [SuffixRule; 3] = [
        SuffixRule::CollapseB00,
        SuffixRule::TrailingIToL,
        SuffixRule::TrailingZ2To20,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CollapseB00 => "collapse_b00",
            Self::TrailingIToL => "trailing_i_to_l",
            Self::TrailingZ2To20 => "trailing_z2_to_20",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    fn apply(&self, key: &mut String) {
        match self {
            Self::CollapseB00 => {
                while key.contains("B00") {
                    *key = key.replace("B00", "B0");
                }
            }
            Self::TrailingIToL => {
                if key.ends_with('I') {
                    key.pop();
                    key.push('L');
                }
            }
            Self::TrailingZ2To20 => {
                if key.ends_with("Z2") {
                    key.truncate(key.len() - 2);
                    key.push_str("20");
                }
            }
        }
    }
}

impl std::fmt::Display for SuffixRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Core canonicalization: the six-rule pipeline, no suffix corrections.
///
/// ```
/// assert_eq!(slipsort_recon::canonical::canonical("OQ-1S 5"), "00I55");
/// ```
pub fn canonical(text: &str) -> String {
    // Substitutions and deletions are per-character; only the `I` collapse
    // looks at neighbours, and it sees the already-substituted output.
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let mapped = match ch {
            'O' | 'Q' => '0',
            'S' => '5',
            '-' => continue,
            '1' | '|' => 'I',
            c if c.is_whitespace() => continue,
            c => c,
        };
        if mapped == 'I' && out.ends_with('I') {
            continue;
        }
        out.push(mapped);
    }
    out
}

/// Core pipeline plus a fixed set of suffix rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Canonicalizer {
    rules: Vec<SuffixRule>,
}

impl Canonicalizer {
    /// Rules are deduplicated and always applied in [`SuffixRule`] order,
    /// whatever order the caller lists them in.
    pub fn new(rules: &[SuffixRule]) -> Self {
        let mut rules = rules.to_vec();
        rules.sort();
        rules.dedup();
        Self { rules }
    }

    pub fn rules(&self) -> &[SuffixRule] {
        &self.rules
    }

    pub fn apply(&self, text: &str) -> String {
        let mut key = canonical(text);
        for rule in &self.rules {
            rule.apply(&mut key);
        }
        key
    }
}
