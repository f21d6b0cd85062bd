use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error in a profile table.
    ProfileParse(String),
    /// Profile table validation error (duplicate name, bad region, etc.).
    ProfileValidation(String),
    /// No profile matched the requested name or lookup hint.
    UnknownProfile(String),
    /// Profile strategy does not match the entry point it was run through.
    StrategyMismatch { profile: String, expected: String },
    /// Missing required column in input data.
    MissingColumn { input: String, column: String },
    /// Record index could not be parsed.
    IndexParse { input: String, line: u64, value: String },
    /// Two records of one input share an index.
    DuplicateIndex { input: String, index: usize },
    /// IO error (CSV read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProfileParse(msg) => write!(f, "profile parse error: {msg}"),
            Self::ProfileValidation(msg) => write!(f, "profile validation error: {msg}"),
            Self::UnknownProfile(key) => write!(f, "no profile matches '{key}'"),
            Self::StrategyMismatch { profile, expected } => {
                write!(f, "profile '{profile}' is not a {expected} profile")
            }
            Self::MissingColumn { input, column } => {
                write!(f, "{input}: missing column '{column}'")
            }
            Self::IndexParse { input, line, value } => {
                write!(f, "{input}, line {line}: cannot parse index '{value}'")
            }
            Self::DuplicateIndex { input, index } => {
                write!(f, "{input}: index {index} appears more than once")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Io(e.to_string())
    }
}
