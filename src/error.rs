use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("unknown metric name {0}")]
    UnknownMetric(String),

    #[error("unknown ranking key {0}")]
    UnknownRankKey(String),

    #[error("metric {metric} cannot rank by {key}")]
    UnsupportedRankKey {
        metric: &'static str,
        key: &'static str,
    },

    #[error("metric {metric} takes {expected} options, got {found}")]
    OptionArity {
        metric: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid option for {metric}: {reason}")]
    InvalidOption {
        metric: &'static str,
        reason: String,
    },

    #[error("mismatch between stats.len() and suffStatsCount ({found} vs. {expected}) in {metric}")]
    StatsLength {
        metric: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("source file {path} has {found} lines, need {expected}")]
    MissingSource {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("reference file has {lines} lines, not a multiple of {refs_per_sentence} references per sentence")]
    ReferenceCount {
        lines: usize,
        refs_per_sentence: usize,
    },

    #[error("line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("line {line}: sentence index {found} follows {previous}")]
    IndexOrder {
        line: usize,
        previous: usize,
        found: usize,
    },

    #[error("line {line}: sentence index {found} skips ahead of {previous}")]
    IndexGap {
        line: usize,
        previous: usize,
        found: usize,
    },

    #[error("sentence index {index} out of range ({sentences} sentences)")]
    SentenceIndex { index: usize, sentences: usize },

    #[error("bad tree: {0}")]
    Tree(String),

    #[error("no parse available for \"{0}\"")]
    Unparsed(String),
}

impl Error {
    /// Process exit status for a run that ends with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UnknownMetric(_) => 10,
            Error::StatsLength { .. } => 2,
            _ => 1,
        }
    }

    /// Errors that abort a run even when raised for a single candidate.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::StatsLength { .. } | Error::SentenceIndex { .. } | Error::Io(_)
        )
    }
}
