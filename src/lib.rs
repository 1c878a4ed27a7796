//! Rescoring machine-translation n-best lists with BLEU and with
//! readability- and simplicity-aware metrics built on it.
//!
//! Every metric follows the sufficient-statistics contract in [`metric`]:
//! a candidate becomes a fixed-length vector of counts, and a vector becomes
//! a score. [`rerank`] reads an n-best list grouped by sentence index and
//! writes each group back ordered by metric score.

pub mod cache;
pub mod config;
pub mod corpus;
pub mod error;
pub mod lexicon;
pub mod metric;
pub mod nbest;
pub mod ngram;
pub mod rerank;
pub mod syntax;
pub mod text;

pub use config::Settings;
pub use corpus::Corpus;
pub use error::{Error, Result};
pub use metric::{Direction, Metric, MetricContext, MetricKind, RankKey};
pub use nbest::{NbestGroup, NbestGroups, NbestRecord};
pub use rerank::{rank_group, rerank, score_report, Ranking, RerankSummary};
