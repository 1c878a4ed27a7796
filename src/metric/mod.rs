//! Sufficient-statistics metrics.
//!
//! A metric turns a candidate and its sentence index into a fixed-length
//! vector of counts (`suff_stats`), and a vector into a scalar (`score`).
//! Each variant keeps its statistics in a named struct and only flattens it
//! at this boundary; the vector length is fixed when the metric is built.

pub mod bleu;
pub mod grade_level;
pub mod grade_level_bleu;
pub mod readability;
pub mod readability_bleu;
pub mod registry;
pub mod simplicity_bleu;
pub mod syntactic_readability;
pub mod syntactic_simplicity;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub use bleu::{Bleu, BleuConfig, EffectiveLength};
pub use registry::{MetricContext, MetricKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

/// The value candidates of a group are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankKey {
    /// The metric score. Only candidates scoring above zero are kept.
    #[default]
    Score,
    /// The summed weights of the syntactic sub-scores on which a candidate
    /// is simpler than its source. Only positive values are kept.
    Relative,
    /// The parser's model score. Every candidate with a parse is kept.
    Parse,
}

impl RankKey {
    pub fn name(&self) -> &'static str {
        match self {
            RankKey::Score => "score",
            RankKey::Relative => "relative",
            RankKey::Parse => "parse",
        }
    }

    /// Whether a candidate with this value takes part in the ranking.
    pub fn keeps(&self, value: f64) -> bool {
        match self {
            RankKey::Parse => value.is_finite(),
            RankKey::Score | RankKey::Relative => value > 0.0,
        }
    }
}

impl FromStr for RankKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<RankKey> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" => Ok(RankKey::Score),
            "relative" => Ok(RankKey::Relative),
            "parse" => Ok(RankKey::Parse),
            _ => Err(Error::UnknownRankKey(s.to_string())),
        }
    }
}

impl fmt::Display for RankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Metric {
    fn name(&self) -> &'static str;

    fn direction(&self) -> Direction;

    /// Number of sentences the metric was built for.
    fn num_sentences(&self) -> usize;

    fn suff_stats_count(&self) -> usize;

    fn suff_stats(&self, candidate: &str, sentence: usize) -> Result<Vec<u32>>;

    /// Fails with [`Error::StatsLength`] unless `stats.len() == suff_stats_count()`.
    fn score(&self, stats: &[u32]) -> Result<f64>;

    /// Named intermediate quantities behind the score, score first.
    fn breakdown(&self, stats: &[u32]) -> Result<Vec<(String, f64)>>;

    fn best_possible_score(&self) -> f64;

    fn worst_possible_score(&self) -> f64;

    fn score_candidate(&self, candidate: &str, sentence: usize) -> Result<f64> {
        let stats = self.suff_stats(candidate, sentence)?;
        self.score(&stats)
    }

    /// Keys this metric can rank candidates by.
    fn rank_keys(&self) -> &'static [RankKey] {
        &[RankKey::Score]
    }

    fn supports(&self, key: RankKey) -> Result<()> {
        if self.rank_keys().contains(&key) {
            Ok(())
        } else {
            Err(Error::UnsupportedRankKey {
                metric: self.name(),
                key: key.name(),
            })
        }
    }

    /// The value `candidate` is ranked by under `key`.
    fn rank_value(&self, key: RankKey, candidate: &str, sentence: usize) -> Result<f64> {
        self.supports(key)?;
        self.score_candidate(candidate, sentence)
    }

    /// Clamps a composite score into the metric's bounds.
    fn clamp(&self, score: f64) -> f64 {
        let (lo, hi) = match self.direction() {
            Direction::Maximize => (self.worst_possible_score(), self.best_possible_score()),
            Direction::Minimize => (self.best_possible_score(), self.worst_possible_score()),
        };
        if score.is_nan() {
            return self.worst_possible_score();
        }
        score.max(lo).min(hi)
    }
}

pub(crate) fn check_index(sentence: usize, sentences: usize) -> Result<()> {
    if sentence >= sentences {
        return Err(Error::SentenceIndex {
            index: sentence,
            sentences,
        });
    }
    Ok(())
}

/// Sequential reader over a statistics vector whose length was checked up front.
pub(crate) struct StatsReader<'a> {
    stats: &'a [u32],
    pos: usize,
}

impl<'a> StatsReader<'a> {
    pub(crate) fn new(metric: &'static str, stats: &'a [u32], expected: usize) -> Result<Self> {
        if stats.len() != expected {
            return Err(Error::StatsLength {
                metric,
                expected,
                found: stats.len(),
            });
        }
        Ok(StatsReader { stats, pos: 0 })
    }

    pub(crate) fn next(&mut self) -> u32 {
        let value = self.stats.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_reader_checks_length() {
        assert!(matches!(
            StatsReader::new("X", &[1, 2], 3),
            Err(Error::StatsLength {
                expected: 3,
                found: 2,
                ..
            })
        ));
        let mut r = StatsReader::new("X", &[4, 5], 2).unwrap();
        assert_eq!((r.next(), r.next()), (4, 5));
    }

    #[test]
    fn rank_keys_by_name() {
        assert_eq!("score".parse::<RankKey>().unwrap(), RankKey::Score);
        assert_eq!(" Relative".parse::<RankKey>().unwrap(), RankKey::Relative);
        assert_eq!("PARSE".parse::<RankKey>().unwrap(), RankKey::Parse);
        assert!(matches!(
            "bleu".parse::<RankKey>(),
            Err(Error::UnknownRankKey(s)) if s == "bleu"
        ));
        assert_eq!(RankKey::default().to_string(), "score");
    }

    #[test]
    fn only_parse_scores_keep_non_positive_values() {
        assert!(!RankKey::Score.keeps(0.0));
        assert!(!RankKey::Relative.keeps(-1.0));
        assert!(RankKey::Parse.keeps(-42.5));
        assert!(!RankKey::Parse.keeps(f64::NAN));
    }

    #[test]
    fn index_bounds() {
        assert!(check_index(0, 1).is_ok());
        assert!(check_index(1, 1).is_err());
    }
}
