//! Clipped n-gram precision, effective reference length, brevity penalty
//! and smoothed BLEU, plus the stand-alone `BLEU` metric.

use std::rc::Rc;
use std::str::FromStr;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::ngram::{ngram_counts_of_order, NgramCounts, NgramIndex};
use crate::text::candidate_tokens;

use super::{check_index, Direction, Metric, StatsReader};

pub const DEFAULT_MAX_ORDER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveLength {
    /// Shortest reference.
    Shortest,
    /// Reference closest in length to the candidate, ties toward the shorter.
    Closest,
}

impl FromStr for EffectiveLength {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shortest" => Ok(EffectiveLength::Shortest),
            "closest" => Ok(EffectiveLength::Closest),
            _ => Err(format!("unknown effective length method {s}")),
        }
    }
}

impl EffectiveLength {
    pub fn select(self, ref_lengths: &[usize], candidate_len: usize) -> usize {
        match self {
            EffectiveLength::Shortest => ref_lengths.iter().copied().min(),
            EffectiveLength::Closest => ref_lengths
                .iter()
                .copied()
                .min_by_key(|&len| (len.abs_diff(candidate_len), len)),
        }
        .unwrap_or(candidate_len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NgramMatch {
    pub correct: u32,
    pub total: u32,
}

/// Reference-side BLEU statistics for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BleuStats {
    pub matches: Vec<NgramMatch>,
    pub candidate_len: u32,
    pub reference_len: u32,
}

impl BleuStats {
    pub fn len_for(max_order: usize) -> usize {
        2 * max_order + 2
    }

    pub fn write(&self, out: &mut Vec<u32>) {
        write_matches(&self.matches, out);
        out.push(self.candidate_len);
        out.push(self.reference_len);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>, max_order: usize) -> BleuStats {
        let matches = read_matches(reader, max_order);
        BleuStats {
            matches,
            candidate_len: reader.next(),
            reference_len: reader.next(),
        }
    }
}

pub(crate) fn write_matches(matches: &[NgramMatch], out: &mut Vec<u32>) {
    for m in matches {
        out.push(m.correct);
        out.push(m.total);
    }
}

pub(crate) fn read_matches(reader: &mut StatsReader<'_>, max_order: usize) -> Vec<NgramMatch> {
    (0..max_order)
        .map(|_| NgramMatch {
            correct: reader.next(),
            total: reader.next(),
        })
        .collect()
}

/// Order, weights and length policy shared by every BLEU-derived metric.
#[derive(Debug, Clone, PartialEq)]
pub struct BleuConfig {
    pub max_order: usize,
    pub effective_length: EffectiveLength,
    weights: Vec<f64>,
}

impl BleuConfig {
    pub fn new(max_order: usize, effective_length: EffectiveLength) -> BleuConfig {
        let max_order = max_order.max(1);
        BleuConfig {
            max_order,
            effective_length,
            weights: vec![1.0 / max_order as f64; max_order],
        }
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<BleuConfig> {
        if weights.len() != self.max_order {
            return Err(Error::Settings(format!(
                "{} BLEU weights given for max order {}",
                weights.len(),
                self.max_order
            )));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Clipped and total n-gram counts of `words` against `max_counts`.
    pub fn matches(&self, words: &[&str], max_counts: &NgramCounts) -> Vec<NgramMatch> {
        (1..=self.max_order)
            .map(|n| {
                let correct = ngram_counts_of_order(words, n)
                    .iter()
                    .map(|(gram, &count)| count.min(max_counts.get(gram).copied().unwrap_or(0)))
                    .sum();
                NgramMatch {
                    correct,
                    total: (words.len() + 1).saturating_sub(n) as u32,
                }
            })
            .collect()
    }

    /// Statistics of `words` against sentence `sentence` of `index`.
    pub fn stats(&self, words: &[&str], index: &NgramIndex, sentence: usize) -> Result<BleuStats> {
        let (max_counts, lengths) = index
            .max_counts(sentence)
            .zip(index.ref_lengths(sentence))
            .ok_or(Error::SentenceIndex {
                index: sentence,
                sentences: index.len(),
            })?;
        Ok(BleuStats {
            matches: self.matches(words, max_counts),
            candidate_len: words.len() as u32,
            reference_len: self.effective_length.select(lengths, words.len()) as u32,
        })
    }

    pub fn score(&self, stats: &BleuStats) -> f64 {
        let precisions = smoothed_precisions(&stats.matches, stats.candidate_len);
        let log_sum: f64 = precisions
            .iter()
            .zip(&self.weights)
            .map(|(p, w)| w * p.ln())
            .sum();
        brevity_penalty(stats.candidate_len, stats.reference_len) * log_sum.exp()
    }
}

impl Default for BleuConfig {
    fn default() -> Self {
        BleuConfig::new(DEFAULT_MAX_ORDER, EffectiveLength::Closest)
    }
}

/// Per-order precisions; a zero precision is replaced by a smoothing factor
/// halved at each zero order, divided by the number of n-grams of that order.
pub fn smoothed_precisions(matches: &[NgramMatch], candidate_len: u32) -> Vec<f64> {
    let mut smooth = 1.0;
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let n = i as f64 + 1.0;
            let prec = if m.total > 0 {
                m.correct as f64 / m.total as f64
            } else {
                1.0
            };
            if prec == 0.0 {
                smooth *= 0.5;
                smooth / (candidate_len as f64 - n + 1.0).max(1.0)
            } else {
                prec
            }
        })
        .collect()
}

pub fn brevity_penalty(candidate_len: u32, reference_len: u32) -> f64 {
    if candidate_len >= reference_len {
        1.0
    } else if candidate_len == 0 {
        0.0
    } else {
        (1.0 - reference_len as f64 / candidate_len as f64).exp()
    }
}

/// Plain sentence-level BLEU against the references.
pub struct Bleu {
    config: BleuConfig,
    index: NgramIndex,
    oov_marker: String,
}

impl Bleu {
    pub const NAME: &'static str = "BLEU";

    pub fn new(corpus: &Rc<Corpus>, config: BleuConfig, oov_marker: &str) -> Bleu {
        let index = NgramIndex::build(corpus.iter(), config.max_order);
        Bleu {
            config,
            index,
            oov_marker: oov_marker.to_string(),
        }
    }

    pub fn config(&self) -> &BleuConfig {
        &self.config
    }

    fn decode(&self, stats: &[u32]) -> Result<BleuStats> {
        let mut reader = StatsReader::new(Self::NAME, stats, self.suff_stats_count())?;
        Ok(BleuStats::read(&mut reader, self.config.max_order))
    }
}

impl Metric for Bleu {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn num_sentences(&self) -> usize {
        self.index.len()
    }

    fn suff_stats_count(&self) -> usize {
        BleuStats::len_for(self.config.max_order)
    }

    fn suff_stats(&self, candidate: &str, sentence: usize) -> Result<Vec<u32>> {
        check_index(sentence, self.num_sentences())?;
        let words = candidate_tokens(candidate, &self.oov_marker);
        let stats = self.config.stats(&words, &self.index, sentence)?;
        let mut out = Vec::with_capacity(self.suff_stats_count());
        stats.write(&mut out);
        Ok(out)
    }

    fn score(&self, stats: &[u32]) -> Result<f64> {
        Ok(self.config.score(&self.decode(stats)?))
    }

    fn breakdown(&self, stats: &[u32]) -> Result<Vec<(String, f64)>> {
        let decoded = self.decode(stats)?;
        let mut fields = vec![
            ("BLEU".to_string(), self.config.score(&decoded)),
            (
                "BP".to_string(),
                brevity_penalty(decoded.candidate_len, decoded.reference_len),
            ),
        ];
        for (n, p) in smoothed_precisions(&decoded.matches, decoded.candidate_len)
            .into_iter()
            .enumerate()
        {
            fields.push((format!("P{}", n + 1), p));
        }
        fields.push(("HYP_LEN".to_string(), decoded.candidate_len as f64));
        fields.push(("REF_LEN".to_string(), decoded.reference_len as f64));
        Ok(fields)
    }

    fn best_possible_score(&self) -> f64 {
        1.0
    }

    fn worst_possible_score(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(refs: &[&[&str]]) -> Rc<Corpus> {
        Rc::new(
            Corpus::new(
                refs.iter()
                    .map(|r| r.iter().map(|s| s.to_string()).collect())
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn shortest_effective_length() {
        for cand in [0, 3, 7, 20] {
            assert_eq!(EffectiveLength::Shortest.select(&[5, 8, 6], cand), 5);
        }
    }

    #[test]
    fn closest_effective_length() {
        assert_eq!(EffectiveLength::Closest.select(&[5, 8, 6], 7), 6);
        assert_eq!(EffectiveLength::Closest.select(&[8, 6], 7), 6);
        assert_eq!(EffectiveLength::Closest.select(&[5, 8, 6], 100), 8);
        assert_eq!(EffectiveLength::Closest.select(&[], 3), 3);
    }

    #[test]
    fn parses_effective_length_names() {
        assert_eq!("CLOSEST".parse(), Ok(EffectiveLength::Closest));
        assert_eq!("shortest".parse(), Ok(EffectiveLength::Shortest));
        assert!("average".parse::<EffectiveLength>().is_err());
    }

    #[test]
    fn identical_candidate_scores_one() {
        let c = corpus(&[&["the quick brown fox jumps over the dog"]]);
        let bleu = Bleu::new(&c, BleuConfig::default(), "_OOV");
        let stats = bleu
            .suff_stats("the quick brown fox jumps over the dog", 0)
            .unwrap();
        assert_eq!(stats.len(), bleu.suff_stats_count());
        for n in 0..4 {
            assert_eq!(stats[2 * n], stats[2 * n + 1]);
        }
        assert_eq!(bleu.score(&stats).unwrap(), 1.0);
    }

    #[test]
    fn clips_over_generated_ngrams() {
        let config = BleuConfig::new(1, EffectiveLength::Closest);
        let mut max_counts = NgramCounts::new();
        max_counts.insert("the".to_string(), 2);
        let m = config.matches(&["the", "the", "the", "cat"], &max_counts);
        assert_eq!(m, vec![NgramMatch { correct: 2, total: 4 }]);
    }

    #[test]
    fn smoothing_halves_at_each_zero_order() {
        let matches = [
            NgramMatch { correct: 3, total: 5 },
            NgramMatch { correct: 0, total: 4 },
            NgramMatch { correct: 0, total: 3 },
            NgramMatch { correct: 0, total: 2 },
        ];
        let p = smoothed_precisions(&matches, 5);
        assert!(approx(p[0], 0.6));
        assert!(approx(p[1], 0.5 / 4.0));
        assert!(approx(p[2], 0.25 / 3.0));
        assert!(approx(p[3], 0.125 / 2.0));
        assert!(approx(p[1] * 4.0, 2.0 * p[2] * 3.0));
    }

    #[test]
    fn empty_orders_count_as_precision_one() {
        let matches = [
            NgramMatch { correct: 1, total: 1 },
            NgramMatch { correct: 0, total: 0 },
        ];
        assert_eq!(smoothed_precisions(&matches, 1), vec![1.0, 1.0]);
    }

    #[test]
    fn brevity_penalty_applies_only_to_short_candidates() {
        assert_eq!(brevity_penalty(5, 5), 1.0);
        assert_eq!(brevity_penalty(9, 5), 1.0);
        assert!(approx(brevity_penalty(4, 8), (-1.0f64).exp()));
        assert_eq!(brevity_penalty(0, 3), 0.0);
        assert_eq!(brevity_penalty(0, 0), 1.0);
    }

    #[test]
    fn empty_candidate_scores_worst() {
        let c = corpus(&[&["a b c"]]);
        let bleu = Bleu::new(&c, BleuConfig::default(), "_OOV");
        let stats = bleu.suff_stats("", 0).unwrap();
        assert_eq!(bleu.score(&stats).unwrap(), bleu.worst_possible_score());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let c = corpus(&[&["a b c"]]);
        let bleu = Bleu::new(&c, BleuConfig::default(), "_OOV");
        let err = bleu.score(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::StatsLength {
                expected: 10,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn oov_marker_is_stripped_before_matching() {
        let c = corpus(&[&["a b c"]]);
        let bleu = Bleu::new(&c, BleuConfig::default(), "_OOV");
        let stats = bleu.suff_stats("a b_OOV c", 0).unwrap();
        assert_eq!(bleu.score(&stats).unwrap(), 1.0);
    }

    #[test]
    fn custom_weights_must_match_order() {
        assert!(BleuConfig::new(2, EffectiveLength::Closest)
            .with_weights(vec![1.0])
            .is_err());
        let config = BleuConfig::new(2, EffectiveLength::Closest)
            .with_weights(vec![1.0, 0.0])
            .unwrap();
        let stats = BleuStats {
            matches: vec![
                NgramMatch { correct: 1, total: 2 },
                NgramMatch { correct: 0, total: 1 },
            ],
            candidate_len: 2,
            reference_len: 2,
        };
        assert!(approx(config.score(&stats), 0.5));
    }
}
