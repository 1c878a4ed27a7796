//! `SYN_SIMP`: reference BLEU gated on the candidate's syntactic simplicity
//! reaching a target, or its source's simplicity.

use std::rc::Rc;

use crate::cache::SentenceCache;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::ngram::NgramIndex;
use crate::syntax::features::{NUM_SUB_SCORES, SIMPLICITY_WEIGHTS, SUB_SCORE_NAMES};
use crate::syntax::{SyntacticAnalyzer, SyntacticFeatures};
use crate::text::candidate_tokens;

use super::bleu::{BleuConfig, BleuStats};
use super::readability::{PenaltyStyle, Target};
use super::{check_index, Direction, Metric, RankKey, StatsReader};

pub const DEFAULT_TARGET_SIMPLICITY: f64 = 7.02566633571197;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntacticSimplicityConfig {
    pub bleu: BleuConfig,
    pub target: Target,
    pub penalty: PenaltyStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntacticSimplicityStats {
    pub bleu: BleuStats,
    pub candidate: SyntacticFeatures,
    pub source: SyntacticFeatures,
}

impl SyntacticSimplicityStats {
    pub fn len_for(max_order: usize) -> usize {
        BleuStats::len_for(max_order) + 2 * SyntacticFeatures::LEN
    }

    pub fn write(&self, out: &mut Vec<u32>) {
        self.bleu.write(out);
        self.candidate.write(out);
        self.source.write(out);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>, max_order: usize) -> Self {
        SyntacticSimplicityStats {
            bleu: BleuStats::read(reader, max_order),
            candidate: SyntacticFeatures::read(reader),
            source: SyntacticFeatures::read(reader),
        }
    }

    /// Summed weights of the sub-scores on which the candidate is simpler
    /// than its source.
    pub fn relative_score(&self) -> f64 {
        let cand = self.candidate.sub_scores();
        let src = self.source.sub_scores();
        (0..NUM_SUB_SCORES)
            .filter(|&i| cand[i] > src[i])
            .map(|i| SIMPLICITY_WEIGHTS[i])
            .sum()
    }
}

pub struct SyntacticSimplicity {
    config: SyntacticSimplicityConfig,
    index: NgramIndex,
    analyzer: SyntacticAnalyzer,
    sources: Vec<String>,
    source_features: SentenceCache<SyntacticFeatures>,
    oov_marker: String,
}

impl SyntacticSimplicity {
    pub const NAME: &'static str = "SYN_SIMP";

    pub fn new(
        corpus: &Rc<Corpus>,
        sources: Vec<String>,
        config: SyntacticSimplicityConfig,
        analyzer: SyntacticAnalyzer,
        oov_marker: &str,
    ) -> SyntacticSimplicity {
        let index = NgramIndex::build(corpus.iter(), config.bleu.max_order);
        SyntacticSimplicity {
            config,
            index,
            analyzer,
            sources,
            source_features: SentenceCache::new(corpus.len()),
            oov_marker: oov_marker.to_string(),
        }
    }

    fn source_features(&self, sentence: usize) -> Result<SyntacticFeatures> {
        let source = self.sources.get(sentence).map_or("", String::as_str);
        self.source_features
            .get_or_try_init(sentence, || self.analyzer.features(source))
            .copied()
    }

    pub fn stats(&self, candidate: &str, sentence: usize) -> Result<SyntacticSimplicityStats> {
        check_index(sentence, self.num_sentences())?;
        let words = candidate_tokens(candidate, &self.oov_marker);
        Ok(SyntacticSimplicityStats {
            bleu: self.config.bleu.stats(&words, &self.index, sentence)?,
            candidate: self.analyzer.features(candidate)?,
            source: self.source_features(sentence)?,
        })
    }

    fn penalty(&self, stats: &SyntacticSimplicityStats) -> f64 {
        let cand = stats.candidate.weighted_score();
        let limit = self.config.target.resolve(stats.source.weighted_score());
        self.config.penalty.penalty(limit - cand)
    }

    pub fn score_stats(&self, stats: &SyntacticSimplicityStats) -> f64 {
        self.clamp(self.config.bleu.score(&stats.bleu) * self.penalty(stats))
    }

    pub fn relative_score(&self, stats: &[u32]) -> Result<f64> {
        Ok(self.decode(stats)?.relative_score())
    }

    fn decode(&self, stats: &[u32]) -> Result<SyntacticSimplicityStats> {
        let mut reader = StatsReader::new(Self::NAME, stats, self.suff_stats_count())?;
        Ok(SyntacticSimplicityStats::read(
            &mut reader,
            self.config.bleu.max_order,
        ))
    }
}

impl Metric for SyntacticSimplicity {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn num_sentences(&self) -> usize {
        self.source_features.len()
    }

    fn suff_stats_count(&self) -> usize {
        SyntacticSimplicityStats::len_for(self.config.bleu.max_order)
    }

    fn suff_stats(&self, candidate: &str, sentence: usize) -> Result<Vec<u32>> {
        let mut out = Vec::with_capacity(self.suff_stats_count());
        self.stats(candidate, sentence)?.write(&mut out);
        Ok(out)
    }

    fn score(&self, stats: &[u32]) -> Result<f64> {
        Ok(self.score_stats(&self.decode(stats)?))
    }

    fn breakdown(&self, stats: &[u32]) -> Result<Vec<(String, f64)>> {
        let s = self.decode(stats)?;
        let mut out = vec![
            ("SYN_SIMP".to_string(), self.score_stats(&s)),
            ("BLEU".to_string(), self.config.bleu.score(&s.bleu)),
            ("PENALTY".to_string(), self.penalty(&s)),
            ("CAND_SIMPLICITY".to_string(), s.candidate.weighted_score()),
            ("SRC_SIMPLICITY".to_string(), s.source.weighted_score()),
            ("RELATIVE".to_string(), s.relative_score()),
        ];
        out.extend(
            SUB_SCORE_NAMES
                .iter()
                .zip(s.candidate.sub_scores())
                .map(|(name, v)| (name.to_string(), v)),
        );
        Ok(out)
    }

    fn rank_keys(&self) -> &'static [RankKey] {
        &[RankKey::Score, RankKey::Relative, RankKey::Parse]
    }

    fn rank_value(&self, key: RankKey, candidate: &str, sentence: usize) -> Result<f64> {
        match key {
            RankKey::Score => self.score_candidate(candidate, sentence),
            RankKey::Relative => self.relative_score(&self.suff_stats(candidate, sentence)?),
            RankKey::Parse => {
                check_index(sentence, self.num_sentences())?;
                self.analyzer.parse_score(candidate)
            }
        }
    }

    fn best_possible_score(&self) -> f64 {
        SIMPLICITY_WEIGHTS.iter().sum()
    }

    fn worst_possible_score(&self) -> f64 {
        0.0
    }
}
