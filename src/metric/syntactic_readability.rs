//! `SYN_READ`: the weighted syntactic simplicity of the candidate alone,
//! carried alongside the grade-level statistics.

use std::rc::Rc;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::syntax::features::{SIMPLICITY_WEIGHTS, SUB_SCORE_NAMES};
use crate::syntax::{SyntacticAnalyzer, SyntacticFeatures};

use super::grade_level::{GradeLevel, GradeLevelStats};
use super::{check_index, Direction, Metric, StatsReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntacticReadabilityStats {
    pub grade: GradeLevelStats,
    pub features: SyntacticFeatures,
}

impl SyntacticReadabilityStats {
    pub const LEN: usize = GradeLevelStats::LEN + SyntacticFeatures::LEN;

    pub fn write(&self, out: &mut Vec<u32>) {
        self.grade.write(out);
        self.features.write(out);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>) -> Self {
        SyntacticReadabilityStats {
            grade: GradeLevelStats::read(reader),
            features: SyntacticFeatures::read(reader),
        }
    }
}

pub struct SyntacticReadability {
    grade: GradeLevel,
    analyzer: SyntacticAnalyzer,
}

impl SyntacticReadability {
    pub const NAME: &'static str = "SYN_READ";

    pub fn new(
        corpus: Rc<Corpus>,
        sources: Vec<String>,
        analyzer: SyntacticAnalyzer,
        oov_marker: &str,
    ) -> SyntacticReadability {
        SyntacticReadability {
            grade: GradeLevel::new(corpus, sources, oov_marker),
            analyzer,
        }
    }

    pub fn stats(&self, candidate: &str, sentence: usize) -> Result<SyntacticReadabilityStats> {
        check_index(sentence, self.num_sentences())?;
        Ok(SyntacticReadabilityStats {
            grade: self.grade.stats(candidate, sentence)?,
            features: self.analyzer.features(candidate)?,
        })
    }

    pub fn score_stats(&self, stats: &SyntacticReadabilityStats) -> f64 {
        self.clamp(stats.features.weighted_score())
    }

    fn decode(&self, stats: &[u32]) -> Result<SyntacticReadabilityStats> {
        let mut reader = StatsReader::new(Self::NAME, stats, SyntacticReadabilityStats::LEN)?;
        Ok(SyntacticReadabilityStats::read(&mut reader))
    }
}

impl Metric for SyntacticReadability {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn num_sentences(&self) -> usize {
        self.grade.num_sentences()
    }

    fn suff_stats_count(&self) -> usize {
        SyntacticReadabilityStats::LEN
    }

    fn suff_stats(&self, candidate: &str, sentence: usize) -> Result<Vec<u32>> {
        let mut out = Vec::with_capacity(SyntacticReadabilityStats::LEN);
        self.stats(candidate, sentence)?.write(&mut out);
        Ok(out)
    }

    fn score(&self, stats: &[u32]) -> Result<f64> {
        Ok(self.score_stats(&self.decode(stats)?))
    }

    fn breakdown(&self, stats: &[u32]) -> Result<Vec<(String, f64)>> {
        let s = self.decode(stats)?;
        let mut out = vec![
            ("SYN_READ".to_string(), self.score_stats(&s)),
            ("CAND_GL".to_string(), s.grade.candidate_grade()),
            ("SRC_GL".to_string(), s.grade.source_grade()),
        ];
        out.extend(
            SUB_SCORE_NAMES
                .iter()
                .zip(s.features.sub_scores())
                .map(|(name, v)| (name.to_string(), v)),
        );
        Ok(out)
    }

    fn best_possible_score(&self) -> f64 {
        SIMPLICITY_WEIGHTS.iter().sum()
    }

    fn worst_possible_score(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::syntax::{ParseCache, Tree};

    fn metric() -> SyntacticReadability {
        let cache = ParseCache::in_memory();
        let tree: Tree = "(ROOT (S (NP (PRP it)) (VP (VBD rained))))".parse().unwrap();
        cache.insert("it rained", &tree, 0.0).unwrap();
        let analyzer = SyntacticAnalyzer::new(Rc::new(cache), Rc::new(Lexicon::empty()), "_OOV");
        let corpus = Rc::new(Corpus::single(vec!["it rained".to_string()]));
        SyntacticReadability::new(corpus, vec!["it rained hard".to_string()], analyzer, "_OOV")
    }

    #[test]
    fn score_is_candidate_simplicity() {
        let m = metric();
        let stats = m.stats("it rained", 0).unwrap();
        assert_eq!(m.suff_stats("it rained", 0).unwrap().len(), 23);
        let score = m.score_stats(&stats);
        assert!((score - stats.features.weighted_score()).abs() < 1e-12);
        assert!(score > 0.0 && score <= m.best_possible_score());
    }

    #[test]
    fn breakdown_lists_sub_scores() {
        let m = metric();
        let stats = m.suff_stats("it rained", 0).unwrap();
        let rows = m.breakdown(&stats).unwrap();
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[3].0, "HEIGHT_RATIO");
    }
}
