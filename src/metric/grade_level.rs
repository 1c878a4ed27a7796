//! `GRADE_LEVEL`: ratio of candidate to source grade level, divided by the
//! brevity penalty against the first reference. Lower is better.

use std::rc::Rc;

use crate::cache::SentenceCache;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::text::{candidate_tokens, whitespace_tokenizer};

use super::bleu::brevity_penalty;
use super::readability::{grade_level, LengthProfile};
use super::{check_index, Direction, Metric, StatsReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeLevelStats {
    pub candidate: LengthProfile,
    pub reference: LengthProfile,
    pub source: LengthProfile,
}

impl GradeLevelStats {
    pub const LEN: usize = 9;

    pub fn write(&self, out: &mut Vec<u32>) {
        self.candidate.write(out);
        self.reference.write(out);
        self.source.write(out);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>) -> GradeLevelStats {
        GradeLevelStats {
            candidate: LengthProfile::read(reader),
            reference: LengthProfile::read(reader),
            source: LengthProfile::read(reader),
        }
    }

    pub fn candidate_grade(&self) -> f64 {
        grade_level(self.candidate.words, self.candidate.syllables)
    }

    pub fn source_grade(&self) -> f64 {
        grade_level(self.source.words, self.source.syllables)
    }

    pub fn reference_grade(&self) -> f64 {
        grade_level(self.reference.words, self.reference.syllables)
    }
}

/// Profiles of the first reference and the source, computed once per sentence.
#[derive(Debug)]
pub(crate) struct SentenceProfiles {
    corpus: Rc<Corpus>,
    sources: Vec<String>,
    cache: SentenceCache<(LengthProfile, LengthProfile)>,
}

impl SentenceProfiles {
    pub(crate) fn new(corpus: Rc<Corpus>, sources: Vec<String>) -> SentenceProfiles {
        let cache = SentenceCache::new(corpus.len());
        SentenceProfiles {
            corpus,
            sources,
            cache,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn source(&self, sentence: usize) -> &str {
        self.sources.get(sentence).map_or("", String::as_str)
    }

    /// (first reference, source)
    pub(crate) fn get(&self, sentence: usize) -> Result<&(LengthProfile, LengthProfile)> {
        self.cache.get_or_try_init(sentence, || {
            let reference = self.corpus.references(sentence)?;
            let first = reference.first().map_or("", String::as_str);
            Ok((
                LengthProfile::of(&whitespace_tokenizer(first)),
                LengthProfile::of(&whitespace_tokenizer(self.source(sentence))),
            ))
        })
    }
}

pub struct GradeLevel {
    profiles: SentenceProfiles,
    oov_marker: String,
}

impl GradeLevel {
    pub const NAME: &'static str = "GRADE_LEVEL";

    pub fn new(corpus: Rc<Corpus>, sources: Vec<String>, oov_marker: &str) -> GradeLevel {
        GradeLevel {
            profiles: SentenceProfiles::new(corpus, sources),
            oov_marker: oov_marker.to_string(),
        }
    }

    pub fn stats(&self, candidate: &str, sentence: usize) -> Result<GradeLevelStats> {
        check_index(sentence, self.num_sentences())?;
        let words = candidate_tokens(candidate, &self.oov_marker);
        let (reference, source) = *self.profiles.get(sentence)?;
        Ok(GradeLevelStats {
            candidate: LengthProfile::of(&words),
            reference,
            source,
        })
    }

    pub fn score_stats(&self, stats: &GradeLevelStats) -> f64 {
        if stats.candidate.tokens == 0 {
            return self.worst_possible_score();
        }
        let cand = stats.candidate_grade();
        let src = stats.source_grade();
        let ratio = if src > 0.0 {
            cand / src
        } else if cand > 0.0 {
            self.worst_possible_score()
        } else {
            1.0
        };
        let bp = brevity_penalty(stats.candidate.tokens, stats.reference.tokens);
        self.clamp(ratio / bp)
    }

    fn decode(&self, stats: &[u32]) -> Result<GradeLevelStats> {
        let mut reader = StatsReader::new(Self::NAME, stats, GradeLevelStats::LEN)?;
        Ok(GradeLevelStats::read(&mut reader))
    }
}

impl Metric for GradeLevel {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn num_sentences(&self) -> usize {
        self.profiles.len()
    }

    fn suff_stats_count(&self) -> usize {
        GradeLevelStats::LEN
    }

    fn suff_stats(&self, candidate: &str, sentence: usize) -> Result<Vec<u32>> {
        let mut out = Vec::with_capacity(GradeLevelStats::LEN);
        self.stats(candidate, sentence)?.write(&mut out);
        Ok(out)
    }

    fn score(&self, stats: &[u32]) -> Result<f64> {
        Ok(self.score_stats(&self.decode(stats)?))
    }

    fn breakdown(&self, stats: &[u32]) -> Result<Vec<(String, f64)>> {
        let s = self.decode(stats)?;
        Ok(vec![
            ("GRADE_LEVEL_RATIO".to_string(), self.score_stats(&s)),
            ("REF_GL".to_string(), s.reference_grade()),
            ("CAND_GL".to_string(), s.candidate_grade()),
            ("SRC_GL".to_string(), s.source_grade()),
        ])
    }

    fn best_possible_score(&self) -> f64 {
        0.0
    }

    fn worst_possible_score(&self) -> f64 {
        50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "the committee unanimously ratified the comprehensive international agreement yesterday afternoon";

    fn metric(reference: &str) -> GradeLevel {
        let corpus = Rc::new(Corpus::single(vec![reference.to_string()]));
        GradeLevel::new(corpus, vec![SOURCE.to_string()], "_OOV")
    }

    #[test]
    fn stats_layout() {
        let m = metric("the group agreed to the deal");
        let stats = m.suff_stats("the group agreed , yes", 0).unwrap();
        assert_eq!(stats.len(), m.suff_stats_count());
        assert_eq!(&stats[0..2], &[5, 4]);
        assert_eq!(stats[3], 6);
        assert_eq!(stats[6], 10);
    }

    #[test]
    fn simpler_candidate_scores_lower() {
        let m = metric("the group agreed to the deal");
        let simple = m
            .score_candidate("the group said yes to the deal on monday", 0)
            .unwrap();
        let hard = m.score_candidate(SOURCE, 0).unwrap();
        assert!(simple < hard);
        assert!((hard - 1.0).abs() < 1e-9);
        assert_eq!(m.direction(), Direction::Minimize);
    }

    #[test]
    fn empty_candidate_scores_worst() {
        let m = metric("the group agreed to the deal");
        assert_eq!(m.score_candidate("", 0).unwrap(), m.worst_possible_score());
    }

    #[test]
    fn source_profile_is_cached() {
        let m = metric("a b");
        assert!(!m.profiles.cache.is_populated(0));
        m.suff_stats("x", 0).unwrap();
        assert!(m.profiles.cache.is_populated(0));
    }
}
