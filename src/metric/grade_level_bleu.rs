//! `GL_BLEU`: BLEU against the references, pushed away from the source by a
//! source-BLEU term and gated by a grade-level penalty.

use std::rc::Rc;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::ngram::NgramIndex;
use crate::text::candidate_tokens;

use super::bleu::{read_matches, write_matches, BleuConfig, BleuStats, NgramMatch};
use super::grade_level::SentenceProfiles;
use super::readability::{LengthProfile, PenaltyStyle, Target};
use super::{check_index, Direction, Metric, StatsReader};

pub const DEFAULT_TARGET_GRADE: f64 = 9.87;
pub const DEFAULT_ALPHA: f64 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct GradeLevelBleuConfig {
    pub bleu: BleuConfig,
    pub target: Target,
    /// Weight of reference BLEU against source BLEU.
    pub alpha: f64,
    pub penalty: PenaltyStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeLevelBleuStats {
    pub reference: BleuStats,
    pub source_matches: Vec<NgramMatch>,
    pub candidate: LengthProfile,
    pub first_reference: LengthProfile,
    pub source: LengthProfile,
}

impl GradeLevelBleuStats {
    pub fn len_for(max_order: usize) -> usize {
        BleuStats::len_for(max_order) + 2 * max_order + 9
    }

    pub fn write(&self, out: &mut Vec<u32>) {
        self.reference.write(out);
        write_matches(&self.source_matches, out);
        self.candidate.write(out);
        self.first_reference.write(out);
        self.source.write(out);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>, max_order: usize) -> GradeLevelBleuStats {
        GradeLevelBleuStats {
            reference: BleuStats::read(reader, max_order),
            source_matches: read_matches(reader, max_order),
            candidate: LengthProfile::read(reader),
            first_reference: LengthProfile::read(reader),
            source: LengthProfile::read(reader),
        }
    }

    /// The candidate's n-gram statistics against its source sentence.
    pub fn source_bleu_stats(&self) -> BleuStats {
        BleuStats {
            matches: self.source_matches.clone(),
            candidate_len: self.candidate.tokens,
            reference_len: self.source.tokens,
        }
    }
}

pub struct GradeLevelBleu {
    config: GradeLevelBleuConfig,
    ref_index: NgramIndex,
    src_index: NgramIndex,
    profiles: SentenceProfiles,
    oov_marker: String,
}

struct Parts {
    bleu_ref: f64,
    bleu_src: f64,
    combined: f64,
    candidate_gl: f64,
    source_gl: f64,
    penalty: f64,
}

impl GradeLevelBleu {
    pub const NAME: &'static str = "GL_BLEU";

    pub fn new(
        corpus: Rc<Corpus>,
        sources: Vec<String>,
        config: GradeLevelBleuConfig,
        oov_marker: &str,
    ) -> GradeLevelBleu {
        let max_order = config.bleu.max_order;
        let ref_index = NgramIndex::build(corpus.iter(), max_order);
        let src_index = NgramIndex::build_single(&sources, max_order);
        GradeLevelBleu {
            config,
            ref_index,
            src_index,
            profiles: SentenceProfiles::new(corpus, sources),
            oov_marker: oov_marker.to_string(),
        }
    }

    pub fn stats(&self, candidate: &str, sentence: usize) -> Result<GradeLevelBleuStats> {
        check_index(sentence, self.num_sentences())?;
        let words = candidate_tokens(candidate, &self.oov_marker);
        let bleu = &self.config.bleu;
        let reference = bleu.stats(&words, &self.ref_index, sentence)?;
        let source_matches = match self.src_index.max_counts(sentence) {
            Some(counts) => bleu.matches(&words, counts),
            None => bleu.matches(&words, &Default::default()),
        };
        let (first_reference, source) = *self.profiles.get(sentence)?;
        Ok(GradeLevelBleuStats {
            reference,
            source_matches,
            candidate: LengthProfile::of(&words),
            first_reference,
            source,
        })
    }

    fn parts(&self, stats: &GradeLevelBleuStats) -> Parts {
        let bleu_ref = self.config.bleu.score(&stats.reference);
        let bleu_src = self.config.bleu.score(&stats.source_bleu_stats());
        let alpha = self.config.alpha;
        let combined = alpha * bleu_ref - (1.0 - alpha) * bleu_src;

        let candidate_gl = stats.candidate.grade_level();
        let source_gl = stats.source.grade_level();
        let limit = self.config.target.resolve(source_gl);
        let penalty = self.config.penalty.penalty(candidate_gl - limit);

        Parts {
            bleu_ref,
            bleu_src,
            combined,
            candidate_gl,
            source_gl,
            penalty,
        }
    }

    pub fn score_stats(&self, stats: &GradeLevelBleuStats) -> f64 {
        let parts = self.parts(stats);
        self.clamp(parts.penalty * parts.combined)
    }

    fn decode(&self, stats: &[u32]) -> Result<GradeLevelBleuStats> {
        let mut reader = StatsReader::new(Self::NAME, stats, self.suff_stats_count())?;
        Ok(GradeLevelBleuStats::read(
            &mut reader,
            self.config.bleu.max_order,
        ))
    }
}

impl Metric for GradeLevelBleu {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn num_sentences(&self) -> usize {
        self.profiles.len()
    }

    fn suff_stats_count(&self) -> usize {
        GradeLevelBleuStats::len_for(self.config.bleu.max_order)
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
        let p = self.parts(&s);
        Ok(vec![
            ("GLB".to_string(), self.score_stats(&s)),
            ("REF_GL".to_string(), s.first_reference.grade_level()),
            ("CAND_GL".to_string(), p.candidate_gl),
            ("SRC_GL".to_string(), p.source_gl),
            ("Penalty".to_string(), p.penalty),
            ("BLEU(pp,ref)".to_string(), p.bleu_ref),
            ("BLEU(pp,src)".to_string(), p.bleu_src),
            ("BLEU+".to_string(), p.combined),
            ("TOK_LEN".to_string(), s.candidate.tokens as f64),
            ("SYLL_LEN".to_string(), s.candidate.syllables as f64),
        ])
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
    use crate::metric::bleu::EffectiveLength;

    const SOURCE: &str = "the committee unanimously ratified the comprehensive agreement";
    const REFERENCE: &str = "the group agreed to the plan";

    fn metric(target: Target, alpha: f64, penalty: PenaltyStyle) -> GradeLevelBleu {
        let corpus = Rc::new(Corpus::single(vec![REFERENCE.to_string()]));
        let config = GradeLevelBleuConfig {
            bleu: BleuConfig::new(4, EffectiveLength::Shortest),
            target,
            alpha,
            penalty,
        };
        GradeLevelBleu::new(corpus, vec![SOURCE.to_string()], config, "_OOV")
    }

    #[test]
    fn stats_length_is_fixed() {
        let m = metric(Target::Fixed(9.87), 0.9, PenaltyStyle::Hard);
        assert_eq!(m.suff_stats_count(), 4 * 4 + 2 + 9);
        for cand in ["", "the", REFERENCE, SOURCE] {
            assert_eq!(m.suff_stats(cand, 0).unwrap().len(), m.suff_stats_count());
        }
    }

    #[test]
    fn reference_copy_beats_source_copy() {
        let m = metric(Target::Fixed(9.87), 0.9, PenaltyStyle::Hard);
        let reference = m.score_candidate(REFERENCE, 0).unwrap();
        let source = m.score_candidate(SOURCE, 0).unwrap();
        assert!(reference > source);
        assert!(reference <= m.best_possible_score());
    }

    #[test]
    fn combines_reference_and_source_bleu() {
        let m = metric(Target::Fixed(50.0), 0.9, PenaltyStyle::Hard);
        let stats = m.stats(REFERENCE, 0).unwrap();
        let bleu_ref = m.config.bleu.score(&stats.reference);
        let bleu_src = m.config.bleu.score(&stats.source_bleu_stats());
        let expected = 0.9 * bleu_ref - 0.1 * bleu_src;
        assert!((m.score_stats(&stats) - expected.max(0.0)).abs() < 1e-12);
        assert!((bleu_ref - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hard_penalty_zeroes_candidates_above_target() {
        let hard = metric(Target::Fixed(1.0), 1.0, PenaltyStyle::Hard);
        let soft = metric(Target::Fixed(1.0), 1.0, PenaltyStyle::Exponential);
        let stats = hard.stats(SOURCE, 0).unwrap();
        assert!(stats.candidate.grade_level() > 1.0);
        assert_eq!(hard.score_stats(&stats), 0.0);
        assert!(soft.score_stats(&stats) > 0.0);
    }

    #[test]
    fn source_target_compares_against_source_grade() {
        let m = metric(Target::Source, 1.0, PenaltyStyle::Hard);
        // the source itself is not strictly simpler than the source
        assert_eq!(m.score_candidate(SOURCE, 0).unwrap(), 0.0);
        assert!(m.score_candidate(REFERENCE, 0).unwrap() > 0.0);
    }
}
