//! `READ_BLEU`: reference BLEU gated on the candidate's grade level falling
//! below its source's (and optionally a target grade).

use std::rc::Rc;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::ngram::NgramIndex;
use crate::text::candidate_tokens;

use super::bleu::{BleuConfig, BleuStats};
use super::grade_level::SentenceProfiles;
use super::readability::{grade_level, LengthProfile};
use super::simplicity_bleu::ReferenceLengths;
use super::{check_index, Direction, Metric, StatsReader};

/// Grade-level gate. Without a target only a strictly simpler candidate
/// passes; with one, candidates between target and source decay
/// exponentially.
pub fn grade_penalty(source_gl: f64, candidate_gl: f64, target: Option<f64>) -> f64 {
    match target {
        None if source_gl > candidate_gl => 1.0,
        None => 0.0,
        Some(_) if candidate_gl > source_gl => 0.0,
        Some(t) if candidate_gl <= t => 1.0,
        Some(t) => (t - candidate_gl).exp(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadabilityBleuStats {
    pub bleu: BleuStats,
    pub candidate: LengthProfile,
    pub source: LengthProfile,
    /// Tokens and syllables of the simplest reference.
    pub reference_tokens: u32,
    pub reference_syllables: u32,
}

impl ReadabilityBleuStats {
    pub fn len_for(max_order: usize) -> usize {
        BleuStats::len_for(max_order) + 8
    }

    pub fn write(&self, out: &mut Vec<u32>) {
        self.bleu.write(out);
        self.candidate.write(out);
        self.source.write(out);
        out.extend([self.reference_tokens, self.reference_syllables]);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>, max_order: usize) -> ReadabilityBleuStats {
        ReadabilityBleuStats {
            bleu: BleuStats::read(reader, max_order),
            candidate: LengthProfile::read(reader),
            source: LengthProfile::read(reader),
            reference_tokens: reader.next(),
            reference_syllables: reader.next(),
        }
    }
}

pub struct ReadabilityBleu {
    config: BleuConfig,
    target: Option<f64>,
    index: NgramIndex,
    references: Vec<ReferenceLengths>,
    profiles: SentenceProfiles,
    oov_marker: String,
}

impl ReadabilityBleu {
    pub const NAME: &'static str = "READ_BLEU";

    pub fn new(
        corpus: Rc<Corpus>,
        sources: Vec<String>,
        config: BleuConfig,
        target: Option<f64>,
        oov_marker: &str,
    ) -> ReadabilityBleu {
        let index = NgramIndex::build(corpus.iter(), config.max_order);
        let references = ReferenceLengths::build(&corpus);
        ReadabilityBleu {
            config,
            target,
            index,
            references,
            profiles: SentenceProfiles::new(corpus, sources),
            oov_marker: oov_marker.to_string(),
        }
    }

    pub fn stats(&self, candidate: &str, sentence: usize) -> Result<ReadabilityBleuStats> {
        check_index(sentence, self.num_sentences())?;
        let words = candidate_tokens(candidate, &self.oov_marker);
        let bleu = self.config.stats(&words, &self.index, sentence)?;
        let (_, source) = *self.profiles.get(sentence)?;
        let simplest = &self.references[sentence];
        Ok(ReadabilityBleuStats {
            bleu,
            candidate: LengthProfile::of(&words),
            source,
            reference_tokens: simplest.simplest_tokens,
            reference_syllables: simplest.simplest_syllables,
        })
    }

    fn penalty(&self, stats: &ReadabilityBleuStats) -> f64 {
        grade_penalty(
            stats.source.grade_level(),
            stats.candidate.grade_level(),
            self.target,
        )
    }

    pub fn score_stats(&self, stats: &ReadabilityBleuStats) -> f64 {
        self.clamp(self.penalty(stats) * self.config.score(&stats.bleu))
    }

    fn decode(&self, stats: &[u32]) -> Result<ReadabilityBleuStats> {
        let mut reader = StatsReader::new(Self::NAME, stats, self.suff_stats_count())?;
        Ok(ReadabilityBleuStats::read(&mut reader, self.config.max_order))
    }
}

impl Metric for ReadabilityBleu {
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
        ReadabilityBleuStats::len_for(self.config.max_order)
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
        Ok(vec![
            ("READ_BLEU".to_string(), self.score_stats(&s)),
            ("BLEU".to_string(), self.config.score(&s.bleu)),
            ("GL_PENALTY".to_string(), self.penalty(&s)),
            ("CAND_GL".to_string(), s.candidate.grade_level()),
            ("SRC_GL".to_string(), s.source.grade_level()),
            (
                "REF_GL".to_string(),
                grade_level(s.reference_tokens, s.reference_syllables),
            ),
        ])
    }

    fn best_possible_score(&self) -> f64 {
        1.0
    }

    fn worst_possible_score(&self) -> f64 {
        0.0
    }
}
