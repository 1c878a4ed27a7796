//! `SIMP_BLEU`: reference BLEU scaled down when the candidate reads harder
//! than its source (Flesch reading ease).

use std::rc::Rc;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::ngram::NgramIndex;
use crate::text::{candidate_tokens, char_length, normalize_spacing, whitespace_tokenizer};

use super::bleu::{brevity_penalty, BleuConfig, BleuStats};
use super::grade_level::SentenceProfiles;
use super::readability::{count_total_syllables, reading_ease, LengthProfile};
use super::{check_index, Direction, Metric, StatsReader};

/// Character lengths of each reference, and the token and syllable totals
/// of the reference with the fewest syllables per token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferenceLengths {
    pub(crate) char_lengths: Vec<usize>,
    pub(crate) simplest_tokens: u32,
    pub(crate) simplest_syllables: u32,
}

impl ReferenceLengths {
    pub(crate) fn of(references: &[String]) -> ReferenceLengths {
        let mut char_lengths = Vec::with_capacity(references.len());
        let mut simplest: Option<(f64, u32, u32)> = None;
        for reference in references {
            let tokens = whitespace_tokenizer(reference);
            char_lengths.push(char_length(&normalize_spacing(reference), tokens.len()));
            let syllables = count_total_syllables(&tokens);
            let rate = syllables as f64 / tokens.len().max(1) as f64;
            if simplest.map_or(true, |(best, _, _)| rate < best) {
                simplest = Some((rate, tokens.len() as u32, syllables));
            }
        }
        let (_, simplest_tokens, simplest_syllables) = simplest.unwrap_or_default();
        ReferenceLengths {
            char_lengths,
            simplest_tokens,
            simplest_syllables,
        }
    }

    pub(crate) fn build(corpus: &Corpus) -> Vec<ReferenceLengths> {
        corpus.iter().map(ReferenceLengths::of).collect()
    }
}

/// Flesch penalty: none once the candidate reads easier than the source.
pub fn ease_penalty(ratio: f64) -> f64 {
    if ratio > 1.0 {
        1.0
    } else {
        (10.0 * (ratio - 1.0)).exp()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplicityBleuStats {
    pub bleu: BleuStats,
    pub candidate_chars: u32,
    pub reference_chars: u32,
    pub source_chars: u32,
    pub candidate: LengthProfile,
    pub source: LengthProfile,
    /// Tokens and syllables of the simplest reference.
    pub reference_tokens: u32,
    pub reference_syllables: u32,
}

impl SimplicityBleuStats {
    pub fn len_for(max_order: usize) -> usize {
        BleuStats::len_for(max_order) + 11
    }

    pub fn write(&self, out: &mut Vec<u32>) {
        self.bleu.write(out);
        out.extend([self.candidate_chars, self.reference_chars, self.source_chars]);
        self.candidate.write(out);
        self.source.write(out);
        out.extend([self.reference_tokens, self.reference_syllables]);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>, max_order: usize) -> SimplicityBleuStats {
        SimplicityBleuStats {
            bleu: BleuStats::read(reader, max_order),
            candidate_chars: reader.next(),
            reference_chars: reader.next(),
            source_chars: reader.next(),
            candidate: LengthProfile::read(reader),
            source: LengthProfile::read(reader),
            reference_tokens: reader.next(),
            reference_syllables: reader.next(),
        }
    }

    pub fn ease_ratio(&self) -> f64 {
        self.candidate.reading_ease() / self.source.reading_ease()
    }
}

pub struct SimplicityBleu {
    config: BleuConfig,
    index: NgramIndex,
    references: Vec<ReferenceLengths>,
    profiles: SentenceProfiles,
    oov_marker: String,
}

impl SimplicityBleu {
    pub const NAME: &'static str = "SIMP_BLEU";

    pub fn new(
        corpus: Rc<Corpus>,
        sources: Vec<String>,
        config: BleuConfig,
        oov_marker: &str,
    ) -> SimplicityBleu {
        let index = NgramIndex::build(corpus.iter(), config.max_order);
        let references = ReferenceLengths::build(&corpus);
        SimplicityBleu {
            config,
            index,
            references,
            profiles: SentenceProfiles::new(corpus, sources),
            oov_marker: oov_marker.to_string(),
        }
    }

    pub fn stats(&self, candidate: &str, sentence: usize) -> Result<SimplicityBleuStats> {
        check_index(sentence, self.num_sentences())?;
        let words = candidate_tokens(candidate, &self.oov_marker);
        let bleu = self.config.stats(&words, &self.index, sentence)?;
        let (_, source) = *self.profiles.get(sentence)?;

        let candidate_chars = char_length(&words.join(" "), words.len());
        let refs = &self.references[sentence];
        let reference_chars = self
            .config
            .effective_length
            .select(&refs.char_lengths, candidate_chars);
        let source_text = normalize_spacing(self.profiles.source(sentence));

        Ok(SimplicityBleuStats {
            bleu,
            candidate_chars: candidate_chars as u32,
            reference_chars: reference_chars as u32,
            source_chars: char_length(&source_text, source.tokens as usize) as u32,
            candidate: LengthProfile::of(&words),
            source,
            reference_tokens: refs.simplest_tokens,
            reference_syllables: refs.simplest_syllables,
        })
    }

    pub fn score_stats(&self, stats: &SimplicityBleuStats) -> f64 {
        self.clamp(ease_penalty(stats.ease_ratio()) * self.config.score(&stats.bleu))
    }

    fn decode(&self, stats: &[u32]) -> Result<SimplicityBleuStats> {
        let mut reader = StatsReader::new(Self::NAME, stats, self.suff_stats_count())?;
        Ok(SimplicityBleuStats::read(&mut reader, self.config.max_order))
    }
}

impl Metric for SimplicityBleu {
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
        SimplicityBleuStats::len_for(self.config.max_order)
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
        let ratio = s.ease_ratio();
        Ok(vec![
            ("SIMP_BLEU".to_string(), self.score_stats(&s)),
            ("BLEU".to_string(), self.config.score(&s.bleu)),
            (
                "BP".to_string(),
                brevity_penalty(s.bleu.candidate_len, s.bleu.reference_len),
            ),
            ("READ_PENALTY".to_string(), ease_penalty(ratio)),
            ("FK_RATIO".to_string(), ratio),
            ("CAND_EASE".to_string(), s.candidate.reading_ease()),
            ("SRC_EASE".to_string(), s.source.reading_ease()),
            (
                "REF_EASE".to_string(),
                reading_ease(s.reference_tokens, s.reference_syllables),
            ),
            ("CAND_CHARS".to_string(), s.candidate_chars as f64),
            ("REF_CHARS".to_string(), s.reference_chars as f64),
            ("SRC_CHARS".to_string(), s.source_chars as f64),
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

    fn metric(refs: &[&str]) -> SimplicityBleu {
        metric_with_source(refs, SOURCE)
    }

    fn metric_with_source(refs: &[&str], source: &str) -> SimplicityBleu {
        let corpus = Corpus::new(vec![refs.iter().map(|r| r.to_string()).collect()]).unwrap();
        SimplicityBleu::new(
            Rc::new(corpus),
            vec![source.to_string()],
            BleuConfig::new(4, EffectiveLength::Closest),
            "_OOV",
        )
    }

    #[test]
    fn simplest_reference_has_lowest_syllable_rate() {
        let lengths = ReferenceLengths::of(&[
            "international organisations".to_string(),
            "the big dog ran".to_string(),
        ]);
        assert_eq!(lengths.simplest_tokens, 4);
        assert_eq!(lengths.simplest_syllables, 4);
        assert_eq!(lengths.char_lengths, vec![26, 12]);
    }

    #[test]
    fn ease_penalty_is_continuous_at_one() {
        assert_eq!(ease_penalty(1.5), 1.0);
        assert_eq!(ease_penalty(1.0), 1.0);
        assert!((ease_penalty(0.9) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn stats_layout() {
        let m = metric(&["the group agreed to the plan"]);
        let stats = m.stats("the group  agreed", 0).unwrap();
        assert_eq!(stats.candidate_chars, 14);
        assert_eq!(stats.reference_chars, 23);
        assert_eq!(stats.source.tokens, 7);
        let flat = m.suff_stats("the group  agreed", 0).unwrap();
        assert_eq!(flat.len(), m.suff_stats_count());
        assert_eq!(flat.len(), 21);
    }

    #[test]
    fn reference_ease_comes_from_one_reference() {
        let m = metric(&["international organisations", "the big dog ran"]);
        let stats = m.suff_stats("international organisations", 0).unwrap();
        let rows = m.breakdown(&stats).unwrap();
        let ref_ease = rows.iter().find(|(name, _)| name == "REF_EASE").unwrap().1;
        assert_eq!(m.stats("international organisations", 0).unwrap().bleu.reference_len, 2);
        assert_eq!(ref_ease, reading_ease(4, 4));
    }

    #[test]
    fn easier_than_source_keeps_full_bleu() {
        let m = metric(&["the group agreed to the plan"]);
        let stats = m.stats("the group agreed to the plan", 0).unwrap();
        assert!(stats.ease_ratio() > 1.0);
        assert!((m.score_stats(&stats) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn harder_than_source_is_penalised() {
        let easy = "the cat sat on the mat";
        let m = metric_with_source(&[easy], easy);
        let stats = m.stats("the cat sat on the incomprehensibility", 0).unwrap();
        assert!(stats.ease_ratio() < 1.0);
        let bleu = m.config.score(&stats.bleu);
        assert!(m.score_stats(&stats) < bleu);
    }

    #[test]
    fn empty_candidate_scores_worst() {
        let m = metric(&["the group agreed"]);
        assert_eq!(m.score_candidate("", 0).unwrap(), 0.0);
    }
}
