//! Syllable counting, grade level, reading ease and the penalty policies
//! the readability-aware metrics layer on top of BLEU.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use super::StatsReader;

/// C*V+ runs.
static SYLLABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^aeiouy]*[aeiouy]+").expect("valid regex"));

static SILENT_E: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^aeiou]e$").expect("valid regex"));

const MIN_READING_EASE: f64 = 0.000001;

/// Heuristic syllable count of one token. Never less than one, so
/// punctuation is not free.
pub fn count_syllables(token: &str) -> u32 {
    if token == "-" {
        return 1;
    }
    if token.contains('-') {
        let count: u32 = token
            .split('-')
            .filter(|part| !part.is_empty())
            .map(count_syllables)
            .sum();
        return count.max(1);
    }

    let lower = token.to_lowercase();
    let mut count = SYLLABLE.find_iter(&lower).count() as i64;
    if SILENT_E.is_match(&lower) {
        count -= 1;
    }
    count.max(1) as u32
}

pub fn count_total_syllables<S: AsRef<str>>(tokens: &[S]) -> u32 {
    tokens.iter().map(|t| count_syllables(t.as_ref())).sum()
}

/// Tokens containing at least one ASCII letter.
pub fn count_words<S: AsRef<str>>(tokens: &[S]) -> u32 {
    tokens
        .iter()
        .filter(|t| t.as_ref().chars().any(|c| c.is_ascii_alphabetic()))
        .count() as u32
}

/// Flesch-Kincaid style grade level, floored at zero. Zero tokens grade 0.
pub fn grade_level(tokens: u32, syllables: u32) -> f64 {
    if tokens == 0 {
        return 0.0;
    }
    let tokens = tokens as f64;
    (0.39 * tokens + 11.8 * syllables as f64 / tokens - 15.19).max(0.0)
}

/// Flesch reading ease, floored at a small positive value.
pub fn reading_ease(words: u32, syllables: u32) -> f64 {
    if words == 0 {
        return MIN_READING_EASE;
    }
    let words = words as f64;
    let ease = 206.835 - 1.015 * words - 84.6 * syllables as f64 / words;
    if ease <= 0.0 {
        MIN_READING_EASE
    } else {
        ease
    }
}

/// Token, word and syllable totals of one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LengthProfile {
    pub tokens: u32,
    pub words: u32,
    pub syllables: u32,
}

impl LengthProfile {
    pub fn of<S: AsRef<str>>(tokens: &[S]) -> LengthProfile {
        LengthProfile {
            tokens: tokens.len() as u32,
            words: count_words(tokens),
            syllables: count_total_syllables(tokens),
        }
    }

    pub fn grade_level(&self) -> f64 {
        grade_level(self.tokens, self.syllables)
    }

    pub fn reading_ease(&self) -> f64 {
        reading_ease(self.tokens, self.syllables)
    }

    pub(crate) fn write(&self, out: &mut Vec<u32>) {
        out.extend([self.tokens, self.words, self.syllables]);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>) -> LengthProfile {
        LengthProfile {
            tokens: reader.next(),
            words: reader.next(),
            syllables: reader.next(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyStyle {
    /// 0/1 cutoff.
    Hard,
    /// Exponential decay in the overshoot.
    Exponential,
}

impl FromStr for PenaltyStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hard" => Ok(PenaltyStyle::Hard),
            "exp" | "exponential" => Ok(PenaltyStyle::Exponential),
            _ => Err(format!("unknown penalty style {s}")),
        }
    }
}

impl PenaltyStyle {
    /// Multiplier in [0, 1] for a candidate that overshoots its limit by
    /// `excess`; no penalty while `excess < 0`.
    pub fn penalty(self, excess: f64) -> f64 {
        if excess < 0.0 {
            return 1.0;
        }
        match self {
            PenaltyStyle::Hard => 0.0,
            PenaltyStyle::Exponential => (-excess).exp(),
        }
    }
}

/// What a candidate's readability is compared against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Fixed(f64),
    Source,
}

impl Target {
    /// `value > 0` is a fixed target, `0` the default, `< 0` the source sentence.
    pub fn from_option(value: f64, default: f64) -> Target {
        if value > 0.0 {
            Target::Fixed(value)
        } else if value < 0.0 {
            Target::Source
        } else {
            Target::Fixed(default)
        }
    }

    pub fn resolve(self, source: f64) -> f64 {
        match self {
            Target::Fixed(t) => t,
            Target::Source => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllables_of_simple_words() {
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("free"), 1);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("banana"), 3);
        assert_eq!(count_syllables("Banana"), 3);
        assert_eq!(count_syllables(","), 1);
    }

    #[test]
    fn hyphenated_tokens_sum_their_parts() {
        assert_eq!(count_syllables("-"), 1);
        assert_eq!(
            count_syllables("well-known"),
            count_syllables("well") + count_syllables("known")
        );
        assert_eq!(count_syllables("state-of-the-art"), 4);
        assert_eq!(count_syllables("--"), 1);
    }

    #[test]
    fn counts_words_with_letters() {
        assert_eq!(count_words(&["the", ",", "42", "x1"]), 2);
        assert_eq!(count_total_syllables(&["the", "banana"]), 4);
    }

    #[test]
    fn length_profile_of_sentence() {
        let p = LengthProfile::of(&["the", "banana", "."]);
        assert_eq!(
            p,
            LengthProfile {
                tokens: 3,
                words: 2,
                syllables: 5
            }
        );
        assert_eq!(p.grade_level(), grade_level(3, 5));
    }

    #[test]
    fn grade_level_formula() {
        let gl = grade_level(20, 30);
        assert!((gl - (0.39 * 20.0 + 11.8 * 1.5 - 15.19)).abs() < 1e-9);
        assert_eq!(grade_level(3, 3), 0.0);
        assert_eq!(grade_level(0, 0), 0.0);
    }

    #[test]
    fn grade_level_grows_with_length_at_fixed_syllable_rate() {
        let mut prev = grade_level(2, 4);
        for tokens in 3..200 {
            let gl = grade_level(tokens, 2 * tokens);
            assert!(gl >= prev);
            prev = gl;
        }
    }

    #[test]
    fn reading_ease_is_positive() {
        assert!(reading_ease(10, 10) > 100.0);
        assert_eq!(reading_ease(100, 900), MIN_READING_EASE);
        assert_eq!(reading_ease(0, 0), MIN_READING_EASE);
    }

    #[test]
    fn penalty_styles() {
        assert_eq!(PenaltyStyle::Hard.penalty(-0.1), 1.0);
        assert_eq!(PenaltyStyle::Hard.penalty(0.0), 0.0);
        assert!((PenaltyStyle::Exponential.penalty(2.0) - (-2.0f64).exp()).abs() < 1e-12);
        assert_eq!("EXP".parse(), Ok(PenaltyStyle::Exponential));
        assert!("lin".parse::<PenaltyStyle>().is_err());
    }

    #[test]
    fn target_options() {
        assert_eq!(Target::from_option(0.0, 9.87), Target::Fixed(9.87));
        assert_eq!(Target::from_option(8.0, 9.87), Target::Fixed(8.0));
        assert_eq!(Target::from_option(-1.0, 9.87), Target::Source);
        assert_eq!(Target::Source.resolve(12.5), 12.5);
    }
}
