//! Basic-vocabulary and word-frequency tables read by the syntactic metrics.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use log::info;
use rust_stemmers::Algorithm;

use crate::corpus::read_lines;
use crate::error::Result;

/// Rank given to words missing from the frequency table.
pub const LOWEST_FREQUENCY: u32 = 75000;

pub trait Stemmer {
    fn stem(&self, word: &str) -> String;
}

/// Leaves words untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, word: &str) -> String {
        word.to_string()
    }
}

/// Snowball stemming, English by default.
pub struct SnowballStemmer(rust_stemmers::Stemmer);

impl SnowballStemmer {
    pub fn english() -> SnowballStemmer {
        SnowballStemmer(rust_stemmers::Stemmer::create(Algorithm::English))
    }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, word: &str) -> String {
        self.0.stem(word).into_owned()
    }
}

/// Stemmer choice as named in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemmerKind {
    English,
    Identity,
}

impl StemmerKind {
    pub fn build(&self) -> Box<dyn Stemmer> {
        match self {
            StemmerKind::English => Box::new(SnowballStemmer::english()),
            StemmerKind::Identity => Box::new(IdentityStemmer),
        }
    }
}

impl FromStr for StemmerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<StemmerKind, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(StemmerKind::English),
            "none" => Ok(StemmerKind::Identity),
            other => Err(format!("unknown stemmer {other:?}, expected english or none")),
        }
    }
}

/// Read-only after construction.
pub struct Lexicon {
    basic_words: HashSet<String>,
    frequency_ranks: HashMap<String, u32>,
    stemmer: Box<dyn Stemmer>,
}

impl Lexicon {
    /// `frequent_words` is ordered most frequent first; a word's rank is its
    /// position, and repeated words keep their first rank.
    pub fn new<I, J>(basic_words: I, frequent_words: J, stemmer: Box<dyn Stemmer>) -> Lexicon
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        let basic_words = basic_words
            .into_iter()
            .map(|w| stemmer.stem(w.as_ref().trim()))
            .collect();
        let mut frequency_ranks = HashMap::new();
        for (rank, word) in frequent_words.into_iter().enumerate() {
            frequency_ranks
                .entry(word.as_ref().trim().to_string())
                .or_insert(rank as u32);
        }
        Lexicon {
            basic_words,
            frequency_ranks,
            stemmer,
        }
    }

    pub fn empty() -> Lexicon {
        Lexicon::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            Box::new(IdentityStemmer),
        )
    }

    /// Reads one word per line from each file. Basic words are stored
    /// stemmed; frequency lookups use the word as written.
    pub fn load(
        basic_words: &Path,
        word_frequencies: &Path,
        stemmer: Box<dyn Stemmer>,
    ) -> Result<Lexicon> {
        let lexicon = Lexicon::new(
            read_lines(basic_words)?,
            read_lines(word_frequencies)?,
            stemmer,
        );
        info!(
            "loaded {} basic words and {} word frequencies",
            lexicon.basic_words.len(),
            lexicon.frequency_ranks.len()
        );
        Ok(lexicon)
    }

    pub fn is_basic(&self, word: &str) -> bool {
        self.basic_words.contains(&self.stemmer.stem(word))
    }

    pub fn frequency_rank(&self, word: &str) -> u32 {
        self.frequency_ranks
            .get(word)
            .copied()
            .unwrap_or(LOWEST_FREQUENCY)
    }
}
