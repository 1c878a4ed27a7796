//! Per-sentence n-gram clipping tables.

use std::collections::HashMap;

use crate::text::whitespace_tokenizer;

/// N-gram (space-joined tokens, orders 1..=max_order) to occurrence count.
pub type NgramCounts = HashMap<String, u32>;

/// Counts every n-gram of order 1..=max_order in `words`.
pub fn ngram_counts(words: &[&str], max_order: usize) -> NgramCounts {
    let mut counts = NgramCounts::new();
    for n in 1..=max_order.min(words.len()) {
        for window in words.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}

/// Counts of order `n` only, as (n-gram, count) pairs.
pub fn ngram_counts_of_order(words: &[&str], n: usize) -> NgramCounts {
    let mut counts = NgramCounts::new();
    if n == 0 || n > words.len() {
        return counts;
    }
    for window in words.windows(n) {
        *counts.entry(window.join(" ")).or_insert(0) += 1;
    }
    counts
}

/// For each sentence, the maximum count of every n-gram over its references,
/// plus the token length of each reference.
#[derive(Debug, Clone)]
pub struct NgramIndex {
    max_order: usize,
    max_counts: Vec<NgramCounts>,
    ref_lengths: Vec<Vec<usize>>,
}

impl NgramIndex {
    pub fn build<'a, I>(sentences: I, max_order: usize) -> NgramIndex
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut max_counts = Vec::new();
        let mut ref_lengths = Vec::new();

        for references in sentences {
            let mut counts = NgramCounts::new();
            let mut lengths = Vec::with_capacity(references.len());
            for reference in references {
                let words = whitespace_tokenizer(reference);
                lengths.push(words.len());
                for (gram, next) in ngram_counts(&words, max_order) {
                    let slot = counts.entry(gram).or_insert(0);
                    *slot = (*slot).max(next);
                }
            }
            max_counts.push(counts);
            ref_lengths.push(lengths);
        }

        NgramIndex {
            max_order,
            max_counts,
            ref_lengths,
        }
    }

    /// Index over single sentences, e.g. the sources of a corpus.
    pub fn build_single(sentences: &[String], max_order: usize) -> NgramIndex {
        NgramIndex::build(sentences.iter().map(std::slice::from_ref), max_order)
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    pub fn len(&self) -> usize {
        self.max_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_counts.is_empty()
    }

    pub fn max_counts(&self, sentence: usize) -> Option<&NgramCounts> {
        self.max_counts.get(sentence)
    }

    pub fn ref_lengths(&self, sentence: usize) -> Option<&[usize]> {
        self.ref_lengths.get(sentence).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn counts_all_orders() {
        let counts = ngram_counts(&["a", "b", "a", "b"], 3);
        assert_eq!(counts["a"], 2);
        assert_eq!(counts["a b"], 2);
        assert_eq!(counts["b a"], 1);
        assert_eq!(counts["a b a"], 1);
        assert!(!counts.contains_key("a b a b"));
    }

    #[test]
    fn keeps_per_gram_maximum_across_references() {
        let sentences = refs(&[&["the the cat", "the cat the the"], &["x"]]);
        let index = NgramIndex::build(sentences.iter().map(Vec::as_slice), 2);
        let counts = index.max_counts(0).unwrap();
        assert_eq!(counts["the"], 3);
        assert_eq!(counts["cat"], 1);
        assert_eq!(counts["the the"], 1);
        assert_eq!(index.ref_lengths(0).unwrap(), &[3, 4]);
        assert_eq!(index.ref_lengths(1).unwrap(), &[1]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn empty_reference_yields_empty_map() {
        let sentences = refs(&[&[""]]);
        let index = NgramIndex::build(sentences.iter().map(Vec::as_slice), 4);
        assert!(index.max_counts(0).unwrap().is_empty());
        assert_eq!(index.ref_lengths(0).unwrap(), &[0]);
    }
}
