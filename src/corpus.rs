//! Reference and source sentence loading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::error::{Error, Result};

/// Reference sentences, `refs_per_sentence` per sentence index.
#[derive(Debug, Clone)]
pub struct Corpus {
    references: Vec<Vec<String>>,
}

impl Corpus {
    pub fn new(references: Vec<Vec<String>>) -> Result<Corpus> {
        if let Some(first) = references.first() {
            let refs_per_sentence = first.len();
            if refs_per_sentence == 0 || references.iter().any(|r| r.len() != refs_per_sentence) {
                return Err(Error::ReferenceCount {
                    lines: references.iter().map(Vec::len).sum(),
                    refs_per_sentence,
                });
            }
        }
        Ok(Corpus { references })
    }

    /// One reference per sentence.
    pub fn single(references: Vec<String>) -> Corpus {
        Corpus {
            references: references.into_iter().map(|r| vec![r]).collect(),
        }
    }

    /// Groups consecutive lines of `lines` into `refs_per_sentence` references each.
    pub fn from_lines(lines: Vec<String>, refs_per_sentence: usize) -> Result<Corpus> {
        if refs_per_sentence == 0 || lines.len() % refs_per_sentence != 0 {
            return Err(Error::ReferenceCount {
                lines: lines.len(),
                refs_per_sentence,
            });
        }
        let references = lines
            .chunks(refs_per_sentence)
            .map(|chunk| chunk.to_vec())
            .collect();
        Ok(Corpus { references })
    }

    pub fn load<P: AsRef<Path>>(path: P, refs_per_sentence: usize) -> Result<Corpus> {
        let lines = read_lines(path.as_ref())?;
        let corpus = Corpus::from_lines(lines, refs_per_sentence)?;
        info!(
            "loaded {} sentences ({} references each) from {}",
            corpus.len(),
            refs_per_sentence,
            path.as_ref().display()
        );
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn refs_per_sentence(&self) -> usize {
        self.references.first().map_or(0, Vec::len)
    }

    pub fn references(&self, sentence: usize) -> Result<&[String]> {
        self.references
            .get(sentence)
            .map(Vec::as_slice)
            .ok_or(Error::SentenceIndex {
                index: sentence,
                sentences: self.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.references.iter().map(Vec::as_slice)
    }
}

/// Reads a UTF-8 file into trimmed lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?.trim().to_string());
    }
    Ok(lines)
}

/// Loads the first `num_sentences` lines of a source file aligned with the references.
pub fn load_sources<P: AsRef<Path>>(path: P, num_sentences: usize) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut lines = read_lines(path)?;
    if lines.len() < num_sentences {
        return Err(Error::MissingSource {
            path: path.display().to_string(),
            expected: num_sentences,
            found: lines.len(),
        });
    }
    lines.truncate(num_sentences);
    info!("loaded {} sources from {}", lines.len(), path.display());
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn groups_consecutive_reference_lines() {
        let lines = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let corpus = Corpus::from_lines(lines, 2).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.refs_per_sentence(), 2);
        assert_eq!(corpus.references(1).unwrap(), &["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn rejects_ragged_reference_file() {
        let lines = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(matches!(
            Corpus::from_lines(lines, 2),
            Err(Error::ReferenceCount { lines: 3, .. })
        ));
    }

    #[test]
    fn out_of_range_sentence() {
        let corpus = Corpus::single(vec!["a".into()]);
        assert!(matches!(
            corpus.references(1),
            Err(Error::SentenceIndex { index: 1, sentences: 1 })
        ));
    }

    #[test]
    fn short_source_file_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, " one ").unwrap();
        assert!(matches!(
            load_sources(f.path(), 2),
            Err(Error::MissingSource { expected: 2, found: 1, .. })
        ));
        assert_eq!(load_sources(f.path(), 1).unwrap(), vec!["one".to_string()]);
    }
}
