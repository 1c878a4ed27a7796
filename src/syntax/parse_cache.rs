//! Parser seam and the on-disk parse cache.
//!
//! The cache file holds one `sentence \t tree \t score` line per parse and
//! is only ever appended to.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::Tree;
use crate::error::{Error, Result};
use crate::text::normalize_spacing;

pub const DEFAULT_PARSE_CACHE: &str = "parsed_nbest_list";

/// A constituency parser backend.
pub trait Parser {
    fn parse(&self, sentence: &str) -> Result<Tree>;

    /// Parse plus the backend's model score, when it has one.
    fn parse_scored(&self, sentence: &str) -> Result<(Tree, f64)> {
        Ok((self.parse(sentence)?, 0.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CachedParse {
    tree: String,
    score: f64,
}

#[derive(Debug)]
pub struct ParseCache {
    path: Option<PathBuf>,
    entries: RefCell<HashMap<String, CachedParse>>,
    writer: RefCell<Option<BufWriter<File>>>,
}

impl ParseCache {
    /// A cache that is never persisted.
    pub fn in_memory() -> ParseCache {
        ParseCache {
            path: None,
            entries: RefCell::new(HashMap::new()),
            writer: RefCell::new(None),
        }
    }

    /// Loads every well-formed line of `path`, creating the file if needed,
    /// and keeps it open for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ParseCache> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut entries = HashMap::new();
        for (n, line) in BufReader::new(&file).lines().enumerate() {
            let line = line?;
            match parse_line(&line) {
                Some((sentence, parse)) => {
                    entries.insert(sentence, parse);
                }
                None => warn!("skipping malformed parse cache line {}", n + 1),
            }
        }
        info!(
            "loaded {} existing parses from {}",
            entries.len(),
            path.display()
        );

        Ok(ParseCache {
            path: Some(path.to_path_buf()),
            entries: RefCell::new(entries),
            writer: RefCell::new(Some(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, sentence: &str) -> bool {
        self.entries
            .borrow()
            .contains_key(&normalize_spacing(sentence))
    }

    /// The cached tree, if one is stored and still parses.
    pub fn get(&self, sentence: &str) -> Option<Tree> {
        let key = normalize_spacing(sentence);
        let entries = self.entries.borrow();
        let cached = entries.get(&key)?;
        match cached.tree.parse() {
            Ok(tree) => Some(tree),
            Err(e) => {
                warn!("ignoring cached parse of {key:?}: {e}");
                None
            }
        }
    }

    pub fn score(&self, sentence: &str) -> Option<f64> {
        self.entries
            .borrow()
            .get(&normalize_spacing(sentence))
            .map(|p| p.score)
    }

    pub fn insert(&self, sentence: &str, tree: &Tree, score: f64) -> Result<()> {
        let key = normalize_spacing(sentence);
        let parse = CachedParse {
            tree: tree.to_string(),
            score,
        };
        if let Some(writer) = self.writer.borrow_mut().as_mut() {
            writeln!(writer, "{}\t{}\t{}", key, parse.tree, parse.score)?;
            writer.flush()?;
        }
        self.entries.borrow_mut().insert(key, parse);
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<(String, CachedParse)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 3 {
        return None;
    }
    let score = fields[2].trim().parse().ok()?;
    Some((
        fields[0].to_string(),
        CachedParse {
            tree: fields[1].to_string(),
            score,
        },
    ))
}

/// A bare cache parses only what it has already seen.
impl Parser for ParseCache {
    fn parse(&self, sentence: &str) -> Result<Tree> {
        self.get(sentence)
            .ok_or_else(|| Error::Unparsed(normalize_spacing(sentence)))
    }

    fn parse_scored(&self, sentence: &str) -> Result<(Tree, f64)> {
        let tree = self.parse(sentence)?;
        Ok((tree, self.score(sentence).unwrap_or(0.0)))
    }
}

/// Serves parses from the cache and falls back to `backend`, recording
/// every new parse with its score.
///
/// This is where a live parser plugs in: wrap it here and hand the result
/// to [`SyntacticAnalyzer`](super::SyntacticAnalyzer). The command-line tool
/// ships no backend and reads a bare [`ParseCache`] instead.
pub struct CachedParser<P> {
    cache: ParseCache,
    backend: P,
}

impl<P: Parser> CachedParser<P> {
    pub fn new(cache: ParseCache, backend: P) -> CachedParser<P> {
        CachedParser { cache, backend }
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }
}

impl<P: Parser> Parser for CachedParser<P> {
    fn parse(&self, sentence: &str) -> Result<Tree> {
        Ok(self.parse_scored(sentence)?.0)
    }

    fn parse_scored(&self, sentence: &str) -> Result<(Tree, f64)> {
        if let Ok(hit) = self.cache.parse_scored(sentence) {
            return Ok(hit);
        }
        let sentence = normalize_spacing(sentence);
        let (tree, score) = self.backend.parse_scored(&sentence)?;
        self.cache.insert(&sentence, &tree, score)?;
        Ok((tree, score))
    }
}
