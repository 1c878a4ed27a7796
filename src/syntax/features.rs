//! Counts read off a parse, and the ten normalised simplicity sub-scores
//! built from them.

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Parser, Tree};
use crate::error::{Error, Result};
use crate::lexicon::{Lexicon, LOWEST_FREQUENCY};
use crate::metric::readability::{count_total_syllables, grade_level};
use crate::metric::StatsReader;
use crate::text::candidate_tokens;

pub const PHRASE_LABELS: &[&str] = &[
    "ADJP", "ADVP", "CONJP", "INTJ", "NP", "PP", "PRN", "QP", "RRC", "UCP", "VP", "WHADJP",
    "WHAVP", "WHNP", "WHPP",
];

pub const CLAUSE_LABELS: &[&str] = &["S", "SBAR", "SBARQ", "SINV", "SQ"];

pub const NUM_SUB_SCORES: usize = 10;

/// Fitted weights of the sub-scores, in `sub_scores` order.
pub const SIMPLICITY_WEIGHTS: [f64; NUM_SUB_SCORES] = [
    3.69502835452864,
    1.26044509901525,
    0.477196468625433,
    1.23174218570469,
    0.159968071686012,
    0.711246454431046,
    0.0386657528996089,
    1.93191587271441,
    0.447413473942941,
    1.23089145652181,
];

pub const SUB_SCORE_NAMES: [&str; NUM_SUB_SCORES] = [
    "HEIGHT_RATIO",
    "PHRASE_RATIO",
    "VP_NP_RATIO",
    "RIGHT_BRANCH",
    "BASIC_RATIO",
    "MEDIAN_FREQ",
    "TOK_SYLL_RATIO",
    "GRADE_LEVEL",
    "AP_NP_RATIO",
    "PP_NP_RATIO",
];

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z_]+$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyntacticFeatures {
    pub token_len: u32,
    pub syllables: u32,
    pub height: u32,
    /// Heights of every node, summed.
    pub total_height: u32,
    pub phrases: u32,
    /// Never below one.
    pub nps: u32,
    pub vps: u32,
    pub pps: u32,
    pub aps: u32,
    pub basic_words: u32,
    pub words: u32,
    pub clauses: u32,
    pub median_rank: u32,
    /// Depth of the rightmost word leaf.
    pub right_branch: u32,
}

impl SyntacticFeatures {
    pub const LEN: usize = 14;

    /// Features of a sentence with no tokens.
    pub fn empty() -> SyntacticFeatures {
        SyntacticFeatures {
            nps: 1,
            median_rank: LOWEST_FREQUENCY,
            ..Default::default()
        }
    }

    pub fn extract(tree: &Tree, tokens: &[&str], lexicon: &Lexicon) -> SyntacticFeatures {
        let mut total_height = 0;
        let mut phrases = 0;
        let mut labels: HashMap<&str, u32> = HashMap::new();
        for node in tree.subtrees() {
            total_height += node.height() as u32;
            if node.is_phrasal() {
                phrases += 1;
            }
            if !node.is_leaf() {
                *labels.entry(node.label()).or_insert(0) += 1;
            }
        }

        let (mut nps, mut vps, mut pps, mut aps, mut clauses) = (0, 0, 0, 0, 0);
        for (label, count) in labels {
            if CLAUSE_LABELS.contains(&label) {
                clauses += count;
            } else if PHRASE_LABELS.contains(&label) {
                match label {
                    "NP" => nps += count,
                    "VP" => vps += count,
                    "PP" => pps += count,
                    _ => {}
                }
                if label.starts_with('A') {
                    aps += count;
                }
            }
        }

        let leaves = tree.leaf_depths();
        let right_branch = leaves
            .iter()
            .rev()
            .find(|(w, _)| WORD.is_match(w))
            .map_or(0, |&(_, depth)| depth as u32);

        let mut ranks = Vec::new();
        let mut basic_words = 0;
        for (word, _) in leaves.iter().filter(|(w, _)| WORD.is_match(w)) {
            ranks.push(lexicon.frequency_rank(word));
            if lexicon.is_basic(word) {
                basic_words += 1;
            }
        }

        SyntacticFeatures {
            token_len: tokens.len() as u32,
            syllables: count_total_syllables(tokens),
            height: tree.height() as u32,
            total_height,
            phrases,
            nps: nps.max(1),
            vps,
            pps,
            aps,
            basic_words,
            words: ranks.len() as u32,
            clauses,
            median_rank: median_rank(ranks),
            right_branch,
        }
    }

    pub fn write(&self, out: &mut Vec<u32>) {
        out.extend([
            self.token_len,
            self.syllables,
            self.height,
            self.total_height,
            self.phrases,
            self.nps,
            self.vps,
            self.pps,
            self.aps,
            self.basic_words,
            self.words,
            self.clauses,
            self.median_rank,
            self.right_branch,
        ]);
    }

    pub(crate) fn read(reader: &mut StatsReader<'_>) -> SyntacticFeatures {
        SyntacticFeatures {
            token_len: reader.next(),
            syllables: reader.next(),
            height: reader.next(),
            total_height: reader.next(),
            phrases: reader.next(),
            nps: reader.next(),
            vps: reader.next(),
            pps: reader.next(),
            aps: reader.next(),
            basic_words: reader.next(),
            words: reader.next(),
            clauses: reader.next(),
            median_rank: reader.next(),
            right_branch: reader.next(),
        }
    }

    /// Ten sub-scores in [0, 1], higher meaning simpler.
    pub fn sub_scores(&self) -> [f64; NUM_SUB_SCORES] {
        let median_base = (1.0 - self.median_rank as f64 / 60000.0).max(0.0);
        let grade = grade_level(self.token_len, self.syllables).min(50.0);
        [
            ratio(self.height, self.total_height) * 5.0,
            ratio(self.phrases, self.token_len),
            ratio(self.vps, self.nps),
            ratio(4, self.right_branch),
            ratio(self.basic_words, self.words),
            median_base.powi(50),
            ratio(self.token_len, self.syllables),
            1.0 - grade / 50.0,
            ratio(self.aps, self.nps),
            ratio(self.pps, self.nps),
        ]
        .map(|s| s.clamp(0.0, 1.0))
    }

    pub fn weighted_score(&self) -> f64 {
        self.sub_scores()
            .iter()
            .zip(SIMPLICITY_WEIGHTS)
            .map(|(s, w)| s * w)
            .sum()
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Median of the ranks; an even count averages the middle two in integer
/// arithmetic. No ranks count as the lowest frequency.
pub fn median_rank(mut ranks: Vec<u32>) -> u32 {
    if ranks.is_empty() {
        return LOWEST_FREQUENCY;
    }
    ranks.sort_unstable();
    let n = ranks.len();
    if n % 2 == 1 {
        ranks[n / 2]
    } else {
        (ranks[n / 2 - 1] + ranks[n / 2]) / 2
    }
}

/// Parses sentences and extracts their features against a shared lexicon.
#[derive(Clone)]
pub struct SyntacticAnalyzer {
    parser: Rc<dyn Parser>,
    lexicon: Rc<Lexicon>,
    oov_marker: String,
}

impl SyntacticAnalyzer {
    pub fn new(parser: Rc<dyn Parser>, lexicon: Rc<Lexicon>, oov_marker: &str) -> Self {
        SyntacticAnalyzer {
            parser,
            lexicon,
            oov_marker: oov_marker.to_string(),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn features(&self, text: &str) -> Result<SyntacticFeatures> {
        let tokens = candidate_tokens(text, &self.oov_marker);
        if tokens.is_empty() {
            return Ok(SyntacticFeatures::empty());
        }
        let tree = self.parser.parse(&tokens.join(" "))?;
        Ok(SyntacticFeatures::extract(&tree, &tokens, &self.lexicon))
    }

    /// The parser's model score for `text`, keyed the same way as
    /// [`features`](Self::features). Text with no tokens has no parse.
    pub fn parse_score(&self, text: &str) -> Result<f64> {
        let tokens = candidate_tokens(text, &self.oov_marker);
        if tokens.is_empty() {
            return Err(Error::Unparsed(String::new()));
        }
        Ok(self.parser.parse_scored(&tokens.join(" "))?.1)
    }
}
