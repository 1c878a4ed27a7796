//! N-best list records and grouping by sentence index.

use std::fmt;
use std::io::{BufRead, Lines};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

pub const FIELD_SEPARATOR: &str = " ||| ";

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\|\|\s*").expect("valid regex"));

/// One `index ||| candidate ||| features` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NbestRecord {
    pub index: usize,
    pub candidate: String,
    /// Everything after the candidate, kept verbatim.
    pub features: String,
}

impl NbestRecord {
    pub fn new(index: usize, candidate: &str, features: &str) -> NbestRecord {
        NbestRecord {
            index,
            candidate: candidate.to_string(),
            features: features.to_string(),
        }
    }

    /// Parses a record; `line_no` is 1-based and only used for errors.
    pub fn parse(line: &str, line_no: usize) -> Result<NbestRecord> {
        let fields: Vec<&str> = SEPARATOR.split(line.trim()).collect();
        if fields.len() < 3 {
            return Err(Error::MalformedRecord {
                line: line_no,
                reason: format!("expected 3 fields, found {}", fields.len()),
            });
        }
        let index = fields[0].parse().map_err(|_| Error::MalformedRecord {
            line: line_no,
            reason: format!("bad sentence index \"{}\"", fields[0]),
        })?;
        Ok(NbestRecord {
            index,
            candidate: fields[1].to_string(),
            features: fields[2..].join(FIELD_SEPARATOR),
        })
    }
}

impl fmt::Display for NbestRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.index, FIELD_SEPARATOR, self.candidate, FIELD_SEPARATOR, self.features
        )
    }
}

/// All contiguous records sharing one sentence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NbestGroup {
    pub index: usize,
    pub records: Vec<NbestRecord>,
}

impl NbestGroup {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads records from `reader` and yields one group per run of equal
/// indices. Blank lines are skipped. Each new index must be exactly one
/// above the previous; a lower one is `IndexOrder`, a higher one `IndexGap`.
pub struct NbestGroups<R> {
    lines: Lines<R>,
    line_no: usize,
    block: Vec<NbestRecord>,
    failed: bool,
}

impl<R: BufRead> NbestGroups<R> {
    pub fn new(reader: R) -> NbestGroups<R> {
        NbestGroups {
            lines: reader.lines(),
            line_no: 0,
            block: Vec::new(),
            failed: false,
        }
    }

    /// Lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn flush(block: &mut Vec<NbestRecord>, next: Option<NbestRecord>) -> Option<NbestGroup> {
        let records = match next {
            Some(record) => std::mem::replace(block, vec![record]),
            None => std::mem::take(block),
        };
        let index = records.first()?.index;
        Some(NbestGroup { index, records })
    }

    fn advance(&mut self) -> Result<Option<NbestGroup>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let record = NbestRecord::parse(&line, self.line_no)?;
            match self.block.first().map(|r| r.index) {
                None => self.block.push(record),
                Some(current) if current == record.index => self.block.push(record),
                Some(current) if current + 1 == record.index => {
                    return Ok(Self::flush(&mut self.block, Some(record)));
                }
                Some(current) if current < record.index => {
                    return Err(Error::IndexGap {
                        line: self.line_no,
                        previous: current,
                        found: record.index,
                    })
                }
                Some(current) => {
                    return Err(Error::IndexOrder {
                        line: self.line_no,
                        previous: current,
                        found: record.index,
                    })
                }
            }
        }
        Ok(Self::flush(&mut self.block, None))
    }
}

impl<R: BufRead> Iterator for NbestGroups<R> {
    type Item = Result<NbestGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(group) => group.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
