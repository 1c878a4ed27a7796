//! Rescoring n-best groups with a metric, and the per-sentence score report.

use std::io::{BufRead, Write};

use log::{info, warn};

use crate::error::Result;
use crate::metric::{Metric, RankKey};
use crate::nbest::{NbestGroup, NbestGroups, NbestRecord, FIELD_SEPARATOR};

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub record: NbestRecord,
    pub score: f64,
}

impl RankedCandidate {
    /// Writes `index ||| candidate ||| features ||| score`.
    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}{}{}", self.record, FIELD_SEPARATOR, self.score)
    }
}

/// The emitted order of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub index: usize,
    pub candidates: Vec<RankedCandidate>,
    /// No candidate had a rankable value; all are kept in input order at 0.
    pub fallback: bool,
}

impl Ranking {
    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for candidate in &self.candidates {
            candidate.write(out)?;
        }
        Ok(())
    }
}

/// The value `record` ranks by, or `None` when it drops out of the ranking.
/// Failures that break the metric contract propagate; anything else is
/// logged and drops the candidate.
fn rank_value(metric: &dyn Metric, key: RankKey, record: &NbestRecord) -> Result<Option<f64>> {
    match metric.rank_value(key, &record.candidate, record.index) {
        Ok(value) => Ok(Some(value).filter(|&v| key.keeps(v))),
        Err(e) if e.is_contract_violation() => Err(e),
        Err(e) => {
            warn!("sentence {}: scoring \"{}\" failed: {}", record.index, record.candidate, e);
            Ok(None)
        }
    }
}

/// Keeps the candidates `key` admits, best first and stable on ties. A
/// group with none is returned whole, in input order, scored zero.
pub fn rank_group(metric: &dyn Metric, group: NbestGroup, key: RankKey) -> Result<Ranking> {
    let mut values = Vec::with_capacity(group.len());
    for record in &group.records {
        values.push(rank_value(metric, key, record)?);
    }

    if values.iter().all(Option::is_none) {
        let candidates = group
            .records
            .into_iter()
            .map(|record| RankedCandidate { record, score: 0.0 })
            .collect();
        return Ok(Ranking {
            index: group.index,
            candidates,
            fallback: true,
        });
    }

    let mut valid: Vec<RankedCandidate> = group
        .records
        .into_iter()
        .zip(values)
        .filter_map(|(record, value)| value.map(|score| RankedCandidate { record, score }))
        .collect();
    valid.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(Ranking {
        index: group.index,
        candidates: valid,
        fallback: false,
    })
}

/// Counts from one reranking run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RerankSummary {
    pub groups: usize,
    pub candidates: usize,
    pub emitted: usize,
    pub fallbacks: usize,
}

/// Reranks every group of the n-best list read from `reader` by `key`.
///
/// The whole list is read and ranked before anything is written, so a
/// malformed or out-of-order line leaves `writer` untouched.
pub fn rerank<R: BufRead, W: Write>(
    metric: &dyn Metric,
    key: RankKey,
    reader: R,
    writer: &mut W,
    progress_every: usize,
) -> Result<RerankSummary> {
    metric.supports(key)?;
    info!(
        "reranking with {} by {} over {} sentences",
        metric.name(),
        key,
        metric.num_sentences()
    );
    let groups = NbestGroups::new(reader).collect::<Result<Vec<_>>>()?;

    let mut summary = RerankSummary::default();
    let mut rankings = Vec::with_capacity(groups.len());
    for group in groups {
        summary.candidates += group.len();
        let ranking = rank_group(metric, group, key)?;
        summary.groups += 1;
        summary.emitted += ranking.candidates.len();
        if ranking.fallback {
            summary.fallbacks += 1;
        }
        if progress_every > 0 && summary.groups % progress_every == 0 {
            info!("processing sentence: {}", ranking.index);
        }
        rankings.push(ranking);
    }

    for ranking in &rankings {
        ranking.write(writer)?;
    }
    writer.flush()?;
    info!(
        "reranked {} groups, {} of {} candidates kept, {} groups without a rankable candidate",
        summary.groups, summary.emitted, summary.candidates, summary.fallbacks
    );
    Ok(summary)
}

/// Writes a tab-separated breakdown per candidate, one candidate per
/// sentence, followed by an `all` row over the summed statistics.
pub fn score_report<W: Write>(
    metric: &dyn Metric,
    candidates: &[String],
    writer: &mut W,
    progress_every: usize,
) -> Result<()> {
    let mut total = vec![0u32; metric.suff_stats_count()];
    let mut header = false;
    for (sentence, candidate) in candidates.iter().enumerate() {
        let stats = metric.suff_stats(candidate, sentence)?;
        let rows = metric.breakdown(&stats)?;
        if !header {
            write_header(writer, &rows)?;
            header = true;
        }
        write_row(writer, &sentence.to_string(), &rows)?;
        for (sum, value) in total.iter_mut().zip(&stats) {
            *sum = sum.saturating_add(*value);
        }
        if progress_every > 0 && (sentence + 1) % progress_every == 0 {
            info!("processing sentence: {}", sentence + 1);
        }
    }

    let rows = metric.breakdown(&total)?;
    if !header {
        write_header(writer, &rows)?;
    }
    write_row(writer, "all", &rows)?;
    writer.flush()?;
    Ok(())
}

fn write_header<W: Write>(writer: &mut W, rows: &[(String, f64)]) -> std::io::Result<()> {
    write!(writer, "sentence")?;
    for (name, _) in rows {
        write!(writer, "\t{}", name)?;
    }
    writeln!(writer)
}

fn write_row<W: Write>(writer: &mut W, label: &str, rows: &[(String, f64)]) -> std::io::Result<()> {
    write!(writer, "{}", label)?;
    for (_, value) in rows {
        write!(writer, "\t{:.4}", value)?;
    }
    writeln!(writer)
}
