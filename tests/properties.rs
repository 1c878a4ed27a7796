use std::io::{Cursor, Write};

use proptest::prelude::*;
use tempfile::NamedTempFile;

use rerank_nbest::metric::{Direction, RankKey};
use rerank_nbest::{
    rank_group, Corpus, Error, Metric, MetricContext, NbestGroup, NbestGroups, NbestRecord,
    Result, Settings,
};

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-d]{1,4}(_OOV)?", 0..8).prop_map(|words| words.join(" "))
}

fn nonempty_sentence() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-d]{1,4}", 1..8).prop_map(|words| words.join(" "))
}

fn context(references: &[String]) -> MetricContext {
    MetricContext::new(Corpus::single(references.to_vec()), Settings::default())
}

fn source_file(sources: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in sources {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn opts(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Scores a candidate by the number it spells.
struct Lookup;

impl Metric for Lookup {
    fn name(&self) -> &'static str {
        "LOOKUP"
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn num_sentences(&self) -> usize {
        1
    }

    fn suff_stats_count(&self) -> usize {
        1
    }

    fn suff_stats(&self, candidate: &str, _sentence: usize) -> Result<Vec<u32>> {
        Ok(vec![candidate.parse().unwrap_or(0)])
    }

    fn score(&self, stats: &[u32]) -> Result<f64> {
        match stats {
            [value] => Ok(*value as f64),
            _ => Err(Error::StatsLength {
                metric: "LOOKUP",
                expected: 1,
                found: stats.len(),
            }),
        }
    }

    fn breakdown(&self, stats: &[u32]) -> Result<Vec<(String, f64)>> {
        Ok(vec![("LOOKUP".to_string(), self.score(stats)?)])
    }

    fn best_possible_score(&self) -> f64 {
        f64::MAX
    }

    fn worst_possible_score(&self) -> f64 {
        0.0
    }
}

proptest! {
    #[test]
    fn stats_have_the_advertised_length(
        reference in nonempty_sentence(),
        source in nonempty_sentence(),
        candidate in sentence(),
    ) {
        let ctx = context(&[reference]);
        let src = source_file(&[source]);
        let path = src.path().to_str().unwrap();
        let configs = [
            ("BLEU", opts(&["4", "closest"])),
            ("BLEU", opts(&["2", "shortest"])),
            ("GRADE_LEVEL", opts(&[path])),
            ("GL_BLEU", opts(&["0", "0.5", path, "exp"])),
            ("SIMP_BLEU", opts(&["3", "closest", path])),
            ("READ_BLEU", opts(&["4", "shortest", path, "8"])),
        ];
        for (name, options) in configs {
            let metric = ctx.build_by_name(name, &options).unwrap();
            let stats = metric.suff_stats(&candidate, 0).unwrap();
            prop_assert_eq!(stats.len(), metric.suff_stats_count());
            let score = metric.score(&stats).unwrap();
            prop_assert!(!score.is_nan());
            let (lo, hi) = match metric.direction() {
                Direction::Maximize => (metric.worst_possible_score(), metric.best_possible_score()),
                Direction::Minimize => (metric.best_possible_score(), metric.worst_possible_score()),
            };
            prop_assert!(score >= lo && score <= hi, "{} scored {} outside [{}, {}]", name, score, lo, hi);
        }
    }

    #[test]
    fn identical_candidate_scores_one(reference in nonempty_sentence()) {
        let ctx = context(&[reference.clone()]);
        let metric = ctx.build_by_name("BLEU", &opts(&["4", "closest"])).unwrap();
        prop_assert_eq!(metric.score_candidate(&reference, 0).unwrap(), 1.0);
    }

    #[test]
    fn groups_follow_index_runs(sizes in prop::collection::vec(1usize..5, 1..6)) {
        let mut input = String::new();
        for (index, size) in sizes.iter().enumerate() {
            for i in 0..*size {
                input.push_str(&format!("{index} ||| c{i} ||| f\n"));
            }
        }
        let found: Vec<usize> = NbestGroups::new(Cursor::new(input))
            .map(|g| g.unwrap().len())
            .collect();
        prop_assert_eq!(found, sizes);
    }

    #[test]
    fn ranking_is_a_stable_descending_sort(scores in prop::collection::vec(0u32..4, 1..10)) {
        let group = NbestGroup {
            index: 0,
            records: scores
                .iter()
                .enumerate()
                .map(|(i, s)| NbestRecord::new(0, &s.to_string(), &i.to_string()))
                .collect(),
        };
        let ranking = rank_group(&Lookup, group, RankKey::Score).unwrap();
        let emitted: Vec<(usize, f64)> = ranking
            .candidates
            .iter()
            .map(|c| (c.record.features.parse().unwrap(), c.score))
            .collect();

        let mut expected: Vec<(usize, f64)> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| (i, *s as f64))
            .filter(|(_, s)| *s > 0.0)
            .collect();
        if expected.is_empty() {
            prop_assert!(ranking.fallback);
            expected = (0..scores.len()).map(|i| (i, 0.0)).collect();
        } else {
            prop_assert!(!ranking.fallback);
            expected.sort_by(|a, b| b.1.total_cmp(&a.1));
        }
        prop_assert_eq!(emitted, expected);
    }
}
