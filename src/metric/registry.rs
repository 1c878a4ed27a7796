//! Metric lookup by name and construction from an ordered option vector.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use log::{info, warn};
use once_cell::unsync::OnceCell;

use crate::config::Settings;
use crate::corpus::{load_sources, Corpus};
use crate::error::{Error, Result};
use crate::lexicon::Lexicon;
use crate::syntax::{ParseCache, Parser, SyntacticAnalyzer};

use super::bleu::{Bleu, EffectiveLength};
use super::grade_level::GradeLevel;
use super::grade_level_bleu::{
    GradeLevelBleu, GradeLevelBleuConfig, DEFAULT_ALPHA, DEFAULT_TARGET_GRADE,
};
use super::readability::Target;
use super::readability_bleu::ReadabilityBleu;
use super::simplicity_bleu::SimplicityBleu;
use super::syntactic_readability::SyntacticReadability;
use super::syntactic_simplicity::{
    SyntacticSimplicity, SyntacticSimplicityConfig, DEFAULT_TARGET_SIMPLICITY,
};
use super::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Bleu,
    GradeLevel,
    GradeLevelBleu,
    SimplicityBleu,
    ReadabilityBleu,
    SyntacticSimplicity,
    SyntacticReadability,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Bleu,
        MetricKind::GradeLevel,
        MetricKind::GradeLevelBleu,
        MetricKind::SimplicityBleu,
        MetricKind::ReadabilityBleu,
        MetricKind::SyntacticSimplicity,
        MetricKind::SyntacticReadability,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Bleu => Bleu::NAME,
            MetricKind::GradeLevel => GradeLevel::NAME,
            MetricKind::GradeLevelBleu => GradeLevelBleu::NAME,
            MetricKind::SimplicityBleu => SimplicityBleu::NAME,
            MetricKind::ReadabilityBleu => ReadabilityBleu::NAME,
            MetricKind::SyntacticSimplicity => SyntacticSimplicity::NAME,
            MetricKind::SyntacticReadability => SyntacticReadability::NAME,
        }
    }

    pub fn option_count(self) -> usize {
        match self {
            MetricKind::Bleu => 2,
            MetricKind::GradeLevel => 1,
            MetricKind::GradeLevelBleu => 4,
            MetricKind::SimplicityBleu => 3,
            MetricKind::ReadabilityBleu => 4,
            MetricKind::SyntacticSimplicity => 5,
            MetricKind::SyntacticReadability => 1,
        }
    }

    pub fn from_name(name: &str) -> Result<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| Error::UnknownMetric(name.to_string()))
    }
}

impl FromStr for MetricKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<MetricKind> {
        MetricKind::from_name(s)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a metric is built from: the references, the settings, and
/// the lexicon and parser, which are loaded on first use.
pub struct MetricContext {
    corpus: Rc<Corpus>,
    settings: Settings,
    lexicon: OnceCell<Rc<Lexicon>>,
    parser: OnceCell<Rc<dyn Parser>>,
}

impl MetricContext {
    pub fn new(corpus: Corpus, settings: Settings) -> MetricContext {
        MetricContext {
            corpus: Rc::new(corpus),
            settings,
            lexicon: OnceCell::new(),
            parser: OnceCell::new(),
        }
    }

    pub fn with_lexicon(self, lexicon: Lexicon) -> MetricContext {
        let _ = self.lexicon.set(Rc::new(lexicon));
        self
    }

    pub fn with_parser(self, parser: Rc<dyn Parser>) -> MetricContext {
        let _ = self.parser.set(parser);
        self
    }

    pub fn corpus(&self) -> &Rc<Corpus> {
        &self.corpus
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn lexicon(&self) -> Result<Rc<Lexicon>> {
        self.lexicon
            .get_or_try_init(|| {
                let s = &self.settings;
                match (&s.basic_words, &s.word_frequencies) {
                    (Some(basic), Some(freq)) => {
                        Ok(Rc::new(Lexicon::load(basic, freq, s.stemmer()?.build())?))
                    }
                    _ => {
                        warn!("no basic word or frequency list configured, using an empty lexicon");
                        Ok(Rc::new(Lexicon::empty()))
                    }
                }
            })
            .cloned()
    }

    fn parser(&self) -> Result<Rc<dyn Parser>> {
        self.parser
            .get_or_try_init(|| {
                let cache = ParseCache::open(&self.settings.parse_cache)?;
                Ok(Rc::new(cache) as Rc<dyn Parser>)
            })
            .cloned()
    }

    fn analyzer(&self) -> Result<SyntacticAnalyzer> {
        Ok(SyntacticAnalyzer::new(
            self.parser()?,
            self.lexicon()?,
            &self.settings.oov_marker,
        ))
    }

    fn sources(&self, path: &str) -> Result<Vec<String>> {
        load_sources(path, self.corpus.len())
    }

    pub fn build_by_name(&self, name: &str, options: &[String]) -> Result<Box<dyn Metric>> {
        self.build(MetricKind::from_name(name)?, options)
    }

    pub fn build(&self, kind: MetricKind, options: &[String]) -> Result<Box<dyn Metric>> {
        let name = kind.name();
        if options.len() != kind.option_count() {
            return Err(Error::OptionArity {
                metric: name,
                expected: kind.option_count(),
                found: options.len(),
            });
        }
        let oov = self.settings.oov_marker.as_str();
        let corpus = Rc::clone(&self.corpus);

        let metric: Box<dyn Metric> = match kind {
            MetricKind::Bleu => {
                let bleu = self.settings.bleu_config(
                    parse_max_order(name, &options[0])?,
                    parse_option(name, "effective length", &options[1])?,
                )?;
                Box::new(Bleu::new(&corpus, bleu, oov))
            }
            MetricKind::GradeLevel => {
                Box::new(GradeLevel::new(corpus, self.sources(&options[0])?, oov))
            }
            MetricKind::GradeLevelBleu => {
                let target: f64 = parse_option(name, "target grade", &options[0])?;
                let alpha: f64 = parse_option(name, "alpha", &options[1])?;
                if alpha > 1.0 {
                    return Err(invalid(name, format!("alpha {alpha} is above 1")));
                }
                let config = GradeLevelBleuConfig {
                    bleu: self
                        .settings
                        .bleu_config(self.settings.max_order, EffectiveLength::Shortest)?,
                    target: Target::from_option(target, DEFAULT_TARGET_GRADE),
                    alpha: if alpha > 0.0 { alpha } else { DEFAULT_ALPHA },
                    penalty: parse_option(name, "penalty", &options[3])?,
                };
                let sources = self.sources(&options[2])?;
                Box::new(GradeLevelBleu::new(corpus, sources, config, oov))
            }
            MetricKind::SimplicityBleu => {
                let bleu = self.settings.bleu_config(
                    parse_max_order(name, &options[0])?,
                    parse_option(name, "effective length", &options[1])?,
                )?;
                let sources = self.sources(&options[2])?;
                Box::new(SimplicityBleu::new(corpus, sources, bleu, oov))
            }
            MetricKind::ReadabilityBleu => {
                let bleu = self.settings.bleu_config(
                    parse_max_order(name, &options[0])?,
                    parse_option(name, "effective length", &options[1])?,
                )?;
                let sources = self.sources(&options[2])?;
                let target: f64 = parse_option(name, "target grade", &options[3])?;
                let target = (target > 0.0).then_some(target);
                Box::new(ReadabilityBleu::new(corpus, sources, bleu, target, oov))
            }
            MetricKind::SyntacticSimplicity => {
                let target: f64 = parse_option(name, "target simplicity", &options[2])?;
                let config = SyntacticSimplicityConfig {
                    bleu: self.settings.bleu_config(
                        parse_max_order(name, &options[0])?,
                        parse_option(name, "effective length", &options[1])?,
                    )?,
                    target: Target::from_option(target, DEFAULT_TARGET_SIMPLICITY),
                    penalty: parse_option(name, "penalty", &options[3])?,
                };
                let sources = self.sources(&options[4])?;
                let analyzer = self.analyzer()?;
                Box::new(SyntacticSimplicity::new(
                    &corpus, sources, config, analyzer, oov,
                ))
            }
            MetricKind::SyntacticReadability => {
                let sources = self.sources(&options[0])?;
                let analyzer = self.analyzer()?;
                Box::new(SyntacticReadability::new(corpus, sources, analyzer, oov))
            }
        };
        info!(
            "initialized {} for {} sentences, {} statistics per candidate",
            metric.name(),
            metric.num_sentences(),
            metric.suff_stats_count()
        );
        Ok(metric)
    }
}

fn invalid(metric: &'static str, reason: String) -> Error {
    Error::InvalidOption { metric, reason }
}

fn parse_option<T>(metric: &'static str, what: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| invalid(metric, format!("{what} {value:?}: {e}")))
}

fn parse_max_order(metric: &'static str, value: &str) -> Result<usize> {
    let order: usize = parse_option(metric, "max order", value)?;
    match order {
        0 => Err(invalid(metric, "max order must be positive".to_string())),
        n => Ok(n),
    }
}
