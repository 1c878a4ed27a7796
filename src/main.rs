use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{error, info};

use rerank_nbest::corpus::read_lines;
use rerank_nbest::metric::RankKey;
use rerank_nbest::{rerank, score_report, Corpus, Metric, MetricContext, Result, Settings};

/// Rerank n-best lists by an evaluation metric against references.
#[derive(Parser)]
#[command(name = "rerank-nbest", version)]
struct Cli {
    /// Consecutive reference lines per sentence.
    #[arg(long, global = true, default_value_t = 1)]
    refs_per_sentence: usize,

    /// TOML settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rescore an n-best list and order each sentence's candidates by score
    Rerank {
        references: PathBuf,
        /// `index ||| candidate ||| features` lines, or `-` for stdin.
        nbest: String,
        metric: String,
        /// Metric options, in the order the metric expects.
        #[arg(allow_hyphen_values = true)]
        options: Vec<String>,
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Order candidates by `score`, or by `relative` or `parse` for SYN_SIMP.
        #[arg(long, default_value = "score")]
        rank_by: String,
    },
    /// Print a per-sentence score breakdown for one candidate per sentence
    Score {
        references: PathBuf,
        candidates: PathBuf,
        metric: String,
        #[arg(allow_hyphen_values = true)]
        options: Vec<String>,
    },
}

fn build_metric(
    cli: &Cli,
    settings: &Settings,
    references: &Path,
    name: &str,
    options: &[String],
) -> Result<Box<dyn Metric>> {
    let corpus = Corpus::load(references, cli.refs_per_sentence)?;
    MetricContext::new(corpus, settings.clone()).build_by_name(name, options)
}

fn output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn input(path: &str) -> Result<Box<dyn BufRead>> {
    Ok(if path == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(path)?))
    })
}

fn run(cli: &Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    match &cli.command {
        Command::Rerank {
            references,
            nbest,
            metric,
            options,
            output: out,
            rank_by,
        } => {
            let key: RankKey = rank_by.parse()?;
            let metric = build_metric(cli, &settings, references, metric, options)?;
            metric.supports(key)?;
            let reader = input(nbest)?;
            let mut writer = output(out.as_deref())?;
            rerank(metric.as_ref(), key, reader, &mut writer, settings.progress_every)?;
        }
        Command::Score {
            references,
            candidates,
            metric,
            options,
        } => {
            let metric = build_metric(cli, &settings, references, metric, options)?;
            let candidates = read_lines(candidates)?;
            info!("scoring {} candidates", candidates.len());
            let mut writer = output(None)?;
            score_report(metric.as_ref(), &candidates, &mut writer, settings.progress_every)?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
