mod logging;

use areahist_common::{Config, HistError};
use areahist_core::{
    aggregate, aggregate_par, demo_samples, export_csv, export_json, histogram_json,
    read_samples, render_table, resolve_inputs, write_csv, BinEdges, Histogram, MAX_BIN_COUNT,
};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::{info, warn};
use std::path::{Path, PathBuf};

const DEMO_EDGES: [f64; 12] = [0.0, 0.02, 0.05, 0.1, 0.2, 0.4, 0.6, 0.8, 0.9, 0.95, 0.98, 1.0];

fn parse_bin_count(s: &str) -> Result<usize, String> { // reject 0 and oversized counts at CLI parse time
    let v: usize = s.parse().map_err(|_| format!("not an integer: {s}"))?;
    match v {
        0 => Err("bin count must be at least 1".into()),
        v if v > MAX_BIN_COUNT => Err(format!("bin count must be at most {MAX_BIN_COUNT}")),
        v => Ok(v),
    }
}

/// Falls back to defaults on a broken config file, keeping the error to report once logging is up.
fn settle_config(loaded: Result<Config, HistError>) -> (Config, Option<HistError>) {
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
    Csv,
}

impl Format {
    fn from_config(s: &str) -> Self {
        Format::from_str(s, true).unwrap_or(Format::Table)
    }

    fn extension(self) -> &'static str {
        match self {
            Format::Table => "txt",
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

#[derive(Parser)]
#[command(name = "areahist", version, about = "Area-normalized histograms with unequal bin widths")]
struct Cli {
    /// Repeat to raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin samples from a text file, Parquet column, or glob of files
    Bin {
        input: String,
        /// Numeric column to read from Parquet inputs
        #[arg(long)] column: Option<String>,
        #[arg(long, allow_hyphen_values = true)] start: Option<f64>,
        #[arg(long, allow_hyphen_values = true)] end: Option<f64>,
        #[arg(long, value_parser = parse_bin_count)] bins: Option<usize>,
        /// Explicit edges, e.g. --edges 0,0.1,0.5,1
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with_all = ["start", "end", "bins", "quantiles"])]
        edges: Option<Vec<f64>>,
        /// Equal-mass bins estimated from the sample quantiles
        #[arg(long, value_parser = parse_bin_count, conflicts_with_all = ["start", "end", "bins"])]
        quantiles: Option<usize>,
        #[arg(long, conflicts_with = "placed_only")] count_unplaced: bool,
        #[arg(long)] placed_only: bool,
        /// Fail instead of printing NaN areas when nothing is counted
        #[arg(long)] strict: bool,
        #[arg(long, value_enum)] format: Option<Format>,
        #[arg(long)] output: Option<String>,
        /// Write to <export.output_dir>/histogram.<ext>
        #[arg(long, conflicts_with = "output")] save: bool,
    },
    /// Bin the (1 + cos 2πr) / 2 demo distribution with regular and custom edges
    Demo {
        #[arg(long, default_value_t = 10_000)] count: usize,
        #[arg(long)] seed: Option<u64>,
    },
    /// Write the default config file
    InitConfig {
        #[arg(long)] force: bool,
    },
    /// Print a shell completion script
    Completions { shell: Shell },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_err) = settle_config(Config::load());
    let _log_guard = logging::setup(logging::effective_level(&config.logging.level, cli.verbose))?;
    if let Some(e) = config_err {
        warn!("ignoring config file, using defaults: {e}");
    }
    match cli.command {
        Commands::Bin {
            input, column, start, end, bins, edges, quantiles,
            count_unplaced, placed_only, strict, format, output, save,
        } => {
            let count_unplaced = if placed_only {
                false
            } else {
                count_unplaced || config.binning.count_unplaced
            };
            let choice = EdgeChoice::from_args(start, end, bins, edges, quantiles, config.binning.bins)?;
            let format = format.unwrap_or_else(|| Format::from_config(&config.export.format));
            let out_path = if save {
                Some(Path::new(&config.export.output_dir).join(format!("histogram.{}", format.extension())))
            } else {
                output.map(PathBuf::from)
            };
            run_bin(&input, column.as_deref(), choice, count_unplaced, strict, format, out_path.as_deref(), &config)?
        }
        Commands::Demo { count, seed } => run_demo(count, seed, &config),
        Commands::InitConfig { force } => run_init_config(force)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "areahist", &mut std::io::stdout());
        }
    }
    Ok(())
}

/// How the edges are chosen for `bin`.
#[derive(Debug, Clone, PartialEq)]
enum EdgeChoice {
    Uniform { start: f64, end: f64, bins: usize },
    Explicit(Vec<f64>),
    Quantiles(usize),
}

impl EdgeChoice {
    fn from_args(
        start: Option<f64>,
        end: Option<f64>,
        bins: Option<usize>,
        edges: Option<Vec<f64>>,
        quantiles: Option<usize>,
        default_bins: usize,
    ) -> anyhow::Result<Self> {
        if let Some(e) = edges { return Ok(EdgeChoice::Explicit(e)); }
        if let Some(q) = quantiles { return Ok(EdgeChoice::Quantiles(q)); }
        match (start, end) {
            (Some(start), Some(end)) => Ok(EdgeChoice::Uniform { start, end, bins: bins.unwrap_or(default_bins) }),
            _ => anyhow::bail!("pass --start and --end, --edges, or --quantiles"),
        }
    }

    fn resolve(&self, samples: &[f64]) -> areahist_core::Result<BinEdges> {
        match self {
            EdgeChoice::Uniform { start, end, bins } => BinEdges::uniform(*start, *end, *bins),
            EdgeChoice::Explicit(e) => BinEdges::from_breaks(e),
            EdgeChoice::Quantiles(n) => BinEdges::quantiles(samples, *n),
        }
    }
}

fn bin_samples(samples: &[f64], edges: &BinEdges, count_unplaced: bool, config: &Config) -> Histogram {
    if samples.len() >= config.binning.parallel_threshold {
        info!("binning {} samples in parallel", samples.len());
        aggregate_par(samples, edges, count_unplaced)
    } else {
        aggregate(samples.iter().copied(), edges, count_unplaced)
    }
}

#[allow(clippy::too_many_arguments)]
fn run_bin(
    input: &str,
    column: Option<&str>,
    choice: EdgeChoice,
    count_unplaced: bool,
    strict: bool,
    format: Format,
    out_path: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let paths = resolve_inputs(input)?;
    let samples = read_samples(&paths, column)?;
    info!("read {} samples from {} file(s)", samples.len(), paths.len());
    let edges = choice.resolve(&samples)?;
    let hist = bin_samples(&samples, &edges, count_unplaced, config);
    if hist.unplaced > 0 {
        warn!("{} sample(s) fell outside [{}, {})", hist.unplaced, edges.first(), edges.last());
    }
    let hist = if strict { hist.require_defined()? } else { hist };
    emit(&hist, format, out_path, config.display.bar_width)
}

fn emit(hist: &Histogram, format: Format, out_path: Option<&Path>, bar_width: usize) -> anyhow::Result<()> {
    if let Some(path) = out_path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
        }
        match format {
            Format::Json => export_json(path, hist)?,
            Format::Csv => export_csv(path, hist)?,
            Format::Table => std::fs::write(path, render_table(hist, bar_width))?,
        }
        println!("Exported to {}", path.display());
        return Ok(());
    }
    match format {
        Format::Table => print!("{}", render_table(hist, bar_width)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&histogram_json(hist))?),
        Format::Csv => write_csv(&mut std::io::stdout().lock(), hist)?,
    }
    Ok(())
}

fn run_demo(count: usize, seed: Option<u64>, config: &Config) {
    let samples = demo_samples(count, seed);
    let regular = BinEdges::uniform(0.0, 1.0, 10).map(|e| aggregate(samples.iter().copied(), &e, true));
    let custom = BinEdges::from_breaks(&DEMO_EDGES).map(|e| aggregate(samples.iter().copied(), &e, true));
    for (title, hist) in [("Regular Bins", regular), ("Custom Bins", custom)] {
        println!("{title}");
        match hist {
            Ok(h) => print!("{}", render_table(&h, config.display.bar_width)),
            Err(e) => eprintln!("  {e}"),
        }
        println!();
    }
}

fn run_init_config(force: bool) -> anyhow::Result<()> {
    let path = Config::config_path();
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save()?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn edges_flag_parses_list() {
        let cli = Cli::try_parse_from(["areahist", "bin", "data.txt", "--edges", "0,0.5,1"]).unwrap();
        match cli.command {
            Commands::Bin { edges, .. } => assert_eq!(edges, Some(vec![0.0, 0.5, 1.0])),
            _ => panic!("expected bin"),
        }
    }

    #[test]
    fn negative_start_is_accepted() {
        let cli = Cli::try_parse_from(["areahist", "bin", "d.txt", "--start", "-1", "--end", "1"]).unwrap();
        match cli.command {
            Commands::Bin { start, end, .. } => assert_eq!((start, end), (Some(-1.0), Some(1.0))),
            _ => panic!("expected bin"),
        }
    }

    #[test]
    fn zero_bins_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["areahist", "bin", "d.txt", "--start", "0", "--end", "1", "--bins", "0"]).is_err());
    }

    #[test]
    fn oversized_bins_rejected_at_parse_time() {
        let max = MAX_BIN_COUNT.to_string();
        let too_many = (MAX_BIN_COUNT + 1).to_string();
        let base = ["areahist", "bin", "d.txt", "--start", "0", "--end", "1", "--bins"];
        assert!(Cli::try_parse_from(base.iter().copied().chain([max.as_str()])).is_ok());
        assert!(Cli::try_parse_from(base.iter().copied().chain([too_many.as_str()])).is_err());
        assert!(Cli::try_parse_from(base.iter().copied().chain(["18446744073709551615"])).is_err());
        assert!(Cli::try_parse_from(["areahist", "bin", "d.txt", "--quantiles", "18446744073709551615"]).is_err());
    }

    #[test]
    fn broken_config_falls_back_and_keeps_error() {
        let (config, err) = settle_config(Err(HistError::Config("expected `]`".into())));
        assert_eq!(config, Config::default());
        assert!(matches!(err, Some(HistError::Config(_))));

        let mut custom = Config::default();
        custom.binning.bins = 3;
        let (config, err) = settle_config(Ok(custom.clone()));
        assert_eq!(config, custom);
        assert!(err.is_none());
    }

    #[test]
    fn edges_conflict_with_range() {
        assert!(Cli::try_parse_from(["areahist", "bin", "d.txt", "--edges", "0,1", "--start", "0"]).is_err());
    }

    #[test]
    fn edge_choice_requires_a_source() {
        assert!(EdgeChoice::from_args(Some(0.0), None, None, None, None, 10).is_err());
        assert_eq!(
            EdgeChoice::from_args(Some(0.0), Some(2.0), None, None, None, 10).unwrap(),
            EdgeChoice::Uniform { start: 0.0, end: 2.0, bins: 10 }
        );
        assert_eq!(
            EdgeChoice::from_args(None, None, None, None, Some(4), 10).unwrap(),
            EdgeChoice::Quantiles(4)
        );
    }

    #[test]
    fn format_from_config_is_case_insensitive() {
        assert_eq!(Format::from_config("JSON"), Format::Json);
        assert_eq!(Format::from_config("bogus"), Format::Table);
    }
}
