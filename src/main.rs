use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use keydev_core::{DecayKind, KeydevConfig};
use keydev_metrics::Metric;

#[derive(Parser)]
#[command(
    name = "keydev",
    version,
    about = "Key developer mining over change-set history",
    long_about = "Keydev slides a time window across a change-set log, maintains the\n\
                   artifact and developer collaboration graphs inside the window, and\n\
                   scores every developer per tick as jack (breadth), maven (exclusive\n\
                   ownership), and connector (brokerage).\n\n\
                   Examples:\n  \
                     keydev run hive.json                  Score one dataset\n  \
                     keydev run hive.json --resume         Continue an interrupted run\n  \
                     keydev batch data/*.json -o out/      Score many datasets in parallel\n  \
                     keydev rank out/hive.jsonl --metric maven   Top mavens of the last window\n  \
                     keydev init                           Create a keydev.toml config"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: keydev.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the sliding-window pipeline over one dataset
    #[command(long_about = "Run the sliding-window pipeline over one dataset.\n\n\
        Loads the JSON change-set log, slides the window across it, and appends\n\
        per-tick developer scores to a JSONL file. With --resume, an existing\n\
        output file is continued instead of overwritten.\n\n\
        Examples:\n  keydev run hive.json\n  keydev run hive.json -o hive-scores.jsonl --window-days 90")]
    Run {
        /// Path to the change-set log (JSON)
        dataset: PathBuf,

        /// Output scores file (default: <dataset stem>.scores.jsonl)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Continue a previous run from its last checkpointed window
        #[arg(long)]
        resume: bool,

        /// Project label for logs and the run report
        #[arg(long)]
        project: Option<String>,

        /// Override the window size in days
        #[arg(long)]
        window_days: Option<u32>,

        /// Override the window step in days
        #[arg(long)]
        step_days: Option<u32>,

        /// Override the edge decay strategy
        #[arg(long, value_enum)]
        decay: Option<DecayArg>,
    },
    /// Run the pipeline over several datasets in parallel
    #[command(long_about = "Run the pipeline over several datasets in parallel.\n\n\
        Each dataset is an isolated unit of work; one failing dataset is reported\n\
        and does not stop the others. Output files land in --output-dir, named\n\
        after each dataset.\n\n\
        Examples:\n  keydev batch hive.json hbase.json\n  keydev batch data/*.json --output-dir out --resume")]
    Batch {
        /// Change-set logs to process
        #[arg(required = true)]
        datasets: Vec<PathBuf>,

        /// Directory for the output score files (default: current directory)
        #[arg(long, short, default_value = ".")]
        output_dir: PathBuf,

        /// Continue previous runs from their last checkpointed windows
        #[arg(long)]
        resume: bool,
    },
    /// Rank developers of the last scored window by one metric
    #[command(long_about = "Rank developers of the last scored window by one metric.\n\n\
        Reads a JSONL score file produced by 'keydev run', takes the most recent\n\
        window, and prints developers ordered by the chosen metric. Scores below\n\
        the configured threshold are dropped.\n\n\
        Examples:\n  keydev rank hive.scores.jsonl\n  keydev rank hive.scores.jsonl --metric connector --limit 5")]
    Rank {
        /// Score file produced by 'keydev run'
        scores: PathBuf,

        /// Metric to rank by
        #[arg(long, value_enum, default_value = "jack")]
        metric: MetricArg,

        /// Maximum developers to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Create a default keydev.toml configuration file
    #[command(long_about = "Create a default keydev.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if keydev.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DecayArg {
    /// Binary presence inside the window
    None,
    /// Linear falloff from fresh to window exit
    Linear,
    /// Half-life falloff, clamped at window exit
    Exponential,
}

impl From<DecayArg> for DecayKind {
    fn from(arg: DecayArg) -> Self {
        match arg {
            DecayArg::None => DecayKind::None,
            DecayArg::Linear => DecayKind::Linear,
            DecayArg::Exponential => DecayKind::Exponential,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    /// Breadth across file areas
    Jack,
    /// Exclusive ownership of file areas
    Maven,
    /// Brokerage between developer groups
    Connector,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Jack => Metric::Jack,
            MetricArg::Maven => Metric::Maven,
            MetricArg::Connector => Metric::Connector,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# Keydev Configuration
# See: https://github.com/Meru143/keydev

# project = "hive"
# on_malformed = "skip"   # or "abort"

[window]
# window_days = 365
# step_days = 1

[graph]
# decay = "linear"        # none | linear | exponential
# max_files_per_change_set = 50
# include_issue_links = true
# min_edge_weight = 0.0

[metrics]
# score_threshold = 0.000005
# area_depth = 2
"#;

fn load_config(path: &Option<PathBuf>) -> Result<KeydevConfig> {
    match path {
        Some(path) => KeydevConfig::from_file(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let default_path = Path::new("keydev.toml");
            if default_path.exists() {
                KeydevConfig::from_file(default_path)
                    .into_diagnostic()
                    .wrap_err("reading keydev.toml")
            } else {
                Ok(KeydevConfig::default())
            }
        }
    }
}

/// Default output path: the dataset stem plus `.scores.jsonl`, in `dir`.
fn output_path_for(dataset: &Path, dir: &Path) -> PathBuf {
    let stem = dataset
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".into());
    dir.join(format!("{stem}.scores.jsonl"))
}

fn progress_spinner(message: String) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) =
        indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

fn run_one(
    dataset: &Path,
    config: &KeydevConfig,
    output: &Path,
    resume: bool,
) -> Result<keydev_pipeline::PipelineReport> {
    let spinner = progress_spinner(format!("Scoring {}", dataset.display()));
    let result = keydev_pipeline::run(dataset, config, output, resume, |tick| {
        if let Some(pb) = &spinner {
            pb.set_message(format!("Scoring {} (tick {tick})", dataset.display()));
        }
    });
    if let Some(pb) = spinner {
        match &result {
            Ok(_) => pb.finish_with_message(format!("Done: {}", dataset.display())),
            Err(_) => pb.finish_with_message(format!("Failed: {}", dataset.display())),
        }
    }
    result
        .into_diagnostic()
        .wrap_err(format!("scoring {}", dataset.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(&cli.config)?;

    match cli.command {
        Command::Run {
            ref dataset,
            ref output,
            resume,
            ref project,
            window_days,
            step_days,
            decay,
        } => {
            if let Some(project) = project {
                config.project = Some(project.clone());
            }
            if let Some(days) = window_days {
                config.window.window_days = days;
            }
            if let Some(days) = step_days {
                config.window.step_days = days;
            }
            if let Some(decay) = decay {
                config.graph.decay = decay.into();
            }

            let output = output
                .clone()
                .unwrap_or_else(|| output_path_for(dataset, Path::new(".")));
            let report = run_one(dataset, &config, &output, resume)?;

            println!(
                "{}: {} ticks ({} resumed), {} developers -> {}",
                report.project.as_deref().unwrap_or("run"),
                report.ticks,
                report.skipped_ticks,
                report.developers,
                report.output.display(),
            );
        }
        Command::Batch {
            ref datasets,
            ref output_dir,
            resume,
        } => {
            std::fs::create_dir_all(output_dir)
                .into_diagnostic()
                .wrap_err(format!("creating {}", output_dir.display()))?;

            let mut handles = Vec::with_capacity(datasets.len());
            for dataset in datasets {
                let dataset = dataset.clone();
                let config = config.clone();
                let output = output_path_for(&dataset, output_dir);
                handles.push((
                    dataset.clone(),
                    tokio::task::spawn_blocking(move || {
                        run_one(&dataset, &config, &output, resume)
                    }),
                ));
            }

            let mut failed = 0usize;
            for (dataset, handle) in handles {
                match handle.await {
                    Ok(Ok(report)) => {
                        println!(
                            "{}: {} ticks, {} developers -> {}",
                            dataset.display(),
                            report.ticks,
                            report.developers,
                            report.output.display(),
                        );
                    }
                    Ok(Err(err)) => {
                        failed += 1;
                        eprintln!("{}: {err:?}", dataset.display());
                    }
                    Err(join_err) => {
                        failed += 1;
                        warn!(dataset = %dataset.display(), "worker panicked: {join_err}");
                    }
                }
            }
            if failed > 0 {
                miette::bail!("{failed} of {} datasets failed", datasets.len());
            }
        }
        Command::Rank {
            ref scores,
            metric,
            limit,
        } => {
            let all = keydev_pipeline::read_scores(scores)
                .into_diagnostic()
                .wrap_err(format!("reading {}", scores.display()))?;
            let Some(last_window) = all.iter().map(|s| s.window_end).max() else {
                miette::bail!("no scores found in {}", scores.display());
            };
            let latest: Vec<_> = all
                .into_iter()
                .filter(|s| s.window_end == last_window)
                .collect();
            let ranking =
                keydev_metrics::ranked(&latest, metric.into(), config.metrics.score_threshold);

            println!("Window ending {last_window}:");
            if ranking.is_empty() {
                println!("  no developers above the score threshold");
            }
            for (i, (dev, score)) in ranking.iter().take(limit).enumerate() {
                println!("{:>3}. {dev:<30} {score:.6}", i + 1);
            }
        }
        Command::Init => {
            let path = Path::new("keydev.toml");
            if path.exists() {
                miette::bail!("keydev.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created keydev.toml with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "keydev", &mut std::io::stdout());
        }
    }

    Ok(())
}
