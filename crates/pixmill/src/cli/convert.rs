//! The `pixmill convert` command: run a batch with live progress.

use clap::Args;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use pixmill_core::{Config, Executor, FileDiscovery, Job, ProgressEvent, RunSummary};
use std::path::PathBuf;
use std::time::Duration;

use super::stages::StageArgs;
use super::types::EventsFormat;

/// Arguments for the `convert` command.
#[derive(Args, Debug, Default)]
pub struct ConvertArgs {
    /// Image files or directories to convert
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (created if missing)
    #[arg(short, long)]
    pub out: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Progress output
    #[arg(long, value_enum, default_value = "bar")]
    pub events: EventsFormat,

    #[command(flatten)]
    pub stages: StageArgs,
}

/// Execute the convert command.
pub async fn execute(args: ConvertArgs, config: &Config) -> anyhow::Result<()> {
    let configuration = args.stages.resolve(config)?;

    let sources = FileDiscovery::new(args.recursive).discover_all(&args.inputs);
    if sources.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.inputs);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to convert", sources.len());

    let mut reporter = Reporter::new(args.events, sources.len() as u64);
    reporter.announce(&configuration.describe());

    let executor = Executor::new(config);
    let mut run = executor.run(Job::batch(sources), configuration, args.out.clone())?;

    let token = run.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current image");
            token.cancel();
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(config.progress.poll_interval_ms));
    let mut finished = false;
    while !finished {
        ticker.tick().await;
        // Read is_finished first so nothing sent before exit is missed
        let worker_done = run.is_finished();
        for event in run.events().drain() {
            finished |= event.is_terminal();
            reporter.report(&event)?;
        }
        finished |= worker_done;
    }

    // Failed runs surface here as an error and a non-zero exit
    let summary = run.join()?;
    tracing::debug!("Run finished: {:?}", summary);
    Ok(())
}

/// Renders progress events for a human or a machine.
enum Reporter {
    Bar(ProgressBar),
    Jsonl,
}

impl Reporter {
    fn new(format: EventsFormat, total: u64) -> Self {
        match format {
            EventsFormat::Bar => Reporter::Bar(create_progress_bar(total)),
            EventsFormat::Jsonl => Reporter::Jsonl,
        }
    }

    /// Show the operations about to run.
    fn announce(&self, operations: &[String]) {
        if let Reporter::Bar(pb) = self {
            let dim = Style::new().for_stderr().dim();
            pb.suspend(|| {
                eprintln!("  Operations:");
                for op in operations {
                    eprintln!("    {}", dim.apply_to(format!("• {op}")));
                }
            });
        }
    }

    fn report(&mut self, event: &ProgressEvent) -> anyhow::Result<()> {
        let pb = match self {
            Reporter::Jsonl => {
                println!("{}", serde_json::to_string(event)?);
                return Ok(());
            }
            Reporter::Bar(pb) => pb,
        };

        match event {
            ProgressEvent::Status(message) => pb.set_message(message.clone()),
            ProgressEvent::Progress { index, .. } => pb.set_position(*index as u64),
            ProgressEvent::Saved { .. } => pb.inc(1),
            ProgressEvent::Warning { message, .. } => {
                let yellow = Style::new().for_stderr().yellow();
                pb.println(format!("  {} {}", yellow.apply_to("!"), message));
            }
            ProgressEvent::ImageFailed { error, .. } => {
                let red = Style::new().for_stderr().red();
                pb.println(format!("  {} {}", red.apply_to("✗"), error));
                pb.inc(1);
            }
            ProgressEvent::Completed(summary) => {
                pb.finish_and_clear();
                print_summary(summary);
            }
            ProgressEvent::Failed(message) => {
                pb.finish_and_clear();
                let red = Style::new().for_stderr().red().bold();
                eprintln!("{} {}", red.apply_to("Conversion failed:"), message);
            }
        }
        Ok(())
    }
}

/// Create a progress bar for batch conversion.
fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary after a run.
fn print_summary(summary: &RunSummary) {
    let green = Style::new().for_stderr().green().bold();
    let secs = summary.elapsed().as_secs_f64();
    let rate = if secs > 0.0 {
        (summary.succeeded + summary.failed) as f64 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    if summary.cancelled {
        eprintln!("           Conversion cancelled");
    } else {
        eprintln!("           {}", green.apply_to("Conversion complete"));
    }
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.skipped() > 0 {
        eprintln!("    Not started:  {:>8}", summary.skipped());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
