use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use keyframer::{
    FfmpegLogLevel, FileLogger, KeyframeError, KeyframeExtractor, KeyframeSchedule, LogObserver,
    PipelineOptions, ProcessOutcome, VideoId, YoutubeSource, batch, frame_file_name,
    logger::DEFAULT_LOG_PATH,
};
use log::LevelFilter;
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  keyframer process duration_set_4.csv --limit 5\n  keyframer process ids.csv --column videoId --output-root screenshot --progress\n  keyframer plan --frame-count 1200 --fps 30 --json\n  keyframer completions zsh > _keyframer";

#[derive(Debug, Parser)]
#[command(
    name = "keyframer",
    version,
    about = "Download videos and capture 20 evenly-spaced keyframes each",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone)]
struct GlobalOptions {
    /// Echo log lines to stderr and log at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    /// Append-only run log.
    #[arg(long, global = true, default_value = DEFAULT_LOG_PATH)]
    log_file: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true, default_value = "error")]
    ffmpeg_log_level: FfmpegLogLevel,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Capture keyframes for every id in a CSV file.
    #[command(
        about = "Process a list of video ids",
        after_help = "Examples:\n  keyframer process duration_set_4.csv\n  keyframer process ids.csv --offset 100 --limit 50 --json"
    )]
    Process {
        /// CSV file whose id column holds composite ids such as `yt:dQw4w9WgXcQ`.
        input: PathBuf,
        /// Column holding the composite ids.
        #[arg(long, default_value = batch::DEFAULT_ID_COLUMN)]
        column: String,
        /// Skip this many ids from the start of the list.
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Process at most this many ids.
        #[arg(long)]
        limit: Option<usize>,
        /// Directory receiving one sub-directory per video.
        #[arg(long, default_value = keyframer::configuration::DEFAULT_OUTPUT_ROOT)]
        output_root: PathBuf,
        /// Directory for temporary downloads (defaults to the system temp dir).
        #[arg(long)]
        temp_dir: Option<PathBuf>,
        /// Path to the yt-dlp executable.
        #[arg(long)]
        yt_dlp: Option<PathBuf>,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
        /// Print the batch summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the capture timestamps for a frame count and frame rate.
    #[command(about = "Show the keyframe schedule")]
    Plan {
        #[arg(long)]
        frame_count: u64,
        #[arg(long)]
        fps: f64,
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn install_logger(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let level = if global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    FileLogger::open(&global.log_file, level)?
        .with_stderr_echo(global.verbose)
        .install()?;
    keyframer::set_ffmpeg_log_level(global.ffmpeg_log_level);
    Ok(())
}

fn select_window(ids: Vec<VideoId>, offset: usize, limit: Option<usize>) -> Vec<VideoId> {
    let window = ids.into_iter().skip(offset);
    match limit {
        Some(limit) => window.take(limit).collect(),
        None => window.collect(),
    }
}

fn print_result(id: &VideoId, result: &Result<ProcessOutcome, KeyframeError>) -> String {
    match result {
        Ok(ProcessOutcome::Skipped { .. }) => {
            format!("{} {id}: already processed", "skipped".yellow().bold())
        }
        Ok(ProcessOutcome::Completed(report)) if report.is_complete() => format!(
            "{} {id}: {} keyframes",
            "done".green().bold(),
            report.frames_written.len()
        ),
        Ok(ProcessOutcome::Completed(report)) => format!(
            "{} {id}: {} keyframes, {} unreadable",
            "partial".yellow().bold(),
            report.frames_written.len(),
            report.failures.len()
        ),
        Err(error) => format!("{} {id}: {error}", "failed".red().bold()),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            column,
            offset,
            limit,
            output_root,
            temp_dir,
            yt_dlp,
            progress,
            json,
        } => {
            install_logger(&cli.global)?;

            let ids = select_window(batch::load_video_ids(&input, &column)?, offset, limit);

            let mut options = PipelineOptions::new()
                .with_output_root(output_root)
                .with_observer(Arc::new(LogObserver));
            if let Some(directory) = temp_dir {
                options = options.with_temp_dir(directory);
            }

            let mut source = YoutubeSource::new()?;
            if let Some(path) = yt_dlp {
                source = source.with_yt_dlp_path(path);
            }
            let extractor = KeyframeExtractor::new(source, keyframer::FfmpegOpener, options);

            let progress_bar = if progress {
                let pb = ProgressBar::new(ids.len() as u64);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                pb.set_style(style.progress_chars("##-"));
                Some(pb)
            } else {
                None
            };

            let summary = batch::run_batch(&extractor, &ids, |id, result| {
                let line = print_result(id, result);
                match &progress_bar {
                    Some(pb) => {
                        pb.println(line);
                        pb.inc(1);
                    }
                    None if !json => println!("{line}"),
                    None => {}
                }
            });

            if let Some(pb) = progress_bar {
                pb.finish_and_clear();
            }

            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "ids": summary.total(),
                    "completed": summary.completed,
                    "skipped": summary.skipped,
                    "failed": summary.failed,
                    "frames_written": summary.frames_written,
                    "frame_failures": summary.frame_failures,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {} completed, {} skipped, {} failed ({} keyframes written)",
                    "summary".cyan().bold(),
                    summary.completed,
                    summary.skipped,
                    summary.failed,
                    summary.frames_written
                );
            }
        }
        Commands::Plan {
            frame_count,
            fps,
            json,
        } => {
            let schedule = KeyframeSchedule::new(frame_count, fps)?;
            if json {
                let payload = json!({
                    "frame_count": schedule.frame_count(),
                    "fps": schedule.frames_per_second(),
                    "total_duration_ms": schedule.total_duration_ms(),
                    "interval_ms": schedule.interval_ms(),
                    "timestamps_ms": schedule.timestamps(),
                    "files": schedule
                        .timestamps()
                        .iter()
                        .map(|timestamp| frame_file_name(*timestamp))
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "Duration: {:.0} ms, interval {:.0} ms",
                    schedule.total_duration_ms(),
                    schedule.interval_ms()
                );
                for timestamp in schedule.timestamps() {
                    println!("{timestamp:>12.1} ms  {}", frame_file_name(*timestamp));
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "keyframer", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
