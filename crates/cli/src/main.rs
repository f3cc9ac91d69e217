//! Binary entry point for the avkit media utilities.

use anyhow::{bail, Result};
use avkit_core::tool::SystemRunner;
use avkit_core::{chapters, srt, sync, tracks};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser)]
#[command(about = "Small utilities for media chapters, subtitles and timestamps")]
struct Cli {
    /// Enable verbose debug and trace logs.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Concatenate selected chapters of a media file with ffmpeg.
    Concat {
        /// Path to the source media file.
        input: PathBuf,

        /// Path to the metadata JSON holding the `chapters` array.
        #[arg(long)]
        chapters: PathBuf,

        /// Comma separated 1-based chapter numbers, e.g. 1,3,5.
        #[arg(long)]
        select: String,

        /// Output file path. Defaults to concat_<input name>.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the ffmpeg command without running it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Analyze timestamp pair delays between two recordings.
    Sync {
        /// Text file with one `<timestamp> - <timestamp>` pair per line.
        input: PathBuf,
    },
    /// Merge translated text lines into an SRT file.
    Merge {
        /// Path to the original SRT file.
        #[arg(long)]
        srt: PathBuf,

        /// Path to the translation TXT file, one line per subtitle.
        #[arg(long)]
        txt: PathBuf,

        /// Path of the merged SRT to write.
        #[arg(long, default_value = "translated.srt")]
        output: PathBuf,
    },
    /// Remove audio tracks of given languages from MKV files.
    Strip {
        /// Directory scanned recursively for MKV files.
        directory: PathBuf,

        /// Language code(s) to remove, e.g. eng, jpn. Repeatable.
        #[arg(short, long, required = true)]
        language: Vec<String>,

        /// Edit each file in place with mkvpropedit instead of remuxing.
        #[arg(long)]
        in_place: bool,

        /// Preview the commands without touching any file.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Application entry point which parses CLI args and performs actions.
/// This function should initialize logging and delegate to the core library.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("avkit=trace".parse().unwrap())
            .add_directive("avkit_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else {
        EnvFilter::default()
            .add_directive("avkit=info".parse().unwrap())
            .add_directive("avkit_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let runner = SystemRunner;
    match cli.command {
        Command::Concat {
            input,
            chapters: metadata,
            select,
            output,
            dry_run,
        } => {
            let all = chapters::load_chapters(&fs::read_to_string(&metadata)?)?;
            let picked = chapters::select_chapters(&all, &select)?;
            if picked.is_empty() {
                bail!("no chapters selected");
            }
            let output = output.unwrap_or_else(|| {
                let name = input
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                input.with_file_name(format!("concat_{name}"))
            });
            chapters::concat_chapters(&runner, &picked, &input, &output, dry_run)?;
        }
        Command::Sync { input } => {
            let content = fs::read_to_string(&input)?;
            let (pairs, skipped) = sync::read_pairs(&content);
            if !skipped.is_empty() {
                info!("{} line(s) skipped", skipped.len());
            }
            if pairs.is_empty() {
                bail!("no valid timestamp pairs found in {}", input.display());
            }
            print!("{}", sync::render_report(&pairs));
        }
        Command::Merge {
            srt: srt_path,
            txt,
            output,
        } => {
            let blocks = srt::parse(&fs::read_to_string(&srt_path)?);
            let replacements = srt::translations(&fs::read_to_string(&txt)?);
            let merged = srt::merge(&blocks, &replacements)?;
            fs::write(&output, srt::format(&merged))?;
            info!("wrote {}", output.display());
        }
        Command::Strip {
            directory,
            language,
            in_place,
            dry_run,
        } => {
            let languages: HashSet<String> = language.into_iter().collect();
            let mode = if in_place {
                tracks::Mode::InPlace
            } else {
                tracks::Mode::Remux
            };
            let found =
                tracks::process_directory(&runner, &directory, &languages, mode, dry_run)?;
            info!("processed {found} file(s)");
        }
    }
    Ok(())
}
