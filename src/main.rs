// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{crate_version, ArgGroup, Parser, Subcommand};
use midly::Smf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use midisplit::batch::{self, Batch};
use midisplit::config::{Overrides, SplitConfig};
use midisplit::error::SplitError;
use midisplit::split::{self, Grouping, MergeMode};
use midisplit::timing::tempo_to_bpm;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Splits MIDI files into one file per channel."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Splits a file, or every MIDI file in a directory, into per channel files.
    #[command(group(
        ArgGroup::new("input")
            .required(true)
            .args(["input_file", "input_directory"])
    ))]
    Split {
        /// A single MIDI file to split.
        #[arg(short = 'i', long)]
        input_file: Option<PathBuf>,
        /// A directory of MIDI files to split.
        #[arg(short = 'd', long)]
        input_directory: Option<PathBuf>,
        /// The directory to write the channel files to.
        output_dir: PathBuf,
        /// Clamp long silences within each channel.
        #[arg(long)]
        trim: bool,
        /// Drop lyrics, markers and other informational meta events.
        #[arg(long)]
        ignore_meta: bool,
        /// Drop each channel's events up to this many seconds.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        offset: Option<u32>,
        /// Drop each channel's events from this many seconds on.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        cutoff: Option<u32>,
        /// Group the output files into subdirectories.
        #[arg(long, value_enum)]
        split_dir: Option<Grouping>,
        /// How the tracks of each file are combined before splitting.
        #[arg(long, value_enum)]
        merge: Option<MergeMode>,
        /// The number of files to process at once. Defaults to the number of CPUs.
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        jobs: Option<u16>,
        /// Report what would be written without writing anything.
        #[arg(long)]
        dry_run: bool,
        /// A YAML file with default split settings.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Lists the channels used by a MIDI file.
    Channels {
        /// The MIDI file to inspect.
        file: PathBuf,
        /// How the tracks of the file are combined.
        #[arg(long, value_enum, default_value_t = MergeMode::Auto)]
        merge: MergeMode,
    },
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            input_file,
            input_directory,
            output_dir,
            trim,
            ignore_meta,
            offset,
            cutoff,
            split_dir,
            merge,
            jobs,
            dry_run,
            config,
        } => {
            let config = match config {
                Some(path) => SplitConfig::deserialize(&path)?,
                None => SplitConfig::default(),
            };
            let config = config.with_overrides(Overrides {
                trim_silence: trim,
                ignore_meta,
                offset,
                cutoff,
                split_dir,
                merge,
                jobs: jobs.map(usize::from),
            });
            config.validate()?;

            let inputs = match (input_file, input_directory) {
                (Some(file), _) => vec![file],
                (None, Some(dir)) => batch::collect_inputs(&dir)?,
                (None, None) => return Err("an input file or directory is required".into()),
            };

            if inputs.is_empty() {
                println!("No MIDI files found.");
                return Ok(ExitCode::SUCCESS);
            }

            info!(files = inputs.len(), output = ?output_dir, dry_run, "Starting split");
            let report = Batch::new(config.settings(output_dir), config.jobs(), dry_run)
                .run(&inputs)?;
            batch::print_report(&report);

            if report.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Channels { file, merge } => {
            let bytes = fs::read(&file).map_err(|e| SplitError::filesystem(&file, e))?;
            let smf = Smf::parse(&bytes).map_err(SplitError::from)?;
            let ticks_per_beat = split::ticks_per_beat(smf.header.timing)?;
            let summary = split::summarize(&smf, merge)?;

            println!(
                "{}: {:?}, {} track(s), {} ticks per beat, {:.1} BPM",
                file.display(),
                smf.header.format,
                smf.tracks.len(),
                ticks_per_beat,
                tempo_to_bpm(split::initial_tempo(&smf, merge))
            );

            if summary.is_empty() {
                println!("No channel events found.");
                return Ok(ExitCode::SUCCESS);
            }

            println!("Channels (count: {}):", summary.len());
            for channel in summary.iter() {
                println!("- {}", channel);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
