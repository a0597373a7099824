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
// Runs the splitter over many files. Files are independent, so each one is
// handled on a Rayon worker and a failure only affects that file.
//
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, error, info};

use crate::error::SplitError;
use crate::split::{self, ChannelFile, Settings, OUTPUT_EXTENSION};
use crate::util::{duration_minutes_seconds, filename_display, has_extension};

/// A channel file produced from a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub channel: u8,
    pub instrument: u8,
    pub path: PathBuf,
}

/// The result of splitting a single source file.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub result: Result<Vec<Written>, SplitError>,
}

/// The results of a batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    /// Returns true if any file failed.
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|outcome| outcome.result.is_err())
    }

    /// Returns the outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    /// Returns every channel file produced across all sources.
    pub fn written(&self) -> impl Iterator<Item = &Written> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .flatten()
    }
}

/// Lists the MIDI files directly inside the given directory, sorted by path.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>, SplitError> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| SplitError::filesystem(dir, e))? {
        let entry = entry.map_err(|e| SplitError::filesystem(dir, e))?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, OUTPUT_EXTENSION) {
            inputs.push(path);
        } else {
            debug!(path = ?path, "Skipping non-MIDI entry");
        }
    }
    inputs.sort();
    Ok(inputs)
}

fn write_channel_file(file: &ChannelFile<'_>) -> Result<(), SplitError> {
    if let Some(parent) = file.path().parent() {
        fs::create_dir_all(parent).map_err(|e| SplitError::filesystem(parent, e))?;
    }
    file.smf()
        .save(file.path())
        .map_err(|e| SplitError::filesystem(file.path(), e))
}

/// Splits one file and writes a file per active channel. Nothing is written
/// on a dry run, but the destinations are still returned.
pub fn split_file(
    source: &Path,
    settings: &Settings,
    dry_run: bool,
) -> Result<Vec<Written>, SplitError> {
    let bytes = fs::read(source).map_err(|e| SplitError::filesystem(source, e))?;
    let files = split::split_bytes(&bytes, &split::base_name(source), settings)?;

    let mut written = Vec::with_capacity(files.len());
    for file in files.iter() {
        if !dry_run {
            write_channel_file(file)?;
        }
        debug!(
            channel = file.channel(),
            instrument = file.instrument(),
            path = ?file.path(),
            dry_run,
            "Channel file"
        );
        written.push(Written {
            channel: file.channel(),
            instrument: file.instrument(),
            path: file.path().to_path_buf(),
        });
    }
    Ok(written)
}

/// A batch of files split with the same settings.
pub struct Batch {
    settings: Settings,
    jobs: usize,
    dry_run: bool,
}

impl Batch {
    /// Creates a new batch. `jobs` is the number of files processed at once.
    pub fn new(settings: Settings, jobs: usize, dry_run: bool) -> Batch {
        Batch {
            settings,
            jobs: jobs.max(1),
            dry_run,
        }
    }

    /// Splits every input. Only failing to set up the output directory or the
    /// worker pool aborts the run; per-file failures end up in the report.
    pub fn run(&self, inputs: &[PathBuf]) -> Result<BatchReport, SplitError> {
        let start = Instant::now();
        let output_dir = &self.settings.output_dir;
        if !self.dry_run && !output_dir.is_dir() {
            info!(path = ?output_dir, "Creating output directory");
            fs::create_dir_all(output_dir).map_err(|e| SplitError::filesystem(output_dir, e))?;
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("midisplit-worker-{i}"))
            .build()?;

        info!(
            files = inputs.len(),
            jobs = self.jobs,
            trim_silence = self.settings.options.trim_silence,
            ignore_meta = self.settings.options.suppress_meta,
            offset = ?self.settings.options.offset_seconds,
            cutoff = ?self.settings.options.cutoff_seconds,
            split_dir = %self.settings.grouping,
            "Splitting MIDI files"
        );

        let outcomes = pool.install(|| {
            inputs
                .par_iter()
                .map(|source| {
                    let result = split_file(source, &self.settings, self.dry_run);
                    match &result {
                        Ok(written) => info!(
                            file = filename_display(source),
                            channels = written.len(),
                            "Split file"
                        ),
                        Err(e) => error!(
                            file = filename_display(source),
                            err = %e,
                            "Unable to split file"
                        ),
                    }
                    FileOutcome {
                        source: source.clone(),
                        result,
                    }
                })
                .collect::<Vec<FileOutcome>>()
        });

        let report = BatchReport {
            outcomes,
            elapsed: start.elapsed(),
        };
        info!(
            elapsed = duration_minutes_seconds(report.elapsed),
            written = report.written().count(),
            failed = report.failures().count(),
            "Finished"
        );
        Ok(report)
    }
}

/// Prints a batch report grouped by source file.
pub fn print_report(report: &BatchReport) {
    for outcome in report.outcomes.iter() {
        match &outcome.result {
            Ok(written) if written.is_empty() => {
                println!("\u{26a0}\u{fe0f}  {}: no active channels", outcome.source.display());
            }
            Ok(written) => {
                println!("\u{2705} {}", outcome.source.display());
                for file in written {
                    println!(
                        "   ch{:<2} instrument {:>3} -> {}",
                        file.channel,
                        file.instrument,
                        file.path.display()
                    );
                }
            }
            Err(e) => println!("\u{274c} {}: {}", outcome.source.display(), e),
        }
    }

    println!(
        "\n{} file(s), {} channel file(s), {} failure(s) in {}",
        report.outcomes.len(),
        report.written().count(),
        report.failures().count(),
        duration_minutes_seconds(report.elapsed)
    );
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::fs;
    use std::path::{Path, PathBuf};

    use midly::{Format, Smf};

    use crate::error::SplitError;
    use crate::split::{Grouping, MergeMode, Options, Settings};
    use crate::testutil::{
        channel_events, deltas, end_of_track, lyric, note_off, note_on, program_change, tempo,
        write_smf,
    };

    use super::{collect_inputs, split_file, Batch};

    fn settings(output_dir: &Path, grouping: Grouping) -> Settings {
        Settings {
            options: Options::default(),
            grouping,
            merge: MergeMode::Auto,
            output_dir: output_dir.to_path_buf(),
        }
    }

    fn write_song(path: &Path) -> Result<(), Box<dyn Error>> {
        write_smf(
            path,
            Format::Parallel,
            vec![
                vec![tempo(500_000, 0), lyric(b"hello", 0), end_of_track(960)],
                vec![
                    program_change(0, 25, 0),
                    note_on(0, 60, 0),
                    note_off(0, 60, 480),
                    end_of_track(0),
                ],
                vec![
                    program_change(9, 1, 0),
                    note_on(9, 36, 240),
                    note_off(9, 36, 240),
                    end_of_track(0),
                ],
            ],
        )
    }

    #[test]
    fn collects_midi_files_only() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let dir = temp_dir.path();
        write_song(&dir.join("b.mid"))?;
        write_song(&dir.join("a.MID"))?;
        fs::write(dir.join("notes.txt"), "not midi")?;
        fs::create_dir(dir.join("nested.mid"))?;

        let inputs = collect_inputs(dir)?;

        assert_eq!(vec![dir.join("a.MID"), dir.join("b.mid")], inputs);
        Ok(())
    }

    #[test]
    fn collect_from_missing_directory() {
        let result = collect_inputs(Path::new("/does/not/exist"));
        assert!(matches!(result, Err(SplitError::Filesystem { .. })));
    }

    #[test]
    fn split_file_writes_each_channel() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let source = temp_dir.path().join("song.mid");
        write_song(&source)?;
        let out = temp_dir.path().join("out");

        let written = split_file(&source, &settings(&out, Grouping::File), false)?;

        let paths: Vec<PathBuf> = written.iter().map(|w| w.path.clone()).collect();
        assert_eq!(
            vec![
                out.join("song").join("25_ch0_song.mid"),
                out.join("song").join("1_ch9_song.mid"),
            ],
            paths
        );

        let bytes = fs::read(&paths[0])?;
        let smf = Smf::parse(&bytes)?;
        assert_eq!(Format::SingleTrack, smf.header.format);
        assert_eq!(1, smf.tracks.len());
        // Tempo, lyric, program change, note on, note off, end of track.
        assert_eq!(6, smf.tracks[0].len());
        assert_eq!(vec![0, 0, 480], deltas(&channel_events(&smf.tracks[0])));

        let bytes = fs::read(&paths[1])?;
        let smf = Smf::parse(&bytes)?;
        assert_eq!(vec![0, 0, 240], deltas(&channel_events(&smf.tracks[0])));
        Ok(())
    }

    #[test]
    fn ignore_meta_drops_lyrics_from_output() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let source = temp_dir.path().join("song.mid");
        write_song(&source)?;
        let out = temp_dir.path().join("out");
        let mut settings = settings(&out, Grouping::Flat);
        settings.options.suppress_meta = true;

        let written = split_file(&source, &settings, false)?;

        let bytes = fs::read(&written[0].path)?;
        let smf = Smf::parse(&bytes)?;
        assert_eq!(5, smf.tracks[0].len());
        Ok(())
    }

    #[test]
    fn dry_run_writes_nothing() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let source = temp_dir.path().join("song.mid");
        write_song(&source)?;
        let out = temp_dir.path().join("out");

        let report = Batch::new(settings(&out, Grouping::Instrument), 2, true).run(&[source])?;

        assert!(!report.has_failures());
        assert_eq!(2, report.written().count());
        assert!(!out.exists());
        Ok(())
    }

    #[test]
    fn bad_file_does_not_stop_the_batch() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let dir = temp_dir.path();
        write_song(&dir.join("good.mid"))?;
        fs::write(dir.join("bad.mid"), b"MThd garbage")?;
        let out = dir.join("out");

        let inputs = collect_inputs(dir)?;
        let report = Batch::new(settings(&out, Grouping::Channel), 2, false).run(&inputs)?;

        assert_eq!(2, report.outcomes.len());
        assert!(report.has_failures());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(1, failures.len());
        assert_eq!(dir.join("bad.mid"), failures[0].source);
        match &failures[0].result {
            Err(e) => assert!(e.is_decode()),
            Ok(_) => panic!("expected bad.mid to fail"),
        }

        assert!(out.join("0").join("25_ch0_good.mid").is_file());
        assert!(out.join("9").join("1_ch9_good.mid").is_file());
        Ok(())
    }

    #[test]
    fn output_directory_that_is_a_file_fails() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let source = temp_dir.path().join("song.mid");
        write_song(&source)?;
        let out = temp_dir.path().join("out");
        fs::write(&out, "in the way")?;

        let result = Batch::new(settings(&out, Grouping::Flat), 1, false).run(&[source]);

        assert!(matches!(result, Err(SplitError::Filesystem { .. })));
        Ok(())
    }

    #[test]
    fn missing_source_is_reported() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let out = temp_dir.path().join("out");

        let report = Batch::new(settings(&out, Grouping::Flat), 1, false)
            .run(&[temp_dir.path().join("missing.mid")])?;

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(1, failures.len());
        assert!(matches!(
            failures[0].result,
            Err(SplitError::Filesystem { .. })
        ));
        Ok(())
    }
}
