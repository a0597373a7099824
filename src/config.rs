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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use crate::split::{Grouping, MergeMode, Options, Settings};

mod error;

pub use error::ConfigError;

/// The YAML representation of the split settings. Every field is optional.
///
/// ```yaml
/// trim_silence: true
/// ignore_meta: true
/// offset: 10
/// cutoff: 60
/// split_dir: instrument
/// merge: auto
/// jobs: 4
/// ```
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SplitConfig {
    /// Clamp long silences within each channel.
    trim_silence: bool,
    /// Drop lyrics, markers and other informational meta events.
    ignore_meta: bool,
    /// Seconds at which to start keeping each channel's events.
    offset: Option<u32>,
    /// Seconds at which to stop keeping each channel's events.
    cutoff: Option<u32>,
    /// How to group the output files into directories.
    split_dir: Grouping,
    /// How the tracks of each file are combined before splitting.
    merge: MergeMode,
    /// The number of files to process at once.
    jobs: Option<usize>,
}

/// Values given on the command line. Flags can only switch a feature on, any
/// other value replaces the one from the file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub trim_silence: bool,
    pub ignore_meta: bool,
    pub offset: Option<u32>,
    pub cutoff: Option<u32>,
    pub split_dir: Option<Grouping>,
    pub merge: Option<MergeMode>,
    pub jobs: Option<usize>,
}

impl SplitConfig {
    /// Deserializes a file from the path into a split configuration.
    pub fn deserialize(path: &Path) -> Result<SplitConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<SplitConfig>()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command line overrides on top of this configuration.
    pub fn with_overrides(self, overrides: Overrides) -> SplitConfig {
        SplitConfig {
            trim_silence: self.trim_silence || overrides.trim_silence,
            ignore_meta: self.ignore_meta || overrides.ignore_meta,
            offset: overrides.offset.or(self.offset),
            cutoff: overrides.cutoff.or(self.cutoff),
            split_dir: overrides.split_dir.unwrap_or(self.split_dir),
            merge: overrides.merge.unwrap_or(self.merge),
            jobs: overrides.jobs.or(self.jobs),
        }
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offset == Some(0) {
            return Err(ConfigError::Invalid {
                field: "offset",
                reason: "must be a positive number of seconds".into(),
            });
        }
        if self.cutoff == Some(0) {
            return Err(ConfigError::Invalid {
                field: "cutoff",
                reason: "must be a positive number of seconds".into(),
            });
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "jobs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Returns true if long silences are clamped.
    pub fn trim_silence(&self) -> bool {
        self.trim_silence
    }

    /// Returns true if informational meta events are dropped.
    pub fn ignore_meta(&self) -> bool {
        self.ignore_meta
    }

    /// Gets the output grouping.
    pub fn split_dir(&self) -> Grouping {
        self.split_dir
    }

    /// Gets the number of files to process at once, defaulting to the number of CPUs.
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(num_cpus::get)
    }

    /// Gets the demultiplexing options.
    pub fn options(&self) -> Options {
        Options {
            trim_silence: self.trim_silence,
            suppress_meta: self.ignore_meta,
            offset_seconds: self.offset,
            cutoff_seconds: self.cutoff,
        }
    }

    /// Builds the per-file settings for the given output directory.
    pub fn settings(&self, output_dir: PathBuf) -> Settings {
        Settings {
            options: self.options(),
            grouping: self.split_dir,
            merge: self.merge,
            output_dir,
        }
    }
}
