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
use std::io;
use std::path::{Path, PathBuf};

/// Errors that abort the processing of a single input file. Other files in a
/// batch are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("MIDI decode error: {0}")]
    Decode(#[from] midly::Error),

    #[error("unsupported timing: SMPTE timecode at {fps} fps, only ticks per beat is supported")]
    UnsupportedTiming { fps: u8 },

    #[error("filesystem error for {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SplitError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn filesystem(path: &Path, source: io::Error) -> SplitError {
        SplitError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true if the error came from malformed or unsupported input
    /// rather than from the filesystem.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            SplitError::Decode(_) | SplitError::UnsupportedTiming { .. }
        )
    }
}
