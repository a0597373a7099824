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
use std::fmt;
use std::path::{Path, PathBuf};

use midly::num::u28;
use midly::{MetaMessage, Smf, Timing, TrackEventKind};
use tracing::debug;

use crate::error::SplitError;
use crate::timing::DEFAULT_TEMPO;

mod assemble;
mod classify;
mod demux;
mod merge;
mod state;

pub use assemble::{destination, file_name, ChannelFile, Grouping, OUTPUT_EXTENSION};
pub use classify::{classify, is_informational, Classified, GlobalKind};
pub use demux::{demultiplex, Demultiplexed, Demultiplexer, Options, MAX_SILENCE_TICKS};
pub use merge::{concatenate, merge, merged_events, MergeMode};
pub use state::{ChannelState, DEFAULT_INSTRUMENT, NUM_CHANNELS};

const MAX_DELTA: u64 = (1 << 28) - 1;

/// Converts a tick count to a delta, saturating at the largest delta a MIDI
/// file can hold.
pub(crate) fn to_delta(ticks: u64) -> u28 {
    u28::new(ticks.min(MAX_DELTA) as u32)
}

/// Everything needed to split one file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub options: Options,
    pub grouping: Grouping,
    pub merge: MergeMode,
    pub output_dir: PathBuf,
}

/// Returns the resolution of a file, rejecting SMPTE timecode files.
pub fn ticks_per_beat(timing: Timing) -> Result<u16, SplitError> {
    match timing {
        Timing::Metrical(ticks_per_beat) => Ok(ticks_per_beat.as_int()),
        Timing::Timecode(fps, _) => Err(SplitError::UnsupportedTiming { fps: fps.as_int() }),
    }
}

/// Splits a parsed file into one file per active channel. `base_name` is the
/// source file name without its extension.
pub fn split_smf<'a>(
    smf: &Smf<'a>,
    base_name: &str,
    settings: &Settings,
) -> Result<Vec<ChannelFile<'a>>, SplitError> {
    let ticks_per_beat = ticks_per_beat(smf.header.timing)?;
    let events = merged_events(smf, settings.merge);
    debug!(
        file = base_name,
        tracks = smf.tracks.len(),
        events = events.len(),
        merge = %settings.merge.resolve(smf.header.format),
        "Demultiplexing"
    );

    let demultiplexed = demultiplex(events, &settings.options, ticks_per_beat);
    Ok(assemble::assemble(
        demultiplexed,
        ticks_per_beat,
        base_name,
        &settings.output_dir,
        settings.grouping,
    ))
}

/// Splits the raw bytes of a MIDI file.
pub fn split_bytes<'a>(
    bytes: &'a [u8],
    base_name: &str,
    settings: &Settings,
) -> Result<Vec<ChannelFile<'a>>, SplitError> {
    let smf = Smf::parse(bytes)?;
    split_smf(&smf, base_name, settings)
}

/// A short description of one channel of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub channel: u8,
    pub instrument: u8,
    pub events: usize,
    pub active: bool,
}

impl fmt::Display for ChannelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ch{:<2} instrument {:>3}, {} event(s){}",
            self.channel,
            self.instrument,
            self.events,
            if self.active { "" } else { " (no notes)" }
        )
    }
}

/// Describes every channel of the file that carries at least one event,
/// without applying any trimming or windowing.
pub fn summarize(smf: &Smf<'_>, merge: MergeMode) -> Result<Vec<ChannelSummary>, SplitError> {
    let ticks_per_beat = ticks_per_beat(smf.header.timing)?;
    let demultiplexed = demultiplex(
        merged_events(smf, merge),
        &Options::default(),
        ticks_per_beat,
    );

    Ok((0..NUM_CHANNELS)
        .filter(|channel| demultiplexed.channel_events(*channel) > 0)
        .map(|channel| {
            let state = demultiplexed.state(channel);
            ChannelSummary {
                channel: channel as u8,
                instrument: state.instrument,
                events: demultiplexed.channel_events(channel),
                active: state.active,
            }
        })
        .collect())
}

/// Returns the first tempo of the file in playback order.
pub fn initial_tempo(smf: &Smf<'_>, merge: MergeMode) -> u32 {
    merged_events(smf, merge)
        .iter()
        .find_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => Some(tempo.as_int()),
            _ => None,
        })
        .unwrap_or(DEFAULT_TEMPO)
}

/// Returns the name of the source file without its extension.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed".to_string())
}
