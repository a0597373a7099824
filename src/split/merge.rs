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

use midly::{Format, MetaMessage, Smf, Track, TrackEvent, TrackEventKind};
use serde::Deserialize;

use super::to_delta;

/// How the tracks of a file are combined into the single stream that gets split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Merge parallel files by time, concatenate everything else.
    #[default]
    Auto,
    /// Interleave all tracks by absolute time.
    Merge,
    /// Play the tracks back to back.
    Concatenate,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeMode::Auto => "auto",
            MergeMode::Merge => "merge",
            MergeMode::Concatenate => "concatenate",
        };
        write!(f, "{}", name)
    }
}

impl MergeMode {
    /// Resolves `Auto` against the format of the file.
    pub fn resolve(self, format: Format) -> MergeMode {
        match (self, format) {
            (MergeMode::Auto, Format::Parallel) => MergeMode::Merge,
            (MergeMode::Auto, _) => MergeMode::Concatenate,
            (mode, _) => mode,
        }
    }
}

/// Returns the events of every track of the file as one ordered stream.
pub fn merged_events<'a>(smf: &Smf<'a>, mode: MergeMode) -> Vec<TrackEvent<'a>> {
    match mode.resolve(smf.header.format) {
        MergeMode::Merge => merge(&smf.tracks),
        _ => concatenate(&smf.tracks),
    }
}

/// Appends the tracks one after another. Each end of track marker is removed
/// and its delta moved onto the next event, with a single marker at the end.
pub fn concatenate<'a>(tracks: &[Track<'a>]) -> Vec<TrackEvent<'a>> {
    let mut joined = Vec::with_capacity(tracks.iter().map(Vec::len).sum::<usize>() + 1);
    let mut pending = 0;

    for event in tracks.iter().flatten() {
        let delta = pending + u64::from(event.delta.as_int());
        if is_end_of_track(event) {
            pending = delta;
            continue;
        }
        joined.push(TrackEvent {
            delta: to_delta(delta),
            kind: event.kind,
        });
        pending = 0;
    }
    joined.push(TrackEvent {
        delta: to_delta(pending),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    joined
}

fn is_end_of_track(event: &TrackEvent<'_>) -> bool {
    matches!(event.kind, TrackEventKind::Meta(MetaMessage::EndOfTrack))
}

/// Interleaves the tracks by absolute tick. Events on the same tick keep
/// track order. The end of track markers are replaced by a single one placed
/// at the end of the longest track.
pub fn merge<'a>(tracks: &[Track<'a>]) -> Vec<TrackEvent<'a>> {
    let mut timed: Vec<(u64, TrackEvent<'a>)> = Vec::new();
    let mut end = 0;

    for track in tracks {
        let mut now = 0;
        for event in track {
            now += u64::from(event.delta.as_int());
            if !is_end_of_track(event) {
                timed.push((now, *event));
            }
        }
        end = end.max(now);
    }

    // sort_by_key is stable, which keeps the track order for ties.
    timed.sort_by_key(|(tick, _)| *tick);

    let mut merged = Vec::with_capacity(timed.len() + 1);
    let mut last = 0;
    for (tick, event) in timed {
        merged.push(TrackEvent {
            delta: to_delta(tick - last),
            kind: event.kind,
        });
        last = tick;
    }
    merged.push(TrackEvent {
        delta: to_delta(end - last),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    merged
}
