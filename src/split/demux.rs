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
use midly::{MidiMessage, Track, TrackEvent};
use serde::Deserialize;
use tracing::trace;

use crate::timing::{seconds_to_ticks, DEFAULT_TEMPO};

use super::classify::{classify, Classified, GlobalKind};
use super::state::{ChannelState, NUM_CHANNELS};
use super::to_delta;

/// The longest silence, in ticks, kept between two events of a channel when
/// trimming is enabled.
pub const MAX_SILENCE_TICKS: u64 = 10_000;

/// Options controlling a demultiplexing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Clamp the silence between two events of a channel to `MAX_SILENCE_TICKS`.
    pub trim_silence: bool,
    /// Drop informational meta events (lyrics, markers, ...).
    pub suppress_meta: bool,
    /// Drop each channel's events up to this many seconds in.
    pub offset_seconds: Option<u32>,
    /// Drop each channel's events from this many seconds in.
    pub cutoff_seconds: Option<u32>,
}

/// Splits a merged event stream into one stream per channel.
///
/// Deltas in the merged stream count ticks since the previous event of any
/// channel. Each channel keeps a carry of the ticks that went by on other
/// channels so its own events can be rewritten as ticks since the previous
/// event on that channel.
pub struct Demultiplexer<'a> {
    options: Options,
    ticks_per_beat: u16,
    tempo: u32,
    states: [ChannelState; NUM_CHANNELS],
    tracks: Vec<Track<'a>>,
    global_events: usize,
}

impl<'a> Demultiplexer<'a> {
    /// Creates a demultiplexer for a file with the given resolution. The tempo
    /// starts at the default of 120 BPM.
    pub fn new(options: Options, ticks_per_beat: u16) -> Demultiplexer<'a> {
        Demultiplexer {
            options,
            ticks_per_beat,
            tempo: DEFAULT_TEMPO,
            states: [ChannelState::default(); NUM_CHANNELS],
            tracks: vec![Track::new(); NUM_CHANNELS],
            global_events: 0,
        }
    }

    /// Consumes the next event of the merged stream.
    pub fn push(&mut self, event: TrackEvent<'a>) {
        match classify(&event.kind, self.options.suppress_meta) {
            Classified::Dropped => {}
            Classified::Global(kind) => {
                // Global events are shared verbatim by every channel.
                for track in self.tracks.iter_mut() {
                    track.push(event);
                }
                self.global_events += 1;
                if let GlobalKind::Tempo(tempo) = kind {
                    self.tempo = tempo;
                }
            }
            Classified::Channel { channel, message } => {
                self.push_channel_event(usize::from(channel), message, event)
            }
        }
    }

    fn push_channel_event(&mut self, channel: usize, message: MidiMessage, event: TrackEvent<'a>) {
        let delta = u64::from(event.delta.as_int());

        // Every other channel carries this interval, active or not.
        let mut new_time = 0;
        for (index, state) in self.states.iter_mut().enumerate() {
            if index == channel {
                new_time = state.take_carried(delta);
            } else {
                state.carry(delta);
            }
        }

        if self.options.trim_silence && new_time > MAX_SILENCE_TICKS {
            new_time = MAX_SILENCE_TICKS;
        }

        let state = &mut self.states[channel];

        // Activation takes effect from the next event, so the first note on is
        // itself written without leading silence.
        let emitted = if state.active { new_time } else { 0 };
        match message {
            MidiMessage::NoteOn { .. } => state.active = true,
            MidiMessage::ProgramChange { program } => state.instrument = program.as_int(),
            _ => {}
        }
        state.total_ticks_emitted = state.total_ticks_emitted.saturating_add(new_time);

        let total = state.total_ticks_emitted;
        if self.outside_window(total) {
            trace!(channel, total, "Dropping event outside of window");
            return;
        }

        self.tracks[channel].push(TrackEvent {
            delta: to_delta(emitted),
            kind: event.kind,
        });
    }

    /// Checks the channel's running total against the cutoff and offset, using
    /// whatever tempo is current.
    fn outside_window(&self, total: u64) -> bool {
        if let Some(cutoff) = self.options.cutoff_seconds {
            if total >= seconds_to_ticks(cutoff, self.ticks_per_beat, self.tempo) {
                return true;
            }
        }
        if let Some(offset) = self.options.offset_seconds {
            if total <= seconds_to_ticks(offset, self.ticks_per_beat, self.tempo) {
                return true;
            }
        }
        false
    }

    /// Finishes the pass and returns the per-channel streams.
    pub fn finish(self) -> Demultiplexed<'a> {
        Demultiplexed {
            tracks: self.tracks,
            states: self.states,
            global_events: self.global_events,
        }
    }
}

/// The per-channel streams produced by a demultiplexing pass.
pub struct Demultiplexed<'a> {
    tracks: Vec<Track<'a>>,
    states: [ChannelState; NUM_CHANNELS],
    global_events: usize,
}

impl<'a> Demultiplexed<'a> {
    /// Returns the events written to the given channel, including global events.
    pub fn track(&self, channel: usize) -> &[TrackEvent<'a>] {
        &self.tracks[channel]
    }

    /// Returns the final state of the given channel.
    pub fn state(&self, channel: usize) -> &ChannelState {
        &self.states[channel]
    }

    /// Returns the number of global events copied into every channel.
    pub fn global_events(&self) -> usize {
        self.global_events
    }

    /// Returns the number of channel events kept for the given channel.
    pub fn channel_events(&self, channel: usize) -> usize {
        self.tracks[channel].len() - self.global_events
    }

    /// Returns the channels that saw at least one note on.
    pub fn active_channels(&self) -> impl Iterator<Item = usize> + '_ {
        (0..NUM_CHANNELS).filter(|channel| self.states[*channel].active)
    }

    /// Consumes the result, yielding each channel's stream and final state.
    pub fn into_channels(self) -> impl Iterator<Item = (usize, Track<'a>, ChannelState)> {
        let states = self.states;
        self.tracks
            .into_iter()
            .enumerate()
            .map(move |(channel, track)| (channel, track, states[channel]))
    }
}

/// Demultiplexes an ordered, merged event stream in a single pass.
pub fn demultiplex<'a, I>(events: I, options: &Options, ticks_per_beat: u16) -> Demultiplexed<'a>
where
    I: IntoIterator<Item = TrackEvent<'a>>,
{
    let mut demultiplexer = Demultiplexer::new(options.clone(), ticks_per_beat);
    for event in events {
        demultiplexer.push(event);
    }
    demultiplexer.finish()
}
