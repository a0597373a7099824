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

//! Event builders and file helpers shared by the unit tests.

use std::error::Error;
use std::path::Path;

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

pub const TICKS_PER_BEAT: u16 = 480;

fn midi(channel: u8, message: MidiMessage, delta: u32) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(channel),
            message,
        },
    }
}

fn meta(message: MetaMessage<'static>, delta: u32) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

pub fn note_on(channel: u8, key: u8, delta: u32) -> TrackEvent<'static> {
    midi(
        channel,
        MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(100),
        },
        delta,
    )
}

pub fn note_off(channel: u8, key: u8, delta: u32) -> TrackEvent<'static> {
    midi(
        channel,
        MidiMessage::NoteOff {
            key: u7::new(key),
            vel: u7::new(0),
        },
        delta,
    )
}

pub fn program_change(channel: u8, program: u8, delta: u32) -> TrackEvent<'static> {
    midi(
        channel,
        MidiMessage::ProgramChange {
            program: u7::new(program),
        },
        delta,
    )
}

pub fn control_change(channel: u8, controller: u8, value: u8, delta: u32) -> TrackEvent<'static> {
    midi(
        channel,
        MidiMessage::Controller {
            controller: u7::new(controller),
            value: u7::new(value),
        },
        delta,
    )
}

pub fn tempo(tempo: u32, delta: u32) -> TrackEvent<'static> {
    meta(MetaMessage::Tempo(u24::new(tempo)), delta)
}

pub fn end_of_track(delta: u32) -> TrackEvent<'static> {
    meta(MetaMessage::EndOfTrack, delta)
}

pub fn lyric(text: &'static [u8], delta: u32) -> TrackEvent<'static> {
    meta(MetaMessage::Lyric(text), delta)
}

/// Returns only the channel events of a track.
pub fn channel_events<'a>(track: &[TrackEvent<'a>]) -> Vec<TrackEvent<'a>> {
    track
        .iter()
        .filter(|event| matches!(event.kind, TrackEventKind::Midi { .. }))
        .copied()
        .collect()
}

/// Returns the delta of every event in a track.
pub fn deltas(track: &[TrackEvent<'_>]) -> Vec<u32> {
    track.iter().map(|event| event.delta.as_int()).collect()
}

/// Writes a metrical MIDI file with the given tracks.
pub fn write_smf(
    path: &Path,
    format: Format,
    tracks: Vec<Vec<TrackEvent<'static>>>,
) -> Result<(), Box<dyn Error>> {
    let mut smf = Smf::new(Header::new(
        format,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));
    smf.tracks = tracks;
    smf.save(path)?;
    Ok(())
}
