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
use midly::{MetaMessage, MidiMessage, TrackEventKind};

/// The kind of an event that has no channel and is copied to every output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    /// A tempo change, in microseconds per quarter note.
    Tempo(u32),
    EndOfTrack,
    /// Purely informational meta events such as lyrics or markers.
    Informational,
    /// Any other meta event (time signature, key signature, ...).
    Meta,
    /// System exclusive and escape sequences.
    SysEx,
}

/// The result of classifying a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// The event is discarded entirely.
    Dropped,
    /// The event belongs to a single channel.
    Channel { channel: u8, message: MidiMessage },
    /// The event belongs to every channel.
    Global(GlobalKind),
}

/// Returns true for meta events that carry no playback information and may be
/// suppressed: text, lyrics, copyright, track names, markers and cue points.
pub fn is_informational(meta: &MetaMessage<'_>) -> bool {
    matches!(
        meta,
        MetaMessage::Text(_)
            | MetaMessage::Lyric(_)
            | MetaMessage::Copyright(_)
            | MetaMessage::TrackName(_)
            | MetaMessage::Marker(_)
            | MetaMessage::CuePoint(_)
    )
}

/// Classifies an event as channel scoped or global. Informational meta events
/// are dropped when `suppress_meta` is set.
pub fn classify(kind: &TrackEventKind<'_>, suppress_meta: bool) -> Classified {
    match kind {
        TrackEventKind::Midi { channel, message } => Classified::Channel {
            channel: channel.as_int(),
            message: *message,
        },
        TrackEventKind::Meta(meta) if is_informational(meta) => {
            if suppress_meta {
                Classified::Dropped
            } else {
                Classified::Global(GlobalKind::Informational)
            }
        }
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
            Classified::Global(GlobalKind::Tempo(tempo.as_int()))
        }
        TrackEventKind::Meta(MetaMessage::EndOfTrack) => Classified::Global(GlobalKind::EndOfTrack),
        TrackEventKind::Meta(_) => Classified::Global(GlobalKind::Meta),
        TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => {
            Classified::Global(GlobalKind::SysEx)
        }
    }
}
