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

/// The number of MIDI channels.
pub const NUM_CHANNELS: usize = 16;

/// The instrument a channel reports until it sees a program change.
pub const DEFAULT_INSTRUMENT: u8 = 1;

/// Per-channel bookkeeping for a single demultiplexing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Ticks accumulated since this channel last received an event.
    pub carried_ticks: u64,
    /// Sum of the (possibly trimmed) ticks of every event seen on this channel,
    /// kept or not. Compared against the offset/cutoff window.
    pub total_ticks_emitted: u64,
    /// Whether a note on has been seen on this channel.
    pub active: bool,
    /// The last program change seen on this channel.
    pub instrument: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        ChannelState {
            carried_ticks: 0,
            total_ticks_emitted: 0,
            active: false,
            instrument: DEFAULT_INSTRUMENT,
        }
    }
}

impl ChannelState {
    /// Moves the channel forward by the delta of an event that belongs to
    /// another channel.
    pub fn carry(&mut self, ticks: u64) {
        self.carried_ticks = self.carried_ticks.saturating_add(ticks);
    }

    /// Returns the ticks since this channel last spoke, including `ticks`, and
    /// resets the carry.
    pub fn take_carried(&mut self, ticks: u64) -> u64 {
        let elapsed = self.carried_ticks.saturating_add(ticks);
        self.carried_ticks = 0;
        elapsed
    }
}
