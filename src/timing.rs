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

/// Tempo assumed until the first tempo event, in microseconds per quarter note (120 BPM).
pub const DEFAULT_TEMPO: u32 = 500_000;

const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// Converts whole seconds to ticks at the given resolution and tempo, rounding
/// to the nearest tick.
pub fn seconds_to_ticks(seconds: u32, ticks_per_beat: u16, tempo: u32) -> u64 {
    // A zero tempo only shows up in malformed files. Treat it as the slowest
    // possible rate rather than dividing by zero.
    let tempo = f64::from(tempo.max(1));
    let ticks = f64::from(seconds) * MICROSECONDS_PER_SECOND * f64::from(ticks_per_beat) / tempo;
    ticks.round() as u64
}

/// Converts a tempo in microseconds per quarter note to beats per minute.
pub fn tempo_to_bpm(tempo: u32) -> f64 {
    60.0 * MICROSECONDS_PER_SECOND / f64::from(tempo.max(1))
}

#[cfg(test)]
mod test {
    use super::{seconds_to_ticks, tempo_to_bpm, DEFAULT_TEMPO};

    #[test]
    fn seconds_at_default_tempo() {
        assert_eq!(0, seconds_to_ticks(0, 480, DEFAULT_TEMPO));
        assert_eq!(960, seconds_to_ticks(1, 480, DEFAULT_TEMPO));
        assert_eq!(1920, seconds_to_ticks(2, 480, DEFAULT_TEMPO));
        assert_eq!(192, seconds_to_ticks(1, 96, DEFAULT_TEMPO));
    }

    #[test]
    fn seconds_follow_tempo() {
        // 60 BPM: one beat per second.
        assert_eq!(480, seconds_to_ticks(1, 480, 1_000_000));
        // 90 BPM: 1.5 beats per second.
        assert_eq!(720, seconds_to_ticks(1, 480, 666_667));
    }

    #[test]
    fn zero_tempo_does_not_divide_by_zero() {
        assert_eq!(480_000_000, seconds_to_ticks(1, 480, 0));
    }

    #[test]
    fn bpm() {
        assert_eq!(120.0, tempo_to_bpm(DEFAULT_TEMPO));
        assert_eq!(60.0, tempo_to_bpm(1_000_000));
    }
}
