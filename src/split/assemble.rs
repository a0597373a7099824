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

use midly::num::u15;
use midly::{Format, Header, Smf, Timing};
use serde::Deserialize;

use super::demux::Demultiplexed;

/// The extension of every written file.
pub const OUTPUT_EXTENSION: &str = "mid";

/// How output files are grouped into subdirectories of the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// Everything goes directly into the output directory.
    #[default]
    #[serde(alias = "none")]
    #[value(alias = "none")]
    Flat,
    /// One directory per instrument number.
    Instrument,
    /// One directory per channel number.
    Channel,
    /// One directory per source file.
    File,
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Grouping::Flat => "flat",
            Grouping::Instrument => "instrument",
            Grouping::Channel => "channel",
            Grouping::File => "file",
        };
        write!(f, "{}", name)
    }
}

/// One channel of a source file, ready to be written.
pub struct ChannelFile<'a> {
    channel: u8,
    instrument: u8,
    path: PathBuf,
    smf: Smf<'a>,
}

impl<'a> ChannelFile<'a> {
    /// The channel this file was split from.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// The last program change seen on the channel.
    pub fn instrument(&self) -> u8 {
        self.instrument
    }

    /// Where the file should be written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The single track MIDI file holding the channel's events.
    pub fn smf(&self) -> &Smf<'a> {
        &self.smf
    }
}

/// Builds the output file name for a channel, e.g. `33_ch2_song.mid`.
pub fn file_name(instrument: u8, channel: u8, base_name: &str) -> String {
    format!(
        "{}_ch{}_{}.{}",
        instrument, channel, base_name, OUTPUT_EXTENSION
    )
}

/// Computes the destination of a channel file within the output directory.
pub fn destination(
    output_dir: &Path,
    grouping: Grouping,
    instrument: u8,
    channel: u8,
    base_name: &str,
) -> PathBuf {
    let folder = match grouping {
        Grouping::Flat => output_dir.to_path_buf(),
        Grouping::Instrument => output_dir.join(instrument.to_string()),
        Grouping::Channel => output_dir.join(channel.to_string()),
        Grouping::File => output_dir.join(base_name),
    };
    folder.join(file_name(instrument, channel, base_name))
}

/// Packages every active channel into its own single track file. Channels that
/// never played a note produce nothing.
pub fn assemble<'a>(
    demultiplexed: Demultiplexed<'a>,
    ticks_per_beat: u16,
    base_name: &str,
    output_dir: &Path,
    grouping: Grouping,
) -> Vec<ChannelFile<'a>> {
    demultiplexed
        .into_channels()
        .filter(|(_, _, state)| state.active)
        .map(|(channel, track, state)| {
            // Channels are always below 16.
            let channel = channel as u8;
            let mut smf = Smf::new(Header::new(
                Format::SingleTrack,
                Timing::Metrical(u15::new(ticks_per_beat)),
            ));
            smf.tracks.push(track);
            ChannelFile {
                channel,
                instrument: state.instrument,
                path: destination(output_dir, grouping, state.instrument, channel, base_name),
                smf,
            }
        })
        .collect()
}
