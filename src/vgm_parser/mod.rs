//! File Format Support
//!
//! Parsers for the two song formats the renderer consumes:
//! - VGM containers (header, GD3 tag, command stream), optionally gzip-wrapped
//! - Raw packet captures, used as a reference for the VGM frame builder
//!
//! Both produce the same thing: a sequence of [`Frame`]s, one per playback tick.

pub mod commands;
pub mod frames;
pub mod gd3;
pub mod header;
pub mod raw;

pub use commands::{decode_commands, encode_commands, Command, Opcode, StandardWait};
pub use frames::{build_frames, infer_rate, tick_samples, FrameStats};
pub use gd3::Gd3Tag;
pub use header::{HeaderField, Sn76489Flags, VgmHeader, SUPPORTED_VERSIONS, VGM_MAGIC};
pub use raw::{RawCapture, RawParser};

use crate::compression::decompress_if_needed;
use crate::{Result, Sn76489Error};

/// PSG bytes written during one playback tick
pub type Frame = Vec<u8>;

/// Trait for parsing song formats into frame sequences
pub trait FormatParser {
    /// Parse file data and return frames
    fn parse(&self, data: &[u8]) -> Result<Vec<Frame>>;

    /// Get parser name
    fn name(&self) -> &str;
}

/// A parsed VGM container
#[derive(Debug, Clone)]
pub struct VgmFile {
    /// Header
    pub header: VgmHeader,
    /// Metadata tag, when the file has one
    pub gd3: Option<Gd3Tag>,
    /// Decoded command stream
    pub commands: Vec<Command>,
}

impl VgmFile {
    /// Parse a VGM image, unwrapping gzip framing when the magic is absent
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.starts_with(VGM_MAGIC) {
            return Self::parse_plain(data);
        }
        let unpacked = decompress_if_needed(data).map_err(|e| {
            Sn76489Error::FormatError(format!("Invalid VGM magic and unusable gzip framing ({})", e))
        })?;
        if !unpacked.starts_with(VGM_MAGIC) {
            return Err(Sn76489Error::FormatError(
                "Invalid VGM magic number (not a VGM or VGZ file)".into(),
            ));
        }
        Self::parse_plain(&unpacked)
    }

    fn parse_plain(data: &[u8]) -> Result<Self> {
        let header = VgmHeader::parse(data)?;
        let start = header.data_start();

        let gd3_pos = header.gd3_position().filter(|&p| p > start);
        let gd3 = match gd3_pos {
            Some(pos) => {
                let tag = data.get(pos..).ok_or_else(|| {
                    Sn76489Error::FormatError(format!(
                        "GD3 offset 0x{:X} beyond end of file ({} bytes)",
                        pos,
                        data.len()
                    ))
                })?;
                Some(Gd3Tag::parse(tag)?)
            }
            None => None,
        };

        let mut end = data.len();
        if let Some(eof) = header.eof_position() {
            end = end.min(eof);
        }
        if let Some(pos) = gd3_pos {
            end = end.min(pos);
        }
        let commands = decode_commands(&data[start..end.max(start)])?;

        Ok(VgmFile {
            header,
            gd3,
            commands,
        })
    }

    /// Playback rate: header value, else inferred from the stream
    pub fn rate(&self) -> u32 {
        infer_rate(self.header.rate, &self.commands)
    }

    /// Group the command stream into frames at the playback rate
    pub fn frames(&self) -> (Vec<Frame>, FrameStats) {
        build_frames(&self.commands, tick_samples(self.rate()))
    }
}

/// VGM [`FormatParser`]
pub struct VgmParser;

impl VgmParser {
    /// Create a new VGM parser
    pub fn new() -> Self {
        VgmParser
    }
}

impl Default for VgmParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for VgmParser {
    fn parse(&self, data: &[u8]) -> Result<Vec<Frame>> {
        Ok(VgmFile::parse(data)?.frames().0)
    }

    fn name(&self) -> &str {
        "VGM Parser"
    }
}
