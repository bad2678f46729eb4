//! VGM header parsing and encoding
//!
//! The VGM header grew over the format's lifetime. Each field is described once in
//! [`HEADER_FIELDS`] by its byte offset, width and the first version that defines it. Reading
//! walks that table: a field the file's version does not define is left at zero, and so is any
//! field whose offset lies at or beyond the start of the command stream (a 1.50+ file may ship
//! a header shorter than its version implies).
//!
//! Format details (little-endian):
//! - 0x00 `"Vgm "` magic, 0x04 EOF offset (relative), 0x08 BCD version
//! - 0x0C SN76489 clock, 0x14 GD3 offset (relative), 0x18 total samples
//! - 0x1C loop offset (relative), 0x20 loop samples, 0x24 rate (1.01)
//! - 0x28 noise feedback (u16), 0x2A shift register width (u8) (1.10), 0x2B flags (u8) (1.51)
//! - 0x34 data offset (relative) (1.50)
//! - 0x7C volume modifier, 0x7E loop base (1.60), 0x7F loop modifier (1.51)
//! - 0xBC extra header offset (relative) (1.70)

use crate::sn76489::NoiseConfig;
use crate::{Result, Sn76489Error};
use bitflags::bitflags;
use serde::Serialize;

/// Container magic
pub const VGM_MAGIC: &[u8; 4] = b"Vgm ";

/// Command stream start for files without a data offset
pub const LEGACY_DATA_START: usize = 0x40;

/// Largest header layout any supported version defines
pub const MAX_HEADER_SIZE: usize = 0x100;

/// Versions this parser understands (BCD)
pub const SUPPORTED_VERSIONS: [u32; 9] = [
    0x100, 0x101, 0x110, 0x150, 0x151, 0x160, 0x161, 0x170, 0x171,
];

/// Sample clock all VGM timing is expressed in
pub const VGM_SAMPLE_RATE: u32 = 44_100;

/// Noise feedback pattern assumed for files older than 1.10
pub const DEFAULT_FEEDBACK: u16 = 0x0009;

/// Shift register width assumed for files older than 1.10
pub const DEFAULT_SHIFT_WIDTH: u8 = 16;

bitflags! {
    /// SN76489 flags byte (header offset 0x2B)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Sn76489Flags: u8 {
        /// A period of 0 is treated as 0x400
        const FREQ_ZERO_IS_0X400 = 0x01;
        /// Output is negated
        const NEGATE_OUTPUT = 0x02;
        /// Game Gear stereo disabled
        const STEREO_OFF = 0x04;
        /// Internal clock divider disabled
        const CLOCK_DIVIDER_OFF = 0x08;
    }
}

/// Every header field this parser knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// Relative offset of the end of file
    EofOffset,
    /// BCD version
    Version,
    /// SN76489 input clock in Hz
    Sn76489Clock,
    /// YM2413 clock in Hz (only reported)
    Ym2413Clock,
    /// Relative offset of the GD3 tag
    Gd3Offset,
    /// Total song length in 44.1 kHz samples
    TotalSamples,
    /// Relative offset of the loop point
    LoopOffset,
    /// Loop length in samples
    LoopSamples,
    /// Recording rate in Hz (50, 60 or 0 for unknown)
    Rate,
    /// White noise feedback tap mask
    Sn76489Feedback,
    /// Noise shift register width
    ShiftRegisterWidth,
    /// Flags byte
    Sn76489Flags,
    /// YM2612 clock in Hz (only reported)
    Ym2612Clock,
    /// YM2151 clock in Hz (only reported)
    Ym2151Clock,
    /// Relative offset of the command stream
    DataOffset,
    /// Volume modifier
    VolumeModifier,
    /// Loop base
    LoopBase,
    /// Loop modifier
    LoopModifier,
    /// Relative offset of the extra header
    ExtraHeaderOffset,
}

/// Layout entry: where a field lives and since when
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field
    pub field: HeaderField,
    /// Absolute byte offset in the header
    pub offset: usize,
    /// Width in bytes (1, 2 or 4)
    pub width: usize,
    /// First version defining the field
    pub since: u32,
}

const fn spec(field: HeaderField, offset: usize, width: usize, since: u32) -> FieldSpec {
    FieldSpec {
        field,
        offset,
        width,
        since,
    }
}

/// Per-version header layout
pub const HEADER_FIELDS: [FieldSpec; 19] = [
    spec(HeaderField::EofOffset, 0x04, 4, 0x100),
    spec(HeaderField::Version, 0x08, 4, 0x100),
    spec(HeaderField::Sn76489Clock, 0x0C, 4, 0x100),
    spec(HeaderField::Ym2413Clock, 0x10, 4, 0x100),
    spec(HeaderField::Gd3Offset, 0x14, 4, 0x100),
    spec(HeaderField::TotalSamples, 0x18, 4, 0x100),
    spec(HeaderField::LoopOffset, 0x1C, 4, 0x100),
    spec(HeaderField::LoopSamples, 0x20, 4, 0x100),
    spec(HeaderField::Rate, 0x24, 4, 0x101),
    spec(HeaderField::Sn76489Feedback, 0x28, 2, 0x110),
    spec(HeaderField::ShiftRegisterWidth, 0x2A, 1, 0x110),
    spec(HeaderField::Sn76489Flags, 0x2B, 1, 0x151),
    spec(HeaderField::Ym2612Clock, 0x2C, 4, 0x110),
    spec(HeaderField::Ym2151Clock, 0x30, 4, 0x110),
    spec(HeaderField::DataOffset, 0x34, 4, 0x150),
    spec(HeaderField::VolumeModifier, 0x7C, 1, 0x160),
    spec(HeaderField::LoopBase, 0x7E, 1, 0x160),
    spec(HeaderField::LoopModifier, 0x7F, 1, 0x151),
    spec(HeaderField::ExtraHeaderOffset, 0xBC, 4, 0x170),
];

/// Decoded VGM header
///
/// Offsets are kept exactly as stored (relative to their own field); use the `*_position`
/// accessors for absolute file positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VgmHeader {
    /// Relative EOF offset
    pub eof_offset: u32,
    /// BCD version (0x171 = 1.71)
    pub version: u32,
    /// SN76489 input clock in Hz (bit 31 = dual chip, masked by [`VgmHeader::clock_hz`])
    pub sn76489_clock: u32,
    /// YM2413 clock
    pub ym2413_clock: u32,
    /// Relative GD3 offset (0 = no tag)
    pub gd3_offset: u32,
    /// Total length in 44.1 kHz samples
    pub total_samples: u32,
    /// Relative loop offset (0 = no loop)
    pub loop_offset: u32,
    /// Loop length in samples
    pub loop_samples: u32,
    /// Recording rate in Hz
    pub rate: u32,
    /// White noise feedback taps (0 when the file does not declare them)
    pub sn76489_feedback: u16,
    /// Noise shift register width (0 when the file does not declare it)
    pub shift_register_width: u8,
    /// Raw flags byte
    pub sn76489_flags: u8,
    /// YM2612 clock
    pub ym2612_clock: u32,
    /// YM2151 clock
    pub ym2151_clock: u32,
    /// Relative command stream offset (0 = legacy 0x40)
    pub data_offset: u32,
    /// Volume modifier
    pub volume_modifier: u8,
    /// Loop base
    pub loop_base: u8,
    /// Loop modifier
    pub loop_modifier: u8,
    /// Relative extra header offset
    pub extra_header_offset: u32,
}

fn read_le(data: &[u8], offset: usize, width: usize) -> u32 {
    data[offset..offset + width]
        .iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn write_le(buf: &mut [u8], offset: usize, width: usize, value: u32) {
    for (i, byte) in buf[offset..offset + width].iter_mut().enumerate() {
        *byte = (value >> (8 * i)) as u8;
    }
}

impl VgmHeader {
    /// A header for `version` with every other field zero
    pub fn new(version: u32) -> Self {
        VgmHeader {
            version,
            ..Default::default()
        }
    }

    /// Field accessor used by the table-driven reader and writer
    pub fn get(&self, field: HeaderField) -> u32 {
        match field {
            HeaderField::EofOffset => self.eof_offset,
            HeaderField::Version => self.version,
            HeaderField::Sn76489Clock => self.sn76489_clock,
            HeaderField::Ym2413Clock => self.ym2413_clock,
            HeaderField::Gd3Offset => self.gd3_offset,
            HeaderField::TotalSamples => self.total_samples,
            HeaderField::LoopOffset => self.loop_offset,
            HeaderField::LoopSamples => self.loop_samples,
            HeaderField::Rate => self.rate,
            HeaderField::Sn76489Feedback => self.sn76489_feedback as u32,
            HeaderField::ShiftRegisterWidth => self.shift_register_width as u32,
            HeaderField::Sn76489Flags => self.sn76489_flags as u32,
            HeaderField::Ym2612Clock => self.ym2612_clock,
            HeaderField::Ym2151Clock => self.ym2151_clock,
            HeaderField::DataOffset => self.data_offset,
            HeaderField::VolumeModifier => self.volume_modifier as u32,
            HeaderField::LoopBase => self.loop_base as u32,
            HeaderField::LoopModifier => self.loop_modifier as u32,
            HeaderField::ExtraHeaderOffset => self.extra_header_offset,
        }
    }

    /// Field mutator, narrower fields are truncated to their width
    pub fn set(&mut self, field: HeaderField, value: u32) {
        match field {
            HeaderField::EofOffset => self.eof_offset = value,
            HeaderField::Version => self.version = value,
            HeaderField::Sn76489Clock => self.sn76489_clock = value,
            HeaderField::Ym2413Clock => self.ym2413_clock = value,
            HeaderField::Gd3Offset => self.gd3_offset = value,
            HeaderField::TotalSamples => self.total_samples = value,
            HeaderField::LoopOffset => self.loop_offset = value,
            HeaderField::LoopSamples => self.loop_samples = value,
            HeaderField::Rate => self.rate = value,
            HeaderField::Sn76489Feedback => self.sn76489_feedback = value as u16,
            HeaderField::ShiftRegisterWidth => self.shift_register_width = value as u8,
            HeaderField::Sn76489Flags => self.sn76489_flags = value as u8,
            HeaderField::Ym2612Clock => self.ym2612_clock = value,
            HeaderField::Ym2151Clock => self.ym2151_clock = value,
            HeaderField::DataOffset => self.data_offset = value,
            HeaderField::VolumeModifier => self.volume_modifier = value as u8,
            HeaderField::LoopBase => self.loop_base = value as u8,
            HeaderField::LoopModifier => self.loop_modifier = value as u8,
            HeaderField::ExtraHeaderOffset => self.extra_header_offset = value,
        }
    }

    /// Parse the header of an (already decompressed) VGM image
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < LEGACY_DATA_START {
            return Err(Sn76489Error::FormatError(format!(
                "VGM file too small for header ({} bytes)",
                data.len()
            )));
        }
        if &data[0..4] != VGM_MAGIC {
            return Err(Sn76489Error::FormatError("Invalid VGM magic number".into()));
        }

        let version = read_le(data, 0x08, 4);
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(Sn76489Error::VersionError { version });
        }

        let mut header = VgmHeader::new(version);
        if version >= 0x150 {
            header.data_offset = read_le(data, 0x34, 4);
        }

        let data_start = header.data_start();
        if data_start > data.len() {
            return Err(Sn76489Error::FormatError(format!(
                "VGM data offset 0x{:X} beyond end of file ({} bytes)",
                data_start,
                data.len()
            )));
        }

        for spec in HEADER_FIELDS.iter().filter(|s| s.since <= version) {
            let value = if spec.offset + spec.width > data_start {
                0
            } else {
                read_le(data, spec.offset, spec.width)
            };
            header.set(spec.field, value);
        }
        // Keep the offset that located the stream even if it overlaps the stream itself
        if version >= 0x150 {
            header.data_offset = read_le(data, 0x34, 4);
        }

        Ok(header)
    }

    /// Header length a writer should emit for this version
    pub fn layout_size(&self) -> usize {
        match self.version {
            v if v < 0x151 => LEGACY_DATA_START,
            v if v < 0x170 => 0x80,
            _ => MAX_HEADER_SIZE,
        }
    }

    /// Encode the header fields defined by this version
    ///
    /// The buffer is as long as the command stream start. Fields at or beyond that start are
    /// not written; `data_offset` is written as stored, so callers building a short header
    /// for a later version set it themselves.
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self.data_start().max(LEGACY_DATA_START);
        let mut buf = vec![0u8; size];
        buf[0..4].copy_from_slice(VGM_MAGIC);
        for spec in HEADER_FIELDS.iter().filter(|s| s.since <= self.version) {
            if spec.offset + spec.width <= size {
                write_le(&mut buf, spec.offset, spec.width, self.get(spec.field));
            }
        }
        buf
    }

    /// Absolute position of the command stream
    pub fn data_start(&self) -> usize {
        if self.version < 0x150 || self.data_offset == 0 {
            LEGACY_DATA_START
        } else {
            0x34 + self.data_offset as usize
        }
    }

    /// Absolute position of the GD3 tag, if any
    pub fn gd3_position(&self) -> Option<usize> {
        (self.gd3_offset != 0).then(|| 0x14 + self.gd3_offset as usize)
    }

    /// Absolute end of file position, if declared
    pub fn eof_position(&self) -> Option<usize> {
        (self.eof_offset != 0).then(|| 0x04 + self.eof_offset as usize)
    }

    /// Absolute loop position, if any
    pub fn loop_position(&self) -> Option<usize> {
        (self.loop_offset != 0).then(|| 0x1C + self.loop_offset as usize)
    }

    /// SN76489 clock without the dual-chip bit
    pub fn clock_hz(&self) -> u32 {
        self.sn76489_clock & 0x3FFF_FFFF
    }

    /// Typed view of the flags byte
    pub fn flags(&self) -> Sn76489Flags {
        Sn76489Flags::from_bits_truncate(self.sn76489_flags)
    }

    /// Noise register layout, falling back to the pre-1.10 defaults
    pub fn noise_config(&self) -> NoiseConfig {
        let taps = if self.sn76489_feedback == 0 {
            DEFAULT_FEEDBACK
        } else {
            self.sn76489_feedback
        };
        let width = if self.shift_register_width == 0 {
            DEFAULT_SHIFT_WIDTH
        } else {
            self.shift_register_width
        };
        NoiseConfig { width, taps }
    }

    /// Frame count implied by `total_samples` at `rate` Hz
    pub fn expected_frames(&self, rate: u32) -> u64 {
        self.total_samples as u64 * rate as u64 / VGM_SAMPLE_RATE as u64
    }

    /// Version as `major.minor`
    pub fn version_string(&self) -> String {
        crate::bcd_version(&self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(version: u32) -> VgmHeader {
        let mut h = VgmHeader::new(version);
        h.eof_offset = 0x1234;
        h.sn76489_clock = 3_579_545;
        h.ym2413_clock = 0;
        h.gd3_offset = 0x0200;
        h.total_samples = 44_100 * 3;
        h.loop_offset = 0x20;
        h.loop_samples = 44_100;
        if version >= 0x101 {
            h.rate = 60;
        }
        if version >= 0x110 {
            h.sn76489_feedback = 0x0003;
            h.shift_register_width = 15;
            h.ym2612_clock = 7_670_453;
            h.ym2151_clock = 0;
        }
        if version >= 0x150 {
            h.data_offset = (h.layout_size() - 0x34) as u32;
        }
        if version >= 0x151 {
            h.sn76489_flags = 0x09;
            h.loop_modifier = 0x10;
        }
        if version >= 0x160 {
            h.volume_modifier = 0x20;
            h.loop_base = 0x02;
        }
        if version >= 0x170 {
            h.extra_header_offset = 0;
        }
        h
    }

    #[test]
    fn test_header_round_trip_all_versions() {
        for &version in SUPPORTED_VERSIONS.iter() {
            let header = sample_header(version);
            let bytes = header.to_bytes();
            let parsed = VgmHeader::parse(&bytes).unwrap();
            assert_eq!(parsed, header, "version {:x}", version);
        }
    }

    #[test]
    fn test_short_header_fields_read_as_zero() {
        // A 1.71 file whose command stream starts at 0x40
        let mut header = sample_header(0x171);
        header.data_offset = 0x0C;
        let mut bytes = header.to_bytes();
        assert_eq!(bytes.len(), 0x40);
        // Command bytes that would overlap the 1.51+ fields if read as header
        bytes.extend_from_slice(&[0x66; 0xC0]);

        let parsed = VgmHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.data_start(), 0x40);
        assert_eq!(parsed.volume_modifier, 0);
        assert_eq!(parsed.loop_base, 0);
        assert_eq!(parsed.loop_modifier, 0);
        assert_eq!(parsed.extra_header_offset, 0);
        assert_eq!(parsed.rate, 60);
        assert_eq!(parsed.sn76489_flags, 0x09);
    }

    #[test]
    fn test_fields_not_in_version_are_zero() {
        let mut bytes = vec![0u8; 0x40];
        bytes[0..4].copy_from_slice(b"Vgm ");
        bytes[0x08..0x0C].copy_from_slice(&0x100u32.to_le_bytes());
        bytes[0x24..0x28].copy_from_slice(&50u32.to_le_bytes());
        bytes[0x28..0x2A].copy_from_slice(&0x0003u16.to_le_bytes());

        let parsed = VgmHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.rate, 0);
        assert_eq!(parsed.sn76489_feedback, 0);
        assert_eq!(parsed.noise_config(), NoiseConfig::SEGA);
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = VgmHeader::new(0x171).to_bytes();
        bytes[0x08..0x0C].copy_from_slice(&0x172u32.to_le_bytes());
        let err = VgmHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, Sn76489Error::VersionError { version: 0x172 }));
        assert!(err.to_string().contains("1.72"));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = VgmHeader::new(0x150).to_bytes();
        bytes[0] = b'X';
        let err = VgmHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, Sn76489Error::FormatError(_)));
    }

    #[test]
    fn test_too_small() {
        let err = VgmHeader::parse(b"Vgm \x00\x00").unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn test_data_offset_beyond_file() {
        let mut header = VgmHeader::new(0x150);
        header.data_offset = 0x1000;
        let mut bytes = vec![0u8; 0x40];
        bytes[0..4].copy_from_slice(b"Vgm ");
        bytes[0x08..0x0C].copy_from_slice(&0x150u32.to_le_bytes());
        bytes[0x34..0x38].copy_from_slice(&header.data_offset.to_le_bytes());
        assert!(VgmHeader::parse(&bytes).is_err());
    }

    #[test]
    fn test_positions_and_derived_values() {
        let header = sample_header(0x151);
        assert_eq!(header.data_start(), 0x80);
        assert_eq!(header.gd3_position(), Some(0x214));
        assert_eq!(header.eof_position(), Some(0x1238));
        assert_eq!(header.loop_position(), Some(0x3C));
        assert_eq!(header.expected_frames(60), 180);
        assert!(header.flags().contains(Sn76489Flags::CLOCK_DIVIDER_OFF));
        assert!(header.flags().contains(Sn76489Flags::FREQ_ZERO_IS_0X400));
        assert_eq!(header.noise_config(), NoiseConfig::TI);
        assert_eq!(header.version_string(), "1.51");

        let legacy = VgmHeader::new(0x101);
        assert_eq!(legacy.data_start(), 0x40);
        assert_eq!(legacy.gd3_position(), None);
    }

    #[test]
    fn test_dual_chip_bit_masked() {
        let mut header = VgmHeader::new(0x150);
        header.sn76489_clock = 0x4000_0000 | 3_579_545;
        assert_eq!(header.clock_hz(), 3_579_545);
    }
}
