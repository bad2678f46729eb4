//! Register write decoding
//!
//! The SN76489 has a single write port. Every byte is either a latch byte that selects a
//! register and carries its low bits, or a data byte that completes the latched tone period.
//!
//! **Latch byte (bit 7 = 1):** `1 c c t d d d d`
//! - `cc`: channel (00 = tone 1, 01 = tone 2, 10 = tone 3, 11 = noise)
//! - `t`: type (0 = tone period / noise control, 1 = attenuation)
//! - `dddd`: attenuation code, low 4 bits of a tone period, or the 3-bit noise control field
//!
//! **Data byte (bit 7 = 0):** `0 x d d d d d d`
//! - `dddddd`: high 6 bits of the period of the latched tone channel. Ignored when the latch
//!   points at an attenuator or at the noise control register.

use serde::{Deserialize, Serialize};

/// Channel addressed by a latch byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// Tone channel 1
    Tone1 = 0,
    /// Tone channel 2
    Tone2 = 1,
    /// Tone channel 3 (can also clock the noise divider)
    Tone3 = 2,
    /// Noise channel
    Noise = 3,
}

impl Channel {
    /// Decode the 2-bit channel field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Channel::Tone1,
            1 => Channel::Tone2,
            2 => Channel::Tone3,
            _ => Channel::Noise,
        }
    }

    /// Index into the chip's attenuator bank (0-3)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Register selected by the latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterKind {
    /// 10-bit tone period (tone channels only)
    TonePeriod,
    /// 4-bit attenuation code
    Attenuation,
    /// 3-bit noise control (noise channel only)
    NoiseControl,
}

/// The chip's latched register selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latch {
    /// Addressed channel
    pub channel: Channel,
    /// Addressed register kind
    pub kind: RegisterKind,
}

impl Latch {
    /// Decode channel and type bits of a latch byte
    pub fn from_byte(byte: u8) -> Self {
        let channel = Channel::from_bits(byte >> 5);
        let kind = if byte & 0x10 != 0 {
            RegisterKind::Attenuation
        } else if channel == Channel::Noise {
            RegisterKind::NoiseControl
        } else {
            RegisterKind::TonePeriod
        };
        Latch { channel, kind }
    }

    /// True when data bytes are routed to a tone period register
    #[inline]
    pub fn is_tone_period(&self) -> bool {
        self.kind == RegisterKind::TonePeriod
    }
}

impl Default for Latch {
    /// Power-on latch: tone 1 period
    fn default() -> Self {
        Latch {
            channel: Channel::Tone1,
            kind: RegisterKind::TonePeriod,
        }
    }
}

/// A decoded write-port byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    /// Latch byte with its 4-bit payload
    Latch {
        /// New latch selection
        latch: Latch,
        /// Low nibble
        data: u8,
    },
    /// Data byte with its 6-bit payload
    Data(u8),
}

impl RegisterWrite {
    /// Decode one byte written to the chip
    pub fn decode(byte: u8) -> Self {
        if byte & 0x80 != 0 {
            RegisterWrite::Latch {
                latch: Latch::from_byte(byte),
                data: byte & 0x0F,
            }
        } else {
            RegisterWrite::Data(byte & 0x3F)
        }
    }
}

/// Build the latch byte for a tone period write (low nibble)
pub fn tone_latch(channel: Channel, period: u16) -> u8 {
    0x80 | ((channel as u8) << 5) | (period & 0x0F) as u8
}

/// Build the data byte carrying the high 6 bits of a tone period
pub fn tone_data(period: u16) -> u8 {
    ((period >> 4) & 0x3F) as u8
}

/// Build an attenuation latch byte
pub fn attenuation_latch(channel: Channel, code: u8) -> u8 {
    0x90 | ((channel as u8) << 5) | (code & 0x0F)
}

/// Build a noise control latch byte
pub fn noise_latch(control: u8) -> u8 {
    0xE0 | (control & 0x07)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tone_latch() {
        // 1 00 0 1010
        match RegisterWrite::decode(0x8A) {
            RegisterWrite::Latch { latch, data } => {
                assert_eq!(latch.channel, Channel::Tone1);
                assert_eq!(latch.kind, RegisterKind::TonePeriod);
                assert_eq!(data, 0x0A);
            }
            other => panic!("expected latch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_attenuation_latch() {
        // 1 01 1 0101
        let write = RegisterWrite::decode(0xB5);
        assert_eq!(
            write,
            RegisterWrite::Latch {
                latch: Latch {
                    channel: Channel::Tone2,
                    kind: RegisterKind::Attenuation
                },
                data: 0x05
            }
        );
    }

    #[test]
    fn test_decode_noise_control() {
        // 1 11 0 0110
        match RegisterWrite::decode(0xE6) {
            RegisterWrite::Latch { latch, data } => {
                assert_eq!(latch.channel, Channel::Noise);
                assert_eq!(latch.kind, RegisterKind::NoiseControl);
                assert_eq!(data, 0x06);
            }
            other => panic!("expected latch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_data_byte_keeps_six_bits() {
        assert_eq!(RegisterWrite::decode(0x7F), RegisterWrite::Data(0x3F));
        assert_eq!(RegisterWrite::decode(0x15), RegisterWrite::Data(0x15));
    }

    #[test]
    fn test_byte_builders() {
        assert_eq!(tone_latch(Channel::Tone1, 0x15A), 0x8A);
        assert_eq!(tone_data(0x15A), 0x15);
        assert_eq!(attenuation_latch(Channel::Tone2, 5), 0xB5);
        assert_eq!(attenuation_latch(Channel::Noise, 15), 0xFF);
        assert_eq!(noise_latch(0x06), 0xE6);
    }
}
