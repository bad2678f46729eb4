//! SN76489 Output Mixer
//!
//! Each channel passes through a 4-bit attenuator; the mixer sums the four attenuated
//! contributions into one master level that saturates at [`MASTER_MAX`].
//!
//! Features:
//! - 2 dB per step attenuation law with a non-zero silence floor
//! - Per-channel levels stay queryable next to the master level
//! - Conversion of unsigned levels to signed 16-bit PCM

use super::constants::{amplitude, MASTER_MAX, NUM_CHANNELS, NUM_TONE_CHANNELS};
use serde::Serialize;

/// One channel's attenuator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attenuator {
    code: u8,
}

impl Attenuator {
    /// Attenuators power up silent
    pub fn new() -> Self {
        Attenuator { code: 0x0F }
    }

    /// Set the 4-bit attenuation code (0 = loudest, 15 = silent)
    #[inline]
    pub fn set_code(&mut self, code: u8) {
        self.code = code & 0x0F;
    }

    /// Current attenuation code
    #[inline]
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Channel contribution for a generator output bit
    #[inline]
    pub fn apply(&self, bit: bool) -> u16 {
        if bit {
            amplitude(self.code)
        } else {
            0
        }
    }
}

impl Default for Attenuator {
    fn default() -> Self {
        Self::new()
    }
}

/// Instantaneous attenuated channel contributions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelLevels {
    /// Tone channels 1-3
    pub tone: [u16; NUM_TONE_CHANNELS],
    /// Noise channel
    pub noise: u16,
}

impl ChannelLevels {
    /// Contribution of channel `index` (0-2 tone, 3 noise)
    pub fn get(&self, index: usize) -> u16 {
        match index {
            0..=2 => self.tone[index],
            _ => self.noise,
        }
    }

    /// All four contributions in channel order
    pub fn as_array(&self) -> [u16; NUM_CHANNELS] {
        [self.tone[0], self.tone[1], self.tone[2], self.noise]
    }

    /// Saturated master level
    #[inline]
    pub fn master(&self) -> u16 {
        mix(self.as_array())
    }
}

/// Sum four channel contributions, saturating at the top of the output range
#[inline]
pub fn mix(levels: [u16; NUM_CHANNELS]) -> u16 {
    let sum: u32 = levels.iter().map(|&l| l as u32).sum();
    sum.min(MASTER_MAX as u32) as u16
}

/// Convert a master level (0..=32767) to a signed PCM sample
#[inline]
pub fn master_to_pcm(level: u16) -> i16 {
    debug_assert!(level <= MASTER_MAX, "master level {} out of range", level);
    level_to_pcm(level as i32)
}

/// Convert a single channel contribution to a signed PCM sample
///
/// Channels are scaled by 4 so that a lone channel at full volume spans the same range as
/// the master mix of four channels.
#[inline]
pub fn channel_to_pcm(contribution: u16) -> i16 {
    let scaled = (contribution as i32 * NUM_CHANNELS as i32).min(MASTER_MAX as i32);
    level_to_pcm(scaled)
}

#[inline]
fn level_to_pcm(level: i32) -> i16 {
    let sample = level * 2 - MASTER_MAX as i32;
    sample.clamp(-(i16::MAX as i32), i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sn76489::constants::{AMPLITUDE_PEAK, MASTER_SILENCE_FLOOR, SILENCE_FLOOR};

    #[test]
    fn test_attenuator_powers_up_silent() {
        let att = Attenuator::new();
        assert_eq!(att.code(), 15);
        assert_eq!(att.apply(true), SILENCE_FLOOR);
        assert_eq!(att.apply(false), 0);
    }

    #[test]
    fn test_loudest_beats_silent_for_every_code() {
        let mut att = Attenuator::new();
        let mut previous = u16::MAX;
        for code in 0..16 {
            att.set_code(code);
            let level = att.apply(true);
            assert!(level <= previous);
            previous = level;
        }
        att.set_code(0);
        let loud = att.apply(true);
        att.set_code(15);
        assert!(loud > att.apply(true));
    }

    #[test]
    fn test_mix_saturates() {
        assert_eq!(mix([AMPLITUDE_PEAK; 4]), MASTER_MAX);
        assert_eq!(mix([100, 200, 300, 400]), 1000);
        assert_eq!(mix([SILENCE_FLOOR; 4]), MASTER_SILENCE_FLOOR);
    }

    #[test]
    fn test_pcm_range() {
        assert_eq!(master_to_pcm(0), -32767);
        assert_eq!(master_to_pcm(MASTER_MAX), 32767);
        assert_eq!(channel_to_pcm(0), -32767);
        assert_eq!(channel_to_pcm(AMPLITUDE_PEAK), 32767);
        assert_eq!(channel_to_pcm(4096), 1);
    }

    #[test]
    fn test_channel_levels_accessors() {
        let levels = ChannelLevels {
            tone: [1, 2, 3],
            noise: 4,
        };
        assert_eq!(levels.get(0), 1);
        assert_eq!(levels.get(3), 4);
        assert_eq!(levels.as_array(), [1, 2, 3, 4]);
        assert_eq!(levels.master(), 10);
    }
}
