//! Sound generators for the SN76489 PSG
//!
//! This module contains the individual generator components:
//! - Tone generators (3 channels, 10-bit down-counters)
//! - Noise generator (shift register clocked by a divider or by tone channel 3)

use super::constants::{NOISE_RATES, TONE_PERIOD_MASK, ZERO_PERIOD_RELOAD};
use serde::{Deserialize, Serialize};

/// Tone generator for a single channel
///
/// The counter decrements once per internal tick. When it reaches zero it reloads from
/// `compare` and the output bit toggles, giving a square wave with a period of
/// `2 * compare` ticks. Period writes are staged in `pending` and only become the new
/// `compare` at that reload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToneGenerator {
    compare: u16,
    counter: u16,
    output: bool,
    pending: Option<u16>,
}

impl Default for ToneGenerator {
    fn default() -> Self {
        Self {
            compare: 0,
            counter: 1,
            output: false,
            pending: None,
        }
    }
}

impl ToneGenerator {
    /// Create a new tone generator in its reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the low 4 bits of the period
    #[inline]
    pub fn stage_low(&mut self, nibble: u8) {
        let base = self.staged_period();
        self.pending = Some((base & !0x0F) | (nibble & 0x0F) as u16);
    }

    /// Stage the high 6 bits of the period
    #[inline]
    pub fn stage_high(&mut self, bits: u8) {
        let base = self.staged_period();
        self.pending = Some(((base & 0x0F) | (((bits & 0x3F) as u16) << 4)) & TONE_PERIOD_MASK);
    }

    /// Period that the next reload will latch
    #[inline]
    pub fn staged_period(&self) -> u16 {
        self.pending.unwrap_or(self.compare)
    }

    /// Advance one internal tick, returns true on a counter reload
    ///
    /// With `force_nonzero` set (no clock divider) a staged period of zero is latched as 1.
    #[inline]
    pub fn tick(&mut self, force_nonzero: bool) -> bool {
        self.counter -= 1;
        if self.counter != 0 {
            return false;
        }

        if let Some(period) = self.pending.take() {
            self.compare = if force_nonzero && period == 0 { 1 } else { period };
        }
        self.counter = if self.compare == 0 {
            ZERO_PERIOD_RELOAD
        } else {
            self.compare
        };
        self.output = !self.output;
        true
    }

    /// Current output bit
    #[inline]
    pub fn output(&self) -> bool {
        self.output
    }

    /// Latched period
    #[inline]
    pub fn compare(&self) -> u16 {
        self.compare
    }

    /// Ticks left until the next reload
    #[inline]
    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Period write waiting for the next reload
    #[inline]
    pub fn pending(&self) -> Option<u16> {
        self.pending
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Noise shift register parameters
///
/// Real parts differ: TI chips use a 15-bit register tapped at bits 0 and 1, the Sega VDP
/// variants a 16-bit register tapped at bits 0 and 3. VGM 1.10+ headers declare both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Shift register width in bits (1-16)
    pub width: u8,
    /// Feedback tap mask for white noise
    pub taps: u16,
}

impl NoiseConfig {
    /// 15-bit register, taps 0x0003
    pub const TI: NoiseConfig = NoiseConfig {
        width: 15,
        taps: 0x0003,
    };
    /// 16-bit register, taps 0x0009
    pub const SEGA: NoiseConfig = NoiseConfig {
        width: 16,
        taps: 0x0009,
    };

    /// Value the register is reseeded with on reset and on every noise control write
    #[inline]
    pub fn seed(&self) -> u16 {
        1 << (self.width.clamp(1, 16) - 1)
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig::SEGA
    }
}

/// Noise generator
///
/// A divider (fixed rate 16/32/64, or tone channel 3 reload events for rate code 3) drives a
/// toggle; the shift register steps on the toggle's rising edge. In periodic mode the low bit
/// is rotated back into the top bit, in white mode the top bit receives the parity of the
/// tapped bits. The channel output is the register's low bit.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    config: NoiseConfig,
    control: u8,
    counter: u16,
    toggle: bool,
    lfsr: u16,
}

impl NoiseGenerator {
    /// Create a noise generator with the given register layout
    pub fn new(config: NoiseConfig) -> Self {
        let config = NoiseConfig {
            width: config.width.clamp(1, 16),
            taps: config.taps,
        };
        Self {
            config,
            control: 0,
            counter: NOISE_RATES[0],
            toggle: false,
            lfsr: config.seed(),
        }
    }

    /// Write the 3-bit noise control field
    ///
    /// Any write restarts the divider and reseeds the shift register, even when the value
    /// is unchanged.
    pub fn write_control(&mut self, value: u8) {
        self.control = value & 0x07;
        self.restart();
    }

    fn restart(&mut self) {
        self.counter = self.fixed_rate().unwrap_or(NOISE_RATES[0]);
        self.toggle = false;
        self.lfsr = self.config.seed();
    }

    /// Divider rate for codes 0-2, `None` when tone channel 3 drives the noise
    #[inline]
    pub fn fixed_rate(&self) -> Option<u16> {
        NOISE_RATES.get((self.control & 0x03) as usize).copied()
    }

    /// True in white noise mode
    #[inline]
    pub fn is_white(&self) -> bool {
        self.control & 0x04 != 0
    }

    /// Advance one internal tick
    ///
    /// `tone3_reload` reports whether tone channel 3 reloaded during the same tick.
    #[inline]
    pub fn tick(&mut self, tone3_reload: bool) {
        let edge = match self.fixed_rate() {
            Some(rate) => {
                self.counter -= 1;
                if self.counter == 0 {
                    self.counter = rate;
                    true
                } else {
                    false
                }
            }
            None => tone3_reload,
        };

        if edge {
            self.toggle = !self.toggle;
            if self.toggle {
                self.shift();
            }
        }
    }

    fn shift(&mut self) {
        let top = self.config.width - 1;
        let feedback = if self.is_white() {
            ((self.lfsr & self.config.taps).count_ones() & 1) as u16
        } else {
            self.lfsr & 1
        };
        self.lfsr = (self.lfsr >> 1) | (feedback << top);
    }

    /// Current output bit
    #[inline]
    pub fn output(&self) -> bool {
        self.lfsr & 1 != 0
    }

    /// Raw noise control field
    #[inline]
    pub fn control(&self) -> u8 {
        self.control
    }

    /// Shift register contents
    #[inline]
    pub fn lfsr(&self) -> u16 {
        self.lfsr
    }

    /// Divider toggle state
    #[inline]
    pub fn toggle(&self) -> bool {
        self.toggle
    }

    /// Register layout in use
    pub fn config(&self) -> NoiseConfig {
        self.config
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.control = 0;
        self.restart();
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new(NoiseConfig::default())
    }
}
