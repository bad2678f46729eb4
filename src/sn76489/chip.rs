//! SN76489 chip model
//!
//! Ties the generators, attenuators and the write-port latch together. The model is driven by
//! two primitives only: [`Sn76489::write_data`] and [`Sn76489::advance_clock`].

use super::constants::{NOISE_CHANNEL, NUM_CHANNELS, NUM_TONE_CHANNELS};
use super::generators::{NoiseConfig, NoiseGenerator, ToneGenerator};
use super::mixer::{Attenuator, ChannelLevels};
use super::registers::{Latch, RegisterKind, RegisterWrite};
use serde::{Deserialize, Serialize};

/// Relation between the chip's input clock and its internal tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockDivider {
    /// Classic part: one internal tick every 16 input clocks
    #[default]
    Div16,
    /// One internal tick every 128 input clocks
    Div128,
    /// Input clock is the internal tick; a zero period is latched as 1
    None,
}

impl ClockDivider {
    /// Input clocks per internal tick
    pub fn ratio(self) -> u32 {
        match self {
            ClockDivider::Div16 => 16,
            ClockDivider::Div128 => 128,
            ClockDivider::None => 1,
        }
    }

    /// Parse `16`, `128` or `none`
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "16" | "div16" => Some(ClockDivider::Div16),
            "128" | "div128" => Some(ClockDivider::Div128),
            "none" | "1" | "off" => Some(ClockDivider::None),
            _ => None,
        }
    }
}

/// Static chip configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChipConfig {
    /// Input clock divider mode
    pub divider: ClockDivider,
    /// Noise shift register layout
    pub noise: NoiseConfig,
}

/// Debug view of one tone channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToneSnapshot {
    /// Latched period
    pub compare: u16,
    /// Down-counter
    pub counter: u16,
    /// Output bit
    pub output: bool,
    /// Period staged for the next reload
    pub pending: Option<u16>,
}

/// Debug view of the noise channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoiseSnapshot {
    /// Noise control field
    pub control: u8,
    /// Shift register contents
    pub lfsr: u16,
    /// Divider toggle
    pub toggle: bool,
    /// Output bit
    pub output: bool,
}

/// Full internal state, for tracing and debugging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChipSnapshot {
    /// Tone channels
    pub tones: [ToneSnapshot; NUM_TONE_CHANNELS],
    /// Noise channel
    pub noise: NoiseSnapshot,
    /// Attenuation codes (tone 1-3, noise)
    pub attenuation: [u8; NUM_CHANNELS],
    /// Write-port latch
    pub latch: Latch,
    /// Internal ticks since reset
    pub ticks: u64,
}

/// SN76489 programmable sound generator
#[derive(Debug, Clone)]
pub struct Sn76489 {
    config: ChipConfig,
    tones: [ToneGenerator; NUM_TONE_CHANNELS],
    noise: NoiseGenerator,
    attenuators: [Attenuator; NUM_CHANNELS],
    latch: Latch,
    ticks: u64,
}

impl Sn76489 {
    /// Create a chip with the classic divider and the 16-bit noise register
    pub fn new() -> Self {
        Self::with_config(ChipConfig::default())
    }

    /// Create a chip with an explicit configuration
    pub fn with_config(config: ChipConfig) -> Self {
        Sn76489 {
            config,
            tones: Default::default(),
            noise: NoiseGenerator::new(config.noise),
            attenuators: [Attenuator::new(); NUM_CHANNELS],
            latch: Latch::default(),
            ticks: 0,
        }
    }

    /// Return to the power-on state, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config);
    }

    /// Apply one byte written to the chip's port
    ///
    /// Attenuation and noise control take effect immediately. Tone period bits are staged
    /// and become audible at the channel's next counter reload.
    pub fn write_data(&mut self, byte: u8) {
        match RegisterWrite::decode(byte) {
            RegisterWrite::Latch { latch, data } => {
                self.latch = latch;
                let index = latch.channel.index();
                match latch.kind {
                    RegisterKind::TonePeriod => self.tones[index].stage_low(data),
                    RegisterKind::Attenuation => self.attenuators[index].set_code(data),
                    RegisterKind::NoiseControl => self.noise.write_control(data),
                }
            }
            RegisterWrite::Data(bits) => {
                if self.latch.is_tone_period() {
                    self.tones[self.latch.channel.index()].stage_high(bits);
                }
            }
        }
    }

    /// Advance the internal clock by `ticks` ticks
    pub fn advance_clock(&mut self, ticks: u32) {
        let force_nonzero = self.config.divider == ClockDivider::None;
        for _ in 0..ticks {
            let mut tone3_reload = false;
            for (index, tone) in self.tones.iter_mut().enumerate() {
                let reloaded = tone.tick(force_nonzero);
                if index == NUM_TONE_CHANNELS - 1 {
                    tone3_reload = reloaded;
                }
            }
            self.noise.tick(tone3_reload);
        }
        self.ticks += ticks as u64;
    }

    /// Attenuated contribution of every channel right now
    pub fn channel_levels(&self) -> ChannelLevels {
        let mut levels = ChannelLevels::default();
        for (index, tone) in self.tones.iter().enumerate() {
            levels.tone[index] = self.attenuators[index].apply(tone.output());
        }
        levels.noise = self.attenuators[NOISE_CHANNEL].apply(self.noise.output());
        levels
    }

    /// Saturated master level right now
    pub fn output(&self) -> u16 {
        self.channel_levels().master()
    }

    /// Tone generator `index` (0-2)
    pub fn tone(&self, index: usize) -> &ToneGenerator {
        &self.tones[index]
    }

    /// Noise generator
    pub fn noise(&self) -> &NoiseGenerator {
        &self.noise
    }

    /// Attenuation code of channel `index` (0-3)
    pub fn attenuation(&self, index: usize) -> u8 {
        self.attenuators[index].code()
    }

    /// Current latch
    pub fn latch(&self) -> Latch {
        self.latch
    }

    /// Configuration the chip was built with
    pub fn config(&self) -> ChipConfig {
        self.config
    }

    /// Internal ticks since reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Capture the complete internal state
    pub fn snapshot(&self) -> ChipSnapshot {
        let tone = |t: &ToneGenerator| ToneSnapshot {
            compare: t.compare(),
            counter: t.counter(),
            output: t.output(),
            pending: t.pending(),
        };
        ChipSnapshot {
            tones: [
                tone(&self.tones[0]),
                tone(&self.tones[1]),
                tone(&self.tones[2]),
            ],
            noise: NoiseSnapshot {
                control: self.noise.control(),
                lfsr: self.noise.lfsr(),
                toggle: self.noise.toggle(),
                output: self.noise.output(),
            },
            attenuation: [
                self.attenuators[0].code(),
                self.attenuators[1].code(),
                self.attenuators[2].code(),
                self.attenuators[3].code(),
            ],
            latch: self.latch,
            ticks: self.ticks,
        }
    }
}

impl Default for Sn76489 {
    fn default() -> Self {
        Self::new()
    }
}
