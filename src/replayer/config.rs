//! Render configuration
//!
//! One value object carries every knob the renderer needs. Derived timing lives in
//! [`RenderTiming`] and is computed once when a renderer is built.

use crate::sn76489::{ChipConfig, ClockDivider, NoiseConfig};
use crate::vgm_loader::VgmSong;
use crate::vgm_parser::Sn76489Flags;
use crate::{Result, Sn76489Error};
use serde::{Deserialize, Serialize};

/// NTSC colour-burst clock most SN76489 boards run from
pub const DEFAULT_CHIP_CLOCK: u32 = 3_579_545;

/// Default output sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default playback rate
pub const DEFAULT_PLAYBACK_RATE: u32 = 60;

/// What to do when a song and its reference capture disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Divergence is an error
    #[default]
    Fatal,
    /// Divergence is reported and rendering continues
    Warn,
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output sample rate in Hz (default: 44100)
    pub sample_rate: u32,
    /// Playback ticks per second (default: 60)
    pub playback_rate: u32,
    /// Chip input clock in Hz (`None`: 3.579545 MHz)
    pub chip_clock: Option<u32>,
    /// Clock divider mode
    pub divider: ClockDivider,
    /// Noise shift register layout
    pub noise: NoiseConfig,
    /// Stop after this many seconds, checked between frames
    pub max_duration: Option<f64>,
    /// Times the frame sequence is played (default: 1)
    pub loops: u32,
    /// Cross-check policy
    pub mismatch_policy: MismatchPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            chip_clock: None,
            divider: ClockDivider::default(),
            noise: NoiseConfig::default(),
            max_duration: None,
            loops: 1,
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

impl RenderConfig {
    /// Configuration matching a loaded song's header
    pub fn for_song(song: &VgmSong) -> Self {
        let clock = song.header.clock_hz();
        let divider = if song.header.flags().contains(Sn76489Flags::CLOCK_DIVIDER_OFF) {
            ClockDivider::None
        } else {
            ClockDivider::Div16
        };
        Self {
            playback_rate: song.rate,
            chip_clock: (clock != 0).then_some(clock),
            divider,
            noise: song.header.noise_config(),
            ..Default::default()
        }
    }

    /// Set the output sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Override the chip clock
    pub fn with_chip_clock(mut self, clock: u32) -> Self {
        self.chip_clock = Some(clock);
        self
    }

    /// Override the divider mode
    pub fn with_divider(mut self, divider: ClockDivider) -> Self {
        self.divider = divider;
        self
    }

    /// Override the noise register layout
    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    /// Limit the rendered length
    pub fn max_duration(mut self, seconds: f64) -> Self {
        self.max_duration = Some(seconds);
        self
    }

    /// Play the frame sequence `loops` times
    pub fn loops(mut self, loops: u32) -> Self {
        self.loops = loops;
        self
    }

    /// Set the cross-check policy
    pub fn mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    /// Effective chip clock
    pub fn clock(&self) -> u32 {
        self.chip_clock.unwrap_or(DEFAULT_CHIP_CLOCK)
    }

    /// Chip configuration this render uses
    pub fn chip_config(&self) -> ChipConfig {
        ChipConfig {
            divider: self.divider,
            noise: self.noise,
        }
    }

    /// Reject values the renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(Sn76489Error::ConfigError(msg));
        if self.sample_rate == 0 {
            return bad("sample rate must be non-zero".into());
        }
        if self.playback_rate == 0 {
            return bad("playback rate must be non-zero".into());
        }
        if self.chip_clock == Some(0) {
            return bad("chip clock must be non-zero".into());
        }
        if !(1..=16).contains(&self.noise.width) {
            return bad(format!(
                "noise shift register width {} outside 1..=16",
                self.noise.width
            ));
        }
        if self.loops == 0 {
            return bad("loop count must be at least 1".into());
        }
        if let Some(limit) = self.max_duration {
            if !limit.is_finite() || limit < 0.0 {
                return bad(format!("max duration {} is not a valid length", limit));
            }
        }
        Ok(())
    }

    /// Derived timing
    pub fn timing(&self) -> RenderTiming {
        RenderTiming {
            chip_clock: self.clock(),
            divider: self.divider.ratio(),
            playback_rate: self.playback_rate,
            sample_rate: self.sample_rate,
        }
    }
}

/// Tick and sample schedule derived from a [`RenderConfig`]
///
/// All positions are computed from their index with exact integer arithmetic, so rounding
/// never accumulates over a long song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTiming {
    chip_clock: u32,
    /// Input clocks per internal tick
    divider: u32,
    playback_rate: u32,
    sample_rate: u32,
}

impl RenderTiming {
    /// Internal ticks per second
    pub fn ticks_per_second(&self) -> f64 {
        self.chip_clock as f64 / self.divider as f64
    }

    /// Internal tick at which playback frame `k` starts
    pub fn frame_start(&self, k: u64) -> u64 {
        let num = k as u128 * self.chip_clock as u128;
        let den = self.divider as u128 * self.playback_rate as u128;
        (num / den) as u64
    }

    /// Internal tick at which output sample `j` is taken (nearest tick)
    pub fn sample_tick(&self, j: u64) -> u64 {
        let num = j as u128 * self.chip_clock as u128;
        let den = self.divider as u128 * self.sample_rate as u128;
        ((2 * num + den) / (2 * den)) as u64
    }

    /// Average internal ticks per output sample
    pub fn ticks_per_sample(&self) -> f64 {
        self.ticks_per_second() / self.sample_rate as f64
    }

    /// Average internal ticks per playback frame
    pub fn ticks_per_frame(&self) -> f64 {
        self.ticks_per_second() / self.playback_rate as f64
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback rate
    pub fn playback_rate(&self) -> u32 {
        self.playback_rate
    }

    /// Frames that fit in `seconds`, rounded up so a partial frame still plays
    pub fn frames_in(&self, seconds: f64) -> u64 {
        (seconds * self.playback_rate as f64).ceil() as u64
    }
}
