//! Frame-driven sample renderer
//!
//! Walks the frame sequence at the playback rate. Each byte of a frame is written to the chip
//! followed by one clock edge, then the clock runs to the next frame boundary. Output samples
//! are taken at their scheduled ticks (nearest tick, no interpolation) along the way.

use super::config::{RenderConfig, RenderTiming};
use crate::backend::ObservableChip;
use crate::sn76489::{channel_to_pcm, master_to_pcm, Sn76489};
use crate::vgm_parser::Frame;
use crate::Result;

/// Rendered audio: master mix plus one track per channel, all the same length
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pcm {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Saturated mix of all channels
    pub master: Vec<i16>,
    /// Tone channel 1
    pub tone0: Vec<i16>,
    /// Tone channel 2
    pub tone1: Vec<i16>,
    /// Tone channel 3
    pub tone2: Vec<i16>,
    /// Noise channel
    pub noise: Vec<i16>,
}

impl Pcm {
    /// Track names in output order
    pub const TRACK_NAMES: [&'static str; 5] = ["master", "tone0", "tone1", "tone2", "noise"];

    fn with_capacity(sample_rate: u32, capacity: usize) -> Self {
        Pcm {
            sample_rate,
            master: Vec::with_capacity(capacity),
            tone0: Vec::with_capacity(capacity),
            tone1: Vec::with_capacity(capacity),
            tone2: Vec::with_capacity(capacity),
            noise: Vec::with_capacity(capacity),
        }
    }

    /// Samples per track
    pub fn len(&self) -> usize {
        self.master.len()
    }

    /// True when nothing was rendered
    pub fn is_empty(&self) -> bool {
        self.master.is_empty()
    }

    /// Length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Named tracks in output order
    pub fn tracks(&self) -> [(&'static str, &[i16]); 5] {
        [
            (Self::TRACK_NAMES[0], &self.master),
            (Self::TRACK_NAMES[1], &self.tone0),
            (Self::TRACK_NAMES[2], &self.tone1),
            (Self::TRACK_NAMES[3], &self.tone2),
            (Self::TRACK_NAMES[4], &self.noise),
        ]
    }
}

/// Drives an [`ObservableChip`] through a frame sequence
pub struct Renderer<C: ObservableChip = Sn76489> {
    chip: C,
    config: RenderConfig,
    timing: RenderTiming,
    tick: u64,
    next_sample: u64,
    next_sample_tick: u64,
}

impl Renderer<Sn76489> {
    /// Renderer over the built-in chip model
    pub fn new(config: RenderConfig) -> Result<Self> {
        let chip = Sn76489::with_config(config.chip_config());
        Self::with_chip(config, chip)
    }
}

impl<C: ObservableChip> Renderer<C> {
    /// Renderer over any observable chip
    ///
    /// The chip is reset before use.
    pub fn with_chip(config: RenderConfig, mut chip: C) -> Result<Self> {
        config.validate()?;
        chip.reset();
        let timing = config.timing();
        Ok(Renderer {
            chip,
            config,
            timing,
            tick: 0,
            next_sample: 0,
            next_sample_tick: 0,
        })
    }

    /// Render every frame (times the loop count) into PCM
    pub fn render(&mut self, frames: &[Frame]) -> Result<Pcm> {
        self.render_observed(frames, |_, _| {})
    }

    /// Render, calling `observer` with the frame index and chip after each frame
    pub fn render_observed<F>(&mut self, frames: &[Frame], mut observer: F) -> Result<Pcm>
    where
        F: FnMut(u64, &C),
    {
        self.restart();

        let total = frames.len() as u64 * self.config.loops as u64;
        let limit = match self.config.max_duration {
            Some(seconds) => total.min(self.timing.frames_in(seconds)),
            None => total,
        };
        let end_tick = self.timing.frame_start(limit);
        let expected = (end_tick as f64 / self.timing.ticks_per_sample()) as usize + 1;
        let mut pcm = Pcm::with_capacity(self.timing.sample_rate(), expected);

        let sequence = frames.iter().cycle().take(limit as usize);
        for (k, frame) in (0u64..).zip(sequence) {
            for &byte in frame {
                self.chip.write_data(byte);
                let next = self.tick + 1;
                self.run_until(next, &mut pcm);
            }
            let boundary = self.timing.frame_start(k + 1);
            self.run_until(boundary, &mut pcm);
            observer(k, &self.chip);
        }

        Ok(pcm)
    }

    fn restart(&mut self) {
        self.chip.reset();
        self.tick = 0;
        self.next_sample = 0;
        self.next_sample_tick = 0;
    }

    /// Clock the chip up to `target`, sampling at every scheduled tick on the way
    fn run_until(&mut self, target: u64, pcm: &mut Pcm) {
        while self.tick < target {
            while self.next_sample_tick <= self.tick {
                self.sample(pcm);
                self.next_sample += 1;
                self.next_sample_tick = self.timing.sample_tick(self.next_sample);
            }
            let stop = target.min(self.next_sample_tick);
            let steps = (stop - self.tick).min(u32::MAX as u64) as u32;
            self.chip.advance_clock(steps);
            self.tick += steps as u64;
        }
    }

    fn sample(&self, pcm: &mut Pcm) {
        let levels = self.chip.channel_levels();
        pcm.master.push(master_to_pcm(self.chip.output()));
        pcm.tone0.push(channel_to_pcm(levels.tone[0]));
        pcm.tone1.push(channel_to_pcm(levels.tone[1]));
        pcm.tone2.push(channel_to_pcm(levels.tone[2]));
        pcm.noise.push(channel_to_pcm(levels.noise));
    }

    /// The chip being driven
    pub fn chip(&self) -> &C {
        &self.chip
    }

    /// Configuration in use
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Derived timing
    pub fn timing(&self) -> RenderTiming {
        self.timing
    }

    /// Internal ticks elapsed in the last render
    pub fn ticks(&self) -> u64 {
        self.tick
    }
}
