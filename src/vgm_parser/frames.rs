//! Command list to per-tick frames
//!
//! One [`Frame`] holds the PSG bytes written during one playback tick. Every wait closes the open
//! frame; an explicit wait spanning `k` whole ticks adds `k - 1` empty frames after it.

use super::commands::{Command, StandardWait};
use super::header::VGM_SAMPLE_RATE;
use super::Frame;
use crate::{Result, Sn76489Error};
use serde::Serialize;

/// Rate assumed when neither the header nor the stream says otherwise
pub const DEFAULT_RATE: u32 = 60;

/// Samples per playback tick at `rate` Hz
pub fn tick_samples(rate: u32) -> u32 {
    match rate {
        50 => StandardWait::Hz50.samples(),
        60 => StandardWait::Hz60.samples(),
        0 => StandardWait::Hz60.samples(),
        r => VGM_SAMPLE_RATE / r,
    }
}

/// Playback rate for a stream
///
/// A non-zero header rate wins. Otherwise the first fixed-length wait decides, and a stream
/// without one plays at [`DEFAULT_RATE`].
pub fn infer_rate(header_rate: u32, commands: &[Command]) -> u32 {
    if header_rate != 0 {
        return header_rate;
    }
    commands
        .iter()
        .find_map(|c| match c {
            Command::WaitStandard(w) => Some(w.rate()),
            _ => None,
        })
        .unwrap_or(DEFAULT_RATE)
}

/// What the frame builder saw on the way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Samples covered by every wait
    pub total_wait_samples: u64,
    /// Explicit waits that are not a whole number of ticks
    pub misaligned_waits: u32,
    /// Data blocks skipped
    pub data_blocks: u32,
    /// PSG writes
    pub register_writes: u64,
    /// Tick length used
    pub tick_samples: u32,
}

impl FrameStats {
    /// Verify that `frame_count` frames account for the waited samples within one tick
    pub fn check(&self, frame_count: usize) -> Result<()> {
        let expected = frame_count as u64 * self.tick_samples as u64;
        let diff = self.total_wait_samples.abs_diff(expected);
        if diff > self.tick_samples as u64 {
            return Err(Sn76489Error::ConsistencyError(format!(
                "waits cover {} samples but {} frames of {} samples cover {} ({} misaligned waits)",
                self.total_wait_samples,
                frame_count,
                self.tick_samples,
                expected,
                self.misaligned_waits
            )));
        }
        Ok(())
    }
}

/// Group commands into frames of `tick` samples
pub fn build_frames(commands: &[Command], tick: u32) -> (Vec<Frame>, FrameStats) {
    let mut frames = Vec::new();
    let mut open = Frame::new();
    let mut stats = FrameStats {
        tick_samples: tick,
        ..Default::default()
    };

    for command in commands {
        match command {
            Command::RegisterWrite(byte) => {
                open.push(*byte);
                stats.register_writes += 1;
            }
            Command::WaitExplicit(n) => {
                let n = *n as u32;
                stats.total_wait_samples += n as u64;
                frames.push(std::mem::take(&mut open));
                if tick != 0 && n >= tick && n % tick == 0 {
                    frames.extend((1..n / tick).map(|_| Frame::new()));
                } else if n != tick {
                    stats.misaligned_waits += 1;
                }
            }
            Command::WaitStandard(w) => {
                stats.total_wait_samples += w.samples() as u64;
                frames.push(std::mem::take(&mut open));
            }
            Command::DataBlock { .. } => stats.data_blocks += 1,
            Command::EndOfStream => break,
        }
    }

    if !open.is_empty() {
        frames.push(open);
    }
    (frames, stats)
}
