//! Sample Renderer Domain
//!
//! Turns a frame sequence into PCM by driving a chip at the playback rate:
//! - `config`: render settings and the derived tick/sample schedule
//! - `renderer`: the frame loop and sampling
//! - `cross_check`: frame-by-frame comparison of two decodings of one song
//! - `batch`: independent songs rendered on scoped threads

pub mod batch;
pub mod config;
pub mod cross_check;
pub mod renderer;

pub use batch::{render_batch, RenderJob};
pub use config::{MismatchPolicy, RenderConfig, RenderTiming, DEFAULT_CHIP_CLOCK};
pub use cross_check::{cross_check, verify_capture, CrossCheckReport};
pub use renderer::{Pcm, Renderer};

use crate::vgm_loader::VgmSong;
use crate::Result;

/// Render a loaded song with its header-derived configuration
pub fn render_song(song: &VgmSong) -> Result<Pcm> {
    Renderer::new(RenderConfig::for_song(song))?.render(&song.frames)
}
