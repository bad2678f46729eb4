//! Parallel rendering of independent songs
//!
//! Each job owns its own chip; nothing is shared between threads.

use super::config::RenderConfig;
use super::renderer::{Pcm, Renderer};
use crate::vgm_parser::Frame;
use crate::{Result, Sn76489Error};
use std::thread;

/// One song to render
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    /// Frames to play
    pub frames: &'a [Frame],
    /// Settings for this song
    pub config: RenderConfig,
}

impl<'a> RenderJob<'a> {
    /// Create a job
    pub fn new(frames: &'a [Frame], config: RenderConfig) -> Self {
        RenderJob { frames, config }
    }

    /// Render on the current thread
    pub fn run(&self) -> Result<Pcm> {
        Renderer::new(self.config.clone())?.render(self.frames)
    }
}

/// Render every job on its own scoped thread
///
/// Results come back in job order. A failing job does not affect the others.
pub fn render_batch(jobs: &[RenderJob<'_>]) -> Vec<Result<Pcm>> {
    thread::scope(|scope| {
        let handles: Vec<_> = jobs.iter().map(|job| scope.spawn(move || job.run())).collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(Sn76489Error::Other("render thread panicked".into()))
                })
            })
            .collect()
    })
}
