//! Audio export
//!
//! Writes a rendered song as five mono WAV files (master plus one per channel) and, on request,
//! a CSV trace of the frame sequence.
//!
//! # Example
//!
//! ```no_run
//! use sn76489::export::{export_song, ExportConfig};
//! use sn76489::vgm_loader::load_file;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let song = load_file("song.vgm")?;
//! let config = ExportConfig::new("out", "song").with_trace(true);
//! let written = export_song(&song, &config)?;
//! assert_eq!(written.wav_files.len(), 5);
//! # Ok(())
//! # }
//! ```

pub mod trace;
pub mod wav;

pub use trace::{format_write, write_frame_trace, TraceRow};
pub use wav::{read_wav_track, write_pcm_tracks, write_wav_track};

use crate::replayer::{RenderConfig, Renderer};
use crate::sn76489::ChipSnapshot;
use crate::vgm_loader::VgmSong;
use crate::Result;
use std::path::{Path, PathBuf};

/// Where and what to export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output directory (created if missing)
    pub out_dir: PathBuf,
    /// File name stem shared by all outputs
    pub stem: String,
    /// Render settings
    pub render: Option<RenderConfig>,
    /// Frame trace destination, if one is wanted
    pub trace: Option<PathBuf>,
}

impl ExportConfig {
    /// Export into `out_dir` using `stem` for the file names
    pub fn new(out_dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        ExportConfig {
            out_dir: out_dir.into(),
            stem: stem.into(),
            render: None,
            trace: None,
        }
    }

    /// Derive the stem from a song path (`music/song.vgm` -> `song`)
    pub fn for_path(out_dir: impl Into<PathBuf>, song_path: &Path) -> Self {
        let stem = song_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "song".to_string());
        Self::new(out_dir, stem)
    }

    /// Use explicit render settings instead of the header-derived ones
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = Some(render);
        self
    }

    /// Enable the CSV frame trace at `<stem>.frames.csv`
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.trace = enable.then(|| self.default_trace_path());
        self
    }

    /// Write the CSV frame trace to `path`
    pub fn with_trace_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace = Some(path.into());
        self
    }

    /// Path of one output track
    pub fn track_path(&self, track: &str) -> PathBuf {
        self.out_dir.join(format!("{}.{}.wav", self.stem, track))
    }

    fn default_trace_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.frames.csv", self.stem))
    }
}

/// Files produced by an export
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// WAV files in track order
    pub wav_files: Vec<PathBuf>,
    /// CSV trace, when requested
    pub trace_file: Option<PathBuf>,
    /// Samples per track
    pub samples: usize,
}

/// Render a song and write all requested outputs
pub fn export_song(song: &VgmSong, config: &ExportConfig) -> Result<ExportSummary> {
    let render = config
        .render
        .clone()
        .unwrap_or_else(|| RenderConfig::for_song(song));
    let mut renderer = Renderer::new(render)?;

    println!(
        "Rendering {} frames ({:.1}s) at {} Hz...",
        song.frames.len(),
        song.duration_secs(),
        renderer.timing().sample_rate()
    );

    let mut snapshots: Vec<ChipSnapshot> = Vec::new();
    let pcm = if config.trace.is_some() {
        renderer.render_observed(&song.frames, |_, chip| snapshots.push(chip.snapshot()))?
    } else {
        renderer.render(&song.frames)?
    };

    std::fs::create_dir_all(&config.out_dir)?;
    let wav_files = write_pcm_tracks(&pcm, &config.out_dir, &config.stem)?;

    let trace_file = match &config.trace {
        Some(path) => {
            println!("Writing frame trace to {}...", path.display());
            write_frame_trace(path, &song.frames, Some(&snapshots))?;
            Some(path.clone())
        }
        None => None,
    };

    println!("Export complete!");
    Ok(ExportSummary {
        wav_files,
        trace_file,
        samples: pcm.len(),
    })
}
