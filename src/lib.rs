//! SN76489 PSG Renderer
//!
//! A cycle-accurate behavioral model of the Texas Instruments SN76489 Programmable Sound
//! Generator (and its Sega VDP descendants), driven by VGM command streams and rendered to
//! 16-bit PCM.
//!
//! # Features
//! - Three tone channels with deferred period reload, one noise channel
//! - Configurable noise shift register (15-bit TI / 16-bit Sega tap sets)
//! - 2 dB attenuation law with a non-zero silence floor, saturating mixer
//! - Version-aware VGM parser (1.00 - 1.71) with transparent gzip (VGZ) support
//! - Raw packet capture decoder used to cross-check the VGM decoder
//! - Drift-free sample renderer producing master + per-channel PCM tracks
//!
//! # Crate feature flags
//! - `emulator` (default): Core chip model (`sn76489`, `backend`)
//! - `vgm-format` (default): VGM / raw capture parsing and loading (`vgm_parser`, `vgm_loader`, `compression`)
//! - `replayer` (default): Sample renderer, cross-check and batch rendering (`replayer`)
//! - `export-wav` (default): Five-track WAV export and CSV frame traces (`export`)
//!
//! # Quick start
//! ## Core emulator only
//! ```
//! use sn76489::Sn76489;
//! let mut chip = Sn76489::new();
//! chip.write_data(0x8E); // Tone 1 period, low nibble
//! chip.write_data(0x0F); // Tone 1 period, high bits -> 0x0FE
//! chip.write_data(0x90); // Tone 1 attenuation 0
//! chip.advance_clock(1);
//! let level = chip.output();
//! # assert!(level > 0);
//! ```
//!
//! ## Render a VGM file
//! ```no_run
//! # #[cfg(feature = "replayer")]
//! # {
//! use sn76489::replayer::{RenderConfig, Renderer};
//! use sn76489::vgm_loader::load_file;
//! let song = load_file("song.vgm").unwrap();
//! let config = RenderConfig::for_song(&song).with_sample_rate(44_100);
//! let pcm = Renderer::new(config).unwrap().render(&song.frames).unwrap();
//! println!("{} samples", pcm.len());
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules (feature-gated for modular use)
#[cfg(feature = "emulator")]
pub mod backend; // Observable chip abstraction
#[cfg(feature = "emulator")]
pub mod sn76489; // SN76489 PSG Emulation (core)

#[cfg(feature = "vgm-format")]
pub mod compression; // Data Decompression (gzip)
#[cfg(feature = "export-wav")]
pub mod export; // WAV and CSV output
#[cfg(feature = "replayer")]
pub mod replayer; // Sample Renderer
#[cfg(feature = "vgm-format")]
pub mod vgm_loader; // VGM File I/O
#[cfg(feature = "vgm-format")]
pub mod vgm_parser; // VGM / Raw Capture Parsing

/// Error types for SN76489 renderer operations
#[derive(thiserror::Error, Debug)]
pub enum Sn76489Error {
    /// Malformed container, command stream or raw capture
    #[error("Format error: {0}")]
    FormatError(String),

    /// Container version outside the supported set
    #[error("VGM version {} is not supported", bcd_version(.version))]
    VersionError {
        /// Raw BCD version field (0x171 = 1.71)
        version: u32,
    },

    /// Two views of the same song disagree
    #[error("Consistency error: {0}")]
    ConsistencyError(String),

    /// Decompression error
    #[error("Decompression error: {0}")]
    DecompressionError(String),

    /// Error writing audio or trace file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Sn76489Error {
    /// True for errors that describe disagreement rather than unreadable input
    ///
    /// Callers may choose to report these and carry on.
    pub fn is_consistency(&self) -> bool {
        matches!(self, Sn76489Error::ConsistencyError(_))
    }
}

/// Render a BCD version field as `major.minor` (0x171 -> "1.71")
pub fn bcd_version(version: &u32) -> String {
    format!("{:x}.{:02x}", version >> 8, version & 0xFF)
}

impl From<String> for Sn76489Error {
    /// Converts a String into `Sn76489Error::Other`.
    ///
    /// Prefer the specific variants (`FormatError`, `ConfigError`, ...) where the failure
    /// has a clear category.
    fn from(msg: String) -> Self {
        Sn76489Error::Other(msg)
    }
}

impl From<&str> for Sn76489Error {
    /// Converts a string slice into `Sn76489Error::Other`.
    fn from(msg: &str) -> Self {
        Sn76489Error::Other(msg.to_string())
    }
}

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, Sn76489Error>;

// Public API exports
#[cfg(feature = "emulator")]
pub use backend::ObservableChip;
#[cfg(feature = "emulator")]
pub use sn76489::{ChipConfig, ClockDivider, NoiseConfig, Sn76489};

#[cfg(feature = "vgm-format")]
pub use compression::decompress_if_needed;
#[cfg(feature = "replayer")]
pub use replayer::{cross_check, render_batch, Pcm, RenderConfig, Renderer};
#[cfg(feature = "vgm-format")]
pub use vgm_loader::{load_file, VgmSong};
#[cfg(feature = "vgm-format")]
pub use vgm_parser::{Frame, Gd3Tag, RawCapture, VgmHeader};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_error_message() {
        let err = Sn76489Error::VersionError { version: 0x172 };
        assert_eq!(err.to_string(), "VGM version 1.72 is not supported");
    }

    #[test]
    fn test_bcd_version_formatting() {
        assert_eq!(bcd_version(&0x100), "1.00");
        assert_eq!(bcd_version(&0x151), "1.51");
    }

    #[test]
    fn test_string_conversions() {
        let err: Sn76489Error = "boom".into();
        assert!(matches!(err, Sn76489Error::Other(ref m) if m == "boom"));
        assert!(!err.is_consistency());
        assert!(Sn76489Error::ConsistencyError("x".into()).is_consistency());
    }
}
