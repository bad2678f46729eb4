//! VGM File Loader Domain
//!
//! Handles file I/O for songs on disk: format detection, transparent gzip handling and
//! discovery of companion raw captures.

pub mod loader;

pub use loader::{SongFormat, VgmFileLoader, VgmSong};

use crate::vgm_parser::RawCapture;
use crate::Result;
use std::path::{Path, PathBuf};

/// Convenience function to load a VGM or VGZ file from disk
pub fn load_file(path: impl AsRef<Path>) -> Result<VgmSong> {
    VgmFileLoader::load(path)
}

/// Convenience function to load a raw packet capture from disk
pub fn load_capture(path: impl AsRef<Path>) -> Result<RawCapture> {
    VgmFileLoader::load_capture(path)
}

/// Locate the raw capture recorded next to `vgm_path`, if any
pub fn find_companion_capture(vgm_path: impl AsRef<Path>) -> Option<PathBuf> {
    VgmFileLoader::find_companion_capture(vgm_path)
}
