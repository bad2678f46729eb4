//! VGM File Loader
//!
//! Loads VGM songs from disk with format detection and transparent decompression, and finds
//! the raw captures recorded alongside them.

use crate::compression;
use crate::vgm_parser::{Frame, FrameStats, Gd3Tag, RawCapture, VgmFile, VgmHeader, VGM_MAGIC};
use crate::{Result, Sn76489Error};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Container kinds recognised from leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SongFormat {
    /// Plain VGM
    Vgm,
    /// gzip-wrapped VGM
    Vgz,
    /// Anything else (raw captures carry no magic)
    Unknown,
}

/// A song ready to render
#[derive(Debug, Clone, Serialize)]
pub struct VgmSong {
    /// Container header
    pub header: VgmHeader,
    /// Metadata tag
    pub gd3: Option<Gd3Tag>,
    /// Playback rate in Hz (header value or inferred)
    pub rate: u32,
    /// One frame per playback tick
    #[serde(skip)]
    pub frames: Vec<Frame>,
    /// Frame builder statistics
    pub stats: FrameStats,
    /// Container the song came from
    pub format: SongFormat,
}

impl VgmSong {
    /// Build a song from a parsed container
    pub fn from_file(file: VgmFile, format: SongFormat) -> Self {
        let rate = file.rate();
        let (frames, stats) = file.frames();
        VgmSong {
            header: file.header,
            gd3: file.gd3,
            rate,
            frames,
            stats,
            format,
        }
    }

    /// Verify the frame count against the waited samples
    pub fn check(&self) -> Result<()> {
        self.stats.check(self.frames.len())
    }

    /// Frame count the header's `total_samples` implies
    pub fn expected_frames(&self) -> u64 {
        self.header.expected_frames(self.rate)
    }

    /// Song length in seconds, from the frame count
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.rate as f64
    }

    /// Title from the GD3 tag, or an empty string
    pub fn title(&self) -> &str {
        self.gd3.as_ref().map(|t| t.title()).unwrap_or("")
    }

    /// Author from the GD3 tag, or an empty string
    pub fn author(&self) -> &str {
        self.gd3.as_ref().map(|t| t.author()).unwrap_or("")
    }
}

/// Loads VGM files from disk
pub struct VgmFileLoader;

impl VgmFileLoader {
    /// Companion capture suffixes, tried in order
    pub const CAPTURE_SUFFIXES: [&'static str; 2] = ["sn76489.bin", "bin"];

    /// Load a VGM or VGZ file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<VgmSong> {
        let path = path.as_ref();
        let file_data = fs::read(path).map_err(|e| {
            Sn76489Error::Other(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        Self::load_from_bytes(&file_data)
    }

    /// Parse an in-memory VGM or VGZ image
    pub fn load_from_bytes(data: &[u8]) -> Result<VgmSong> {
        let format = Self::detect_format(data);
        let file = match format {
            SongFormat::Vgm => VgmFile::parse(data)?,
            SongFormat::Vgz => {
                let unpacked = compression::decompress_if_needed(data).map_err(|e| {
                    Sn76489Error::FormatError(format!("Unusable gzip framing: {}", e))
                })?;
                VgmFile::parse(&unpacked)?
            }
            SongFormat::Unknown => {
                return Err(Sn76489Error::FormatError(
                    "Unsupported file format. Supported: VGM 1.00-1.71, VGZ".into(),
                ))
            }
        };
        Ok(VgmSong::from_file(file, format))
    }

    /// Load a raw packet capture from disk
    pub fn load_capture(path: impl AsRef<Path>) -> Result<RawCapture> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            Sn76489Error::Other(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        RawCapture::parse(&data)
    }

    /// Detect the container from its leading bytes
    pub fn detect_format(data: &[u8]) -> SongFormat {
        if data.starts_with(VGM_MAGIC) {
            SongFormat::Vgm
        } else if compression::is_gzip_compressed(data) {
            SongFormat::Vgz
        } else {
            SongFormat::Unknown
        }
    }

    /// Candidate capture paths for `vgm_path`, in lookup order
    pub fn capture_candidates(vgm_path: impl AsRef<Path>) -> Vec<PathBuf> {
        let stem = vgm_path.as_ref().with_extension("");
        Self::CAPTURE_SUFFIXES
            .iter()
            .map(|suffix| {
                let mut name = stem.clone().into_os_string();
                name.push(".");
                name.push(suffix);
                PathBuf::from(name)
            })
            .collect()
    }

    /// First existing candidate capture, or `None` when the song has no capture
    pub fn find_companion_capture(vgm_path: impl AsRef<Path>) -> Option<PathBuf> {
        Self::capture_candidates(vgm_path)
            .into_iter()
            .find(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_vgm() -> Vec<u8> {
        let mut header = VgmHeader::new(0x150);
        header.sn76489_clock = 3_579_545;
        header.data_offset = 0x0C;
        header.total_samples = 882 * 2;
        let mut data = header.to_bytes();
        data.extend_from_slice(&[0x50, 0x9F, 0x63, 0x63, 0x66]);
        data
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(VgmFileLoader::detect_format(b"Vgm \x00"), SongFormat::Vgm);
        assert_eq!(
            VgmFileLoader::detect_format(&[0x1F, 0x8B, 0x08, 0x00]),
            SongFormat::Vgz
        );
        assert_eq!(VgmFileLoader::detect_format(b"\x05\x32"), SongFormat::Unknown);
    }

    #[test]
    fn test_load_infers_rate_and_checks() {
        let song = VgmFileLoader::load_from_bytes(&minimal_vgm()).unwrap();
        assert_eq!(song.rate, 50);
        assert_eq!(song.frames.len(), 2);
        assert_eq!(song.expected_frames(), 2);
        assert_eq!(song.title(), "");
        song.check().unwrap();
    }

    #[test]
    fn test_load_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&minimal_vgm()).unwrap();
        let packed = encoder.finish().unwrap();

        let song = VgmFileLoader::load_from_bytes(&packed).unwrap();
        assert_eq!(song.format, SongFormat::Vgz);
        assert_eq!(song.frames.len(), 2);
    }

    #[test]
    fn test_unknown_format() {
        let err = VgmFileLoader::load_from_bytes(b"YM6!LeOnArD!").unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn test_missing_file() {
        assert!(VgmFileLoader::load("/nonexistent/song.vgm").is_err());
    }

    #[test]
    fn test_companion_capture_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        let vgm = dir.path().join("song.vgm");
        assert_eq!(VgmFileLoader::find_companion_capture(&vgm), None);

        let plain = dir.path().join("song.bin");
        fs::write(&plain, [0u8]).unwrap();
        assert_eq!(VgmFileLoader::find_companion_capture(&vgm), Some(plain));

        let specific = dir.path().join("song.sn76489.bin");
        fs::write(&specific, [0u8]).unwrap();
        assert_eq!(
            VgmFileLoader::find_companion_capture(&vgm),
            Some(specific)
        );
    }
}
