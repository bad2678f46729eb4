//! CSV frame trace
//!
//! One row per frame. Write bytes are shown in binary with the latch fields split out
//! (`0b1_cc_t_dddd` for latch bytes, `0b0_x_dddddd` for data bytes), which makes register
//! traffic readable at a glance. When chip snapshots are supplied, the state at the end of each
//! frame is appended.

use crate::sn76489::ChipSnapshot;
use crate::vgm_parser::Frame;
use crate::{Result, Sn76489Error};
use serde::Serialize;
use std::path::Path;

/// One CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRow {
    /// Frame index
    pub frame: usize,
    /// Bytes written in the frame
    pub writes: usize,
    /// Bytes in binary, space separated
    pub bytes: String,
    /// Latched tone periods after the frame
    pub periods: Option<String>,
    /// Attenuation codes after the frame
    pub attenuation: Option<String>,
    /// Noise control field after the frame
    pub noise_control: Option<u8>,
    /// Noise shift register after the frame
    pub lfsr: Option<String>,
}

impl TraceRow {
    /// Row for `frame`, optionally with the chip state that followed it
    pub fn new(index: usize, frame: &[u8], snapshot: Option<&ChipSnapshot>) -> Self {
        let bytes = frame.iter().map(|&b| format_write(b)).collect::<Vec<_>>().join(" ");
        TraceRow {
            frame: index,
            writes: frame.len(),
            bytes,
            periods: snapshot.map(|s| spaced(s.tones.iter().map(|t| t.compare))),
            attenuation: snapshot.map(|s| spaced(s.attenuation)),
            noise_control: snapshot.map(|s| s.noise.control),
            lfsr: snapshot.map(|s| format!("0x{:04X}", s.noise.lfsr)),
        }
    }
}

fn spaced<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Binary rendering of one write byte
pub fn format_write(byte: u8) -> String {
    if byte & 0x80 != 0 {
        format!(
            "0b1_{:02b}_{:b}_{:04b}",
            (byte >> 5) & 0x03,
            (byte >> 4) & 0x01,
            byte & 0x0F
        )
    } else {
        format!("0b0_{:b}_{:06b}", (byte >> 6) & 0x01, byte & 0x3F)
    }
}

/// Write the trace for `frames` to `path`
///
/// `snapshots[i]` is paired with `frames[i]`; frames past the end of `snapshots` get empty
/// state columns.
pub fn write_frame_trace(
    path: &Path,
    frames: &[Frame],
    snapshots: Option<&[ChipSnapshot]>,
) -> Result<()> {
    let to_err = |e: csv::Error| {
        Sn76489Error::AudioFileError(format!("Failed to write trace '{}': {}", path.display(), e))
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    for (i, frame) in frames.iter().enumerate() {
        let snapshot = snapshots.and_then(|s| s.get(i));
        writer
            .serialize(TraceRow::new(i, frame, snapshot))
            .map_err(to_err)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sn76489::Sn76489;

    #[test]
    fn test_format_write() {
        assert_eq!(format_write(0x9F), "0b1_00_1_1111");
        assert_eq!(format_write(0xE4), "0b1_11_0_0100");
        assert_eq!(format_write(0x3F), "0b0_0_111111");
        assert_eq!(format_write(0x40), "0b0_1_000000");
    }

    #[test]
    fn test_row_with_snapshot() {
        let mut chip = Sn76489::new();
        chip.write_data(0x9F);
        chip.advance_clock(1);
        let snap = chip.snapshot();
        let row = TraceRow::new(3, &[0x9F], Some(&snap));
        assert_eq!(row.writes, 1);
        assert_eq!(row.attenuation.as_deref(), Some("15 15 15 15"));
        assert!(row.lfsr.is_some());

        let bare = TraceRow::new(0, &[], None);
        assert_eq!(bare.bytes, "");
        assert_eq!(bare.periods, None);
    }

    #[test]
    fn test_trace_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.csv");
        let frames = vec![vec![0x80, 0x01], vec![]];
        write_frame_trace(&path, &frames, None).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("frame,writes,bytes,periods,attenuation,noise_control,lfsr")
        );
        assert_eq!(lines.next(), Some("0,2,0b1_00_0_0000 0b0_0_000001,,,,"));
        assert_eq!(lines.next(), Some("1,0,,,,,"));
    }
}
