//! Frame sequence cross-check
//!
//! Two decodings of the same song must agree frame for frame. The only tolerated difference is
//! a tail of empty frames on the longer side.

use super::config::MismatchPolicy;
use crate::vgm_loader::VgmSong;
use crate::vgm_parser::{Frame, RawCapture};
use crate::{Result, Sn76489Error};

/// Outcome of a comparison that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossCheckReport {
    /// Frames compared one to one
    pub compared: usize,
    /// Frames in the first sequence
    pub left_len: usize,
    /// Frames in the second sequence
    pub right_len: usize,
    /// Divergence tolerated under [`MismatchPolicy::Warn`]
    pub divergence: Option<String>,
}

impl CrossCheckReport {
    /// True when the sequences agree
    pub fn is_clean(&self) -> bool {
        self.divergence.is_none()
    }

    /// Length difference made up of empty frames
    pub fn padding(&self) -> usize {
        self.left_len.abs_diff(self.right_len)
    }
}

fn describe(frame: &[u8]) -> String {
    if frame.is_empty() {
        "[]".into()
    } else {
        format!("{:02X?}", frame)
    }
}

/// Compare two frame sequences
///
/// Returns [`Sn76489Error::ConsistencyError`] at the first differing frame, or when the longer
/// sequence has a non-empty frame past the end of the shorter one.
pub fn cross_check(left: &[Frame], right: &[Frame]) -> Result<CrossCheckReport> {
    let compared = left.len().min(right.len());

    if let Some(i) = (0..compared).find(|&i| left[i] != right[i]) {
        return Err(Sn76489Error::ConsistencyError(format!(
            "frame {} differs: {} vs {}",
            i,
            describe(&left[i]),
            describe(&right[i])
        )));
    }

    let (longer, side) = if left.len() > right.len() {
        (left, "first")
    } else {
        (right, "second")
    };
    if let Some(offset) = longer[compared..].iter().position(|f| !f.is_empty()) {
        return Err(Sn76489Error::ConsistencyError(format!(
            "{} sequence has {} extra frames and frame {} is not empty: {}",
            side,
            longer.len() - compared,
            compared + offset,
            describe(&longer[compared + offset])
        )));
    }

    Ok(CrossCheckReport {
        compared,
        left_len: left.len(),
        right_len: right.len(),
        divergence: None,
    })
}

/// Check a loaded song against its raw capture under `policy`
///
/// The capture must also agree on the playback rate.
pub fn verify_capture(
    song: &VgmSong,
    capture: &RawCapture,
    policy: MismatchPolicy,
) -> Result<CrossCheckReport> {
    let result = if capture.rate as u32 != song.rate {
        Err(Sn76489Error::ConsistencyError(format!(
            "playback rate differs: VGM {} Hz, capture {} Hz",
            song.rate, capture.rate
        )))
    } else {
        cross_check(&song.frames, &capture.frames)
    };

    match (result, policy) {
        (Ok(report), _) => Ok(report),
        (Err(e), MismatchPolicy::Warn) if e.is_consistency() => Ok(CrossCheckReport {
            compared: song.frames.len().min(capture.frames.len()),
            left_len: song.frames.len(),
            right_len: capture.frames.len(),
            divergence: Some(e.to_string()),
        }),
        (Err(e), _) => Err(e),
    }
}
