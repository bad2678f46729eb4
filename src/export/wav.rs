//! WAV file output

use crate::replayer::Pcm;
use crate::{Result, Sn76489Error};
use std::path::{Path, PathBuf};

fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Write one mono 16-bit track
pub fn write_wav_track(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate)).map_err(|e| {
        Sn76489Error::AudioFileError(format!(
            "Failed to create WAV file '{}': {}",
            path.display(),
            e
        ))
    })?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| Sn76489Error::AudioFileError(format!("Failed to write sample: {}", e)))?;
    }

    writer.finalize().map_err(|e| {
        Sn76489Error::AudioFileError(format!("Failed to finalize WAV file: {}", e))
    })?;
    Ok(())
}

/// Write the five tracks as `<stem>.<track>.wav` into `dir`
///
/// Returns the written paths in track order.
pub fn write_pcm_tracks(pcm: &Pcm, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(Pcm::TRACK_NAMES.len());
    for (name, samples) in pcm.tracks() {
        let path = dir.join(format!("{}.{}.wav", stem, name));
        println!("Writing WAV file to {}...", path.display());
        write_wav_track(&path, samples, pcm.sample_rate)?;
        written.push(path);
    }
    Ok(written)
}

/// Read a mono 16-bit track back, returning samples and sample rate
pub fn read_wav_track(path: &Path) -> Result<(Vec<i16>, u32)> {
    let mut reader = hound::WavReader::open(path).map_err(|e| {
        Sn76489Error::AudioFileError(format!("Failed to open WAV file '{}': {}", path.display(), e))
    })?;
    let rate = reader.spec().sample_rate;
    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Sn76489Error::AudioFileError(format!("Failed to read sample: {}", e)))?;
    Ok((samples, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm() -> Pcm {
        Pcm {
            sample_rate: 22_050,
            master: vec![-32767, 0, 32767],
            tone0: vec![1, 2, 3],
            tone1: vec![4, 5, 6],
            tone2: vec![7, 8, 9],
            noise: vec![-1, -2, -3],
        }
    }

    #[test]
    fn test_five_tracks_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_pcm_tracks(&pcm(), dir.path(), "song").unwrap();
        assert_eq!(paths.len(), 5);
        assert!(paths[0].ends_with("song.master.wav"));
        assert!(paths[4].ends_with("song.noise.wav"));

        let (master, rate) = read_wav_track(&paths[0]).unwrap();
        assert_eq!(rate, 22_050);
        assert_eq!(master, vec![-32767, 0, 32767]);
        let (noise, _) = read_wav_track(&paths[4]).unwrap();
        assert_eq!(noise, vec![-1, -2, -3]);
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("x.wav");
        let err = write_wav_track(&path, &[0], 44_100).unwrap_err();
        assert!(matches!(err, Sn76489Error::AudioFileError(_)));
    }
}
