//! Per-call file formats (§6): `.amb`/`.imb`/`.dmb`/`.mbe` MBE artifact
//! containers, WAV output, and rotating raw symbol capture.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Timelike, Utc};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::errors::{DvError, FileError};

/// Cookie bytes identifying each MBE artifact container (§6).
const AMB_COOKIE: [u8; 4] = *b"AMBE";
const IMB_COOKIE: [u8; 4] = *b"IMBE";
const DMB_COOKIE: [u8; 4] = *b"DMBE";
const MBE_COOKIE: [u8; 4] = *b"GMBE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbeArtifactKind {
    Amb,
    Imb,
    Dmb,
    Mbe,
}

impl MbeArtifactKind {
    fn cookie(self) -> [u8; 4] {
        match self {
            MbeArtifactKind::Amb => AMB_COOKIE,
            MbeArtifactKind::Imb => IMB_COOKIE,
            MbeArtifactKind::Dmb => DMB_COOKIE,
            MbeArtifactKind::Mbe => MBE_COOKIE,
        }
    }

    fn from_cookie(cookie: [u8; 4]) -> Result<Self, DvError> {
        match cookie {
            AMB_COOKIE => Ok(MbeArtifactKind::Amb),
            IMB_COOKIE => Ok(MbeArtifactKind::Imb),
            DMB_COOKIE => Ok(MbeArtifactKind::Dmb),
            MBE_COOKIE => Ok(MbeArtifactKind::Mbe),
            other => Err(FileError::BadCookie { cookie: other }.into()),
        }
    }
}

/// Sequence of fixed-size MBE voice frames with a 4-byte cookie header.
pub struct MbeArtifactFile {
    kind: MbeArtifactKind,
    frames: Vec<Vec<u8>>,
}

impl MbeArtifactFile {
    pub fn new(kind: MbeArtifactKind) -> Self {
        Self { kind, frames: Vec::new() }
    }

    pub fn push_frame(&mut self, frame: Vec<u8>) {
        self.frames.push(frame);
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), DvError> {
        let path = path.as_ref();
        let mut file = fs::File::create(path).map_err(|e| FileError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        file.write_all(&self.kind.cookie()).map_err(|e| FileError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        for frame in &self.frames {
            file.write_all(frame).map_err(|e| FileError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>, frame_len: usize) -> Result<Self, DvError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| FileError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        if data.len() < 4 {
            return Err(FileError::BadCookie { cookie: [0; 4] }.into());
        }
        let mut cookie = [0u8; 4];
        cookie.copy_from_slice(&data[..4]);
        let kind = MbeArtifactKind::from_cookie(cookie)?;
        let frames = data[4..]
            .chunks(frame_len)
            .filter(|c| c.len() == frame_len)
            .map(|c| c.to_vec())
            .collect();
        Ok(Self { kind, frames })
    }

    pub fn kind(&self) -> MbeArtifactKind {
        self.kind
    }

    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }
}

/// Sample rates the decoder ever emits WAV at (§6): 8 kHz mono for most
/// vocoders, stereo for dual-slot DMR capture, and 48 kHz raw for
/// diagnostic discriminator dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavProfile {
    Mono8k,
    StereoDmr8k,
    Raw48k,
}

impl WavProfile {
    fn spec(self) -> WavSpec {
        match self {
            WavProfile::Mono8k => WavSpec {
                channels: 1,
                sample_rate: 8_000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            WavProfile::StereoDmr8k => WavSpec {
                channels: 2,
                sample_rate: 8_000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            WavProfile::Raw48k => WavSpec {
                channels: 1,
                sample_rate: 48_000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
        }
    }
}

pub struct WavFile {
    path: PathBuf,
    writer: Option<WavWriter<std::io::BufWriter<fs::File>>>,
    samples_written: usize,
}

impl WavFile {
    pub fn create(path: impl Into<PathBuf>, profile: WavProfile) -> Result<Self, DvError> {
        let path = path.into();
        let writer = WavWriter::create(&path, profile.spec()).map_err(FileError::Wav)?;
        Ok(Self {
            path,
            writer: Some(writer),
            samples_written: 0,
        })
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> Result<(), DvError> {
        let writer = self.writer.as_mut().expect("writer finalized");
        for &s in samples {
            writer.write_sample(s).map_err(FileError::Wav)?;
        }
        self.samples_written += samples.len();
        Ok(())
    }

    /// Finalizes the WAV file; per §6, a file that never received any
    /// samples is deleted rather than left behind as an empty recording.
    pub fn finish(mut self) -> Result<(), DvError> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(FileError::Wav)?;
        }
        if self.samples_written == 0 {
            let _ = fs::remove_file(&self.path);
        }
        Ok(())
    }
}

/// Rotating raw symbol capture (dibit stream to disk for offline replay),
/// rotating to a new file every hour (§6).
pub struct SymbolCaptureFile {
    directory: PathBuf,
    current: Option<fs::File>,
    current_hour: Option<DateTime<Utc>>,
}

impl SymbolCaptureFile {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            current: None,
            current_hour: None,
        }
    }

    fn hour_bucket(now: DateTime<Utc>) -> DateTime<Utc> {
        now.date_naive()
            .and_hms_opt(now.hour(), 0, 0)
            .unwrap()
            .and_utc()
    }

    fn rotate_if_needed(&mut self, now: DateTime<Utc>) -> Result<(), DvError> {
        let bucket = Self::hour_bucket(now);
        if self.current_hour == Some(bucket) && self.current.is_some() {
            return Ok(());
        }
        fs::create_dir_all(&self.directory).map_err(|e| FileError::Io {
            path: self.directory.display().to_string(),
            source: e,
        })?;
        let filename = format!("symbols-{}.bin", now.format("%Y%m%d-%H"));
        let path = self.directory.join(filename);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FileError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        self.current = Some(file);
        self.current_hour = Some(bucket);
        Ok(())
    }

    pub fn write_dibits(&mut self, dibits: &[u8], now: DateTime<Utc>) -> Result<(), DvError> {
        self.rotate_if_needed(now)?;
        let packed = crate::utils::pack_bits(
            &dibits
                .iter()
                .flat_map(|&d| [(d >> 1) & 1, d & 1])
                .collect::<Vec<u8>>(),
        );
        let file = self.current.as_mut().expect("rotated above");
        file.write_all(&packed).map_err(|e| FileError::Io {
            path: self.directory.display().to_string(),
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mbe_artifact_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.amb");
        let mut artifact = MbeArtifactFile::new(MbeArtifactKind::Amb);
        artifact.push_frame(vec![1, 2, 3, 4, 5, 6, 7]);
        artifact.push_frame(vec![8, 9, 10, 11, 12, 13, 14]);
        artifact.write_to(&path).unwrap();

        let loaded = MbeArtifactFile::read_from(&path, 7).unwrap();
        assert_eq!(loaded.kind(), MbeArtifactKind::Amb);
        assert_eq!(loaded.frames().len(), 2);
        assert_eq!(loaded.frames()[1], vec![8, 9, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn bad_cookie_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.amb");
        fs::write(&path, b"NOPE1234").unwrap();
        let result = MbeArtifactFile::read_from(&path, 4);
        assert!(result.is_err());
    }

    #[test]
    fn empty_wav_is_deleted_on_finish() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let wav = WavFile::create(&path, WavProfile::Mono8k).unwrap();
        wav.finish().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn non_empty_wav_survives_finish() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonempty.wav");
        let mut wav = WavFile::create(&path, WavProfile::Mono8k).unwrap();
        wav.write_samples(&[100, -100, 200]).unwrap();
        wav.finish().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn symbol_capture_rotates_per_hour_bucket() {
        let dir = tempdir().unwrap();
        let mut capture = SymbolCaptureFile::new(dir.path());
        let t0 = Utc::now();
        capture.write_dibits(&[0, 1, 2, 3], t0).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
