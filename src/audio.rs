//! Decoded audio buffers
//!
//! Thin wrapper around `hound` that keeps decoded PCM samples together with
//! their format, so per-utterance results can be appended in script order
//! and written out as one WAV file.

use crate::{Result, VvError};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;

/// PCM sample storage, integer or float depending on the source container
#[derive(Debug, Clone, PartialEq)]
enum Samples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl Samples {
    fn len(&self) -> usize {
        match self {
            Samples::Int(s) => s.len(),
            Samples::Float(s) => s.len(),
        }
    }
}

/// Decoded audio with a fixed sample format
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    spec: WavSpec,
    samples: Samples,
}

impl AudioBuffer {
    /// Create a buffer with no samples
    pub fn empty(spec: WavSpec) -> Self {
        let samples = match spec.sample_format {
            SampleFormat::Int => Samples::Int(Vec::new()),
            SampleFormat::Float => Samples::Float(Vec::new()),
        };
        Self { spec, samples }
    }

    /// Create a 16/24/32-bit integer PCM buffer from interleaved samples
    pub fn from_int_samples(spec: WavSpec, samples: Vec<i32>) -> Result<Self> {
        if spec.sample_format != SampleFormat::Int {
            return Err(VvError::Audio("integer samples need an integer spec".into()));
        }
        Ok(Self {
            spec,
            samples: Samples::Int(samples),
        })
    }

    /// Decode a complete WAV container
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        let samples = match spec.sample_format {
            SampleFormat::Int => Samples::Int(reader.samples::<i32>().collect::<std::result::Result<_, _>>()?),
            SampleFormat::Float => {
                Samples::Float(reader.samples::<f32>().collect::<std::result::Result<_, _>>()?)
            }
        };
        debug!(
            "Decoded WAV: {} Hz, {} ch, {} bit, {} samples",
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            samples.len()
        );
        Ok(Self { spec, samples })
    }

    /// Append another buffer's samples after this one's
    ///
    /// Both buffers must share sample rate, channel count, bit depth and
    /// sample format. No resampling or silence is inserted.
    pub fn append(&mut self, other: AudioBuffer) -> Result<()> {
        if self.spec != other.spec {
            return Err(VvError::Audio(format!(
                "incompatible formats: {} Hz/{} ch/{} bit vs {} Hz/{} ch/{} bit",
                self.spec.sample_rate,
                self.spec.channels,
                self.spec.bits_per_sample,
                other.spec.sample_rate,
                other.spec.channels,
                other.spec.bits_per_sample
            )));
        }

        match (&mut self.samples, other.samples) {
            (Samples::Int(a), Samples::Int(b)) => a.extend(b),
            (Samples::Float(a), Samples::Float(b)) => a.extend(b),
            _ => return Err(VvError::Audio("mismatched sample storage".into())),
        }
        Ok(())
    }

    /// Concatenate buffers in iteration order
    ///
    /// Returns `None` when the iterator is empty.
    pub fn concat<I>(buffers: I) -> Result<Option<AudioBuffer>>
    where
        I: IntoIterator<Item = AudioBuffer>,
    {
        let mut iter = buffers.into_iter();
        let Some(mut joined) = iter.next() else {
            return Ok(None);
        };
        for buffer in iter {
            joined.append(buffer)?;
        }
        Ok(Some(joined))
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Number of interleaved samples across all channels
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Size of the raw PCM payload in bytes
    pub fn byte_len(&self) -> usize {
        self.samples.len() * usize::from(self.spec.bits_per_sample).div_ceil(8)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    /// Playback length
    pub fn duration(&self) -> Duration {
        let frames_per_sec = u64::from(self.spec.sample_rate) * u64::from(self.spec.channels);
        if frames_per_sec == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / frames_per_sec as f64)
    }

    /// Encode as a complete WAV container in memory
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, self.spec)?;
            match &self.samples {
                Samples::Int(samples) => {
                    for &s in samples {
                        writer.write_sample(s)?;
                    }
                }
                Samples::Float(samples) => {
                    for &s in samples {
                        writer.write_sample(s)?;
                    }
                }
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Write the buffer as a WAV file, replacing `path` atomically
    ///
    /// The file is encoded fully in memory and staged in the destination
    /// directory first, so a failure never leaves a partial file behind.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let bytes = self.to_wav_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(&bytes)?;
        staged.flush()?;
        staged.persist(path).map_err(|e| VvError::Io(e.error))?;

        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}
