use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::{ClipDecoder, PendingBytes};
use crate::audio::types::{SampleFormat, StreamFormat};
use crate::error::{EngineError, Result};

/// Samples decoded per refill
const CHUNK_SAMPLES: usize = 4096;

/// WAV clip passed through in its stored encoding
pub struct WavDecoder<R: Read> {
    reader: hound::WavReader<R>,
    format: StreamFormat,
    pending: PendingBytes,
}

impl WavDecoder<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> WavDecoder<R> {
    pub fn new(source: R) -> Result<Self> {
        let reader = hound::WavReader::new(source).map_err(open_error)?;
        let spec = reader.spec();
        let sample_format = sample_format_for(spec.sample_format, spec.bits_per_sample)?;

        Ok(Self {
            reader,
            format: StreamFormat {
                sample_format,
                channels: spec.channels,
                sample_rate: spec.sample_rate,
            },
            pending: PendingBytes::default(),
        })
    }

    fn refill(&mut self) -> io::Result<()> {
        let out = self.pending.reset();

        if self.format.sample_format == SampleFormat::F32 {
            for sample in self.reader.samples::<f32>().take(CHUNK_SAMPLES) {
                let sample = sample.map_err(read_error)?;
                out.extend_from_slice(&sample.to_ne_bytes());
            }
        } else {
            for sample in self.reader.samples::<i32>().take(CHUNK_SAMPLES) {
                let sample = sample.map_err(read_error)?;
                encode_int(self.format.sample_format, sample, out);
            }
        }

        Ok(())
    }
}

impl<R: Read> Read for WavDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending.is_drained() {
            self.refill()?;
        }
        Ok(self.pending.drain_into(buf))
    }
}

impl<R: Read + Send> ClipDecoder for WavDecoder<R> {
    fn format(&self) -> StreamFormat {
        self.format
    }
}

/// Map the container's (format code, bits per sample) pair to a stream encoding
pub fn sample_format_for(format: hound::SampleFormat, bits_per_sample: u16) -> Result<SampleFormat> {
    match (format, bits_per_sample) {
        (hound::SampleFormat::Int, 8) => Ok(SampleFormat::U8),
        (hound::SampleFormat::Int, 16) => Ok(SampleFormat::S16),
        (hound::SampleFormat::Int, 24) => Ok(SampleFormat::S24),
        (hound::SampleFormat::Int, 32) => Ok(SampleFormat::S32),
        (hound::SampleFormat::Float, 32) => Ok(SampleFormat::F32),
        (format, bits) => Err(EngineError::UnsupportedFormat(format!(
            "WAV {:?} with {} bits per sample",
            format, bits
        ))),
    }
}

// hound hands 8-bit samples back re-centred around zero; the device wants them
// unsigned again.
fn encode_int(format: SampleFormat, sample: i32, out: &mut Vec<u8>) {
    match format {
        SampleFormat::U8 => out.push((sample + 128) as u8),
        SampleFormat::S16 => out.extend_from_slice(&(sample as i16).to_ne_bytes()),
        SampleFormat::S24 => out.extend_from_slice(&sample.to_le_bytes()[..3]),
        SampleFormat::S32 => out.extend_from_slice(&sample.to_ne_bytes()),
        SampleFormat::F32 => unreachable!("float samples are not read as integers"),
    }
}

fn open_error(e: hound::Error) -> EngineError {
    match e {
        hound::Error::IoError(e) => EngineError::Io(e),
        hound::Error::Unsupported => {
            EngineError::UnsupportedFormat("WAV encoding not supported".to_string())
        }
        other => EngineError::Decode(other.to_string()),
    }
}

fn read_error(e: hound::Error) -> io::Error {
    match e {
        hound::Error::IoError(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}
