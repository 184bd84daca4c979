use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

use super::{ClipDecoder, PendingBytes};
use crate::audio::types::{SampleFormat, StreamFormat};
use crate::error::{EngineError, Result};

/// Output is always interleaved stereo
pub const MP3_CHANNELS: u16 = 2;

/// Compressed clip decoded to signed 16-bit stereo
pub struct Mp3Decoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: StreamFormat,
    sample_buf: Option<SampleBuffer<i16>>,
    pending: PendingBytes,
    finished: bool,
}

impl Mp3Decoder {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_source(Box::new(file))
    }

    pub fn from_source(source: Box<dyn MediaSource>) -> Result<Self> {
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(open_error)?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| EngineError::Decode("no audio track in stream".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| EngineError::Decode("stream header has no sample rate".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(open_error)?;

        Ok(Self {
            track_id: track.id,
            format_reader,
            decoder,
            format: StreamFormat {
                sample_format: SampleFormat::S16,
                channels: MP3_CHANNELS,
                sample_rate,
            },
            sample_buf: None,
            pending: PendingBytes::default(),
            finished: false,
        })
    }

    /// Decode packets until at least one produces samples or the stream ends
    fn refill(&mut self) -> io::Result<()> {
        self.pending.reset();

        while !self.finished {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    self.finished = true;
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.finished = true;
                    break;
                }
                Err(e) => return Err(read_error(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt mp3 frame: {}", e);
                    continue;
                }
                Err(e) => return Err(read_error(e)),
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            let needed = capacity * spec.channels.count() as u64;
            if self
                .sample_buf
                .as_ref()
                .map_or(true, |buf| (buf.capacity() as u64) < needed)
            {
                self.sample_buf = Some(SampleBuffer::new(capacity, spec));
            }
            let Some(sample_buf) = self.sample_buf.as_mut() else {
                continue;
            };
            sample_buf.copy_interleaved_ref(decoded);

            let out = self.pending.reset();
            interleave_stereo(sample_buf.samples(), spec.channels.count(), out);
            if !out.is_empty() {
                break;
            }
        }

        Ok(())
    }
}

impl Read for Mp3Decoder {
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

impl ClipDecoder for Mp3Decoder {
    fn format(&self) -> StreamFormat {
        self.format
    }
}

/// Append `samples` as native-endian stereo frames.
///
/// Mono is duplicated to both sides; anything wider keeps its first two channels.
pub fn interleave_stereo(samples: &[i16], channels: usize, out: &mut Vec<u8>) {
    if channels == 0 {
        return;
    }

    for frame in samples.chunks_exact(channels) {
        let (left, right) = match frame {
            [mono] => (*mono, *mono),
            [left, right, ..] => (*left, *right),
            [] => unreachable!("chunks_exact never yields empty frames"),
        };
        out.extend_from_slice(&left.to_ne_bytes());
        out.extend_from_slice(&right.to_ne_bytes());
    }
}

fn open_error(e: SymphoniaError) -> EngineError {
    match e {
        SymphoniaError::IoError(e) => EngineError::Io(e),
        SymphoniaError::Unsupported(what) => EngineError::UnsupportedFormat(what.to_string()),
        other => EngineError::Decode(other.to_string()),
    }
}

fn read_error(e: SymphoniaError) -> io::Error {
    match e {
        SymphoniaError::IoError(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}
