// Clip decoding
//
// A clip decoder is a one-shot PCM byte stream plus the format descriptor the
// playback stream must be opened with. The container is picked from the file
// extension before anything is opened:
// - wav: samples passed through in the file's own encoding
// - mp3: decoded to interleaved signed 16-bit stereo

pub mod mp3;
pub mod wav;

pub use mp3::Mp3Decoder;
pub use wav::WavDecoder;

use std::io::{self, Read};
use std::path::Path;

use super::types::StreamFormat;
use crate::error::{EngineError, Result};

/// Lazy, finite PCM stream. Not restartable: replaying a clip means opening a
/// new decoder from the file.
pub trait ClipDecoder: Read + Send {
    fn format(&self) -> StreamFormat;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipContainer {
    Wav,
    Mp3,
}

impl ClipContainer {
    /// Pick the container from the extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("wav") => Ok(ClipContainer::Wav),
            Some("mp3") => Ok(ClipContainer::Mp3),
            Some(other) => Err(EngineError::UnsupportedFormat(format!(
                "unsupported audio file extension .{}",
                other
            ))),
            None => Err(EngineError::UnsupportedFormat(format!(
                "no file extension on {}",
                path.display()
            ))),
        }
    }

    pub fn open(&self, path: &Path) -> Result<Box<dyn ClipDecoder>> {
        Ok(match self {
            ClipContainer::Wav => Box::new(WavDecoder::open(path)?),
            ClipContainer::Mp3 => Box::new(Mp3Decoder::open(path)?),
        })
    }
}

/// Keep reading until `buf` is full or the stream ends; returns bytes written
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Shared pending-bytes buffer the decoders serve `read` from
#[derive(Debug, Default)]
pub(crate) struct PendingBytes {
    bytes: Vec<u8>,
    cursor: usize,
}

impl PendingBytes {
    pub(crate) fn is_drained(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    pub(crate) fn reset(&mut self) -> &mut Vec<u8> {
        self.bytes.clear();
        self.cursor = 0;
        &mut self.bytes
    }

    pub(crate) fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let available = &self.bytes[self.cursor..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.cursor += n;
        n
    }
}
