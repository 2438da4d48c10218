//! Session-wide streaming compression context
//!
//! One zlib stream spans every unit of a session. Each unit is terminated by a
//! sync flush so the receiver can inflate it on arrival, while later units keep
//! back-referencing the dictionary built by earlier ones. Neither side is ever
//! reset mid-session.

use crate::ProtocolError;
use bytes::Bytes;
use flate2::write::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use std::io::Write;

/// Compression level used for bootstrap bundles
pub const DEFAULT_LEVEL: u32 = 1;

/// Sender half of the compression context
pub struct Compressor {
    encoder: ZlibEncoder<Vec<u8>>,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor {
    /// Fresh context at the default level
    pub fn new() -> Self {
        Self::with_level(DEFAULT_LEVEL)
    }

    /// Fresh context at a custom level (0-9)
    pub fn with_level(level: u32) -> Self {
        Self {
            encoder: ZlibEncoder::new(Vec::new(), Compression::new(level)),
        }
    }

    /// Compress one unit and sync-flush, returning exactly the bytes for this unit
    pub fn compress_unit(&mut self, data: &[u8]) -> Result<Bytes, ProtocolError> {
        self.encoder.write_all(data)?;
        // Sync flush: byte-aligned boundary, dictionary kept
        self.encoder.flush()?;
        Ok(Bytes::from(std::mem::take(self.encoder.get_mut())))
    }

    /// Total uncompressed bytes consumed so far
    pub fn total_in(&self) -> u64 {
        self.encoder.total_in()
    }

    /// Total compressed bytes produced so far
    pub fn total_out(&self) -> u64 {
        self.encoder.total_out()
    }
}

/// Receiver half of the compression context
pub struct Decompressor {
    decoder: ZlibDecoder<Vec<u8>>,
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor {
    /// Fresh context
    pub fn new() -> Self {
        Self {
            decoder: ZlibDecoder::new(Vec::new()),
        }
    }

    /// Inflate the body of the unit `name`
    pub fn decompress_unit(&mut self, name: &str, body: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let corrupt = |e: std::io::Error| ProtocolError::CorruptBody {
            name: name.to_string(),
            reason: e.to_string(),
        };
        self.decoder.write_all(body).map_err(corrupt)?;
        self.decoder.flush().map_err(corrupt)?;
        Ok(std::mem::take(self.decoder.get_mut()))
    }

    /// Total compressed bytes consumed so far
    pub fn total_in(&self) -> u64 {
        self.decoder.total_in()
    }
}
