//! Frame codec for async streams

use crate::frame::{parse_flag, SENTINEL};
use crate::{Frame, ProtocolError};
use bytes::Bytes;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
};

/// Maximum frame body size (16MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;
/// Maximum length of one header line, newline included
pub const MAX_HEADER_LINE: usize = 4096;

/// Frame codec for encoding/decoding frames over async streams
pub struct FrameCodec {
    /// Scratch buffer for header lines
    line_buf: Vec<u8>,
    /// Maximum body size allowed
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Create a new frame codec with default settings
    pub fn new() -> Self {
        Self::with_max_frame_size(MAX_FRAME_SIZE)
    }

    /// Create a new frame codec with custom max body size
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            line_buf: Vec::with_capacity(128),
            max_frame_size,
        }
    }

    /// Encode a frame to its wire form
    pub fn encode_frame(&self, frame: &Frame) -> Result<Bytes, ProtocolError> {
        self.check_size(frame.payload_size())?;
        check_unit_name(&frame.name)?;
        Ok(frame.to_bytes())
    }

    /// Write a frame to an async writer
    pub async fn write_frame<W>(
        &self,
        writer: &mut W,
        frame: &Frame,
    ) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        let encoded = self.encode_frame(frame)?;
        writer.write_all(&encoded).await?;
        Ok(())
    }

    /// Write the end-of-stream sentinel and flush
    pub async fn write_sentinel<W>(&self, writer: &mut W) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(SENTINEL).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read the next frame; `None` once the sentinel is seen
    pub async fn read_frame<R>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Frame>, ProtocolError>
    where
        R: AsyncBufRead + Unpin,
    {
        let name = self.read_line(reader, "unit name").await?;
        if name.is_empty() {
            return Ok(None);
        }

        let flag = self.read_line(reader, "package flag").await?;
        let is_package = parse_flag(&flag).ok_or_else(|| {
            ProtocolError::MalformedFrame(format!("package flag {:?} for {}", flag, name))
        })?;

        let count = self.read_line(reader, "byte count").await?;
        let size: usize = count.parse().map_err(|_| {
            ProtocolError::MalformedFrame(format!("byte count {:?} for {}", count, name))
        })?;
        self.check_size(size)?;

        let body = read_counted(reader, size, &name).await?;
        Ok(Some(Frame::new(name, is_package, body)))
    }

    fn check_size(&self, size: usize) -> Result<(), ProtocolError> {
        if size > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        Ok(())
    }

    /// Read one header line (at most `MAX_HEADER_LINE` bytes), trimmed
    async fn read_line<R>(&mut self, reader: &mut R, what: &str) -> Result<String, ProtocolError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.line_buf.clear();
        (&mut *reader)
            .take(MAX_HEADER_LINE as u64)
            .read_until(b'\n', &mut self.line_buf)
            .await?;
        if self.line_buf.last() != Some(&b'\n') {
            if self.line_buf.len() >= MAX_HEADER_LINE {
                return Err(ProtocolError::MalformedFrame(format!(
                    "{} exceeds {} bytes",
                    what, MAX_HEADER_LINE
                )));
            }
            return Err(ProtocolError::TruncatedStream(format!(
                "stream ended while reading {}",
                what
            )));
        }

        let line = std::str::from_utf8(&self.line_buf).map_err(|_| {
            ProtocolError::MalformedFrame(format!("{} is not valid UTF-8", what))
        })?;
        Ok(line.trim().to_string())
    }
}

/// Reject names the header format cannot carry unchanged
///
/// The reader trims header lines, so a name must survive a trim untouched.
pub fn check_unit_name(name: &str) -> Result<(), ProtocolError> {
    if name.is_empty()
        || name.len() >= MAX_HEADER_LINE
        || name.contains(['\n', '\r'])
        || name.trim() != name
    {
        return Err(ProtocolError::MalformedFrame(format!(
            "unit name {:?} cannot be framed",
            name
        )));
    }
    Ok(())
}

/// Read exactly `size` bytes, failing with `TruncatedStream` on a short read
pub async fn read_counted<R>(
    reader: &mut R,
    size: usize,
    what: &str,
) -> Result<Bytes, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::with_capacity(size);
    (&mut *reader).take(size as u64).read_to_end(&mut body).await?;
    if body.len() < size {
        return Err(ProtocolError::TruncatedStream(format!(
            "{}: expected {} bytes, got {}",
            what,
            size,
            body.len()
        )));
    }
    Ok(Bytes::from(body))
}
