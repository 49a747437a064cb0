//! Fixed-size line-padded frame buffer
//!
//! Both the draw buffer (freshly packed pixels) and the send buffer (shaped
//! bytes) use this type. The length is fixed at [`FRAME_BYTES`] for the whole
//! lifetime of the buffer.

use crate::error::{ProtocolError, Result};
use crate::layout::{FRAME_BYTES, LINE_DATA_BYTES, LINE_STRIDE_BYTES, MESSAGE_BYTES, PANEL_HEIGHT};
use std::fmt;
use std::slice::{ChunksExact, ChunksExactMut};

/// One panel frame laid out as `PANEL_HEIGHT` lines of `LINE_STRIDE_BYTES`
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: Box<[u8]>,
}

impl FrameBuffer {
    /// Allocate a zeroed frame
    pub fn new() -> Self {
        Self::filled(0)
    }

    /// Allocate a frame with every byte set to `byte`
    pub fn filled(byte: u8) -> Self {
        Self {
            bytes: vec![byte; FRAME_BYTES].into_boxed_slice(),
        }
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable raw frame bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Full stride of one line (pixel data followed by gutter)
    pub fn line(&self, line: usize) -> Result<&[u8]> {
        check_line(line)?;
        let start = line * LINE_STRIDE_BYTES;
        Ok(&self.bytes[start..start + LINE_STRIDE_BYTES])
    }

    /// Gutter bytes of one line
    pub fn gutter(&self, line: usize) -> Result<&[u8]> {
        Ok(&self.line(line)?[LINE_DATA_BYTES..])
    }

    /// Iterate over every line stride
    pub fn lines(&self) -> ChunksExact<'_, u8> {
        self.bytes.chunks_exact(LINE_STRIDE_BYTES)
    }

    /// Iterate mutably over every line stride
    pub fn lines_mut(&mut self) -> ChunksExactMut<'_, u8> {
        self.bytes.chunks_exact_mut(LINE_STRIDE_BYTES)
    }

    /// Split the frame into bulk-message sized slices, in wire order
    pub fn messages(&self) -> ChunksExact<'_, u8> {
        self.bytes.chunks_exact(MESSAGE_BYTES)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

fn check_line(line: usize) -> Result<()> {
    if line >= PANEL_HEIGHT {
        return Err(ProtocolError::LineOutOfRange {
            line,
            height: PANEL_HEIGHT,
        });
    }
    Ok(())
}
