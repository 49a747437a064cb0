//! Line shaping applied before transmission
//!
//! The panel expects every pixel-data byte XORed with a fixed 4-byte
//! pattern, repeating across each line. This is a framing requirement of
//! the receiver, not encryption. XOR makes the transform its own inverse.

use crate::buffer::FrameBuffer;
use crate::layout::{LINE_DATA_BYTES, SHAPING_PATTERN};

/// Shape the pixel-data part of one line
///
/// `src` and `dst` must be the same length and a multiple of the pattern
/// length; trailing bytes that do not fill a whole group are left alone.
#[inline]
pub fn shape_line(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src
        .chunks_exact(SHAPING_PATTERN.len())
        .zip(dst.chunks_exact_mut(SHAPING_PATTERN.len()))
    {
        d[0] = s[0] ^ SHAPING_PATTERN[0];
        d[1] = s[1] ^ SHAPING_PATTERN[1];
        d[2] = s[2] ^ SHAPING_PATTERN[2];
        d[3] = s[3] ^ SHAPING_PATTERN[3];
    }
}

/// Regenerate `send` from `draw`
///
/// Pixel data is shaped line by line; gutter bytes are copied verbatim.
///
/// # Example
/// ```
/// use protocol::{FrameBuffer, shape_frame};
///
/// let draw = FrameBuffer::new();
/// let mut send = FrameBuffer::new();
/// shape_frame(&draw, &mut send);
/// assert_eq!(&send.as_bytes()[..4], &[0xE7, 0xF3, 0xE7, 0xFF]);
/// ```
pub fn shape_frame(draw: &FrameBuffer, send: &mut FrameBuffer) {
    for (src, dst) in draw.lines().zip(send.lines_mut()) {
        let (src_data, src_gutter) = src.split_at(LINE_DATA_BYTES);
        let (dst_data, dst_gutter) = dst.split_at_mut(LINE_DATA_BYTES);

        shape_line(src_data, dst_data);
        dst_gutter.copy_from_slice(src_gutter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GUTTER_BYTES, LINE_STRIDE_BYTES};

    #[test]
    fn test_pattern_is_positional() {
        let src = [0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut dst = [0u8; 8];
        shape_line(&src, &mut dst);
        assert_eq!(dst, [0xE7, 0xF3, 0xE7, 0xFF, 0x18, 0x0C, 0x18, 0x00]);
    }

    #[test]
    fn test_gutter_copied_not_shaped() {
        let mut draw = FrameBuffer::new();
        for line in draw.lines_mut() {
            line[LINE_DATA_BYTES..].fill(0x42);
        }
        let mut send = FrameBuffer::filled(0x99);

        shape_frame(&draw, &mut send);

        for (d, s) in draw.lines().zip(send.lines()) {
            assert_eq!(&d[LINE_DATA_BYTES..], &s[LINE_DATA_BYTES..]);
            assert_eq!(s[LINE_DATA_BYTES..].len(), GUTTER_BYTES);
        }
    }

    #[test]
    fn test_every_line_shaped() {
        let draw = FrameBuffer::new();
        let mut send = FrameBuffer::new();
        shape_frame(&draw, &mut send);

        for line in send.lines() {
            assert_eq!(line.len(), LINE_STRIDE_BYTES);
            assert_eq!(&line[LINE_DATA_BYTES - 4..LINE_DATA_BYTES], &SHAPING_PATTERN);
        }
    }

    #[test]
    fn test_shape_twice_restores() {
        let mut draw = FrameBuffer::new();
        for (i, b) in draw.as_bytes_mut().iter_mut().enumerate() {
            *b = (i * 31 % 251) as u8;
        }
        let mut once = FrameBuffer::new();
        let mut twice = FrameBuffer::new();

        shape_frame(&draw, &mut once);
        shape_frame(&once, &mut twice);

        assert_eq!(twice, draw);
        assert_ne!(once, draw);
    }
}
