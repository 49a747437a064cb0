//! Pixel conversion from 4-plane 8-bit images to the panel's 16-bit format
//!
//! Input pixels are four interleaved bytes. Byte 0 is ignored, bytes 1..=3
//! are packed into one little-endian word per pixel:
//!
//! ```text
//! bits  0..=4   c1 >> 3
//! bits  5..=10  c2 & 0xFC
//! bits 11..=15  c3 & 0xF8
//! ```
//!
//! Output lines are written into the pixel-data region of a [`FrameBuffer`];
//! gutters are skipped and never written.

use crate::buffer::FrameBuffer;
use crate::error::ConversionError;
use crate::layout::{
    BYTES_PER_PIXEL, INPUT_IMAGE_BYTES, INPUT_PLANES, INPUT_ROW_BYTES, LINE_DATA_BYTES,
    PANEL_HEIGHT, PANEL_WIDTH,
};
use byteorder::{ByteOrder, LittleEndian};

/// Borrowed view of one incoming image
///
/// The view is only valid for the duration of a conversion call. An image
/// whose data could not be resolved by the host is represented with
/// [`ImageInput::unresolved`].
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    width: usize,
    height: usize,
    planes: usize,
    data: Option<&'a [u8]>,
}

impl<'a> ImageInput<'a> {
    /// Describe an image with explicit geometry
    pub fn new(width: usize, height: usize, planes: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            planes,
            data: Some(data),
        }
    }

    /// Image with the panel's own geometry
    pub fn panel(data: &'a [u8]) -> Self {
        Self::new(PANEL_WIDTH, PANEL_HEIGHT, INPUT_PLANES, data)
    }

    /// Image whose data pointer could not be resolved
    pub fn unresolved(width: usize, height: usize, planes: usize) -> Self {
        Self {
            width,
            height,
            planes,
            data: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn planes(&self) -> usize {
        self.planes
    }

    /// Check geometry and return the pixel bytes to read
    pub fn validate(&self) -> Result<&'a [u8], ConversionError> {
        let data = self.data.ok_or(ConversionError::MissingData)?;

        if self.width != PANEL_WIDTH || self.height != PANEL_HEIGHT {
            return Err(ConversionError::DimensionMismatch {
                width: self.width,
                height: self.height,
                expected_width: PANEL_WIDTH,
                expected_height: PANEL_HEIGHT,
            });
        }

        if self.planes != INPUT_PLANES {
            return Err(ConversionError::PlaneCount {
                planes: self.planes,
                expected: INPUT_PLANES,
            });
        }

        if data.len() < INPUT_IMAGE_BYTES {
            return Err(ConversionError::Truncated {
                expected: INPUT_IMAGE_BYTES,
                actual: data.len(),
            });
        }

        Ok(&data[..INPUT_IMAGE_BYTES])
    }
}

/// Pack one 4-byte input pixel into the panel's 16-bit word
///
/// # Example
/// ```
/// use protocol::pack_pixel;
///
/// assert_eq!(pack_pixel([0x00, 0xFF, 0x00, 0x00]), 0x001F);
/// assert_eq!(pack_pixel([0x00, 0x00, 0xFF, 0x00]), 0x07E0);
/// assert_eq!(pack_pixel([0x00, 0x00, 0x00, 0xFF]), 0xF800);
/// ```
#[inline]
pub const fn pack_pixel(pixel: [u8; 4]) -> u16 {
    let c1 = pixel[1] as u16;
    let c2 = pixel[2] as u16;
    let c3 = pixel[3] as u16;
    (c1 >> 3) | ((c2 & 0xFC) << 3) | ((c3 & 0xF8) << 8)
}

/// Convert a validated image into the draw buffer
///
/// Nothing is written unless the image passes validation. Only the first
/// [`LINE_DATA_BYTES`] of each line are touched.
pub fn convert_image(image: &ImageInput<'_>, draw: &mut FrameBuffer) -> Result<(), ConversionError> {
    let data = image.validate()?;

    for (src_row, dst_line) in data.chunks_exact(INPUT_ROW_BYTES).zip(draw.lines_mut()) {
        let dst_pixels = &mut dst_line[..LINE_DATA_BYTES];
        for (src, dst) in src_row
            .chunks_exact(INPUT_PLANES)
            .zip(dst_pixels.chunks_exact_mut(BYTES_PER_PIXEL))
        {
            let word = pack_pixel([src[0], src[1], src[2], src[3]]);
            LittleEndian::write_u16(dst, word);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GUTTER_BYTES, LINE_STRIDE_BYTES};

    fn solid_image(pixel: [u8; 4]) -> Vec<u8> {
        pixel
            .iter()
            .copied()
            .cycle()
            .take(INPUT_IMAGE_BYTES)
            .collect()
    }

    #[test]
    fn test_pack_pixel_boundaries() {
        assert_eq!(pack_pixel([0x00, 0x00, 0x00, 0x00]), 0x0000);
        assert_eq!(pack_pixel([0xFF, 0xFF, 0xFF, 0xFF]), 0xFFFF);
        // channel 0 never contributes
        assert_eq!(pack_pixel([0xFF, 0x00, 0x00, 0x00]), 0x0000);
    }

    #[test]
    fn test_pack_pixel_mid_range() {
        // 0x80 >> 3 = 0x10
        assert_eq!(pack_pixel([0, 0x80, 0, 0]), 0x0010);
        // (0x81 & 0xFC) << 3 = 0x400
        assert_eq!(pack_pixel([0, 0, 0x81, 0]), 0x0400);
        // (0x87 & 0xF8) << 8 = 0x8000
        assert_eq!(pack_pixel([0, 0, 0, 0x87]), 0x8000);
        assert_eq!(pack_pixel([0, 0x80, 0x81, 0x87]), 0x8410);
    }

    #[test]
    fn test_convert_writes_little_endian_words() {
        let image = solid_image([0x00, 0x80, 0x81, 0x87]);
        let mut draw = FrameBuffer::new();

        convert_image(&ImageInput::panel(&image), &mut draw).unwrap();

        let line = draw.line(0).unwrap();
        assert_eq!(&line[..4], &[0x10, 0x84, 0x10, 0x84]);
        let last = draw.line(PANEL_HEIGHT - 1).unwrap();
        assert_eq!(&last[LINE_DATA_BYTES - 2..LINE_DATA_BYTES], &[0x10, 0x84]);
    }

    #[test]
    fn test_convert_leaves_gutters_untouched() {
        let image = solid_image([0x00, 0xFF, 0xFF, 0xFF]);
        let mut draw = FrameBuffer::filled(0x5A);

        convert_image(&ImageInput::panel(&image), &mut draw).unwrap();

        for line in draw.lines() {
            assert!(line[..LINE_DATA_BYTES].iter().all(|&b| b == 0xFF));
            assert_eq!(line[LINE_DATA_BYTES..].len(), GUTTER_BYTES);
            assert!(line[LINE_DATA_BYTES..].iter().all(|&b| b == 0x5A));
        }
    }

    #[test]
    fn test_rows_map_to_lines() {
        let mut image = vec![0u8; INPUT_IMAGE_BYTES];
        // last pixel of row 2 gets full c3
        image[3 * INPUT_ROW_BYTES - 1] = 0xFF;
        let mut draw = FrameBuffer::new();

        convert_image(&ImageInput::panel(&image), &mut draw).unwrap();

        let offset = 2 * LINE_STRIDE_BYTES + LINE_DATA_BYTES - 2;
        assert_eq!(&draw.as_bytes()[offset..offset + 2], &[0x00, 0xF8]);
        assert_eq!(draw.as_bytes().iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn test_unresolved_input_rejected_without_writes() {
        let mut draw = FrameBuffer::filled(0x33);
        let result = convert_image(
            &ImageInput::unresolved(PANEL_WIDTH, PANEL_HEIGHT, INPUT_PLANES),
            &mut draw,
        );

        assert_eq!(result, Err(ConversionError::MissingData));
        assert_eq!(draw, FrameBuffer::filled(0x33));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let data = vec![0u8; 64 * 64 * 4];
        let mut draw = FrameBuffer::new();
        let err = convert_image(&ImageInput::new(64, 64, 4, &data), &mut draw).unwrap_err();
        assert!(matches!(err, ConversionError::DimensionMismatch { width: 64, .. }));
    }

    #[test]
    fn test_plane_count_rejected() {
        let data = vec![0u8; PANEL_WIDTH * PANEL_HEIGHT * 3];
        let mut draw = FrameBuffer::new();
        let err = convert_image(
            &ImageInput::new(PANEL_WIDTH, PANEL_HEIGHT, 3, &data),
            &mut draw,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConversionError::PlaneCount {
                planes: 3,
                expected: 4
            }
        );
    }

    #[test]
    fn test_truncated_data_rejected() {
        let data = vec![0u8; INPUT_IMAGE_BYTES - 1];
        let mut draw = FrameBuffer::new();
        let err = convert_image(&ImageInput::panel(&data), &mut draw).unwrap_err();
        assert!(matches!(err, ConversionError::Truncated { .. }));
    }
}
