//! Panel geometry and wire constants
//!
//! The panel scans 160 lines of 960 pixels. Each line occupies a 2048-byte
//! stride on the wire: 1920 bytes of packed 16-bit pixels followed by a
//! 128-byte gutter the panel ignores.
//!
//! ```text
//! | pixel data (1920 bytes = 960 × u16 LE) | gutter (128 bytes) |
//! ```
//!
//! All values here must match the panel bit-for-bit.

/// Visible pixels per line
pub const PANEL_WIDTH: usize = 960;

/// Number of scan lines
pub const PANEL_HEIGHT: usize = 160;

/// Bytes per packed output pixel
pub const BYTES_PER_PIXEL: usize = 2;

/// Interleaved 8-bit channels per input pixel
pub const INPUT_PLANES: usize = 4;

/// Bytes reserved for one scan line in the frame buffer
pub const LINE_STRIDE_BYTES: usize = 2048;

/// Unused padding at the end of every line
pub const GUTTER_BYTES: usize = 128;

/// Bytes of real pixel data per line
pub const LINE_DATA_BYTES: usize = LINE_STRIDE_BYTES - GUTTER_BYTES;

/// Size of a complete frame (draw and send buffers)
pub const FRAME_BYTES: usize = LINE_STRIDE_BYTES * PANEL_HEIGHT;

/// Size of a single bulk message on the wire
pub const MESSAGE_BYTES: usize = 16 * 1024;

/// Bulk messages needed to carry one frame
pub const MESSAGES_PER_FRAME: usize = FRAME_BYTES / MESSAGE_BYTES;

/// XOR pattern applied positionally to every 4-byte group of pixel data
pub const SHAPING_PATTERN: [u8; 4] = [0xE7, 0xF3, 0xE7, 0xFF];

/// Bytes consumed from the input image per row
pub const INPUT_ROW_BYTES: usize = PANEL_WIDTH * INPUT_PLANES;

/// Bytes of a full input image
pub const INPUT_IMAGE_BYTES: usize = INPUT_ROW_BYTES * PANEL_HEIGHT;

const _: () = assert!(LINE_DATA_BYTES == PANEL_WIDTH * BYTES_PER_PIXEL);
const _: () = assert!(LINE_DATA_BYTES % SHAPING_PATTERN.len() == 0);
const _: () = assert!(FRAME_BYTES % MESSAGE_BYTES == 0);
