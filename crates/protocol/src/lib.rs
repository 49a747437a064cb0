//! Panel protocol library for push-display
//!
//! This crate defines everything that is byte-exact about talking to the
//! display panel: the frame geometry, the pixel packing, the shaping
//! transform and the wire framing. It performs no I/O.
//!
//! # Example
//!
//! ```
//! use protocol::{FrameBuffer, ImageInput, INPUT_IMAGE_BYTES};
//! use protocol::{convert_image, shape_frame, frame_messages};
//!
//! let image = vec![0u8; INPUT_IMAGE_BYTES];
//! let mut draw = FrameBuffer::new();
//! let mut send = FrameBuffer::new();
//!
//! convert_image(&ImageInput::panel(&image), &mut draw).unwrap();
//! shape_frame(&draw, &mut send);
//!
//! assert_eq!(frame_messages(&send).len(), 20);
//! ```

pub mod buffer;
pub mod error;
pub mod framing;
pub mod layout;
pub mod pixel;
pub mod shaping;

pub use buffer::FrameBuffer;
pub use error::{ConversionError, ProtocolError, Result};
pub use framing::{FrameMessage, SYNC_HEADER, WIRE_FRAME_BYTES, encode_wire_frame, frame_messages};
pub use layout::*;
pub use pixel::{ImageInput, convert_image, pack_pixel};
pub use shaping::{shape_frame, shape_line};
