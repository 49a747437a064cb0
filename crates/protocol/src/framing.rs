//! Wire framing for one panel frame
//!
//! # Frame Format
//!
//! Every frame goes out on the bulk OUT endpoint as:
//! ```text
//! [sync header: 16 bytes][message 0: 16384 bytes] ... [message 19: 16384 bytes]
//! ```
//!
//! Messages are contiguous slices of the shaped send buffer, in order.

use crate::buffer::FrameBuffer;
use crate::layout::{FRAME_BYTES, MESSAGE_BYTES, MESSAGES_PER_FRAME};

/// Marker transmitted before each frame's pixel data
pub const SYNC_HEADER: [u8; 16] = [
    0xFF, 0xCC, 0xAA, 0x88, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Total bytes on the wire for one frame, header included
pub const WIRE_FRAME_BYTES: usize = SYNC_HEADER.len() + FRAME_BYTES;

/// One bulk message of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMessage<'a> {
    /// Position within the frame (0-based)
    pub index: usize,
    /// Payload, always [`MESSAGE_BYTES`] long
    pub payload: &'a [u8],
}

/// Split a shaped frame into its bulk messages
///
/// # Example
/// ```
/// use protocol::{FrameBuffer, frame_messages, MESSAGES_PER_FRAME};
///
/// let send = FrameBuffer::new();
/// assert_eq!(frame_messages(&send).count(), MESSAGES_PER_FRAME);
/// ```
pub fn frame_messages(send: &FrameBuffer) -> impl ExactSizeIterator<Item = FrameMessage<'_>> {
    send.messages()
        .enumerate()
        .map(|(index, payload)| FrameMessage { index, payload })
}

/// Render the complete wire image of a frame into one contiguous buffer
///
/// Used for captures and diagnostics; the transport sends the header and
/// each message as separate transfers.
pub fn encode_wire_frame(send: &FrameBuffer) -> Vec<u8> {
    let mut wire = Vec::with_capacity(WIRE_FRAME_BYTES);
    wire.extend_from_slice(&SYNC_HEADER);
    for message in frame_messages(send) {
        wire.extend_from_slice(message.payload);
    }
    wire
}

const _: () = assert!(MESSAGES_PER_FRAME * MESSAGE_BYTES == FRAME_BYTES);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_header_bytes() {
        assert_eq!(&SYNC_HEADER[..4], &[0xFF, 0xCC, 0xAA, 0x88]);
        assert!(SYNC_HEADER[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_messages_concatenate_to_frame() {
        let mut send = FrameBuffer::new();
        for (i, b) in send.as_bytes_mut().iter_mut().enumerate() {
            *b = (i % 253) as u8;
        }

        let mut joined = Vec::new();
        for (expected, message) in frame_messages(&send).enumerate() {
            assert_eq!(message.index, expected);
            assert_eq!(message.payload.len(), MESSAGE_BYTES);
            joined.extend_from_slice(message.payload);
        }

        assert_eq!(joined.len(), FRAME_BYTES);
        assert_eq!(joined.as_slice(), send.as_bytes());
    }

    #[test]
    fn test_wire_frame_layout() {
        let send = FrameBuffer::filled(0x11);
        let wire = encode_wire_frame(&send);

        assert_eq!(wire.len(), WIRE_FRAME_BYTES);
        assert_eq!(&wire[..16], &SYNC_HEADER);
        assert!(wire[16..].iter().all(|&b| b == 0x11));
    }
}
