//! Frame transfer execution
//!
//! Sends one shaped frame to the panel: the sync header as a single bulk
//! transfer, then the frame body as fixed-size messages in order.
//!
//! Header failures are tolerated and the body is sent anyway. The first
//! failed body message aborts the rest of the frame. Nothing is retried.

use crate::usb::device::{PanelDevice, UsbHandle};
use common::TransportMetrics;
use protocol::{FrameBuffer, MESSAGES_PER_FRAME, SYNC_HEADER, frame_messages};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Bulk OUT endpoint of the display interface
pub const BULK_OUT_ENDPOINT: u8 = 0x01;

/// Default timeout for each bulk transfer (1 second)
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_millis(1000);

/// A body message that could not be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageFailure {
    /// Index of the failed message within the frame
    pub index: usize,
    pub error: rusb::Error,
}

/// Result of one frame send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Error of the header transfer, if it failed
    pub header_error: Option<rusb::Error>,
    /// Body messages delivered before completion or abort
    pub messages_sent: usize,
    /// The message that aborted the frame
    pub aborted: Option<MessageFailure>,
}

impl FrameReport {
    /// Every body message reached the device
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.messages_sent == MESSAGES_PER_FRAME
    }
}

/// Send the sync header and every message of `send`
///
/// The caller holds the send-buffer lock for the whole call.
pub fn send_frame<H: UsbHandle>(
    device: &PanelDevice<H>,
    send: &FrameBuffer,
    timeout: Duration,
    metrics: &TransportMetrics,
) -> FrameReport {
    let started = Instant::now();

    let header_error = match device.write_bulk(BULK_OUT_ENDPOINT, &SYNC_HEADER, timeout) {
        Ok(len) => {
            metrics.bytes_delivered(len);
            None
        }
        Err(e) => {
            metrics.header_failed();
            match e {
                rusb::Error::Timeout
                | rusb::Error::Pipe
                | rusb::Error::Overflow
                | rusb::Error::NoDevice => {
                    debug!("Sync header transfer failed: {}", e)
                }
                other => warn!("Sync header transfer failed: {}", other),
            }
            Some(e)
        }
    };

    let mut messages_sent = 0;
    let mut aborted = None;

    for message in frame_messages(send) {
        match device.write_bulk(BULK_OUT_ENDPOINT, message.payload, timeout) {
            Ok(len) => {
                if len != message.payload.len() {
                    debug!(
                        "Short write on message {}: {} of {} bytes",
                        message.index,
                        len,
                        message.payload.len()
                    );
                }
                trace!("Sent message {}/{}", message.index + 1, MESSAGES_PER_FRAME);
                metrics.message_sent();
                metrics.bytes_delivered(len);
                messages_sent += 1;
            }
            Err(error) => {
                warn!(
                    "Frame aborted at message {}/{}: {}",
                    message.index + 1,
                    MESSAGES_PER_FRAME,
                    error
                );
                aborted = Some(MessageFailure {
                    index: message.index,
                    error,
                });
                break;
            }
        }
    }

    let report = FrameReport {
        header_error,
        messages_sent,
        aborted,
    };
    metrics.frame_finished(report.is_complete(), started.elapsed());
    report
}
