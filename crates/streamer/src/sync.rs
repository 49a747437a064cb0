//! State shared between the frame producer and the transport thread
//!
//! One mutex orders every access to the send buffer: the shaper writes it
//! under the lock and the transport holds the same lock across a whole
//! frame's transfers. A producer arriving mid-send waits for the send to
//! finish. The frame-available latch and the cancellation flag are atomics
//! read outside the lock.

use crate::usb::device::{PanelDevice, UsbHandle};
use common::TransportMetrics;
use protocol::FrameBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Send buffer, flags, device and metrics shared by producer and transport
pub struct SharedState<H: UsbHandle> {
    send: Mutex<FrameBuffer>,
    frame_available: AtomicBool,
    cancelled: AtomicBool,
    device: Option<PanelDevice<H>>,
    metrics: TransportMetrics,
}

impl<H: UsbHandle> SharedState<H> {
    /// Zeroed send buffer, no frame yet, not cancelled
    pub fn new(device: Option<PanelDevice<H>>) -> Self {
        Self {
            send: Mutex::new(FrameBuffer::new()),
            frame_available: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            device,
            metrics: TransportMetrics::new(),
        }
    }

    /// Lock the send buffer
    ///
    /// A panic while the lock was held leaves at worst one stale frame, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock_send(&self) -> MutexGuard<'_, FrameBuffer> {
        self.send.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latch the frame-available flag, returning whether it was already set
    pub fn mark_frame_available(&self) -> bool {
        self.frame_available.swap(true, Ordering::AcqRel)
    }

    /// Whether any frame has been shaped since creation
    pub fn frame_available(&self) -> bool {
        self.frame_available.load(Ordering::Acquire)
    }

    /// Ask the transport thread to stop after its current iteration
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether teardown has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// The open panel, if one was claimed
    pub fn device(&self) -> Option<&PanelDevice<H>> {
        self.device.as_ref()
    }

    /// Remove the device so it can be closed; it never comes back
    pub fn take_device(&mut self) -> Option<PanelDevice<H>> {
        self.device.take()
    }

    /// Transfer counters updated by the transport
    pub fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }
}
