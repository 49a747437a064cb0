//! Display pipeline
//!
//! The host-facing adapter: [`StreamerPipeline::create`] opens the panel and
//! starts the transport thread, [`StreamerPipeline::deliver`] converts and
//! shapes one image inline on the caller's thread, and
//! [`StreamerPipeline::destroy`] stops the thread and releases the panel.
//!
//! Delivery is "latest frame wins": every image overwrites the previous one
//! in place and the transport sends whatever is current when it next runs.

use crate::sync::SharedState;
use crate::usb::device::{DeviceError, PanelDevice, UsbHandle, open_panel};
use crate::usb::worker::{TransportConfig, TransportState, spawn_transport};
use common::MetricsSnapshot;
use protocol::{ConversionError, FrameBuffer, ImageInput, convert_image, shape_frame};
use rusb::{Context, DeviceHandle};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that prevent a pipeline from being built
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to spawn transport thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Frame pipeline bound to at most one panel
pub struct StreamerPipeline<H: UsbHandle = DeviceHandle<Context>> {
    shared: Arc<SharedState<H>>,
    /// Packed pixels of the latest accepted image
    draw: Mutex<FrameBuffer>,
    transport: Option<JoinHandle<()>>,
    device_error: Option<DeviceError>,
}

impl StreamerPipeline {
    /// Open the first attached panel and start streaming
    ///
    /// A missing or unusable panel is not an error: it is reported once and
    /// the pipeline runs with a transport that never sends.
    pub fn create(config: TransportConfig) -> Result<Self, PipelineError> {
        Self::with_device(open_panel(), config)
    }
}

impl<H: UsbHandle> StreamerPipeline<H> {
    /// Build a pipeline around the outcome of a device open attempt
    pub fn with_device(
        device: Result<PanelDevice<H>, DeviceError>,
        config: TransportConfig,
    ) -> Result<Self, PipelineError> {
        let (device, device_error) = match device {
            Ok(device) => (Some(device), None),
            Err(e) => {
                error!("Panel unavailable, frames will not be sent: {}", e);
                (None, Some(e))
            }
        };

        let shared = Arc::new(SharedState::new(device));
        let transport = spawn_transport(Arc::clone(&shared), config)?;

        info!(
            "Pipeline created ({})",
            if shared.device().is_some() {
                "panel attached"
            } else {
                "no panel"
            }
        );

        Ok(Self {
            shared,
            draw: Mutex::new(FrameBuffer::new()),
            transport: Some(transport),
            device_error,
        })
    }

    /// Convert and shape one image
    ///
    /// Runs synchronously on the calling thread. May block while the
    /// transport is in the middle of sending a frame. On error nothing is
    /// changed and the previous frame keeps streaming.
    pub fn deliver(&self, image: &ImageInput<'_>) -> Result<(), ConversionError> {
        let mut draw = self.draw.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(e) = convert_image(image, &mut draw) {
            warn!("Dropping frame: {}", e);
            return Err(e);
        }

        let mut send = self.shared.lock_send();
        if !self.shared.mark_frame_available() {
            info!("First frame received");
        }
        shape_frame(&draw, &mut send);
        drop(send);

        debug!("Frame delivered");
        Ok(())
    }

    /// Stop the transport thread and release the panel
    pub fn destroy(mut self) {
        self.shutdown();
    }

    pub fn state(&self) -> TransportState {
        self.shared.transport_state()
    }

    pub fn has_device(&self) -> bool {
        self.shared.device().is_some()
    }

    /// Why the panel could not be opened, if it could not
    pub fn device_error(&self) -> Option<&DeviceError> {
        self.device_error.as_ref()
    }

    pub fn frame_available(&self) -> bool {
        self.shared.frame_available()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics().snapshot()
    }

    /// Inspect the send buffer under the shared lock
    pub fn with_send_buffer<R>(&self, f: impl FnOnce(&FrameBuffer) -> R) -> R {
        let send = self.shared.lock_send();
        f(&send)
    }

    fn shutdown(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };

        self.shared.cancel();
        if transport.join().is_err() {
            error!("Transport thread panicked");
        }

        match Arc::get_mut(&mut self.shared).and_then(SharedState::take_device) {
            Some(device) => device.close(),
            None => debug!("No panel to close"),
        }

        info!("Pipeline destroyed");
    }
}

impl<H: UsbHandle> Drop for StreamerPipeline<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
