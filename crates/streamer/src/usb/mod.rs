//! USB subsystem
//!
//! Panel discovery, frame transfers and the transport thread.
//!
//! This module implements the USB side of the streamer, handling:
//! - Enumeration and opening of the display panel
//! - Interface claim and release
//! - Bulk transfer of framed images
//! - The fixed-rate transport loop
//!
//! USB transfers block, so the transport loop runs in a dedicated thread
//! (worker) rather than on the thread that delivers images.

pub mod device;
pub mod transfers;
pub mod worker;

// Re-export public types
pub use device::{
    DeviceError, DeviceIdentity, PanelDevice, UsbCandidate, UsbHandle, enumerate_panels,
    find_panel, list_panels, open_panel,
};
pub use transfers::{BULK_OUT_ENDPOINT, DEFAULT_TRANSFER_TIMEOUT, FrameReport, send_frame};
pub use worker::{TransportConfig, TransportState, TransportWorker, spawn_transport};
