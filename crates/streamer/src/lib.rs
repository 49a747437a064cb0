//! push-display streamer
//!
//! Streams frames to the display panel over USB. Images delivered by the
//! host are packed into the panel's 16-bit format, shaped, and sent by a
//! dedicated transport thread at a fixed frame rate.
//!
//! ```no_run
//! use protocol::{ImageInput, INPUT_IMAGE_BYTES};
//! use streamer::{StreamerPipeline, TransportConfig};
//!
//! let pipeline = StreamerPipeline::create(TransportConfig::default()).unwrap();
//! let image = vec![0u8; INPUT_IMAGE_BYTES];
//! pipeline.deliver(&ImageInput::panel(&image)).unwrap();
//! pipeline.destroy();
//! ```

pub mod config;
pub mod pipeline;
pub mod sync;
pub mod usb;

pub use config::StreamerConfig;
pub use pipeline::{PipelineError, StreamerPipeline};
pub use usb::{DeviceError, DeviceIdentity, TransportConfig, TransportState};
