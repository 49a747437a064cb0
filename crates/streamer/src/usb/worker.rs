//! Frame transport thread
//!
//! Dedicated thread that streams the latest shaped frame to the panel once
//! per frame period. USB transfers are blocking, so they run here rather
//! than on whatever thread delivers images.
//!
//! Each iteration:
//! 1. Exits if cancellation was requested
//! 2. Sends the frame under the send-buffer lock, if a device is open and a
//!    frame has been produced
//! 3. Sleeps for whatever is left of the frame period (no catch-up)

use crate::sync::SharedState;
use crate::usb::device::UsbHandle;
use crate::usb::transfers::{DEFAULT_TRANSFER_TIMEOUT, send_frame};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Panel refresh rate
pub const DEFAULT_FRAME_RATE_HZ: u32 = 60;

/// Timing parameters of the transport loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub frame_rate_hz: u32,
    pub transfer_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Target iteration period, `1000 / rate` whole milliseconds
    ///
    /// The rate is clamped to 1..=1000 Hz so the period is never zero.
    pub fn period(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.frame_rate_hz.clamp(1, 1000)))
    }
}

/// Observable phase of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No device, or no frame produced yet
    Idle,
    /// Device open and at least one frame produced
    Streaming,
    /// Teardown requested; terminal
    Cancelled,
}

impl<H: UsbHandle> SharedState<H> {
    /// Phase derived from the cancel flag, device and frame latch
    pub fn transport_state(&self) -> TransportState {
        if self.is_cancelled() {
            TransportState::Cancelled
        } else if self.device().is_some() && self.frame_available() {
            TransportState::Streaming
        } else {
            TransportState::Idle
        }
    }
}

/// Transport loop owning a reference to the shared state
pub struct TransportWorker<H: UsbHandle> {
    shared: Arc<SharedState<H>>,
    config: TransportConfig,
}

impl<H: UsbHandle> TransportWorker<H> {
    pub fn new(shared: Arc<SharedState<H>>, config: TransportConfig) -> Self {
        Self { shared, config }
    }

    /// Run until cancelled
    pub fn run(self) {
        let period = self.config.period();
        info!(
            "Transport thread started ({} Hz, period {:?})",
            self.config.frame_rate_hz, period
        );

        loop {
            if self.shared.is_cancelled() {
                break;
            }

            let started = Instant::now();
            self.tick();

            if let Some(remaining) = period.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        info!("Transport thread stopped");
    }

    /// One iteration's worth of work, without the sleep
    fn tick(&self) {
        let device = match self.shared.device() {
            Some(device) if self.shared.frame_available() => device,
            _ => {
                self.shared.metrics().idle_tick();
                return;
            }
        };

        let send = self.shared.lock_send();
        let report = send_frame(
            device,
            &send,
            self.config.transfer_timeout,
            self.shared.metrics(),
        );
        drop(send);

        if !report.is_complete() {
            debug!("Frame incomplete: {:?}", report);
        }
    }
}

/// Spawn the transport thread
pub fn spawn_transport<H: UsbHandle>(
    shared: Arc<SharedState<H>>,
    config: TransportConfig,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("panel-transport".to_string())
        .spawn(move || TransportWorker::new(shared, config).run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period() {
        let config = TransportConfig::default();
        assert_eq!(config.frame_rate_hz, 60);
        assert_eq!(config.period(), Duration::from_millis(16));
        assert_eq!(config.transfer_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_rate_does_not_divide_by_zero() {
        let config = TransportConfig {
            frame_rate_hz: 0,
            ..TransportConfig::default()
        };
        assert_eq!(config.period(), Duration::from_secs(1));
    }

    #[test]
    fn test_excessive_rate_keeps_nonzero_period() {
        for rate in [1000, 1001, 5000, u32::MAX] {
            let config = TransportConfig {
                frame_rate_hz: rate,
                ..TransportConfig::default()
            };
            assert_eq!(config.period(), Duration::from_millis(1), "rate {}", rate);
        }
    }
}
