//! Transport metrics for the frame streamer
//!
//! Thread-safe counters updated by the transport thread and read by whoever
//! wants to report progress. Counters only ever grow.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Number of recent frame send durations kept for averaging
const FRAME_TIME_WINDOW: usize = 120;

/// Rolling window of frame send durations in microseconds
#[derive(Debug, Default)]
struct RollingFrameTimes {
    samples: VecDeque<u64>,
}

impl RollingFrameTimes {
    fn add_sample(&mut self, micros: u64) {
        if self.samples.len() == FRAME_TIME_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(micros);
    }

    fn avg(&self) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }
        self.samples.iter().sum::<u64>() / self.samples.len() as u64
    }

    fn max(&self) -> u64 {
        self.samples.iter().copied().max().unwrap_or(0)
    }
}

/// Counters describing what the transport has put on the wire
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Frames whose every message was delivered
    frames_sent: AtomicU64,
    /// Frames cut short by a failed message transfer
    frames_aborted: AtomicU64,
    /// Sync header transfers that failed (tolerated)
    header_errors: AtomicU64,
    /// Pixel messages delivered
    messages_sent: AtomicU64,
    /// Payload bytes delivered, headers included
    bytes_sent: AtomicU64,
    /// Iterations that found no device or no frame to send
    idle_ticks: AtomicU64,
    frame_times: Mutex<RollingFrameTimes>,
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a header transfer failure
    pub fn header_failed(&self) {
        self.header_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record bytes that made it to the device
    pub fn bytes_delivered(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record one delivered pixel message
    pub fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the end of a frame attempt
    pub fn frame_finished(&self, complete: bool, elapsed: Duration) {
        if complete {
            self.frames_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.frames_aborted.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut times) = self.frame_times.lock() {
            times.add_sample(elapsed.as_micros() as u64);
        }
    }

    /// Record an iteration with nothing to send
    pub fn idle_tick(&self) {
        self.idle_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_aborted(&self) -> u64 {
        self.frames_aborted.load(Ordering::Relaxed)
    }

    /// Take a consistent-enough copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg_frame_us, max_frame_us) = self
            .frame_times
            .lock()
            .map(|times| (times.avg(), times.max()))
            .unwrap_or((0, 0));

        MetricsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_aborted: self.frames_aborted.load(Ordering::Relaxed),
            header_errors: self.header_errors.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
            avg_frame_us,
            max_frame_us,
        }
    }
}

/// Point-in-time copy of [`TransportMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_sent: u64,
    pub frames_aborted: u64,
    pub header_errors: u64,
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub idle_ticks: u64,
    /// Average duration of recent frame sends in microseconds
    pub avg_frame_us: u64,
    /// Slowest recent frame send in microseconds
    pub max_frame_us: u64,
}

impl MetricsSnapshot {
    /// Format average frame time for display
    pub fn format_avg_frame(&self) -> String {
        format!("{:.2} ms", self.avg_frame_us as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = TransportMetrics::new();
        metrics.header_failed();
        metrics.message_sent();
        metrics.message_sent();
        metrics.bytes_delivered(32);
        metrics.frame_finished(true, Duration::from_millis(4));
        metrics.frame_finished(false, Duration::from_millis(2));
        metrics.idle_tick();

        let snap = metrics.snapshot();
        assert_eq!(snap.frames_sent, 1);
        assert_eq!(snap.frames_aborted, 1);
        assert_eq!(snap.header_errors, 1);
        assert_eq!(snap.messages_sent, 2);
        assert_eq!(snap.bytes_sent, 32);
        assert_eq!(snap.idle_ticks, 1);
        assert_eq!(snap.avg_frame_us, 3000);
        assert_eq!(snap.max_frame_us, 4000);
        assert_eq!(snap.format_avg_frame(), "3.00 ms");
    }

    #[test]
    fn test_rolling_window_bounded() {
        let mut times = RollingFrameTimes::default();
        for i in 0..(FRAME_TIME_WINDOW as u64 + 10) {
            times.add_sample(i);
        }
        assert_eq!(times.samples.len(), FRAME_TIME_WINDOW);
        assert_eq!(times.samples.front(), Some(&10));
    }
}
