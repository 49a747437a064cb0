//! Test utilities for push-display
//!
//! Image builders and polling helpers shared by tests across crates.
//!
//! # Example
//!
//! ```
//! use common::test_utils::solid_image;
//! use protocol::INPUT_IMAGE_BYTES;
//!
//! let image = solid_image([0, 0xFF, 0x80, 0x00]);
//! assert_eq!(image.len(), INPUT_IMAGE_BYTES);
//! ```

use protocol::{INPUT_IMAGE_BYTES, INPUT_PLANES, PANEL_WIDTH};
use std::time::{Duration, Instant};

/// Default test timeout (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Full panel image with every pixel set to `pixel`
pub fn solid_image(pixel: [u8; 4]) -> Vec<u8> {
    pixel
        .iter()
        .copied()
        .cycle()
        .take(INPUT_IMAGE_BYTES)
        .collect()
}

/// Full panel image, zero everywhere except one pixel
pub fn image_with_pixel(x: usize, y: usize, pixel: [u8; 4]) -> Vec<u8> {
    let mut image = vec![0; INPUT_IMAGE_BYTES];
    let offset = (y * PANEL_WIDTH + x) * INPUT_PLANES;
    image[offset..offset + INPUT_PLANES].copy_from_slice(&pixel);
    image
}

/// Poll `condition` every millisecond until it holds or `timeout` elapses
///
/// Returns whether the condition was observed.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}
