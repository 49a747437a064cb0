//! Test patterns for driving the panel without a host application
//!
//! Each pattern renders full 4-plane frames (`[a, r, g, b]` per pixel, row
//! major) at the panel's geometry, ready to hand to the pipeline.

use protocol::{INPUT_IMAGE_BYTES, INPUT_PLANES, PANEL_HEIGHT, PANEL_WIDTH};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Side of one checkerboard cell in pixels
const CHECKER_CELL: usize = 32;

/// Frames each solid color is held for (one second at 60 Hz)
const SOLID_HOLD_FRAMES: u64 = 60;

const SOLID_COLORS: [[u8; 3]; 4] = [[0xFF, 0, 0], [0, 0xFF, 0], [0, 0, 0xFF], [0xFF, 0xFF, 0xFF]];

/// Available test patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Full-screen red, green, blue, white, one second each
    Solid,
    /// Horizontal color ramp scrolling sideways
    #[default]
    Gradient,
    /// Scrolling black and white checkerboard
    Checkerboard,
    /// Random pixels every frame
    Noise,
}

impl PatternKind {
    pub const ALL: [PatternKind; 4] = [
        PatternKind::Solid,
        PatternKind::Gradient,
        PatternKind::Checkerboard,
        PatternKind::Noise,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Solid => "solid",
            PatternKind::Gradient => "gradient",
            PatternKind::Checkerboard => "checkerboard",
            PatternKind::Noise => "noise",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| crate::Error::Pattern(format!("Unknown pattern: {}", s)))
    }
}

/// Renders successive frames of one pattern into a reusable buffer
pub struct PatternGenerator {
    kind: PatternKind,
    /// Pixels advanced per frame for scrolling patterns
    speed: usize,
    frame: u64,
    rng: StdRng,
    buffer: Vec<u8>,
}

impl PatternGenerator {
    pub fn new(kind: PatternKind, speed: usize) -> Self {
        debug!("Pattern generator: {} (speed {})", kind, speed);
        Self {
            kind,
            speed,
            frame: 0,
            rng: StdRng::seed_from_u64(0x5EED),
            buffer: vec![0; INPUT_IMAGE_BYTES],
        }
    }

    /// Pattern this generator renders
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Number of frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    /// Render the next frame
    pub fn next_frame(&mut self) -> &[u8] {
        let offset = (self.frame as usize).wrapping_mul(self.speed) % PANEL_WIDTH;

        match self.kind {
            PatternKind::Solid => {
                let index = (self.frame / SOLID_HOLD_FRAMES) as usize % SOLID_COLORS.len();
                let [r, g, b] = SOLID_COLORS[index];
                for pixel in self.buffer.chunks_exact_mut(INPUT_PLANES) {
                    pixel.copy_from_slice(&[0xFF, r, g, b]);
                }
            }
            PatternKind::Gradient => {
                for (y, row) in self.buffer.chunks_exact_mut(PANEL_WIDTH * INPUT_PLANES).enumerate() {
                    let g = (y * 255 / (PANEL_HEIGHT - 1)) as u8;
                    for (x, pixel) in row.chunks_exact_mut(INPUT_PLANES).enumerate() {
                        let r = (((x + offset) % PANEL_WIDTH) * 255 / (PANEL_WIDTH - 1)) as u8;
                        pixel.copy_from_slice(&[0xFF, r, g, 255 - r]);
                    }
                }
            }
            PatternKind::Checkerboard => {
                for (y, row) in self.buffer.chunks_exact_mut(PANEL_WIDTH * INPUT_PLANES).enumerate() {
                    for (x, pixel) in row.chunks_exact_mut(INPUT_PLANES).enumerate() {
                        let lit = ((x + offset) / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0;
                        let v = if lit { 0xFF } else { 0x00 };
                        pixel.copy_from_slice(&[0xFF, v, v, v]);
                    }
                }
            }
            PatternKind::Noise => {
                self.rng.fill(&mut self.buffer[..]);
            }
        }

        self.frame += 1;
        &self.buffer
    }
}
