//! Stepped audio fade between render targets
//!
//! A fade is a linear volume ramp executed as a fixed number of discrete
//! steps spread evenly over a fade window (default: 15 steps over 300 ms,
//! one step every 20 ms).
//!
//! # Levels
//!
//! - **Fade-out** from `v`: `v·(n-1)/n, …, v·1/n, 0` (last level is exactly 0)
//! - **Fade-in** to `t`: `t·1/n, …, t` (last level is exactly `t`)
//!
//! The fade only ever affects audio; visual switches are instantaneous.

use std::time::Duration;

/// Direction of a volume ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Ramp from the current level down to silence
    Out,
    /// Ramp from silence up to the target level
    In,
}

/// Fade window and step count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFade {
    window: Duration,
    steps: u32,
}

impl AudioFade {
    /// Create a fade; a step count of 0 is treated as a single step
    pub fn new(window: Duration, steps: u32) -> Self {
        Self {
            window,
            steps: steps.max(1),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Pause between two consecutive steps
    pub fn step_interval(&self) -> Duration {
        self.window / self.steps
    }

    /// Volume levels for one ramp
    ///
    /// `level` is the starting volume for [`FadeDirection::Out`] and the
    /// target volume for [`FadeDirection::In`].
    pub fn levels(&self, direction: FadeDirection, level: u8) -> Vec<u8> {
        let n = self.steps;
        let level = u32::from(level);

        match direction {
            FadeDirection::Out => (0..n).rev().map(|i| scale(level, i, n)).collect(),
            FadeDirection::In => (1..=n).map(|i| scale(level, i, n)).collect(),
        }
    }
}

impl Default for AudioFade {
    fn default() -> Self {
        Self::new(Duration::from_millis(300), 15)
    }
}

fn scale(level: u32, numerator: u32, denominator: u32) -> u8 {
    // level <= 255 and numerator <= denominator, so the result fits in u8
    (level * numerator / denominator) as u8
}

// ========================================
// Tests
// ========================================
