//! Linear gain ramps for click-free routing transitions.
//!
//! A [`LinearFade`] generates a sample-accurate ramp in one direction:
//! fade-in rises 0→1, fade-out falls 1→0, each over exactly the requested
//! number of samples. After the ramp completes the fade holds its terminal
//! value and reports inactive. Restarting mid-ramp resets the position to
//! the start — retargeting a transition restarts the ramp rather than
//! resuming from the current gain.

use libm::roundf;

/// Ramp direction of a [`LinearFade`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FadeDirection {
    /// Rises 0 → 1.
    In,
    /// Falls 1 → 0.
    Out,
}

impl FadeDirection {
    /// Gain at the start of the ramp.
    #[inline]
    fn start_gain(self) -> f32 {
        match self {
            Self::In => 0.0,
            Self::Out => 1.0,
        }
    }

    /// Gain held after the ramp completes.
    #[inline]
    fn terminal_gain(self) -> f32 {
        match self {
            Self::In => 1.0,
            Self::Out => 0.0,
        }
    }
}

/// Sample-accurate linear gain ramp, restartable at any time.
///
/// Deterministic: `length` calls to [`next_sample()`](Self::next_sample)
/// after a [`start()`](Self::start) land exactly on the terminal gain.
#[derive(Clone, Debug)]
pub struct LinearFade {
    direction: FadeDirection,
    current: f32,
    increment: f32,
    samples_remaining: u32,
}

impl LinearFade {
    /// Creates an inactive fade holding its terminal gain.
    pub fn new(direction: FadeDirection) -> Self {
        Self {
            direction,
            current: direction.terminal_gain(),
            increment: 0.0,
            samples_remaining: 0,
        }
    }

    /// (Re)arms the ramp over `length_in_samples` samples.
    ///
    /// Always resets to the ramp start, discarding any prior progress.
    /// A zero length jumps straight to the terminal gain.
    pub fn start(&mut self, length_in_samples: u32) {
        if length_in_samples == 0 {
            self.current = self.direction.terminal_gain();
            self.increment = 0.0;
            self.samples_remaining = 0;
            return;
        }
        self.current = self.direction.start_gain();
        self.increment = (self.direction.terminal_gain() - self.current)
            / length_in_samples as f32;
        self.samples_remaining = length_in_samples;
    }

    /// Advances the ramp by one sample and returns the gain in `[0, 1]`.
    ///
    /// Holds the terminal gain once the ramp has completed.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                // Snap to the exact terminal value.
                self.current = self.direction.terminal_gain();
            }
        }
        self.current
    }

    /// Current gain without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// True while the ramp is still in progress.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.samples_remaining > 0
    }

    /// Ramp direction.
    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    /// Converts a fade duration in seconds to a sample count at `sample_rate`.
    ///
    /// Never returns zero; the shortest usable ramp is one sample.
    pub fn length_for(seconds: f32, sample_rate: f32) -> u32 {
        let samples = roundf(seconds * sample_rate);
        if samples < 1.0 { 1 } else { samples as u32 }
    }
}
