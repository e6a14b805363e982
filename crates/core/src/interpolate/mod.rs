use serde::{Deserialize, Serialize};

use crate::series::{NoteAccSample, SwingSample};

/// Neighbour spans narrower than this resolve to the left value.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Linear blend between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Linearly interpolates the value at `x` on the segment `(x0, y0)`-`(x1, y1)`.
///
/// When the segment is narrower than [`DEGENERATE_EPSILON`] (both neighbours
/// coincide, e.g. after clamping) `y0` is returned unchanged.
pub fn interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if (x1 - x0).abs() < DEGENERATE_EPSILON {
        return y0;
    }

    lerp(y0, y1, (x - x0) / (x1 - x0))
}

/// Pass, tech and accuracy resolved for a single offset of a window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InterpolatedPoint {
    pub pass: f64,
    pub tech: f64,
    pub acc: f64,
}

impl InterpolatedPoint {
    /// Resolves pass and tech at `beat` from bracketing swings and accuracy
    /// at `seconds` from bracketing notes.
    pub fn between(
        swings: (&SwingSample, &SwingSample),
        notes: (&NoteAccSample, &NoteAccSample),
        beat: f64,
        seconds: f64,
    ) -> Self {
        let (s0, s1) = swings;
        let (a0, a1) = notes;

        Self {
            pass: interpolate(s0.time, s0.pass, s1.time, s1.pass, beat),
            tech: interpolate(s0.time, s0.tech, s1.time, s1.tech, beat),
            acc: interpolate(a0.time, a0.acc, a1.time, a1.acc, seconds),
        }
    }

    /// An all-zero triple is read as "outside of the data" rather than as a
    /// genuine zero rating.
    pub fn is_blank(&self) -> bool {
        self.pass == 0.0 && self.tech == 0.0 && self.acc == 0.0
    }
}
