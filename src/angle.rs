use std::f64::consts::TAU;

/// Angles closer than this are treated as equal.
const ANGLE_EPS: f64 = 1e-9;

/// Fraction of a half beamwidth added to each edge of the drawn mask so
/// neighbouring sectors overlap instead of leaving a hairline gap.
pub const EDGE_OVERDRAW: f64 = 1.1;

/// Screen-to-polar axis convention used by the mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AngleConvention {
    /// `atan2(y, x)`: zero points right, angles grow counter-clockwise.
    #[default]
    MathCcw,
    /// `atan2(-x, y)`: zero points up, angles grow counter-clockwise.
    NorthCcw,
}

impl AngleConvention {
    /// Polar angle of a disc-frame point (y up), in `(-pi, pi]`.
    #[inline]
    pub fn theta(self, x: f32, y: f32) -> f32 {
        match self {
            AngleConvention::MathCcw => y.atan2(x),
            AngleConvention::NorthCcw => (-x).atan2(y),
        }
    }
}

/// A continuous, non-wrapping angular interval covered by one sector.
///
/// `start >= end` always holds and `start - end <= 2pi`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepInterval {
    /// Upper bound, the first scanline's angle (radians).
    pub start: f64,
    /// Lower bound, the last scanline's angle (radians).
    pub end: f64,
    /// Half of one scanline's angular width.
    pub half_beam: f64,
}

impl SweepInterval {
    /// Normalize raw `(angle1, angle2)` edges of a capture with `scanlines` rows.
    ///
    /// Both edges are first reduced into `[0, 2pi)`. If the start edge is then
    /// below the end edge the sweep crossed zero and a full turn is added to it.
    /// Edges a whole number of turns apart describe a full revolution.
    pub fn normalize(angle1: f64, angle2: f64, scanlines: usize) -> Self {
        let mut start = angle1.rem_euclid(TAU);
        let end = angle2.rem_euclid(TAU);
        let gap = (start - end).abs();
        if gap < ANGLE_EPS || gap > TAU - ANGLE_EPS {
            // Same direction once reduced
            start = if (angle1 - angle2).abs() < ANGLE_EPS {
                end
            } else {
                end + TAU
            };
        } else if start < end {
            start += TAU;
        }

        let half_beam = if scanlines == 0 {
            0.0
        } else {
            (start - end) / (2.0 * scanlines as f64)
        };

        Self {
            start,
            end,
            half_beam,
        }
    }

    /// Angular span of the capture.
    pub fn span(&self) -> f64 {
        self.start - self.end
    }

    /// Bounds actually drawn, padded by [`EDGE_OVERDRAW`] half beams per edge.
    pub fn mask_bounds(&self) -> MaskBounds {
        let pad = self.half_beam * EDGE_OVERDRAW;
        MaskBounds {
            min: (self.end - pad) as f32,
            max: (self.start + pad) as f32,
        }
    }
}

/// Angular window tested per pixel by the polar mask.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskBounds {
    pub min: f32,
    pub max: f32,
}

impl MaskBounds {
    /// Returns the wrap-corrected angle if `theta` falls inside the window.
    ///
    /// `theta` is shifted into `[min, min + 2pi)` before the test, which for a
    /// positive `min` amounts to adding a full turn to negative angles.
    #[inline]
    pub fn wrap(&self, theta: f32) -> Option<f32> {
        let tau = std::f32::consts::TAU;
        let t = self.min + (theta - self.min).rem_euclid(tau);
        if t <= self.max { Some(t) } else { None }
    }

    /// Position of a wrapped angle across the window, 0 at `min`, 1 at `max`.
    #[inline]
    pub fn fraction(&self, wrapped: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (wrapped - self.min) / span
    }
}
