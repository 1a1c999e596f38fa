//! Angle to pixel projection
//!
//! Linear map from an angular field of view onto screen pixels, with
//! jiggle suppression on the emitted value. Bounds are captured on the
//! first projection and frozen for the rest of the session.

use std::f64::consts::{PI, TAU};

/// Default jiggle threshold, in pixels
pub const DEFAULT_JIGGLE_THRESHOLD_PX: f64 = 75.0;

/// Angular span mapped onto the full screen extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovBounds {
    pub left: f64,
    pub right: f64,
}

impl FovBounds {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Bounds `center ± half_angle`, half angle in degrees
    pub fn around(center: f64, half_angle_degrees: f64) -> Self {
        let half = half_angle_degrees.to_radians();
        Self {
            left: center - half,
            right: center + half,
        }
    }

    pub fn span(&self) -> f64 {
        self.right - self.left
    }

    pub fn midpoint(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Pixels per radian across `extent` pixels
    pub fn pixels_per_radian(&self, extent: u32) -> f64 {
        extent as f64 / self.span()
    }

    /// `(extent / (right - left)) * (angle - left)`
    pub fn map(&self, angle: f64, extent: u32) -> f64 {
        self.pixels_per_radian(extent) * (angle - self.left)
    }
}

/// Shift `angle` by whole turns so it lies within π of `reference`.
///
/// Azimuths arrive normalized into `[0, 2π)`, so a view centered on 0
/// would otherwise see every leftward reading as a full turn away.
pub fn unwrap_near(angle: f64, reference: f64) -> f64 {
    let mut delta = (angle - reference) % TAU;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    reference + delta
}

/// Hysteresis on emitted pixels
#[derive(Debug, Clone)]
pub struct JiggleGate {
    last: Option<i32>,
    threshold_px: f64,
}

impl JiggleGate {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            last: None,
            threshold_px,
        }
    }

    /// Emit `pixel` if it moved more than the threshold from the last
    /// emitted value, otherwise repeat the last value
    pub fn apply(&mut self, pixel: i32) -> i32 {
        match self.last {
            Some(last) if ((pixel - last).abs() as f64) <= self.threshold_px => last,
            _ => {
                self.last = Some(pixel);
                pixel
            }
        }
    }

    pub fn last(&self) -> Option<i32> {
        self.last
    }
}

/// Lifecycle of a [`Projector`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionState {
    Uninitialized,
    Tracking { bounds: FovBounds, last_pixel: i32 },
}

/// Per-session projection with frozen bounds and one jiggle gate
#[derive(Debug, Clone)]
pub struct Projector {
    bounds: Option<FovBounds>,
    gate: JiggleGate,
    ignored_bounds_change: bool,
}

impl Projector {
    pub fn new(jiggle_threshold_px: f64) -> Self {
        Self {
            bounds: None,
            gate: JiggleGate::new(jiggle_threshold_px),
            ignored_bounds_change: false,
        }
    }

    /// Project `angle` onto `extent` pixels.
    ///
    /// The first call records `bounds`; later calls use the recorded bounds
    /// and ignore the argument.
    pub fn project(&mut self, angle: f64, bounds: FovBounds, extent: u32) -> i32 {
        let frozen = *self.bounds.get_or_insert(bounds);
        if frozen != bounds && !self.ignored_bounds_change {
            self.ignored_bounds_change = true;
            tracing::warn!(
                "Ignoring field-of-view change to {:?}; bounds stay {:?} for this session",
                bounds,
                frozen
            );
        }

        let angle = unwrap_near(angle, frozen.midpoint());
        let pixel = frozen.map(angle, extent).round() as i32;
        self.gate.apply(pixel)
    }

    /// Pixels per radian under the recorded bounds, or under `fallback`
    /// before the first projection
    pub fn pixels_per_radian(&self, fallback: FovBounds, extent: u32) -> f64 {
        self.bounds.unwrap_or(fallback).pixels_per_radian(extent)
    }

    pub fn bounds(&self) -> Option<FovBounds> {
        self.bounds
    }

    pub fn state(&self) -> ProjectionState {
        match (self.bounds, self.gate.last()) {
            (Some(bounds), Some(last_pixel)) => ProjectionState::Tracking { bounds, last_pixel },
            _ => ProjectionState::Uninitialized,
        }
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(DEFAULT_JIGGLE_THRESHOLD_PX)
    }
}
