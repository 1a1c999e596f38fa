//! Orientation filter policies
//!
//! - Moving average: mean of the current window
//! - Exponential smoothing gated on movement significance
//!
//! The exponential carry value is read and written under the buffer lock.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::orientation::buffer::{AngularState, OrientationBuffer};
use crate::projection::unwrap_near;

/// Default smoothing factor
pub const DEFAULT_ALPHA: f64 = 0.1;

/// Default movement gate, in pixels
pub const DEFAULT_MOVEMENT_THRESHOLD_PX: f64 = 75.0;

/// Which stabilization the session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FilterPolicy {
    #[default]
    MovingAverage,
    Exponential,
}

impl std::str::FromStr for FilterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "moving-average" | "average" => Ok(FilterPolicy::MovingAverage),
            "exponential" | "ema" => Ok(FilterPolicy::Exponential),
            other => Err(format!("unknown filter policy: {}", other)),
        }
    }
}

/// Window sample the exponential filter blends toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GateSample {
    /// Most recently pushed sample
    #[default]
    Latest,
    /// Oldest retained sample
    Oldest,
}

/// Exponential smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialParams {
    /// Weight of the new sample, in (0, 1]
    pub alpha: f64,
    /// Minimum average-vs-sample distance, in pixels, before the filter moves
    pub movement_threshold_px: f64,
    #[serde(default)]
    pub sample: GateSample,
}

impl Default for ExponentialParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            movement_threshold_px: DEFAULT_MOVEMENT_THRESHOLD_PX,
            sample: GateSample::Latest,
        }
    }
}

/// One exponential smoothing step
pub fn smooth(prev: f64, sample: f64, alpha: f64) -> f64 {
    sample * alpha + prev * (1.0 - alpha)
}

/// Stabilized angle source for the render thread
#[derive(Debug, Clone)]
pub struct OrientationFilter {
    buffer: Arc<OrientationBuffer>,
    policy: FilterPolicy,
    params: ExponentialParams,
}

impl OrientationFilter {
    pub fn new(buffer: Arc<OrientationBuffer>, policy: FilterPolicy, params: ExponentialParams) -> Self {
        Self {
            buffer,
            policy,
            params,
        }
    }

    pub fn moving_average(buffer: Arc<OrientationBuffer>) -> Self {
        Self::new(buffer, FilterPolicy::MovingAverage, ExponentialParams::default())
    }

    pub fn exponential(buffer: Arc<OrientationBuffer>, params: ExponentialParams) -> Self {
        Self::new(buffer, FilterPolicy::Exponential, params)
    }

    pub fn policy(&self) -> FilterPolicy {
        self.policy
    }

    pub fn buffer(&self) -> &Arc<OrientationBuffer> {
        &self.buffer
    }

    /// Stabilized azimuth. 0 before any sample arrives.
    ///
    /// Samples are unwrapped to within π of `reference` (the view center)
    /// before averaging or blending, so the result is continuous across the
    /// 0/2π seam and lies in that unwrapped space. `pixels_per_radian`
    /// converts the gate's angular distance into the pixel space its
    /// threshold is tuned against; the moving average ignores it.
    pub fn azimuth(&self, reference: f64, pixels_per_radian: f64) -> f64 {
        let mut state = self.buffer.lock();
        match self.policy {
            FilterPolicy::MovingAverage => state.azimuth.average_near(reference),
            FilterPolicy::Exponential => {
                self.exponential_step(&mut state, reference, pixels_per_radian)
            }
        }
    }

    fn exponential_step(
        &self,
        state: &mut AngularState,
        reference: f64,
        pixels_per_radian: f64,
    ) -> f64 {
        if state.azimuth.is_empty() {
            return 0.0;
        }

        let average = state.azimuth.average_near(reference);
        let sample = match self.params.sample {
            GateSample::Latest => state.azimuth.latest(),
            GateSample::Oldest => state.azimuth.oldest(),
        };
        let sample = unwrap_near(sample, reference);

        let distance_px = (sample - average).abs() * pixels_per_radian.abs();
        let far_enough = distance_px > self.params.movement_threshold_px;
        if far_enough {
            let prev = state.filter.prev_filtered_angle;
            state.filter.prev_filtered_angle = smooth(prev, sample, self.params.alpha);
        }
        state.filter.prev_filtered_angle
    }

    /// Mean pitch over the window, 0 before any pitch arrives
    pub fn pitch(&self) -> f64 {
        self.buffer.average_pitch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PX_PER_RAD: f64 = 3840.0 / 0.5236;

    fn loaded(values: &[f64]) -> Arc<OrientationBuffer> {
        loaded_with(values, 16)
    }

    fn loaded_with(values: &[f64], capacity: usize) -> Arc<OrientationBuffer> {
        let buffer = Arc::new(OrientationBuffer::new(capacity));
        for &v in values {
            buffer.push(v);
        }
        buffer
    }

    #[test]
    fn test_moving_average_policy() {
        let filter = OrientationFilter::moving_average(loaded(&[0.1, 0.2, 0.3]));
        assert!((filter.azimuth(0.0, PX_PER_RAD) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_buffer_yields_zero() {
        let buffer = Arc::new(OrientationBuffer::new(4));
        let ma = OrientationFilter::moving_average(Arc::clone(&buffer));
        let ema = OrientationFilter::exponential(buffer, ExponentialParams::default());
        assert_eq!(ma.azimuth(0.0, PX_PER_RAD), 0.0);
        assert_eq!(ema.azimuth(0.0, PX_PER_RAD), 0.0);
        assert_eq!(ema.pitch(), 0.0);
    }

    #[test]
    fn test_gate_holds_small_movement() {
        // average 0.101, latest 0.102: ~7 px apart, below the 75 px gate
        let filter = OrientationFilter::exponential(
            loaded(&[0.100, 0.101, 0.102]),
            ExponentialParams::default(),
        );
        assert_eq!(filter.azimuth(0.0, PX_PER_RAD), 0.0);
        assert_eq!(filter.buffer().lock().filter.prev_filtered_angle, 0.0);
    }

    #[test]
    fn test_gate_passes_large_movement() {
        // average 0.1, latest 0.2: ~733 px apart
        let filter =
            OrientationFilter::exponential(loaded(&[0.0, 0.1, 0.2]), ExponentialParams::default());
        let first = filter.azimuth(0.0, PX_PER_RAD);
        assert!((first - 0.02).abs() < 1e-12);

        let second = filter.azimuth(0.0, PX_PER_RAD);
        assert!((second - smooth(0.02, 0.2, 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_gate_can_follow_oldest_sample() {
        let params = ExponentialParams {
            sample: GateSample::Oldest,
            ..Default::default()
        };
        let filter = OrientationFilter::exponential(loaded(&[0.4, 0.1, 0.1]), params);
        assert!((filter.azimuth(0.0, PX_PER_RAD) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_converges_monotonically() {
        let s = 2.5;
        let mut prev = 0.0;
        for _ in 0..50 {
            let next = smooth(prev, s, DEFAULT_ALPHA);
            assert!(next > prev);
            assert!((0.0..=s).contains(&next));
            prev = next;
        }
        // 2.5 * 0.9^50 ~= 0.013
        assert!(s - prev < 0.02);
    }

    #[test]
    fn test_moving_average_noise_around_seam() {
        let buffer = Arc::new(OrientationBuffer::new(100));
        for i in 0..100 {
            let d: f64 = if i % 2 == 0 { 0.5 } else { -0.5 };
            buffer.push(d.to_radians());
        }
        let filter = OrientationFilter::moving_average(Arc::clone(&buffer));
        assert!(filter.azimuth(0.0, PX_PER_RAD).abs() < 1e-9);

        // the buffer itself still reports the plain mean
        assert!((buffer.average() - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_left_turn_stays_near_center() {
        let buffer = loaded_with(&[0.0; 20], 500);
        let filter = OrientationFilter::exponential(Arc::clone(&buffer), ExponentialParams::default());
        assert_eq!(filter.azimuth(0.0, PX_PER_RAD), 0.0);

        let left = -(2f64.to_radians());
        for _ in 0..60 {
            buffer.push(left);
            let v = filter.azimuth(0.0, PX_PER_RAD);
            assert!(v <= 0.0 && v >= left - 1e-12, "filtered {}", v);
        }
    }

    #[test]
    fn test_exponential_filter_converges_toward_sample() {
        let buffer = loaded_with(&[0.0; 400], 500);
        let filter = OrientationFilter::exponential(Arc::clone(&buffer), ExponentialParams::default());
        let s = 0.3;
        let mut prev = 0.0;
        for _ in 0..50 {
            buffer.push(s);
            // the zeros keep the average well below the sample
            let next = filter.azimuth(0.0, 1e6);
            assert!(next > prev, "{} after {}", next, prev);
            assert!((0.0..=s).contains(&next));
            prev = next;
        }
        assert!(s - prev < 0.01);
    }

    #[test]
    fn test_filter_policy_from_str() {
        assert_eq!(
            "exponential".parse::<FilterPolicy>().unwrap(),
            FilterPolicy::Exponential
        );
        assert_eq!(
            "moving-average".parse::<FilterPolicy>().unwrap(),
            FilterPolicy::MovingAverage
        );
        assert!("kalman".parse::<FilterPolicy>().is_err());
    }
}
