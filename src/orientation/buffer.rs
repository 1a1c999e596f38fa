//! Angular sample buffer
//!
//! A bounded rolling window of recent orientation samples shared between
//! the ingest thread and the render thread. The exponential filter carry
//! value lives behind the same lock so every angle read and write is
//! serialized through one critical section.

use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::f64::consts::TAU;

use crate::projection::unwrap_near;

/// Default number of samples retained per window
pub const DEFAULT_CAPACITY: usize = 500;

/// Normalize an azimuth into `[0, 2π)`.
///
/// Negative readings get one turn added. A reading so close to zero that
/// the addition rounds up to exactly `2π` folds back to 0.
pub fn normalize_azimuth(angle: f64) -> f64 {
    let n = if angle < 0.0 { angle + TAU } else { angle };
    if n >= TAU {
        n - TAU
    } else {
        n
    }
}

/// Fixed-capacity FIFO of angles
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    /// Create an empty window. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one first if the window is full
    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Arithmetic mean of the retained samples, 0 when empty
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Mean after shifting each sample to within π of `reference`.
    ///
    /// Same as [`average`](Self::average) unless the window straddles the
    /// 0/2π seam, where the plain mean would land on the far side of the
    /// circle. 0 when empty.
    pub fn average_near(&self, reference: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples
            .iter()
            .map(|&s| unwrap_near(s, reference))
            .sum::<f64>()
            / self.samples.len() as f64
    }

    /// Most recently pushed sample, 0 when empty
    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or(0.0)
    }

    /// Oldest retained sample, 0 when empty
    pub fn oldest(&self) -> f64 {
        self.samples.front().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate samples oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

/// Exponential filter carry value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterState {
    pub prev_filtered_angle: f64,
}

/// Everything guarded by the orientation lock
#[derive(Debug, Clone)]
pub struct AngularState {
    pub azimuth: SampleWindow,
    pub pitch: SampleWindow,
    pub filter: FilterState,
    /// Total samples accepted since the session started
    pub received: u64,
}

impl AngularState {
    fn new(capacity: usize) -> Self {
        Self {
            azimuth: SampleWindow::new(capacity),
            pitch: SampleWindow::new(capacity),
            filter: FilterState::default(),
            received: 0,
        }
    }
}

/// Shared, mutex-protected orientation window
#[derive(Debug)]
pub struct OrientationBuffer {
    state: Mutex<AngularState>,
}

impl OrientationBuffer {
    /// Create a buffer retaining `capacity` samples per channel
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(AngularState::new(capacity)),
        }
    }

    /// Push a raw azimuth, normalizing it into `[0, 2π)` first
    pub fn push(&self, azimuth: f64) {
        let mut state = self.state.lock();
        state.azimuth.push(normalize_azimuth(azimuth));
        state.received += 1;
    }

    /// Push an azimuth and an already offset pitch under one lock
    pub fn push_with_pitch(&self, azimuth: f64, pitch: f64) {
        let mut state = self.state.lock();
        state.azimuth.push(normalize_azimuth(azimuth));
        state.pitch.push(pitch);
        state.received += 1;
    }

    /// Mean azimuth over the window, 0 when empty
    pub fn average(&self) -> f64 {
        self.state.lock().azimuth.average()
    }

    /// Most recent azimuth, 0 when empty
    pub fn latest(&self) -> f64 {
        self.state.lock().azimuth.latest()
    }

    /// Mean pitch over the window, 0 when empty
    pub fn average_pitch(&self) -> f64 {
        self.state.lock().pitch.average()
    }

    pub fn has_pitch(&self) -> bool {
        !self.state.lock().pitch.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().azimuth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().azimuth.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().azimuth.capacity()
    }

    /// Number of samples accepted since creation
    pub fn received(&self) -> u64 {
        self.state.lock().received
    }

    /// Copy of the azimuth window, oldest first
    pub fn snapshot(&self) -> Vec<f64> {
        self.state.lock().azimuth.iter().collect()
    }

    /// Lock the whole angular state.
    ///
    /// Callers that need the window and the filter state together must go
    /// through one guard so the two are never locked separately.
    pub(crate) fn lock(&self) -> MutexGuard<'_, AngularState> {
        self.state.lock()
    }
}

impl Default for OrientationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut window = SampleWindow::new(4);
        for i in 0..20 {
            window.push(i as f64);
            assert!(window.len() <= 4);
        }
    }

    #[test]
    fn test_window_keeps_last_capacity_values_in_order() {
        let mut window = SampleWindow::new(5);
        for i in 0..(5 + 3) {
            window.push(i as f64);
        }
        let kept: Vec<f64> = window.iter().collect();
        assert_eq!(kept, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(window.oldest(), 3.0);
        assert_eq!(window.latest(), 7.0);
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let mut window = SampleWindow::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest(), 2.0);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_average_matches_mean() {
        let buffer = OrientationBuffer::new(10);
        let values = [0.1, 0.25, 1.5, 2.75, 3.0];
        for v in values {
            buffer.push(v);
        }
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert!((buffer.average() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_average_near_spans_seam() {
        let mut window = SampleWindow::new(8);
        for i in 0..8 {
            let d: f64 = if i % 2 == 0 { 0.5 } else { -0.5 };
            window.push(normalize_azimuth(d.to_radians()));
        }
        // plain mean lands on the far side of the circle
        assert!((window.average() - std::f64::consts::PI).abs() < 1e-9);
        assert!(window.average_near(0.0).abs() < 1e-12);

        // away from the seam both agree
        let mut window = SampleWindow::new(4);
        for v in [1.0, 1.2, 1.4] {
            window.push(v);
        }
        assert!((window.average_near(1.2) - window.average()).abs() < 1e-12);
        assert_eq!(SampleWindow::new(4).average_near(0.0), 0.0);
    }

    #[test]
    fn test_empty_buffer_returns_zero() {
        let buffer = OrientationBuffer::default();
        assert_eq!(buffer.average(), 0.0);
        assert_eq!(buffer.latest(), 0.0);
        assert_eq!(buffer.average_pitch(), 0.0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_negative_azimuth_is_normalized() {
        for a in [-0.001, -1.0, -3.0, -6.0] {
            let n = normalize_azimuth(a);
            assert!((n - (a + TAU)).abs() < 1e-12);
            assert!((0.0..TAU).contains(&n));
        }
        assert_eq!(normalize_azimuth(1.25), 1.25);

        // TAU + -1e-45 rounds to TAU
        let tiny = normalize_azimuth(-1e-45);
        assert!((0.0..TAU).contains(&tiny), "got {}", tiny);
        assert_eq!(normalize_azimuth(f64::from(-f32::from_bits(1))), 0.0);

        let buffer = OrientationBuffer::new(2);
        buffer.push(-1.0);
        assert!((buffer.latest() - (TAU - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_push_with_pitch_updates_both_windows() {
        let buffer = OrientationBuffer::new(3);
        buffer.push_with_pitch(0.5, 1.0);
        buffer.push_with_pitch(0.7, 2.0);
        assert!((buffer.average() - 0.6).abs() < 1e-9);
        assert!((buffer.average_pitch() - 1.5).abs() < 1e-9);
        assert_eq!(buffer.received(), 2);
        assert_eq!(buffer.snapshot(), vec![0.5, 0.7]);
    }
}
