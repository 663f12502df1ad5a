// src/buffer.rs

use std::collections::VecDeque;

use crate::sample::Sample;

/// Default number of points kept for the chart.
pub const MAX_POINTS: usize = 50;

/// Fixed-length history, oldest first. Always exactly `capacity` entries:
/// zero placeholders fill whatever real readings haven't.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    points: VecDeque<Sample>,
    capacity: usize,
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new(MAX_POINTS)
    }
}

impl RollingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut buf = Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        };
        buf.reset();
        buf
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn insert(&mut self, sample: Sample) {
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(sample);
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.points.resize(self.capacity, Sample::ZERO);
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.points.iter().copied().collect()
    }

    pub fn max_ppm(&self) -> f64 {
        self.points.iter().map(|s| s.ppm()).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_full_of_placeholders() {
        let buf = RollingBuffer::default();
        let snap = buf.snapshot();
        assert_eq!(snap.len(), MAX_POINTS);
        assert!(snap.iter().all(|s| *s == Sample::ZERO));
    }

    #[test]
    fn keeps_last_capacity_values_in_order() {
        let mut buf = RollingBuffer::new(5);
        for i in 0..12 {
            buf.insert(Sample::new(i as f64));
            assert_eq!(buf.snapshot().len(), 5);
        }
        let values: Vec<f64> = buf.snapshot().iter().map(|s| s.ppm()).collect();
        assert_eq!(values, vec![7.0, 8.0, 9.0, 10.0, 11.0]);
        assert_eq!(buf.max_ppm(), 11.0);
    }

    #[test]
    fn partial_fill_keeps_leading_placeholders() {
        let mut buf = RollingBuffer::new(4);
        buf.insert(Sample::new(3.5));
        let values: Vec<f64> = buf.snapshot().iter().map(|s| s.ppm()).collect();
        assert_eq!(values, vec![0.0, 0.0, 0.0, 3.5]);
    }

    #[test]
    fn reset_restores_placeholders() {
        let mut buf = RollingBuffer::new(3);
        buf.insert(Sample::new(900.0));
        buf.reset();
        assert_eq!(buf.snapshot(), vec![Sample::ZERO; 3]);
        assert_eq!(buf.max_ppm(), 0.0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(RollingBuffer::new(0).snapshot().len(), 1);
    }
}
