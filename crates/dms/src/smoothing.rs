//! Moving-average smoother for mouth aspect ratio

use std::collections::VecDeque;

/// Bounded FIFO of raw MAR readings; output is the window mean
#[derive(Debug, Clone)]
pub struct MarSmoother {
    window: VecDeque<f64>,
    capacity: usize,
}

impl MarSmoother {
    /// Create a smoother averaging the last `capacity` readings
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a raw reading (evicting the oldest on overflow) and return the mean
    pub fn push(&mut self, raw: f64) -> f64 {
        if self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(raw);
        self.mean()
    }

    /// Mean of the current window, 0.0 when empty
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}
