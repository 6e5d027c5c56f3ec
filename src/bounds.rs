#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Generic bounding box for N-dimensional space.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// Side lengths of the box along each axis.
    pub fn extent(&self) -> [f64; D] {
        let mut extent = [0.0; D];
        for i in 0..D {
            extent[i] = self.max[i] - self.min[i];
        }
        extent
    }

    /// Length of the longest side.
    pub fn max_extent(&self) -> f64 {
        self.extent().into_iter().fold(0.0, f64::max)
    }

    /// Whether `point` lies in the half-open box `[min, max)`.
    pub fn contains(&self, point: &[f64; D]) -> bool {
        (0..D).all(|i| point[i] >= self.min[i] && point[i] < self.max[i])
    }
}
