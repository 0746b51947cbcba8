use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    /// Bounds of a single point.
    pub fn point(p: [f64; 3]) -> Self {
        Self { min: p, max: p }
    }

    /// Bounds of a set of points, or `None` if the set is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::point(first);
        for p in iter {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Grow the box to contain `p`.
    pub fn include(&mut self, p: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Extent along each axis.
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Largest per-coordinate distance between the corners of two boxes.
    pub fn max_deviation(&self, other: &Bounds) -> f64 {
        (0..3)
            .flat_map(|axis| {
                [
                    (self.min[axis] - other.min[axis]).abs(),
                    (self.max[axis] - other.max[axis]).abs(),
                ]
            })
            .fold(0.0, f64::max)
    }

    /// Whether every corner coordinate is within `tolerance` of `other`'s.
    pub fn approx_eq(&self, other: &Bounds, tolerance: f64) -> bool {
        self.max_deviation(other) <= tolerance
    }
}
