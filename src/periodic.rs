use crate::vector::{Vect3b, Vect3d};

/// Maps points into a box that wraps around along its periodic axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Periodicity {
    pub low: Vect3d,
    pub high: Vect3d,
    pub domain_size: Vect3d,
    pub periodic: Vect3b,
}

impl Periodicity {
    pub fn new(low: Vect3d, high: Vect3d, periodic: Vect3b) -> Self {
        Self {
            low,
            high,
            domain_size: [high[0] - low[0], high[1] - low[1], high[2] - low[2]],
            periodic,
        }
    }

    /// Moves `point` into `[low, high)` along every periodic axis by whole
    /// multiples of the domain size. Non-periodic axes are left untouched.
    pub fn wrap_into_domain(&self, point: &Vect3d) -> Vect3d {
        let mut wrapped = *point;
        for i in 0..3 {
            if !self.periodic[i] {
                continue;
            }
            assert!(wrapped[i].is_finite(), "cannot wrap non-finite coordinate {:?}", point);
            let size = self.domain_size[i];
            let mut x = self.low[i] + (wrapped[i] - self.low[i]).rem_euclid(size);
            // rem_euclid may round up to exactly `size`
            if x >= self.high[i] {
                x -= size;
            }
            wrapped[i] = x;
        }
        wrapped
    }

    /// Shortest signed separation `candidate - source`, taking the nearer
    /// periodic copy on each periodic axis.
    pub fn minimum_image(&self, source: &Vect3d, candidate: &Vect3d) -> Vect3d {
        let mut dx = [
            candidate[0] - source[0],
            candidate[1] - source[1],
            candidate[2] - source[2],
        ];
        for i in 0..3 {
            if !self.periodic[i] {
                continue;
            }
            let half = 0.5 * self.domain_size[i];
            if dx[i] > half {
                dx[i] -= self.domain_size[i];
            } else if dx[i] < -half {
                dx[i] += self.domain_size[i];
            }
        }
        dx
    }

    /// The periodic image of `candidate` closest to `source`.
    pub fn nearest_image(&self, source: &Vect3d, candidate: &Vect3d) -> Vect3d {
        let dx = self.minimum_image(source, candidate);
        [source[0] + dx[0], source[1] + dx[1], source[2] + dx[2]]
    }
}
