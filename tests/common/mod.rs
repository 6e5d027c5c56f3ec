#![allow(dead_code)]

use bucketsearch::{BucketSearch, Vect3b, Vect3d};
use rand::Rng;

pub type PointSearch = BucketSearch<Vect3d, fn(&Vect3d) -> Vect3d>;

pub fn position(p: &Vect3d) -> Vect3d {
    *p
}

/// An index over plain points in the box `low..high`.
pub fn point_search(low: Vect3d, high: Vect3d, radius: f64, periodic: Vect3b) -> PointSearch {
    let mut search = BucketSearch::new(low, high, periodic, position as fn(&Vect3d) -> Vect3d).unwrap();
    search.reset(low, high, radius, periodic).unwrap();
    search
}

pub fn random_points<R: Rng>(rng: &mut R, count: usize, low: Vect3d, high: Vect3d) -> Vec<Vect3d> {
    (0..count)
        .map(|_| {
            [
                rng.gen_range(low[0]..high[0]),
                rng.gen_range(low[1]..high[1]),
                rng.gen_range(low[2]..high[2]),
            ]
        })
        .collect()
}

/// Slots within `radius` of `q` along every axis, found by checking every
/// point against its nearest periodic image. Sorted.
pub fn brute_force(
    points: &[Vect3d],
    q: &Vect3d,
    skip: Option<usize>,
    low: Vect3d,
    high: Vect3d,
    radius: f64,
    periodic: Vect3b,
) -> Vec<usize> {
    let mut found = Vec::new();
    for (j, p) in points.iter().enumerate() {
        if Some(j) == skip {
            continue;
        }
        let inside = (0..3).all(|i| {
            let mut d = q[i] - p[i];
            if periodic[i] {
                let size = high[i] - low[i];
                if d > 0.5 * size {
                    d -= size;
                } else if d < -0.5 * size {
                    d += size;
                }
            }
            d.abs() < radius
        });
        if inside {
            found.push(j);
        }
    }
    found
}

/// Sorted slots returned by a query.
pub fn query(search: &PointSearch, points: &[Vect3d], q: &Vect3d, my_index: Option<usize>, self_mode: bool) -> Vec<usize> {
    let mut slots: Vec<usize> = search.find_neighbors(points, q, my_index, self_mode).map(|n| n.slot).collect();
    slots.sort_unstable();
    slots
}
