//! Batch queries over every slot of a container, run in parallel.
//!
//! Queries only read the index, so any number of them may run at once as
//! long as nothing mutates it meanwhile.

use rayon::prelude::*;

use crate::bucket_search::BucketSearch;
use crate::neighbors::Neighbors;
use crate::vector::Vect3d;

/// Slots of the candidates of every point in `particles`, the point itself
/// excluded. With `self_mode` each unordered pair is listed once, under the
/// point that found it.
pub fn neighbor_lists<T, F>(search: &BucketSearch<T, F>, particles: &[T], self_mode: bool) -> Vec<Vec<usize>>
where
    T: Sync,
    F: Fn(&T) -> Vect3d + Sync,
{
    map_neighbors(search, particles, self_mode, |_, _, neighbors| {
        neighbors.map(|n| n.slot).collect()
    })
}

/// Runs `map` on the query of every point in `particles` and collects the
/// results in slot order.
///
/// `map` receives the slot, the point and the cursor over its candidates.
pub fn map_neighbors<T, F, R, M>(search: &BucketSearch<T, F>, particles: &[T], self_mode: bool, map: M) -> Vec<R>
where
    T: Sync,
    F: Fn(&T) -> Vect3d + Sync,
    R: Send,
    M: for<'n> Fn(usize, &'n T, Neighbors<'n, T, F>) -> R + Sync + Send,
{
    (0..particles.len())
        .into_par_iter()
        .map(|i| {
            let p = &particles[i];
            let r = search.position_of(p);
            map(i, p, search.find_neighbors(particles, &r, Some(i), self_mode))
        })
        .collect()
}
