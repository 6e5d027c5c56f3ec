use std::marker::PhantomData;

use log::{debug, trace};

use crate::bounds::BoundingBox;
use crate::domain::SearchDomain;
use crate::error::ConfigError;
use crate::grid::CellGrid;
use crate::neighbors::Neighbors;
use crate::vector::{Vect3b, Vect3d};

/// Marks an empty cell or the end of a bucket list.
pub const CELL_EMPTY: usize = usize::MAX;

/// Neighbourhood search using buckets of constant size.
///
/// The domain is divided into a regular grid of buckets whose side is at
/// least the interaction radius. Points of a caller-owned container are
/// assigned to buckets with [`embed`](Self::embed), after which
/// [`find_neighbors`](Self::find_neighbors) returns every point in the same
/// or an adjacent bucket of a query position that lies within the
/// interaction radius along each axis.
///
/// The index never stores the points themselves. Each bucket keeps the slot
/// index of its most recently inserted point, and two arrays keyed by slot
/// (`next` and `prev`) chain the slots of a bucket into a doubly-linked list,
/// so inserting, removing and moving a point are all O(1). Positions are
/// read through the accessor `F` from the slice passed to each call; that
/// slice must be the same container, in the same order, that was embedded.
pub struct BucketSearch<T, F> {
    grid: CellGrid,
    position: F,
    /// Head slot of each cell (ghost cells mirror their source cell).
    cells: Vec<usize>,
    next: Vec<usize>,
    prev: Vec<usize>,
    /// Cell each slot was last inserted into, or `CELL_EMPTY` if untracked.
    dirty_cells: Vec<usize>,
    use_dirty_cells: bool,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> BucketSearch<T, F>
where
    F: Fn(&T) -> Vect3d,
{
    /// Creates an empty index over the box `low..high`, with the bucket size
    /// set to a tenth of the longest side. Use [`reset`](Self::reset) to set
    /// the interaction radius.
    pub fn new(low: Vect3d, high: Vect3d, periodic: Vect3b, position: F) -> Result<Self, ConfigError> {
        debug!("Creating bucket search with lower corner = {:?} and upper corner = {:?}", low, high);
        let domain = SearchDomain::new(BoundingBox::new(low, high)).with_periodic(periodic);
        Self::with_domain(&domain, position)
    }

    /// Creates an empty index for a fully specified domain.
    pub fn with_domain(domain: &SearchDomain, position: F) -> Result<Self, ConfigError> {
        let grid = CellGrid::new(domain)?;
        Ok(Self {
            cells: vec![CELL_EMPTY; grid.num_cells()],
            grid,
            position,
            next: Vec::new(),
            prev: Vec::new(),
            dirty_cells: Vec::new(),
            use_dirty_cells: false,
            _marker: PhantomData,
        })
    }

    /// Resets the domain extents, periodicity and bucket size.
    ///
    /// All points are forgotten; call [`embed`](Self::embed) afterwards. On
    /// error the index is left exactly as it was.
    pub fn reset(
        &mut self,
        low: Vect3d,
        high: Vect3d,
        interaction_radius: f64,
        periodic: Vect3b,
    ) -> Result<(), ConfigError> {
        let domain = SearchDomain::new(BoundingBox::new(low, high))
            .with_periodic(periodic)
            .with_interaction_radius(interaction_radius);
        self.reset_domain(&domain)
    }

    /// Same as [`reset`](Self::reset), taking a [`SearchDomain`].
    pub fn reset_domain(&mut self, domain: &SearchDomain) -> Result<(), ConfigError> {
        let grid = CellGrid::new(domain)?;
        self.cells = vec![CELL_EMPTY; grid.num_cells()];
        self.grid = grid;
        self.next.clear();
        self.prev.clear();
        self.dirty_cells.clear();
        self.use_dirty_cells = false;
        Ok(())
    }

    /// Embeds every point of `particles`, replacing whatever was embedded
    /// before. Slot `i` refers to `particles[i]`.
    pub fn embed(&mut self, particles: &[T]) {
        let n = particles.len();

        // clear head of linked lists (cells)
        if self.use_dirty_cells && self.dirty_cells.len() < self.cells.len() {
            debug!("Embedding {} points, clearing {} dirty cells", n, self.dirty_cells.len());
            for &cell in &self.dirty_cells {
                if cell == CELL_EMPTY {
                    continue;
                }
                self.cells[cell] = CELL_EMPTY;
                for &ghost in self.grid.ghosts_of(cell) {
                    self.cells[ghost] = CELL_EMPTY;
                }
            }
        } else {
            debug!("Embedding {} points, clearing all {} cells", n, self.cells.len());
            self.cells.fill(CELL_EMPTY);
        }
        self.use_dirty_cells = true;

        self.next.clear();
        self.next.resize(n, CELL_EMPTY);
        self.prev.clear();
        self.prev.resize(n, CELL_EMPTY);
        self.dirty_cells.clear();
        self.dirty_cells.resize(n, CELL_EMPTY);

        for (i, p) in particles.iter().enumerate() {
            let cell = self.grid.find_cell_index(&(self.position)(p));
            self.link(i, cell);
        }
    }

    /// Re-embeds `particles` while keeping slots whose bucket did not change.
    ///
    /// Slots present before and after are moved only if their bucket changed,
    /// slots beyond the new length are dropped and new trailing slots are
    /// added. Cheaper than [`embed`](Self::embed) when few points moved.
    pub fn embed_incremental(&mut self, particles: &[T]) {
        let n = particles.len();
        trace!("Incrementally embedding {} points over {}", n, self.len());
        while self.len() > n {
            self.delete(self.len() - 1);
        }
        for i in 0..self.len() {
            self.relocate(i, &particles[i]);
        }
        for i in self.len()..n {
            self.insert(&particles[i]);
        }
        self.use_dirty_cells = true;
    }

    /// Tracks the point that was just pushed onto the end of `particles`.
    pub fn add(&mut self, particles: &[T]) {
        assert!(
            particles.len() == self.len() + 1,
            "point to add must be the last of {} points, index tracks {}",
            particles.len(),
            self.len()
        );
        trace!("Adding point {}", self.len());
        self.insert(&particles[self.len()]);
        self.use_dirty_cells = true;
    }

    fn insert(&mut self, particle: &T) {
        let i = self.next.len();
        self.next.push(CELL_EMPTY);
        self.prev.push(CELL_EMPTY);
        self.dirty_cells.push(CELL_EMPTY);
        let cell = self.grid.find_cell_index(&(self.position)(particle));
        self.link(i, cell);
    }

    /// Removes the last slot from the index, before the caller pops it from
    /// its container. Panics if `index` is not the last slot.
    pub fn delete(&mut self, index: usize) {
        assert!(
            !self.next.is_empty() && index == self.next.len() - 1,
            "point to delete not at end of sequence: {} of {}",
            index,
            self.next.len()
        );
        trace!("Deleting point {}", index);
        self.unlink(index);
        self.next.pop();
        self.prev.pop();
        self.dirty_cells.pop();
    }

    /// Removes `index` from its bucket so it no longer appears in queries,
    /// without touching the slot numbering. Untracking an untracked slot is
    /// a no-op; [`update`](Self::update) tracks it again.
    pub fn untrack(&mut self, index: usize) {
        assert!(index < self.next.len(), "invalid untrack index {} of {}", index, self.next.len());
        trace!("Untracking point {}", index);
        self.unlink(index);
    }

    /// Moves `index` to the bucket of its current position, if it changed.
    pub fn update(&mut self, particles: &[T], index: usize) {
        self.assert_bound(particles);
        assert!(index < self.next.len(), "invalid update index {} of {}", index, self.next.len());
        self.relocate(index, &particles[index]);
    }

    fn relocate(&mut self, index: usize, particle: &T) {
        let cell = self.grid.find_cell_index(&(self.position)(particle));
        if cell == self.dirty_cells[index] {
            return;
        }
        trace!("Moving point {} from cell {} to {}", index, self.dirty_cells[index], cell);
        self.unlink(index);
        self.link(index, cell);
    }

    /// Records that the caller copied the point at slot `from` over slot
    /// `to`, as in a swap-and-pop removal.
    ///
    /// Whatever `to` held is removed, `to` takes over the list position of
    /// `from` without recomputing its bucket, and `from` becomes untracked
    /// so it can then be [`delete`](Self::delete)d.
    pub fn copy(&mut self, to: usize, from: usize) {
        let n = self.next.len();
        assert!(to < n && from < n, "invalid copy indices {} <- {} of {}", to, from, n);
        if to == from {
            return;
        }
        trace!("Copying point {} to {}", from, to);
        self.unlink(to);

        let cell = self.dirty_cells[from];
        if cell == CELL_EMPTY {
            return;
        }
        let forward = self.next[from];
        let backward = self.prev[from];
        self.next[to] = forward;
        self.prev[to] = backward;
        self.dirty_cells[to] = cell;
        if forward != CELL_EMPTY {
            self.prev[forward] = to;
        }
        if backward != CELL_EMPTY {
            self.next[backward] = to;
        } else {
            assert!(self.cells[cell] == from, "inconsistent cells data structure at cell {}", cell);
            self.set_head(cell, to);
        }
        self.next[from] = CELL_EMPTY;
        self.prev[from] = CELL_EMPTY;
        self.dirty_cells[from] = CELL_EMPTY;
    }

    /// Rebinds the index to `particles` after the caller's storage was
    /// reallocated. The topology is unchanged, so `particles` must hold the
    /// same points in the same order.
    pub fn update_begin_and_end(&mut self, particles: &[T]) {
        self.assert_bound(particles);
    }

    /// Returns the points of `particles` near `r`: those in the bucket of `r`
    /// or an adjacent one whose separation from `r` is below the interaction
    /// radius along every axis. The Euclidean cut is left to the caller.
    ///
    /// `my_index` is the slot of the querying point, if it is tracked; it is
    /// never returned. With `self_mode` set, all pairs of one container are
    /// found exactly once when every slot is queried in turn.
    pub fn find_neighbors<'a>(
        &'a self,
        particles: &'a [T],
        r: &Vect3d,
        my_index: Option<usize>,
        self_mode: bool,
    ) -> Neighbors<'a, T, F> {
        self.assert_bound(particles);
        let centre = self.grid.periodicity().wrap_into_domain(r);
        Neighbors::new(self, particles, centre, my_index, self_mode)
    }

    /// An exhausted iterator, equal to any iterator that has run out.
    pub fn end(&self) -> Neighbors<'_, T, F> {
        Neighbors::end(self)
    }

    /// In periodic domains a point pair has many separations; this returns
    /// the copy of `to_correct` closest to `source`.
    pub fn correct_position_for_periodicity(&self, source: &Vect3d, to_correct: &Vect3d) -> Vect3d {
        self.grid.periodicity().nearest_image(source, to_correct)
    }

    /// Current position of `particle` as seen by the index.
    #[inline]
    pub fn position_of(&self, particle: &T) -> Vect3d {
        (self.position)(particle)
    }

    /// Wraps `r` into the domain along its periodic axes.
    pub fn wrap_into_domain(&self, r: &Vect3d) -> Vect3d {
        self.grid.periodicity().wrap_into_domain(r)
    }

    /// Pushes `index` onto the front of `cell`'s list.
    fn link(&mut self, index: usize, cell: usize) {
        let head = self.cells[cell];
        self.next[index] = head;
        self.prev[index] = CELL_EMPTY;
        if head != CELL_EMPTY {
            self.prev[head] = index;
        }
        self.dirty_cells[index] = cell;
        self.set_head(cell, index);
    }

    /// Splices `index` out of its cell's list and marks it untracked.
    fn unlink(&mut self, index: usize) {
        let cell = self.dirty_cells[index];
        if cell == CELL_EMPTY {
            return;
        }
        let forward = self.next[index];
        let backward = self.prev[index];
        if forward != CELL_EMPTY {
            self.prev[forward] = backward;
        }
        if backward != CELL_EMPTY {
            self.next[backward] = forward;
        } else {
            assert!(self.cells[cell] == index, "inconsistent cells data structure at cell {}", cell);
            self.set_head(cell, forward);
        }
        self.next[index] = CELL_EMPTY;
        self.prev[index] = CELL_EMPTY;
        self.dirty_cells[index] = CELL_EMPTY;
    }

    fn set_head(&mut self, cell: usize, index: usize) {
        self.cells[cell] = index;
        for &ghost in self.grid.ghosts_of(cell) {
            self.cells[ghost] = index;
        }
    }

    fn assert_bound(&self, particles: &[T]) {
        assert!(
            particles.len() == self.next.len(),
            "container holds {} points but {} are embedded",
            particles.len(),
            self.next.len()
        );
    }
}

impl<T, F> BucketSearch<T, F> {
    pub fn low(&self) -> &Vect3d {
        self.grid.low()
    }

    pub fn high(&self) -> &Vect3d {
        self.grid.high()
    }

    pub fn periodic(&self) -> &Vect3b {
        self.grid.periodic()
    }

    /// The interaction radius, which is also the minimum bucket side.
    pub fn lengthscale(&self) -> f64 {
        self.grid.interaction_radius()
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Number of slots, tracked or not.
    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    pub fn is_tracked(&self, index: usize) -> bool {
        self.dirty_cells[index] != CELL_EMPTY
    }

    /// Head slot of `cell`, or `CELL_EMPTY`.
    #[inline]
    pub fn head(&self, cell: usize) -> usize {
        self.cells[cell]
    }

    /// The slot after `index` in its bucket list, or `CELL_EMPTY`.
    #[inline]
    pub fn next_in_cell(&self, index: usize) -> usize {
        self.next[index]
    }

    /// Walks every bucket list and panics on any inconsistency.
    ///
    /// Checks that each list head has no predecessor and is recorded in
    /// the cell it heads, that forward and reverse links agree, that every
    /// tracked slot is reached exactly once, and that ghost heads match
    /// their source.
    pub fn check_invariants(&self) {
        let n = self.next.len();
        assert_eq!(self.prev.len(), n);
        assert_eq!(self.dirty_cells.len(), n);

        for i in 0..n {
            if self.dirty_cells[i] == CELL_EMPTY {
                assert_eq!(self.next[i], CELL_EMPTY, "untracked slot {} has a successor", i);
                assert_eq!(self.prev[i], CELL_EMPTY, "untracked slot {} has a predecessor", i);
            } else if self.prev[i] == CELL_EMPTY {
                assert_eq!(self.cells[self.dirty_cells[i]], i, "slot {} is not the head of its cell", i);
            }
        }

        let mut seen = vec![false; n];
        for cell in 0..self.cells.len() {
            if self.grid.is_ghost(cell) {
                continue;
            }
            for &ghost in self.grid.ghosts_of(cell) {
                assert_eq!(self.cells[ghost], self.cells[cell], "ghost {} out of sync with {}", ghost, cell);
            }
            let mut node = self.cells[cell];
            let mut previous = CELL_EMPTY;
            while node != CELL_EMPTY {
                assert!(!seen[node], "slot {} reached twice", node);
                seen[node] = true;
                assert_eq!(self.prev[node], previous, "broken reverse link at slot {}", node);
                assert_eq!(self.dirty_cells[node], cell, "slot {} listed in foreign cell {}", node, cell);
                previous = node;
                node = self.next[node];
            }
        }
        for i in 0..n {
            assert_eq!(seen[i], self.dirty_cells[i] != CELL_EMPTY, "slot {} tracking mismatch", i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(p: &Vect3d) -> Vect3d {
        *p
    }

    fn unit_search(radius: f64) -> BucketSearch<Vect3d, fn(&Vect3d) -> Vect3d> {
        let mut search = BucketSearch::new([0.0; 3], [1.0; 3], [false; 3], pos as fn(&Vect3d) -> Vect3d).unwrap();
        search.reset([0.0; 3], [1.0; 3], radius, [false; 3]).unwrap();
        search
    }

    #[test]
    fn test_default_lengthscale() {
        let search = BucketSearch::<Vect3d, _>::new([0.0; 3], [10.0, 5.0, 5.0], [false; 3], pos).unwrap();
        assert_eq!(search.lengthscale(), 1.0);
        assert!(search.is_empty());
    }

    #[test]
    fn test_embed_builds_stack_order() {
        let mut search = unit_search(0.3);
        let points = vec![[0.1, 0.1, 0.1], [0.15, 0.1, 0.1], [0.2, 0.2, 0.2]];
        search.embed(&points);
        search.check_invariants();

        let cell = search.grid().find_cell_index(&points[0]);
        assert_eq!(search.head(cell), 2);
        assert_eq!(search.next_in_cell(2), 1);
        assert_eq!(search.next_in_cell(1), 0);
        assert_eq!(search.next_in_cell(0), CELL_EMPTY);
    }

    #[test]
    fn test_add_then_delete_restores_state() {
        let mut search = unit_search(0.3);
        let mut points = vec![[0.1, 0.1, 0.1], [0.5, 0.5, 0.5], [0.15, 0.1, 0.1]];
        search.embed(&points);
        let cells = search.cells.clone();
        let next = search.next.clone();
        let prev = search.prev.clone();

        points.push([0.12, 0.12, 0.12]);
        search.add(&points);
        search.check_invariants();
        search.delete(3);
        points.pop();
        search.check_invariants();

        assert_eq!(search.cells, cells);
        assert_eq!(search.next, next);
        assert_eq!(search.prev, prev);
    }

    #[test]
    #[should_panic(expected = "not at end of sequence")]
    fn test_delete_not_last() {
        let mut search = unit_search(0.3);
        search.embed(&vec![[0.1; 3], [0.2; 3]]);
        search.delete(0);
    }

    #[test]
    fn test_untrack_middle_of_list() {
        let mut search = unit_search(0.3);
        let points = vec![[0.1; 3], [0.11; 3], [0.12; 3]];
        search.embed(&points);
        search.untrack(1);
        search.check_invariants();
        assert!(!search.is_tracked(1));
        assert_eq!(search.next_in_cell(2), 0);

        // untracking twice is harmless
        search.untrack(1);
        search.check_invariants();

        search.update(&points, 1);
        search.check_invariants();
        assert!(search.is_tracked(1));
    }

    #[test]
    fn test_update_moves_between_cells() {
        let mut search = unit_search(0.3);
        let mut points = vec![[0.1; 3], [0.11; 3]];
        search.embed(&points);
        points[0] = [0.9; 3];
        search.update(&points, 0);
        search.check_invariants();
        assert_eq!(search.dirty_cells[0], search.grid().find_cell_index(&[0.9; 3]));
        assert_eq!(search.head(search.grid().find_cell_index(&[0.11; 3])), 1);
    }

    #[test]
    fn test_copy_swap_and_pop() {
        let mut search = unit_search(0.3);
        let mut points = vec![[0.1; 3], [0.5; 3], [0.11; 3], [0.52; 3]];
        search.embed(&points);

        // remove slot 0 by moving the last point over it
        search.copy(0, 3);
        points.swap_remove(0);
        search.delete(3);
        search.check_invariants();

        assert_eq!(search.len(), 3);
        let cell = search.grid().find_cell_index(&[0.5; 3]);
        assert_eq!(search.head(cell), 0);
        assert_eq!(search.next_in_cell(0), 1);
        let cell = search.grid().find_cell_index(&[0.11; 3]);
        assert_eq!(search.head(cell), 2);
        assert_eq!(search.next_in_cell(2), CELL_EMPTY);
    }

    #[test]
    fn test_reset_forgets_points() {
        let mut search = unit_search(0.3);
        search.embed(&vec![[0.1; 3]]);
        search.reset([0.0; 3], [2.0; 3], 0.5, [true; 3]).unwrap();
        assert!(search.is_empty());
        assert_eq!(search.periodic(), &[true; 3]);
        assert!(search.cells.iter().all(|&c| c == CELL_EMPTY));
    }

    #[test]
    fn test_failed_reset_keeps_state() {
        let mut search = unit_search(0.3);
        let points = vec![[0.1; 3]];
        search.embed(&points);
        assert!(search.reset([0.0; 3], [1.0; 3], 0.5, [true; 3]).is_err());
        assert_eq!(search.lengthscale(), 0.3);
        assert_eq!(search.len(), 1);
        search.check_invariants();
    }

    #[test]
    #[should_panic(expected = "inconsistent cells data structure")]
    fn test_untrack_detects_corrupted_head() {
        let mut search = unit_search(0.3);
        search.embed(&vec![[0.1; 3], [0.11; 3]]);
        // slot 0 sits behind slot 1, so its cell must not name it as head
        let cell = search.dirty_cells[1];
        search.cells[cell] = 0;
        search.untrack(1);
    }

    #[test]
    #[should_panic(expected = "inconsistent cells data structure")]
    fn test_copy_detects_corrupted_head() {
        let mut search = unit_search(0.3);
        search.embed(&vec![[0.1; 3], [0.5; 3]]);
        let cell = search.dirty_cells[1];
        search.cells[cell] = CELL_EMPTY;
        search.copy(0, 1);
    }

    #[test]
    #[should_panic(expected = "container holds")]
    fn test_stale_container() {
        let mut search = unit_search(0.3);
        search.embed(&vec![[0.1; 3], [0.2; 3]]);
        search.update_begin_and_end(&vec![[0.1; 3]]);
    }
}
