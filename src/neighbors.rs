use std::iter::FusedIterator;

use crate::bucket_search::{BucketSearch, CELL_EMPTY};
use crate::vector::{max_abs, sub, Vect3d};

/// Progress of a [`Neighbors`] cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Constructed, not yet positioned on the first candidate.
    Init,
    /// Walking bucket lists between candidates.
    Scanning,
    /// Positioned on an in-range candidate.
    AtCandidate,
    /// Every bucket of the stencil has been walked.
    Done,
}

/// One candidate neighbour returned by a query.
#[derive(Debug)]
pub struct Neighbor<'a, T> {
    /// Slot of the candidate in the caller's container.
    pub slot: usize,
    pub particle: &'a T,
    /// Query position minus the candidate's nearest periodic image.
    pub dx: Vect3d,
}

impl<T> Clone for Neighbor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Neighbor<'_, T> {}

/// A lazy cursor over the candidates near a query position.
///
/// Visits the query's own bucket and the buckets of the surrounding stencil
/// (ghost buckets stand in for periodic images) and stops at every point
/// whose minimum-image separation is below the interaction radius along all
/// three axes. This is a cube test: points in the corners of the cube may be
/// further away than the radius.
///
/// Candidates come out bucket by bucket, most recently inserted first. Any
/// mutation of the index invalidates the cursor, which the borrow checker
/// enforces.
pub struct Neighbors<'a, T, F> {
    search: &'a BucketSearch<T, F>,
    particles: &'a [T],
    centre: Vect3d,
    my_index: usize,
    self_mode: bool,
    home: usize,
    offset_i: usize,
    offset_end: usize,
    node: usize,
    /// Slot that terminates the current list walk.
    stop_at: usize,
    dx: Vect3d,
    state: State,
}

impl<'a, T, F> Neighbors<'a, T, F>
where
    F: Fn(&T) -> Vect3d,
{
    /// Starts a query around `centre`, which must already be wrapped into
    /// the domain.
    ///
    /// In self mode only the first half of the stencil is visited, and in the
    /// query's own bucket only the points in front of `my_index`. Running
    /// this for every slot of a container therefore yields each unordered
    /// pair once.
    pub(crate) fn new(
        search: &'a BucketSearch<T, F>,
        particles: &'a [T],
        centre: Vect3d,
        my_index: Option<usize>,
        self_mode: bool,
    ) -> Self {
        assert!(
            !self_mode || my_index.is_some(),
            "a self query needs the index of the querying point"
        );
        let grid = search.grid();
        let num_offsets = grid.surrounding_cell_offsets().len();
        let offset_end = if self_mode { (num_offsets - 1) / 2 + 1 } else { num_offsets };

        let mut neighbors = Neighbors {
            search,
            particles,
            centre,
            my_index: my_index.unwrap_or(CELL_EMPTY),
            self_mode,
            home: grid.find_cell_index(&centre),
            offset_i: 0,
            offset_end,
            node: CELL_EMPTY,
            stop_at: CELL_EMPTY,
            dx: [0.0; 3],
            state: State::Init,
        };
        neighbors.advance();
        neighbors
    }

    pub(crate) fn end(search: &'a BucketSearch<T, F>) -> Self {
        Neighbors {
            search,
            particles: &[],
            centre: [0.0; 3],
            my_index: CELL_EMPTY,
            self_mode: false,
            home: 0,
            offset_i: 0,
            offset_end: 0,
            node: CELL_EMPTY,
            stop_at: CELL_EMPTY,
            dx: [0.0; 3],
            state: State::Done,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// The candidate under the cursor, or `None` once done.
    pub fn current(&self) -> Option<Neighbor<'a, T>> {
        if self.state != State::AtCandidate {
            return None;
        }
        let particles = self.particles;
        Some(Neighbor {
            slot: self.node,
            particle: &particles[self.node],
            dx: self.dx,
        })
    }

    /// Moves to the next in-range candidate. Does nothing once done.
    pub fn advance(&mut self) {
        if self.state == State::Done {
            return;
        }
        self.state = State::Scanning;
        let search = self.search;
        let radius = search.lengthscale();
        let periodicity = search.grid().periodicity();
        loop {
            self.go_to_next_candidate();
            if self.node == CELL_EMPTY {
                self.state = State::Done;
                return;
            }
            if self.node == self.my_index {
                continue;
            }
            let p = search.position_of(&self.particles[self.node]);
            let image = periodicity.nearest_image(&self.centre, &p);
            let dx = sub(&self.centre, &image);
            if max_abs(&dx) < radius {
                self.dx = dx;
                self.state = State::AtCandidate;
                return;
            }
        }
    }

    fn go_to_next_candidate(&mut self) {
        if self.node != CELL_EMPTY {
            self.node = self.search.next_in_cell(self.node);
            if self.node == self.stop_at {
                self.node = CELL_EMPTY;
            }
        }
        while self.node == CELL_EMPTY && self.offset_i != self.offset_end {
            if self.self_mode && self.offset_i == self.offset_end - 1 {
                // own bucket, only the points in front of the querying one
                self.stop_at = self.my_index;
                self.node = self.search.head(self.home);
                if self.node == self.stop_at {
                    self.node = CELL_EMPTY;
                }
            } else {
                let offset = self.search.grid().surrounding_cell_offsets()[self.offset_i];
                self.node = self.search.head(self.home.wrapping_add_signed(offset));
            }
            self.offset_i += 1;
        }
    }
}

impl<T, F> Clone for Neighbors<'_, T, F> {
    fn clone(&self) -> Self {
        Neighbors {
            search: self.search,
            particles: self.particles,
            centre: self.centre,
            my_index: self.my_index,
            self_mode: self.self_mode,
            home: self.home,
            offset_i: self.offset_i,
            offset_end: self.offset_end,
            node: self.node,
            stop_at: self.stop_at,
            dx: self.dx,
            state: self.state,
        }
    }
}

/// Two cursors are equal when they sit on the same candidate; in particular
/// every exhausted cursor equals [`BucketSearch::end`].
impl<T, F> PartialEq for Neighbors<'_, T, F> {
    fn eq(&self, other: &Self) -> bool {
        let slot = |n: &Self| if n.state == State::AtCandidate { n.node } else { CELL_EMPTY };
        slot(self) == slot(other)
    }
}

impl<'a, T, F> Iterator for Neighbors<'a, T, F>
where
    F: Fn(&T) -> Vect3d,
{
    type Item = Neighbor<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.current()?;
        self.advance();
        Some(item)
    }
}

impl<T, F> FusedIterator for Neighbors<'_, T, F> where F: Fn(&T) -> Vect3d {}
