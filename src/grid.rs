use std::collections::BTreeSet;

use log::{debug, info, warn};

use crate::domain::SearchDomain;
use crate::error::ConfigError;
use crate::periodic::Periodicity;
use crate::vector::{Vect3b, Vect3d};

const AXIS_NAMES: [char; 3] = ['x', 'y', 'z'];

/// Minimum number of real cells along a periodic axis. With fewer, a cell
/// would see the same neighbour through the stencil and through its ghost.
const MIN_PERIODIC_CELLS: usize = 3;

/// Depth of the ghost redirection closure: one level per axis, so a corner
/// cell reaches the ghost diagonally opposite across all three axes.
const GHOST_CLOSURE_DEPTH: usize = 3;

/// The uniform bucket grid underlying the neighbour search.
///
/// The domain is tiled by `real` cells per axis, padded with one ghost layer
/// on each side: real cells have coordinates `1..=real` and the ghost layers
/// sit at `0` and `real + 1`. On periodic axes, each ghost cell mirrors the
/// real cell on the opposite boundary, so walking the 3x3x3 stencil around
/// any real cell finds periodic images without wraparound arithmetic. Ghost
/// cells on non-periodic axes stay empty.
#[derive(Clone, Debug)]
pub struct CellGrid {
    periodicity: Periodicity,
    search: Vect3b,
    interaction_radius: f64,
    num_real_cells: [usize; 3],
    num_cells_along_axes: [usize; 3],
    cell_size: Vect3d,
    inv_cell_size: Vect3d,
    surrounding_cell_offsets: Vec<isize>,
    ghosting: Vec<Vec<usize>>,
}

impl CellGrid {
    /// Builds the grid for `domain`, validating its configuration.
    ///
    /// An axis shorter than the interaction radius is collapsed to a single
    /// cell with neighbour search disabled along it. A periodic axis must
    /// hold at least three cells.
    pub fn new(domain: &SearchDomain) -> Result<Self, ConfigError> {
        let radius = domain.interaction_radius;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ConfigError::InvalidRadius { radius });
        }

        let mut low = domain.bounds.min;
        let mut high = domain.bounds.max;
        let mut periodic = domain.periodic;
        let mut search = [true; 3];
        let mut num_real_cells = [0usize; 3];

        for i in 0..3 {
            if !(low[i].is_finite() && high[i].is_finite()) || high[i] < low[i] {
                return Err(ConfigError::InvalidBounds { axis: i, low: low[i], high: high[i] });
            }
            let extent = high[i] - low[i];
            let cells = (extent / radius).floor() as usize;
            if cells == 0 {
                if periodic[i] {
                    if extent > 0.0 {
                        return Err(ConfigError::PeriodicAxisTooNarrow {
                            axis: i,
                            cells,
                            max_radius: extent / MIN_PERIODIC_CELLS as f64,
                        });
                    }
                    warn!("Dimension {} has no length, ignoring its periodicity", AXIS_NAMES[i]);
                    periodic[i] = false;
                }
                info!(
                    "Dimension {} is narrower than the interaction radius, turning off neighbour search in this dimension",
                    AXIS_NAMES[i]
                );
                search[i] = false;
                high[i] = low[i] + radius;
                num_real_cells[i] = 1;
            } else {
                if periodic[i] && cells < MIN_PERIODIC_CELLS {
                    return Err(ConfigError::PeriodicAxisTooNarrow {
                        axis: i,
                        cells,
                        max_radius: extent / MIN_PERIODIC_CELLS as f64,
                    });
                }
                num_real_cells[i] = cells;
            }
        }

        let num_cells_along_axes = [
            num_real_cells[0] + 2,
            num_real_cells[1] + 2,
            num_real_cells[2] + 2,
        ];
        let num_cells = num_cells_along_axes
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or(ConfigError::TooManyCells { cells: num_cells_along_axes })?;

        let mut cell_size = [0.0; 3];
        let mut inv_cell_size = [0.0; 3];
        for i in 0..3 {
            cell_size[i] = (high[i] - low[i]) / num_real_cells[i] as f64;
            inv_cell_size[i] = 1.0 / cell_size[i];
        }

        debug!("Resetting bucket search grid:");
        debug!("\tDomain = {:?} to {:?}", low, high);
        debug!("\tMax interaction radius = {}", radius);
        debug!("\tPeriodic = {:?}", periodic);
        debug!("\tNumber of cells along each axis = {:?}", num_cells_along_axes);
        debug!("\tCell sizes along each axis = {:?}", cell_size);

        let mut grid = CellGrid {
            periodicity: Periodicity::new(low, high, periodic),
            search,
            interaction_radius: radius,
            num_real_cells,
            num_cells_along_axes,
            cell_size,
            inv_cell_size,
            surrounding_cell_offsets: Vec::new(),
            ghosting: Vec::new(),
        };
        grid.surrounding_cell_offsets = grid.build_stencil();
        grid.ghosting = grid.build_ghosting(num_cells);
        Ok(grid)
    }

    /// Flattened index deltas of the 3x3x3 block around a cell, ordered with
    /// x fastest. Axes without search contribute only a zero offset, and the
    /// list is symmetric: entry `k` is the negation of entry `len - 1 - k`.
    fn build_stencil(&self) -> Vec<isize> {
        let range = |axis: usize| if self.search[axis] { -1..=1 } else { 0..=0 };
        let nx = self.num_cells_along_axes[0] as isize;
        let nxy = nx * self.num_cells_along_axes[1] as isize;

        let mut offsets = Vec::with_capacity(27);
        for dz in range(2) {
            for dy in range(1) {
                for dx in range(0) {
                    offsets.push(dx + dy * nx + dz * nxy);
                }
            }
        }
        offsets
    }

    fn build_ghosting(&self, num_cells: usize) -> Vec<Vec<usize>> {
        let n = self.num_cells_along_axes;
        let mut direct: Vec<Vec<usize>> = vec![Vec::new(); num_cells];

        for i in 0..3 {
            if !self.periodicity.periodic[i] || !self.search[i] {
                continue;
            }
            let (j, k) = match i {
                0 => (1, 2),
                1 => (0, 2),
                _ => (0, 1),
            };
            let last_real = self.num_real_cells[i];

            // Lines perpendicular to `i` include the ghost layers of the
            // other axes, so the closure below can chain redirections into
            // edge and corner ghosts.
            let mut c = [0usize; 3];
            for jj in 0..n[j] {
                c[j] = jj;
                for kk in 0..n[k] {
                    c[k] = kk;

                    c[i] = last_real;
                    let from_high = self.cell_index(c);
                    c[i] = 0;
                    let to_low = self.cell_index(c);
                    direct[from_high].push(to_low);

                    c[i] = 1;
                    let from_low = self.cell_index(c);
                    c[i] = last_real + 1;
                    let to_high = self.cell_index(c);
                    direct[from_low].push(to_high);
                }
            }
        }

        // collapse redirections
        (0..num_cells)
            .map(|cell| {
                let mut ghosts = BTreeSet::new();
                let mut frontier = vec![cell];
                for _ in 0..GHOST_CLOSURE_DEPTH {
                    let mut next = Vec::new();
                    for &c in &frontier {
                        for &g in &direct[c] {
                            if ghosts.insert(g) {
                                next.push(g);
                            }
                        }
                    }
                    frontier = next;
                }
                ghosts.into_iter().collect()
            })
            .collect()
    }

    /// Flattened index of the cell at grid coordinates `c` (ghosts included).
    #[inline]
    pub fn cell_index(&self, c: [usize; 3]) -> usize {
        let n = self.num_cells_along_axes;
        c[0] + c[1] * n[0] + c[2] * n[0] * n[1]
    }

    /// Grid coordinates of the cell with flattened index `index`.
    pub fn cell_coords(&self, index: usize) -> [usize; 3] {
        let n = self.num_cells_along_axes;
        let z = index / (n[0] * n[1]);
        let rem = index % (n[0] * n[1]);
        [rem % n[0], rem / n[0], z]
    }

    /// The real cell containing position `r`.
    ///
    /// `r` must lie in `[low, high)` along every axis, periodic or not; use
    /// [`Periodicity::wrap_into_domain`] first for positions that may have
    /// left a periodic box. Anything else is a caller error and panics,
    /// since a stored point outside the box would fail the minimum-image
    /// test and drop out of every query.
    pub fn find_cell_index(&self, r: &Vect3d) -> usize {
        let low = &self.periodicity.low;
        let high = &self.periodicity.high;
        let mut c = [0usize; 3];
        for i in 0..3 {
            assert!(
                r[i] >= low[i] && r[i] < high[i],
                "position is outside of {}-range {:?}",
                AXIS_NAMES[i],
                r
            );
            let x = ((r[i] - low[i]) * self.inv_cell_size[i]).floor();
            // rounding can put points just below `high` one cell too far
            c[i] = 1 + (x as usize).min(self.num_real_cells[i] - 1);
        }
        self.cell_index(c)
    }

    /// Whether the cell with flattened index `index` lies in a padding layer.
    pub fn is_ghost(&self, index: usize) -> bool {
        let c = self.cell_coords(index);
        (0..3).any(|i| c[i] == 0 || c[i] == self.num_real_cells[i] + 1)
    }

    /// Ghost cells that mirror the head of real cell `index`.
    #[inline]
    pub fn ghosts_of(&self, index: usize) -> &[usize] {
        &self.ghosting[index]
    }

    pub fn surrounding_cell_offsets(&self) -> &[isize] {
        &self.surrounding_cell_offsets
    }

    pub fn periodicity(&self) -> &Periodicity {
        &self.periodicity
    }

    pub fn low(&self) -> &Vect3d {
        &self.periodicity.low
    }

    pub fn high(&self) -> &Vect3d {
        &self.periodicity.high
    }

    /// Effective periodicity; zero-length axes are never periodic.
    pub fn periodic(&self) -> &Vect3b {
        &self.periodicity.periodic
    }

    pub fn search(&self) -> &Vect3b {
        &self.search
    }

    pub fn interaction_radius(&self) -> f64 {
        self.interaction_radius
    }

    pub fn num_real_cells(&self) -> [usize; 3] {
        self.num_real_cells
    }

    pub fn num_cells_along_axes(&self) -> [usize; 3] {
        self.num_cells_along_axes
    }

    pub fn num_cells(&self) -> usize {
        self.ghosting.len()
    }

    pub fn cell_size(&self) -> &Vect3d {
        &self.cell_size
    }
}
