use thiserror::Error;

/// Errors raised while configuring the search grid.
///
/// These are the only recoverable failures in the crate. Misuse of a
/// configured index (stale container, deleting a slot that is not last,
/// querying outside a non-periodic domain) panics instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The interaction radius is zero, negative, or not finite.
    #[error("interaction radius must be positive and finite, got {radius}")]
    InvalidRadius { radius: f64 },

    /// A domain bound is not finite or the upper corner lies below the lower one.
    #[error("invalid bounds along axis {axis}: low = {low}, high = {high}")]
    InvalidBounds { axis: usize, low: f64, high: f64 },

    /// A periodic axis is too short to hold three cells of the interaction radius.
    #[error(
        "number of cells in dimension {axis} must be greater than 2, got {cells}; \
         set the interaction radius below {max_radius}"
    )]
    PeriodicAxisTooNarrow {
        axis: usize,
        cells: usize,
        max_radius: f64,
    },

    /// The grid would need more cells than can be addressed.
    #[error("grid of {cells:?} cells per axis is too large to allocate")]
    TooManyCells { cells: [usize; 3] },
}
