use crate::bounds::BoundingBox;
use crate::vector::Vect3b;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fraction of the longest domain side used as the default interaction radius.
const DEFAULT_RADIUS_FRACTION: f64 = 0.1;

/// The configuration of a neighbour search: domain extents, periodicity per
/// axis and the interaction radius that sets the bucket size.
///
/// Changing any of these requires a full reset and re-embed of the index.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchDomain {
    pub bounds: BoundingBox<3>,
    pub periodic: Vect3b,
    pub interaction_radius: f64,
}

impl SearchDomain {
    /// A non-periodic domain over `bounds` with the radius set to a tenth of
    /// its longest side.
    pub fn new(bounds: BoundingBox<3>) -> Self {
        Self {
            bounds,
            periodic: [false; 3],
            interaction_radius: bounds.max_extent() * DEFAULT_RADIUS_FRACTION,
        }
    }

    pub fn with_periodic(mut self, periodic: Vect3b) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn with_interaction_radius(mut self, radius: f64) -> Self {
        self.interaction_radius = radius;
        self
    }
}
