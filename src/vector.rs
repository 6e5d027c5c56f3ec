/// A position or separation in 3D space.
pub type Vect3d = [f64; 3];

/// A per-axis flag, e.g. periodicity.
pub type Vect3b = [bool; 3];

#[inline]
pub fn sub(a: &Vect3d, b: &Vect3d) -> Vect3d {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: &Vect3d, b: &Vect3d) -> Vect3d {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: &Vect3d, s: f64) -> Vect3d {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn norm_squared(a: &Vect3d) -> f64 {
    a[0] * a[0] + a[1] * a[1] + a[2] * a[2]
}

#[inline]
pub fn norm(a: &Vect3d) -> f64 {
    norm_squared(a).sqrt()
}

/// Largest absolute component, i.e. the Chebyshev norm.
#[inline]
pub fn max_abs(a: &Vect3d) -> f64 {
    a[0].abs().max(a[1].abs()).max(a[2].abs())
}
