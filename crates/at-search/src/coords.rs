//! Coordinate-space helpers shared by the continuous techniques.

use rand::Rng;

use crate::technique::Coordinates;

/// Smallest coordinate component considered inside the space; `(0,1]` is
/// half-open, so zero must be avoided.
pub const COORD_FLOOR: f64 = f64::MIN_POSITIVE;

/// Uniform random point in `(0,1]^D` (components drawn as `1 - U[0,1)`).
pub fn random_coordinates<R: Rng + ?Sized>(rng: &mut R, dimensionality: usize) -> Coordinates {
    (0..dimensionality).map(|_| 1.0 - rng.gen::<f64>()).collect()
}

/// Whether every component lies in `(0,1]`.
pub fn valid_coordinates(coords: &[f64]) -> bool {
    coords.iter().all(|&c| c > 0.0 && c <= 1.0)
}

/// Clamp each component into `[COORD_FLOOR, 1]`.
pub fn clamp_capped(mut coords: Coordinates) -> Coordinates {
    for c in &mut coords {
        *c = c.clamp(COORD_FLOOR, 1.0);
    }
    coords
}

/// Fold each component into `(0,1]` via `|c| mod 1`, mapping zero to the
/// floor.  Preserves position information better than capping when a move
/// overshoots the space.
pub fn clamp_mod(mut coords: Coordinates) -> Coordinates {
    for c in &mut coords {
        *c = c.abs() % 1.0;
        if *c == 0.0 {
            *c = COORD_FLOOR;
        }
    }
    coords
}

pub fn add(lhs: &[f64], rhs: &[f64]) -> Coordinates {
    debug_assert_eq!(lhs.len(), rhs.len());
    lhs.iter().zip(rhs).map(|(a, b)| a + b).collect()
}

pub fn sub(lhs: &[f64], rhs: &[f64]) -> Coordinates {
    debug_assert_eq!(lhs.len(), rhs.len());
    lhs.iter().zip(rhs).map(|(a, b)| a - b).collect()
}

pub fn scale(coords: &[f64], factor: f64) -> Coordinates {
    coords.iter().map(|c| c * factor).collect()
}
