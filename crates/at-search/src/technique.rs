//! The two search-technique protocols.

use at_types::BigInt;

/// A point in the continuous addressing space `(0,1]^D`.
pub type Coordinates = Vec<f64>;

/// Scalar cost to minimize.
pub type Cost = f64;

/// Adaptive producer of coordinates in `(0,1]^D`.
///
/// The driver alternates strictly per batch: `next_coordinates` returns a
/// full batch, the costs for all of its members are collected (in proposal
/// order), and `report_costs` delivers them in one call.  A batch may couple
/// several points, e.g. the vertices of a simplex.
pub trait CoordinateTechnique {
    /// Called once before the first batch, with the coordinate-space
    /// dimensionality D.
    fn initialize(&mut self, dimensionality: usize);

    /// The next batch of coordinates, each in `(0,1]^D`; never empty.
    fn next_coordinates(&mut self) -> Vec<Coordinates>;

    /// Costs for the batch previously returned by [`next_coordinates`],
    /// one entry per requested coordinate, in proposal order.
    ///
    /// [`next_coordinates`]: CoordinateTechnique::next_coordinates
    fn report_costs(&mut self, costs: &[(Coordinates, Cost)]);

    /// Called once after the last batch.
    fn finalize(&mut self) {}

    /// Human-readable technique name.
    fn name(&self) -> &'static str;
}

/// Adaptive producer of 1-D indices in `[0, |S|)`.
///
/// Same batch alternation contract as [`CoordinateTechnique`].
pub trait IndexTechnique {
    /// Called once before the first batch, with the search-space size `|S|`.
    fn initialize(&mut self, space_size: BigInt);

    /// The next batch of indices, each in `[0, |S|)`; never empty.
    fn next_indices(&mut self) -> Vec<BigInt>;

    /// Costs for the previously returned batch, in proposal order.
    fn report_costs(&mut self, costs: &[(BigInt, Cost)]);

    /// Called once after the last batch.
    fn finalize(&mut self) {}

    /// Human-readable technique name.
    fn name(&self) -> &'static str;
}
