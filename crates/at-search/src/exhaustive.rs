//! Exhaustive index enumeration.

use at_types::BigInt;

use crate::technique::{Cost, IndexTechnique};

/// Visits every index in order, wrapping around at the search-space size.
#[derive(Debug, Clone, Default)]
pub struct Exhaustive {
    space_size: BigInt,
    pos: BigInt,
}

impl Exhaustive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexTechnique for Exhaustive {
    fn initialize(&mut self, space_size: BigInt) {
        self.space_size = space_size;
        self.pos = BigInt::zero();
    }

    fn next_indices(&mut self) -> Vec<BigInt> {
        if self.pos == self.space_size {
            self.pos = BigInt::zero();
        }
        let index = self.pos.clone();
        self.pos = &self.pos + &BigInt::one();
        vec![index]
    }

    fn report_costs(&mut self, _costs: &[(BigInt, Cost)]) {}

    fn name(&self) -> &'static str {
        "exhaustive"
    }
}
