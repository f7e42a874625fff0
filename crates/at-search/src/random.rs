//! Uniform random index sampling.

use at_types::BigInt;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::technique::{Cost, IndexTechnique};

/// Proposes a uniformly random index in `[0, |S|)` per batch, independent of
/// any reported cost.
pub struct RandomSearch {
    space_size: BigInt,
    rng: StdRng,
}

impl RandomSearch {
    pub fn new() -> Self {
        Self {
            space_size: BigInt::zero(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            space_size: BigInt::zero(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexTechnique for RandomSearch {
    fn initialize(&mut self, space_size: BigInt) {
        self.space_size = space_size;
    }

    fn next_indices(&mut self) -> Vec<BigInt> {
        vec![BigInt::random_in_range(
            &mut self.rng,
            &BigInt::zero(),
            &self.space_size,
        )]
    }

    fn report_costs(&mut self, _costs: &[(BigInt, Cost)]) {}

    fn name(&self) -> &'static str {
        "random_search"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_below_the_space_size() {
        let mut rs = RandomSearch::with_seed(99);
        let size = BigInt::from(1_000u32);
        rs.initialize(size.clone());
        for _ in 0..500 {
            let index = rs.next_indices().remove(0);
            assert!(index < size);
        }
    }

    #[test]
    fn covers_a_tiny_space() {
        let mut rs = RandomSearch::with_seed(123);
        rs.initialize(BigInt::from(4u32));
        let mut seen = [false; 4];
        for _ in 0..200 {
            let index = rs.next_indices().remove(0).to_usize().unwrap();
            seen[index] = true;
        }
        assert!(seen.iter().all(|&s| s), "not all indices sampled: {seen:?}");
    }
}
