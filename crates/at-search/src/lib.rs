//! # at-search
//!
//! Search techniques for the atune auto-tuner.
//!
//! Two protocols are served: [`CoordinateTechnique`]s walk the continuous
//! space `(0,1]^D`, [`IndexTechnique`]s walk the discrete index space
//! `[0, |S|)`.  Both follow a strict batch alternation: propose a batch,
//! receive every member's cost in one report.
//!
//! Coordinate techniques: simulated annealing, Hooke–Jeeves pattern search,
//! Torczon simplex, differential evolution, and particle swarm.  Index
//! techniques: exhaustive enumeration and uniform random sampling.  Two
//! meta-techniques compose coordinate children: round robin and an
//! AUC-scored multi-armed bandit.

mod annealing;
mod auc_bandit;
pub mod coords;
mod differential;
mod exhaustive;
mod pattern;
mod random;
mod round_robin;
mod swarm;
mod technique;
mod torczon;

pub use annealing::SimulatedAnnealing;
pub use auc_bandit::{AucBandit, DEFAULT_C, DEFAULT_WINDOW_SIZE};
pub use differential::DifferentialEvolution;
pub use exhaustive::Exhaustive;
pub use pattern::PatternSearch;
pub use random::RandomSearch;
pub use round_robin::RoundRobin;
pub use swarm::{CltuneStyle, Constriction, Crossover, OpenTunerStyle, Particle, ParticleSwarm};
pub use technique::{CoordinateTechnique, Coordinates, Cost, IndexTechnique};
pub use torczon::Torczon;
