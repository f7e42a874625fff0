//! Tuning a synthetic GEMM blocking model.
//!
//! The cost function models a tiled matrix multiplication where the tile
//! sizes must divide the matrix dimension and the tile area must fit a fixed
//! cache budget; the sweet spot balances parallelism against reuse.

use std::sync::Arc;

use at_engine::abort::Evaluations;
use at_engine::Tuner;
use at_search::AucBandit;
use at_types::{divides, Configuration, Predicate, Range, TunerResult, TuningParameter};

const N: i64 = 1024;
const CACHE_TILES: i64 = 4096;

fn main() -> TunerResult<()> {
    tracing_subscriber::fmt().compact().init();

    let tile_m = TuningParameter::with_predicate("TILE_M", Range::interval(1, N), divides(N));

    let tile_n_pred: Predicate = Arc::new(|value, bindings| {
        let tile_m = bindings
            .value_of("TILE_M")
            .and_then(|v| v.to_i64().ok())
            .unwrap_or(1);
        value.to_i64().map_or(false, |tile_n| {
            tile_n != 0 && (N / tile_n) * tile_n == N && tile_m * tile_n <= CACHE_TILES
        })
    });
    let tile_n = TuningParameter::with_predicate("TILE_N", Range::interval(1, N), tile_n_pred);

    let mut tuner = Tuner::new()
        .tuning_parameters(vec![tile_m, tile_n])
        .search_technique(AucBandit::new())
        .log_file("gemm_blocking_log.csv");

    let status = tuner.tune_with(
        |config: &Configuration| -> TunerResult<f64> {
            let tile_m = config.get("TILE_M").unwrap().to_f64()?;
            let tile_n = config.get("TILE_N").unwrap().to_f64()?;
            // synthetic model: launch overhead shrinks with tile area, data
            // reuse degrades when tiles are lopsided
            let tiles = (N as f64 / tile_m) * (N as f64 / tile_n);
            let imbalance = (tile_m / tile_n).max(tile_n / tile_m);
            Ok(tiles.ln() + imbalance.sqrt())
        },
        Evaluations(200),
    )?;

    println!(
        "best configuration after {} evaluations: {} (cost {:.3})",
        status.evaluated_configs(),
        status.best_configuration(),
        status.min_cost()
    );
    Ok(())
}
