//! Splits a chronon across worker threads by row bands.
//!
//! The grid is cut into an even number of horizontal bands whose layout
//! depends only on the grid height. A chronon runs in two phases: first every
//! even band, then every odd band. Within a phase each band is lent out
//! together with one halo row on either side; because an idle band always
//! separates two active ones, the lent windows never overlap and workers
//! mutate disjoint rows without locking. Returning the rows at the end of a
//! phase is the barrier before the next phase starts.
//!
//! Every band draws from its own generator keyed by seed, chronon and band
//! index, so the outcome of a chronon does not depend on how many workers
//! took part.

use crate::engine::{self, ChrononStats, Rules};
use crate::grid::{Grid, Region};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;
use wator_core::{Error, Result};

/// Fewest rows a band may have. Two rows keep the halo rows of the bands on
/// either side of an idle band apart.
pub const MIN_BAND_ROWS: usize = 2;

/// Upper bound on the number of bands per grid
pub const MAX_BANDS: usize = 64;

/// A contiguous run of grid rows processed by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub index: usize,
    pub start: usize,
    pub len: usize,
}

/// Cut `height` rows into bands. Grids too short for two bands of
/// [`MIN_BAND_ROWS`] rows get a single band covering everything.
pub fn plan_bands(height: usize) -> Vec<Band> {
    let mut count = (height / MIN_BAND_ROWS).min(MAX_BANDS);
    // An odd count would make the first and last band neighbours across the
    // wrap while sharing a phase.
    count -= count % 2;

    if count < 2 {
        return vec![Band {
            index: 0,
            start: 0,
            len: height,
        }];
    }

    let base = height / count;
    let extra = height % count;
    let mut start = 0;
    (0..count)
        .map(|index| {
            let len = base + usize::from(index < extra);
            let band = Band { index, start, len };
            start += len;
            band
        })
        .collect()
}

#[derive(Debug)]
pub struct Scheduler {
    bands: Vec<Band>,
    pool: Option<ThreadPool>,
    seed: u64,
}

impl Scheduler {
    pub fn new(height: usize, worker_count: usize, seed: u64) -> Result<Self> {
        let bands = plan_bands(height);

        let pool = if worker_count > 1 && bands.len() > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("wator-worker-{}", i))
                .build()
                .map_err(|e| Error::WorkerPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        debug!(
            bands = bands.len(),
            worker_count = worker_count,
            threaded = pool.is_some(),
            "Scheduler ready"
        );

        Ok(Self {
            bands,
            pool,
            seed,
        })
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Run one full chronon, blocking until every band has been processed.
    pub fn run_chronon(&self, grid: &mut Grid, rules: &Rules, chronon: u64) -> ChrononStats {
        if self.bands.len() == 1 {
            let mut rng = self.band_rng(chronon, 0);
            return engine::run_chronon(grid, rules, chronon, &mut rng);
        }

        let mut stats = ChrononStats::default();
        for parity in 0..2 {
            let mut regions: Vec<(Band, Region)> = self
                .bands
                .iter()
                .filter(|band| band.index % 2 == parity)
                .map(|band| (*band, grid.take_region(band.start, band.len)))
                .collect();

            let run = |(band, region): &mut (Band, Region)| {
                self.run_band(band, region, rules, chronon)
            };
            let phase_stats = match &self.pool {
                Some(pool) => pool.install(|| {
                    regions
                        .par_iter_mut()
                        .map(run)
                        .reduce(ChrononStats::default, merge)
                }),
                None => regions
                    .iter_mut()
                    .map(run)
                    .fold(ChrononStats::default(), merge),
            };

            for (_, region) in regions {
                grid.restore_region(region);
            }
            stats += phase_stats;
        }

        stats
    }

    fn run_band(
        &self,
        band: &Band,
        region: &mut Region,
        rules: &Rules,
        chronon: u64,
    ) -> ChrononStats {
        let mut rng = self.band_rng(chronon, band.index);
        engine::run_region(region, rules, chronon, &mut rng)
    }

    fn band_rng(&self, chronon: u64, band: usize) -> ChaCha8Rng {
        let key = self.seed ^ chronon.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = ChaCha8Rng::seed_from_u64(key);
        rng.set_stream(band as u64);
        rng
    }
}

fn merge(mut total: ChrononStats, stats: ChrononStats) -> ChrononStats {
    total += stats;
    total
}
