use std::any::{Any, TypeId};

use log::trace;

use crate::hashing::{hash_str, HashMap};
use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::{Rng, SeedableRng};
use crate::random::RngId;

// This is a wrapper that allows for future support for different types of
// random number generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

/// Holds a base seed and the lazily created rng for every [`RngId`] that has been used.
pub struct RngStore {
    base_seed: u64,
    rng_holders: HashMap<TypeId, RngHolder>,
}

impl RngStore {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        trace!("initializing random streams with base seed {base_seed}");
        RngStore {
            base_seed,
            rng_holders: HashMap::default(),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Reseeds every stream. Existing rngs are dropped and recreated on next use.
    pub fn reseed(&mut self, base_seed: u64) {
        self.base_seed = base_seed;
        self.rng_holders.clear();
    }

    fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rng_holders
            .entry(TypeId::of::<R>())
            // Create a new rng holder if it doesn't exist yet
            .or_insert_with(|| {
                trace!("creating new RNG (seed={base_seed}) for {}", R::get_name());
                let seed_offset = hash_str(R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .unwrap()
    }

    /// Applies `sampler` to the rng associated with the given [`RngId`].
    pub fn sample<R: RngId, T>(
        &mut self,
        _rng_type: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        sampler(self.get_rng::<R>())
    }

    /// Gets a random sample within the range provided by `range`
    /// using the generator associated with the given [`RngId`].
    pub fn sample_range<R: RngId, S, T>(&mut self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }
}
