//! Seeded, independently keyed random streams and the sampling primitives the engine is
//! built on.
//!
//! Each stream is identified by a zero-sized type implementing [`RngId`] (see
//! [`define_rng!`]). Streams are created lazily from `base_seed + hash(name)`, so two runs
//! with the same base seed draw identical values, and drawing more from one stream never
//! shifts the values another stream produces.
mod macros;
mod sampling_algorithms;
mod store;

pub use macros::define_rng;
pub use sampling_algorithms::{sample_multiple_from_known_length, split_sample};
pub use store::RngStore;

use crate::rand::SeedableRng;

pub trait RngId: Copy + Clone + 'static {
    type RngType: SeedableRng + 'static;
    fn get_name() -> &'static str;
}
