//! Algorithms for uniform random sampling without replacement. These are the only places the
//! engine draws subsets of individuals, so every "no index is selected twice" guarantee in the
//! crate reduces to the ones made here.

use crate::rand::seq::index::sample as choose_range;
use crate::rand::Rng;

/// Panics with a `SamplingExhaustion` message. Requesting more items than exist is a violation of
/// the engine's arithmetic invariants and is never recovered from.
#[track_caller]
fn sampling_exhaustion(requested: usize, available: usize) -> ! {
    panic!("SamplingExhaustion: requested {requested} samples from {available} candidates");
}

/// Sample multiple random elements uniformly without replacement from a container of known length.
/// The selected items are returned in iteration order.
///
/// We do not assume the container is randomly indexable, only that it can be iterated over.
///
/// # Panics
///
/// Panics if `requested` exceeds the length of the iterator.
pub fn sample_multiple_from_known_length<I, R, T>(rng: &mut R, iter: I, requested: usize) -> Vec<T>
where
    R: Rng,
    I: IntoIterator<Item = T> + ExactSizeIterator<Item = T>,
{
    let len = iter.len();
    if requested > len {
        sampling_exhaustion(requested, len);
    }
    if requested == 0 {
        return Vec::new();
    }

    let mut indexes = Vec::with_capacity(requested);
    indexes.extend(choose_range(rng, len, requested));
    indexes.sort_unstable();
    let mut index_iterator = indexes.into_iter();
    let mut next_idx = index_iterator.next().unwrap();
    let mut selected = Vec::with_capacity(requested);

    for (idx, item) in iter.enumerate() {
        if idx == next_idx {
            selected.push(item);
            if let Some(i) = index_iterator.next() {
                next_idx = i;
            } else {
                break;
            }
        }
    }

    selected
}

/// Draws `requested` items uniformly without replacement from `items` and returns
/// `(selected, remainder)`. Both halves keep the relative order of `items`, and together they
/// are exactly `items`.
///
/// # Panics
///
/// Panics if `requested > items.len()`.
pub fn split_sample<R, T>(rng: &mut R, items: &[T], requested: usize) -> (Vec<T>, Vec<T>)
where
    R: Rng,
    T: Copy,
{
    if requested > items.len() {
        sampling_exhaustion(requested, items.len());
    }

    let mut chosen = vec![false; items.len()];
    for idx in choose_range(rng, items.len(), requested) {
        chosen[idx] = true;
    }

    let mut selected = Vec::with_capacity(requested);
    let mut remainder = Vec::with_capacity(items.len() - requested);
    for (item, is_chosen) in items.iter().zip(chosen) {
        if is_chosen {
            selected.push(*item);
        } else {
            remainder.push(*item);
        }
    }
    (selected, remainder)
}
