//! Answer shuffling and problem sampling.
//!
//! Both draw from the single randomness source the assembler owns for the
//! duration of a batch, so a fixed seed reproduces a whole batch.

use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::model::Problem;

/// Return the problem's option keys in a uniformly random order.
pub fn shuffle_options<R: Rng + ?Sized>(rng: &mut R, problem: &Problem) -> Vec<String> {
    let mut keys: Vec<String> = problem.options.iter().map(|o| o.key.clone()).collect();
    keys.shuffle(rng);
    keys
}

/// Pick `amount` distinct indices out of `0..len`, uniformly, in random order.
///
/// Callers check `amount <= len` beforehand.
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, amount: usize) -> Vec<usize> {
    index::sample(rng, len, amount).into_vec()
}
