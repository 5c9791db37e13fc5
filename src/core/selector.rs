//! Random selection over candidate lists.

use rand::seq::SliceRandom;
use rand::Rng;

/// Pick one candidate uniformly at random. Calls are independent of one
/// another; the same candidate may come up repeatedly.
pub fn pick<'a, R: Rng + ?Sized>(candidates: &'a [String], rng: &mut R) -> Option<&'a str> {
    candidates.choose(rng).map(String::as_str)
}
