//! Presentation-order shuffling

use rand::Rng;

/// Shuffle `items` into a uniformly random permutation.
///
/// Fisher-Yates: position `i` is swapped with a uniformly chosen position in
/// `[i, n)`. Taking any prefix of the result yields a uniform sample without
/// replacement.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    let n = items.len();
    for i in 0..n {
        let j = rng.gen_range(i..n);
        items.swap(i, j);
    }
}
