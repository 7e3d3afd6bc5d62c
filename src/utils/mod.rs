pub use algebra::{all_close, dot_product, perpendicular_distance, solve_linear_system};
pub use non_dominated::fast_non_dominated_sort;
pub use reference_points::das_dennis_points;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

mod algebra;
mod non_dominated;
mod reference_points;

/// Get the random number generator. Without a seed the generator is seeded from the operating
/// system entropy.
///
/// # Arguments
///
/// * `seed`: The optional seed number.
///
/// returns: `Box<dyn RngCore>`
pub fn get_rng(seed: Option<u64>) -> Box<dyn RngCore> {
    let rng = match seed {
        None => ChaCha8Rng::from_entropy(),
        Some(s) => ChaCha8Rng::seed_from_u64(s),
    };
    Box::new(rng)
}
