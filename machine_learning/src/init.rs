use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use crate::error::Result;

/// Samples `fan_in * fan_out` weights using Xavier (Glorot) uniform initialization.
///
/// # Arguments
/// * `rng` - A random number generator.
/// * `fan_in` - The number of input units in the weight tensor.
/// * `fan_out` - The number of output units in the weight tensor.
///
/// # Returns
/// An error if the calculated range is invalid.
pub fn glorot_uniform<R: Rng + ?Sized>(
    rng: &mut R,
    fan_in: usize,
    fan_out: usize,
) -> Result<Vec<f32>> {
    let range = (6. / (fan_in + fan_out) as f32).sqrt();
    let distribution = Uniform::new(-range, range)?;

    Ok((0..fan_in * fan_out)
        .map(|_| distribution.sample(rng))
        .collect())
}

/// A `rows × cols` batch sampled from the standard normal distribution.
pub fn random_normal<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_simple_fn((rows, cols), || -> f32 { StandardNormal.sample(rng) })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn glorot_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = (6f32 / 12.).sqrt();

        let weights = glorot_uniform(&mut rng, 4, 8).unwrap();
        assert_eq!(weights.len(), 32);
        assert!(weights.iter().all(|w| (-range..range).contains(w)));
    }

    #[test]
    fn normal_batch_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_normal(&mut rng, 1, 5).dim(), (1, 5));
    }
}
