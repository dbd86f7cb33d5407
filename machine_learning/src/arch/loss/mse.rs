use ndarray::{Array2, ArrayView2};

use super::LossFn;

/// Mean squared error loss function.
#[derive(Default, Clone, Copy, Debug)]
pub struct Mse;

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        (&y_pred - &y)
            .mapv(|x| x.powi(2))
            .mean()
            .unwrap_or_default()
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        (&y_pred - &y) * (2.0 / y_pred.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn averages_over_every_entry() {
        let y_pred = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![[0.0, 2.0], [3.0, 2.0]];

        // (1 + 0 + 0 + 4) / 4
        assert_eq!(Mse.loss(y_pred.view(), y.view()), 1.25);
    }

    #[test]
    fn prime_scales_by_batch_len() {
        let y_pred = array![[1.0, 2.0]];
        let y = array![[0.0, 4.0]];

        let d = Mse.loss_prime(y_pred.view(), y.view());
        assert_eq!(d, array![[1.0, -2.0]]);
    }
}
