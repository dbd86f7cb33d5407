use machine_learning::{
    MlErr, Mlp,
    arch::loss::Mse,
};
use ndarray::ArrayView2;
use serde::Serialize;

use crate::{
    error::{Result, VizErr},
    params::NetworkParams,
};

/// The activations of the first sample of a batch, layer by layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Activations {
    pub input: Vec<f32>,
    /// `x·W + b` of the hidden layer.
    pub hidden_pre: Vec<f32>,
    /// `relu(hidden_pre)`.
    pub hidden_post: Vec<f32>,
    pub output: Vec<f32>,
}

/// Gradients of the MSE loss with respect to each weight matrix, same layout as the weights.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Gradients {
    pub input_hidden: Vec<f32>,
    pub hidden_output: Vec<f32>,
}

/// A detached copy of a model's state after some step.
///
/// Matrices are row-major: `input_hidden_weights[i * k + j]` connects input `i` to hidden `j`,
/// `hidden_output_weights[j * n + o]` connects hidden `j` to output `o`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub step: usize,
    pub input_hidden_weights: Vec<f32>,
    pub hidden_output_weights: Vec<f32>,
    pub activations: Activations,
    pub gradients: Gradients,
}

impl ModelSnapshot {
    /// The `(m, k, n)` widths this snapshot was captured with.
    pub fn dims(&self) -> (usize, usize, usize) {
        (
            self.activations.input.len(),
            self.activations.hidden_pre.len(),
            self.activations.output.len(),
        )
    }

    /// Whether this snapshot can be drawn with the geometry of `params`.
    pub fn matches(&self, params: &NetworkParams) -> bool {
        self.dims() == (params.m, params.k, params.n) && self.check().is_ok()
    }

    fn check(&self) -> Result<()> {
        let (m, k, n) = self.dims();

        for (what, got, expected) in [
            ("hidden post-activation", self.activations.hidden_post.len(), k),
            ("input-hidden weights", self.input_hidden_weights.len(), m * k),
            ("hidden-output weights", self.hidden_output_weights.len(), k * n),
            ("input-hidden gradients", self.gradients.input_hidden.len(), m * k),
            ("hidden-output gradients", self.gradients.hidden_output.len(), k * n),
        ] {
            if got != expected {
                return Err(VizErr::SizeMismatch {
                    what,
                    got,
                    expected,
                });
            }
        }

        Ok(())
    }
}

/// Captures the weights, activations and gradients of `model`.
///
/// Everything is read from the same weight state, the model is borrowed immutably for the
/// whole capture. The tensors used along the way are released before this returns.
///
/// # Arguments
/// * `model` - The live model.
/// * `inputs` - The batch whose first row is traced through the layers.
/// * `targets` - The expected outputs, used for the MSE gradients.
/// * `step` - The step the model has just completed.
///
/// # Returns
/// The snapshot, or an error if the batch doesn't fit the model.
pub fn capture(
    model: &Mlp,
    inputs: ArrayView2<f32>,
    targets: ArrayView2<f32>,
    step: usize,
) -> Result<ModelSnapshot> {
    let snapshot = model.tidy(|scope| -> Result<ModelSnapshot> {
        let x = scope.tensor(inputs.to_owned());
        let y = scope.tensor(targets.to_owned());

        let input_hidden = scope.kernel(0)?;
        let hidden_output = scope.kernel(1)?;

        let hidden_pre = scope.weighted_sum(0, &x)?;
        let hidden_post = scope.apply(0, &x)?;
        let output = scope.apply(1, &hidden_post)?;

        let (_, grads) = scope.value_and_grads(&x, &y, &Mse)?;
        let [g0, g1] = grads.as_slice() else {
            return Err(MlErr::UnknownLayer {
                index: 1,
                layers: grads.len(),
            }
            .into());
        };

        Ok(ModelSnapshot {
            step,
            input_hidden_weights: input_hidden.to_vec(),
            hidden_output_weights: hidden_output.to_vec(),
            activations: Activations {
                input: x.row(0)?,
                hidden_pre: hidden_pre.row(0)?,
                hidden_post: hidden_post.row(0)?,
                output: output.row(0)?,
            },
            gradients: Gradients {
                input_hidden: g0.weights.to_vec(),
                hidden_output: g1.weights.to_vec(),
            },
        })
    })?;

    snapshot.check()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use machine_learning::init::random_normal;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn setup(m: usize, k: usize, n: usize) -> (Mlp, ndarray::Array2<f32>, ndarray::Array2<f32>) {
        let mut rng = StdRng::seed_from_u64(11);
        let model = Mlp::new(m, k, n, &mut rng).unwrap();
        let x = random_normal(&mut rng, 1, m);
        let y = random_normal(&mut rng, 1, n);
        (model, x, y)
    }

    #[test]
    fn sizes_follow_the_architecture() {
        let (model, x, y) = setup(3, 5, 2);
        let snapshot = capture(&model, x.view(), y.view(), 0).unwrap();

        assert_eq!(snapshot.dims(), (3, 5, 2));
        assert_eq!(snapshot.input_hidden_weights.len(), 15);
        assert_eq!(snapshot.hidden_output_weights.len(), 10);
        assert_eq!(snapshot.gradients.input_hidden.len(), 15);
        assert_eq!(snapshot.gradients.hidden_output.len(), 10);
        assert_eq!(snapshot.activations.input, x.row(0).to_vec());
    }

    #[test]
    fn post_activation_is_relu_of_pre() {
        let (model, x, y) = setup(4, 8, 2);
        let snapshot = capture(&model, x.view(), y.view(), 0).unwrap();

        for (pre, post) in snapshot
            .activations
            .hidden_pre
            .iter()
            .zip(&snapshot.activations.hidden_post)
        {
            assert_eq!(*post, pre.max(0.0));
        }
    }

    #[test]
    fn capture_is_idempotent() {
        let (model, x, y) = setup(2, 3, 1);

        let a = capture(&model, x.view(), y.view(), 4).unwrap();
        let b = capture(&model, x.view(), y.view(), 4).unwrap();

        assert_eq!(a, b);
        assert_eq!(model.live_tensors(), 0);
    }

    #[test]
    fn wrong_targets_fail_without_leaking() {
        let (model, x, _) = setup(2, 3, 1);
        let y = ndarray::Array2::zeros((1, 4));

        assert!(capture(&model, x.view(), y.view(), 0).is_err());
        assert_eq!(model.live_tensors(), 0);
    }

    #[test]
    fn matches_checks_dims() {
        let (model, x, y) = setup(2, 3, 1);
        let snapshot = capture(&model, x.view(), y.view(), 0).unwrap();

        let params = NetworkParams {
            m: 2,
            k: 3,
            n: 1,
            ..Default::default()
        };
        assert!(snapshot.matches(&params));
        assert!(!snapshot.matches(&NetworkParams { k: 4, ..params }));
    }
}
