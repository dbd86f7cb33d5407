use ndarray::ArrayView2;
use rand::Rng;

use super::{Scope, activations::ActFn, layers::Dense, loss::LossFn};
use crate::{
    MlErr, Result, init,
    optimization::Optimizer,
    tensor::TensorPool,
};

/// A two layer perceptron: `input → hidden (ReLU) → output (linear)`.
///
/// The parameters are kept in a single flat buffer, each layer's weights (row-major,
/// `inputs × outputs`) followed by its biases.
#[derive(Debug)]
pub struct Mlp {
    layers: [Dense; 2],
    params: Vec<f32>,
    pool: TensorPool,
}

impl Mlp {
    /// Creates a new `Mlp` with Glorot uniform weights and zero biases.
    ///
    /// # Arguments
    /// * `input` - The width of the input layer.
    /// * `hidden` - The width of the hidden layer.
    /// * `output` - The width of the output layer.
    /// * `rng` - The random number generator used for initialization.
    ///
    /// # Returns
    /// A new `Mlp` or an error if any width is zero.
    pub fn new<R: Rng + ?Sized>(
        input: usize,
        hidden: usize,
        output: usize,
        rng: &mut R,
    ) -> Result<Self> {
        for (what, width) in [("input", input), ("hidden", hidden), ("output", output)] {
            if width == 0 {
                return Err(MlErr::InvalidDim { what });
            }
        }

        let layers = [
            Dense::new((input, hidden), Some(ActFn::relu())),
            Dense::new((hidden, output), None),
        ];

        let mut params = Vec::with_capacity(layers.iter().map(Dense::size).sum());
        for layer in &layers {
            let (fan_in, fan_out) = layer.dim();
            params.extend(init::glorot_uniform(rng, fan_in, fan_out)?);
            params.extend(std::iter::repeat(0.0).take(fan_out));
        }

        Ok(Self {
            layers,
            params,
            pool: TensorPool::new(),
        })
    }

    /// The `(input, hidden, output)` widths.
    pub fn dims(&self) -> (usize, usize, usize) {
        let (input, hidden) = self.layers[0].dim();
        let (_, output) = self.layers[1].dim();
        (input, hidden, output)
    }

    /// Returns the amount of parameters in the model.
    pub fn size(&self) -> usize {
        self.params.len()
    }

    pub fn nlayers(&self) -> usize {
        self.layers.len()
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// The amount of tensor buffers currently handed out by this model.
    pub fn live_tensors(&self) -> usize {
        self.pool.live()
    }

    pub(crate) fn pool(&self) -> &TensorPool {
        &self.pool
    }

    /// Returns a layer along with its slice of the parameters.
    pub(crate) fn layer(&self, index: usize) -> Result<(&Dense, &[f32])> {
        let layer = self.layers.get(index).ok_or(MlErr::UnknownLayer {
            index,
            layers: self.layers.len(),
        })?;

        let offset: usize = self.layers[..index].iter().map(Dense::size).sum();
        Ok((layer, &self.params[offset..offset + layer.size()]))
    }

    /// Runs `f` with a fresh `Scope`. Every tensor created through the scope is released by the
    /// time this returns, only plain data can leave the closure.
    pub fn tidy<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Scope<'_>) -> T,
    {
        let live = self.pool.live();
        let out = f(&Scope::new(self));
        debug_assert_eq!(self.pool.live(), live, "a tensor outlived its scope");
        out
    }

    /// Performs a single optimization step over a batch.
    ///
    /// # Arguments
    /// * `x` - The input batch, one sample per row.
    /// * `y` - The expected output for each sample.
    /// * `optimizer` - The optimizer that dictates how to update the parameters.
    /// * `loss_fn` - The loss function.
    ///
    /// # Returns
    /// The loss of the batch measured before the update.
    pub fn fit<O, L>(
        &mut self,
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        optimizer: &mut O,
        loss_fn: &L,
    ) -> Result<f32>
    where
        O: Optimizer,
        L: LossFn,
    {
        let (loss, grad) = self.tidy(|scope| -> Result<(f32, Vec<f32>)> {
            let x = scope.tensor(x.to_owned());
            let y = scope.tensor(y.to_owned());
            let (loss, grads) = scope.value_and_grads(&x, &y, loss_fn)?;

            let mut flat = Vec::with_capacity(self.size());
            for g in &grads {
                flat.extend(g.weights.view().iter());
                flat.extend(g.biases.view().iter());
            }

            Ok((loss, flat))
        })?;

        optimizer.update_params(&mut self.params, &grad);
        Ok(loss)
    }
}
