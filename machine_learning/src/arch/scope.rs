use ndarray::{Array2, Axis};

use super::{Mlp, loss::LossFn};
use crate::{
    MlErr, Result,
    tensor::Tensor,
};

/// The gradient of the loss with respect to one layer's parameters.
#[derive(Debug)]
pub struct LayerGrads<'s> {
    /// `inputs × outputs`, same layout as the layer's weights.
    pub weights: Tensor<'s>,
    /// `1 × outputs`.
    pub biases: Tensor<'s>,
}

/// A window during which tensors can be created out of an `Mlp`.
///
/// Obtained through `Mlp::tidy`. Every operation reads the model as it was when the scope was
/// opened, the model can't be updated while a scope is alive.
pub struct Scope<'s> {
    model: &'s Mlp,
}

impl<'s> Scope<'s> {
    pub(crate) fn new(model: &'s Mlp) -> Self {
        Self { model }
    }

    /// Wraps an owned array into a tensor of this scope.
    pub fn tensor(&self, data: Array2<f32>) -> Tensor<'s> {
        Tensor::new(data, self.model.pool())
    }

    /// A copy of a layer's weights.
    pub fn kernel(&self, layer: usize) -> Result<Tensor<'s>> {
        let (dense, params) = self.model.layer(layer)?;
        let (w, _) = dense.view_params(params)?;
        Ok(self.tensor(w.to_owned()))
    }

    /// A copy of a layer's biases as a `1 × outputs` tensor.
    pub fn bias(&self, layer: usize) -> Result<Tensor<'s>> {
        let (dense, params) = self.model.layer(layer)?;
        let (_, b) = dense.view_params(params)?;
        Ok(self.tensor(b.to_owned().insert_axis(Axis(0))))
    }

    pub fn mat_mul(&self, a: &Tensor<'_>, b: &Tensor<'_>) -> Result<Tensor<'s>> {
        let ((_, inner), (rows, _)) = (a.shape(), b.shape());
        if inner != rows {
            return Err(MlErr::SizeMismatch {
                what: "matrix product",
                got: rows,
                expected: inner,
            });
        }

        Ok(self.tensor(a.view().dot(&b.view())))
    }

    /// The pre-activation `x·W + b` of a layer.
    pub fn weighted_sum(&self, layer: usize, x: &Tensor<'_>) -> Result<Tensor<'s>> {
        let (dense, params) = self.model.layer(layer)?;
        Ok(self.tensor(dense.weighted_sum(params, x.view())?))
    }

    /// The output of a layer, after its activation function.
    pub fn apply(&self, layer: usize, x: &Tensor<'_>) -> Result<Tensor<'s>> {
        let (dense, params) = self.model.layer(layer)?;
        let z = dense.weighted_sum(params, x.view())?;
        Ok(self.tensor(dense.activate(&z)))
    }

    /// A full forward pass through the model.
    pub fn predict(&self, x: &Tensor<'_>) -> Result<Tensor<'s>> {
        let mut a = self.apply(0, x)?;
        for layer in 1..self.model.nlayers() {
            a = self.apply(layer, &a)?;
        }

        Ok(a)
    }

    /// Computes the loss of a batch along with the gradient of every layer's parameters.
    ///
    /// # Arguments
    /// * `x` - The input batch, one sample per row.
    /// * `y` - The expected output for each sample.
    /// * `loss_fn` - The loss function.
    ///
    /// # Returns
    /// The loss and one `LayerGrads` per layer, in forward order.
    pub fn value_and_grads<L: LossFn>(
        &self,
        x: &Tensor<'_>,
        y: &Tensor<'_>,
        loss_fn: &L,
    ) -> Result<(f32, Vec<LayerGrads<'s>>)> {
        let nlayers = self.model.nlayers();
        let mut inputs = Vec::with_capacity(nlayers);
        let mut zs = Vec::with_capacity(nlayers);

        let mut a = self.tensor(x.view().to_owned());
        for layer in 0..nlayers {
            let (dense, params) = self.model.layer(layer)?;
            let z = dense.weighted_sum(params, a.view())?;
            let next = self.tensor(dense.activate(&z));

            zs.push(self.tensor(z));
            inputs.push(a);
            a = next;
        }

        if a.shape() != y.shape() {
            return Err(MlErr::SizeMismatch {
                what: "targets",
                got: y.shape().1,
                expected: a.shape().1,
            });
        }

        let loss = loss_fn.loss(a.view(), y.view());
        let mut d = loss_fn.loss_prime(a.view(), y.view());
        let mut grads = Vec::with_capacity(nlayers);

        for layer in (0..nlayers).rev() {
            let (dense, params) = self.model.layer(layer)?;
            let grad = dense.backward(params, inputs[layer].view(), zs[layer].view(), d)?;

            grads.push(LayerGrads {
                weights: self.tensor(grad.dw),
                biases: self.tensor(grad.db.insert_axis(Axis(0))),
            });
            d = grad.d_prev;
        }

        grads.reverse();
        Ok((loss, grads))
    }
}
