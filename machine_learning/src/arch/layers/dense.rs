use ndarray::{linalg, prelude::*};

use crate::{
    arch::activations::ActFn,
    error::{MlErr, Result},
};

/// A fully connected layer, `a = f(x·W + b)`.
///
/// The layer doesn't own its parameters, it views them out of a flat slice laid out as the
/// row-major weights (`dim.0 × dim.1`) followed by the biases (`dim.1`).
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,
}

/// The result of back propagating a delta through a `Dense` layer.
#[derive(Debug)]
pub struct DenseGrad {
    /// Gradient of the loss with respect to the weights, `dim.0 × dim.1`.
    pub dw: Array2<f32>,
    /// Gradient of the loss with respect to the biases.
    pub db: Array1<f32>,
    /// The delta to hand to the previous layer.
    pub d_prev: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The amount of inputs and outputs of the layer.
    /// * `act_fn` - The activation applied to the weighted sum, if any.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            act_fn,
            size: (dim.0 + 1) * dim.1,
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Computes the pre-activation `x·W + b` for a batch.
    ///
    /// # Arguments
    /// * `params` - This layer's slice of parameters.
    /// * `x` - The input batch, one sample per row.
    pub fn weighted_sum(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense input",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;
        Ok(z)
    }

    /// Applies the activation function to a pre-activation.
    pub fn activate(&self, z: &Array2<f32>) -> Array2<f32> {
        match &self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        }
    }

    /// Back propagates `d` (the derivative of the loss with respect to this layer's output).
    ///
    /// # Arguments
    /// * `params` - This layer's slice of parameters.
    /// * `x` - The input this layer was fed in the forward pass.
    /// * `z` - The pre-activation computed in the forward pass.
    /// * `d` - The incoming delta.
    pub fn backward(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
        z: ArrayView2<f32>,
        mut d: Array2<f32>,
    ) -> Result<DenseGrad> {
        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&z, |d, &z| *d *= act_fn.df(z));
        }

        let (w, _) = self.view_params(params)?;

        let mut dw = Array2::zeros(self.dim);
        linalg::general_mat_mul(1.0, &x.t(), &d, 0.0, &mut dw);
        let db = d.sum_axis(Axis(0));

        let mut d_prev = Array2::zeros((d.nrows(), self.dim.0));
        linalg::general_mat_mul(1.0, &d, &w.t(), 0.0, &mut d_prev);

        Ok(DenseGrad { dw, db, d_prev })
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    pub fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        if params.len() != self.size {
            return Err(MlErr::SizeMismatch {
                what: "dense parameters",
                got: params.len(),
                expected: self.size,
            });
        }

        let w_size = self.size - self.dim.1;
        let weights = ArrayView2::from_shape(self.dim, &params[..w_size])?;
        let biases = ArrayView1::from_shape(self.dim.1, &params[w_size..])?;
        Ok((weights, biases))
    }
}
