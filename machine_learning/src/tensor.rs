use std::cell::Cell;

use ndarray::{Array2, ArrayView2};

use crate::error::{MlErr, Result};

/// Book keeping of the tensor buffers a model has handed out.
///
/// Every `Tensor` acquires a slot on creation and gives it back when dropped, so the amount of
/// live buffers is zero whenever no `Scope` is open.
#[derive(Debug, Default)]
pub struct TensorPool {
    live: Cell<usize>,
    acquired: Cell<u64>,
}

impl TensorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The amount of tensors currently alive.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// The amount of tensors ever handed out by this pool.
    pub fn acquired(&self) -> u64 {
        self.acquired.get()
    }

    fn acquire(&self) {
        self.live.set(self.live.get() + 1);
        self.acquired.set(self.acquired.get() + 1);
    }

    fn release(&self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// A 2-d buffer of `f32`s borrowed from a `TensorPool`.
///
/// Tensors are tied to the lifetime of the scope that created them, they can't be stored
/// anywhere that outlives it. Copy their contents out with `to_vec` or `row`.
#[derive(Debug)]
pub struct Tensor<'s> {
    data: Array2<f32>,
    pool: &'s TensorPool,
}

impl<'s> Tensor<'s> {
    pub(crate) fn new(data: Array2<f32>, pool: &'s TensorPool) -> Self {
        pool.acquire();
        Self { data, pool }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Copies the whole tensor in row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// Copies a single row of the tensor.
    pub fn row(&self, i: usize) -> Result<Vec<f32>> {
        let nrows = self.data.nrows();
        if i >= nrows {
            return Err(MlErr::SizeMismatch {
                what: "tensor row",
                got: i,
                expected: nrows,
            });
        }

        Ok(self.data.row(i).to_vec())
    }
}

impl Drop for Tensor<'_> {
    fn drop(&mut self) {
        self.pool.release();
    }
}
