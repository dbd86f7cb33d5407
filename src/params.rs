use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VizErr};

/// The architecture and schedule of one training run.
///
/// A run keeps the params it was started with; edits made while it is in flight take effect on
/// the next start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Input width.
    pub m: usize,
    /// Hidden width.
    pub k: usize,
    /// Output width.
    pub n: usize,
    pub lr: f32,
    pub steps: usize,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            m: 4,
            k: 8,
            n: 2,
            lr: 0.001,
            steps: 500,
        }
    }
}

impl NetworkParams {
    /// Checks every field is within its domain.
    ///
    /// # Returns
    /// An `InvalidParams` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, width) in [("m", self.m), ("k", self.k), ("n", self.n)] {
            if width == 0 {
                return Err(VizErr::InvalidParams {
                    field,
                    reason: "must be positive",
                });
            }
        }

        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(VizErr::InvalidParams {
                field: "lr",
                reason: "must be a positive finite number",
            });
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// The amount of weights of both matrices, `m·k + k·n`.
    pub fn weight_count(&self) -> usize {
        self.m * self.k + self.k * self.n
    }
}

impl Display for NetworkParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m={} k={} n={} lr={} steps={}",
            self.m, self.k, self.n, self.lr, self.steps
        )
    }
}

/// One editable field of `NetworkParams`, as exposed by the parameter pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamField {
    M,
    K,
    N,
    Lr,
    Steps,
}

const M_OPTIONS: [usize; 4] = [1, 2, 4, 8];
const K_OPTIONS: [usize; 4] = [2, 4, 8, 16];
const N_OPTIONS: [usize; 4] = [1, 2, 4, 8];
const LR_OPTIONS: [f32; 4] = [0.1, 0.01, 0.001, 0.0001];
const STEPS_OPTIONS: [usize; 4] = [100, 500, 1000, 2000];

impl ParamField {
    pub const ALL: [ParamField; 5] = [Self::M, Self::K, Self::N, Self::Lr, Self::Steps];

    pub fn label(self) -> &'static str {
        match self {
            Self::M => "Input (m)",
            Self::K => "Hidden (k)",
            Self::N => "Output (n)",
            Self::Lr => "Learning rate",
            Self::Steps => "Steps",
        }
    }

    /// The field that follows this one in picker order, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Renders the field's current value in `params`.
    pub fn value(self, params: &NetworkParams) -> String {
        match self {
            Self::M => params.m.to_string(),
            Self::K => params.k.to_string(),
            Self::N => params.n.to_string(),
            Self::Lr => params.lr.to_string(),
            Self::Steps => params.steps.to_string(),
        }
    }

    /// Moves this field of `params` to the next (or previous) picker option.
    ///
    /// A value that isn't one of the options jumps to the first (or last) one.
    ///
    /// # Arguments
    /// * `params` - The params to edit.
    /// * `forward` - Whether to move to the next option rather than the previous one.
    pub fn cycle(self, params: &mut NetworkParams, forward: bool) {
        match self {
            Self::M => params.m = cycle_in(&M_OPTIONS, params.m, forward),
            Self::K => params.k = cycle_in(&K_OPTIONS, params.k, forward),
            Self::N => params.n = cycle_in(&N_OPTIONS, params.n, forward),
            Self::Lr => params.lr = cycle_in(&LR_OPTIONS, params.lr, forward),
            Self::Steps => params.steps = cycle_in(&STEPS_OPTIONS, params.steps, forward),
        }
    }
}

fn cycle_in<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let len = options.len();
    let next = match options.iter().position(|o| *o == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };

    options[next]
}
