use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use machine_learning::MlErr;

/// The result type used across the visualization core.
pub type Result<T> = std::result::Result<T, VizErr>;

/// The visualization core's error type.
#[derive(Debug)]
pub enum VizErr {
    /// A `NetworkParams` field is out of its domain.
    InvalidParams {
        field: &'static str,
        reason: &'static str,
    },
    /// A captured tensor doesn't have the size the params promise.
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A loss sample was appended out of order.
    NonMonotonicStep { last: usize, got: usize },
    Model(MlErr),
    Config(String),
    Io(io::Error),
}

impl Display for VizErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VizErr::InvalidParams { field, reason } => {
                write!(f, "invalid network params: {field} {reason}")
            }
            VizErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "size mismatch for {what}: got {got}, expected {expected}"
            ),
            VizErr::NonMonotonicStep { last, got } => {
                write!(f, "loss sample for step {got} appended after step {last}")
            }
            VizErr::Model(e) => write!(f, "model error: {e}"),
            VizErr::Config(msg) => write!(f, "invalid config: {msg}"),
            VizErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for VizErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VizErr::Model(e) => Some(e),
            VizErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for VizErr {
    fn from(value: MlErr) -> Self {
        Self::Model(value)
    }
}

impl From<io::Error> for VizErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for VizErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}
