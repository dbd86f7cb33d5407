pub mod arch;
pub mod error;
mod frame;
pub mod init;
pub mod optimization;
pub mod tensor;

pub use arch::{Mlp, Scope};
pub use error::{MlErr, Result};
pub use frame::next_frame;
pub use tensor::Tensor;
