pub mod activations;
pub mod layers;
pub mod loss;
mod mlp;
mod scope;

pub use mlp::Mlp;
pub use scope::{LayerGrads, Scope};
