use std::{num::NonZeroUsize, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, VizErr},
    layout::DiagramKind,
    params::NetworkParams,
};

/// The size of a diagram's drawing area, in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One viewport per diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewports {
    pub weights: Viewport,
    pub activations: Viewport,
    pub gradients: Viewport,
    pub loss: Viewport,
}

impl Default for Viewports {
    fn default() -> Self {
        Self {
            weights: Viewport::new(700.0, 500.0),
            activations: Viewport::new(800.0, 200.0),
            gradients: Viewport::new(800.0, 500.0),
            loss: Viewport::new(600.0, 400.0),
        }
    }
}

impl Viewports {
    pub fn get(&self, kind: DiagramKind) -> Viewport {
        match kind {
            DiagramKind::WeightMatrix => self.weights,
            DiagramKind::GradientMatrix => self.gradients,
            DiagramKind::ActivationVector => self.activations,
            DiagramKind::LossCurve => self.loss,
        }
    }
}

/// Settings of the visualizer, every field optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// The params the pickers start at.
    pub params: NetworkParams,
    /// A snapshot is captured every `sample_every` steps, starting at step 0.
    pub sample_every: NonZeroUsize,
    /// Seed for weight initialization and the training batch. Entropy from the OS if unset.
    pub seed: Option<u64>,
    pub viewports: Viewports,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            params: NetworkParams::default(),
            sample_every: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
            seed: None,
            viewports: Viewports::default(),
        }
    }
}

impl VizConfig {
    /// Parses and validates a config from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file.
    ///
    /// # Errors
    /// `Io` if the file can't be read, `Config` if it doesn't parse or holds invalid values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<()> {
        self.params.validate()?;

        let viewports = self.viewports;
        for (name, vp) in [
            ("weights", viewports.weights),
            ("activations", viewports.activations),
            ("gradients", viewports.gradients),
            ("loss", viewports.loss),
        ] {
            if !(vp.width.is_finite() && vp.height.is_finite()) || vp.width < 0. || vp.height < 0.
            {
                return Err(VizErr::Config(format!(
                    "viewport {name} must have a non-negative size"
                )));
            }
        }

        Ok(())
    }
}
