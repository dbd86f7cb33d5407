use serde::Serialize;

use crate::error::{Result, VizErr};

/// The loss measured at one optimizer step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LossSample {
    pub step: usize,
    pub loss: f32,
}

/// The losses of one run, in step order.
///
/// Append only, cleared when a new run starts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LossHistory {
    samples: Vec<LossSample>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample.
    ///
    /// # Errors
    /// `NonMonotonicStep` if `sample.step` doesn't come after the last step.
    pub fn push(&mut self, sample: LossSample) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if sample.step <= last.step {
                return Err(VizErr::NonMonotonicStep {
                    last: last.step,
                    got: sample.step,
                });
            }
        }

        self.samples.push(sample);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LossSample> {
        self.samples.iter()
    }

    pub fn samples(&self) -> &[LossSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&LossSample> {
        self.samples.last()
    }

    pub fn max_step(&self) -> Option<usize> {
        self.last().map(|s| s.step)
    }

    /// The smallest strictly positive, finite loss.
    pub fn min_positive_loss(&self) -> Option<f32> {
        self.samples
            .iter()
            .map(|s| s.loss)
            .filter(|l| l.is_finite() && *l > 0.0)
            .reduce(f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(step: usize, loss: f32) -> LossSample {
        LossSample { step, loss }
    }

    #[test]
    fn steps_must_increase() {
        let mut history = LossHistory::new();
        history.push(sample(0, 1.0)).unwrap();
        history.push(sample(1, 0.5)).unwrap();

        assert!(matches!(
            history.push(sample(1, 0.4)),
            Err(VizErr::NonMonotonicStep { last: 1, got: 1 })
        ));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn min_positive_skips_degenerate_losses() {
        let mut history = LossHistory::new();
        for (step, loss) in [0.0, 0.3, -1.0, f32::NAN, 0.7].into_iter().enumerate() {
            history.push(sample(step, loss)).unwrap();
        }

        assert_eq!(history.min_positive_loss(), Some(0.3));
        assert_eq!(history.max_step(), Some(4));
    }

    #[test]
    fn clear_resets() {
        let mut history = LossHistory::new();
        history.push(sample(3, 1.0)).unwrap();
        history.clear();

        assert!(history.is_empty());
        history.push(sample(0, 1.0)).unwrap();
    }
}
