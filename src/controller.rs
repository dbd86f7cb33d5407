use std::{cell::Cell, num::NonZeroUsize, rc::Rc};

use log::{debug, error, info, warn};
use machine_learning::{
    Mlp,
    arch::loss::Mse,
    init::random_normal,
    next_frame,
    optimization::GradientDescent,
};
use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::{
    config::VizConfig,
    error::{Result, VizErr},
    history::LossSample,
    params::NetworkParams,
    snapshot::{self, ModelSnapshot},
};

/// Where the controller is in its run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    /// A snapshot is being captured, the run goes back to `Running` right after.
    Sampling,
    /// The run observed a cancellation request and is winding down to `Idle`.
    Cancelled,
}

/// What a run reports to its host, in the order it happens.
#[derive(Debug, Clone)]
pub enum TrainingEvent {
    /// A run was started. The host must reset its loss history.
    Started { params: NetworkParams },
    Loss(LossSample),
    Snapshot(ModelSnapshot),
    Finished { steps: usize },
    Cancelled { at_step: usize },
    /// The model failed at `at_step`, the run is over.
    Failed { at_step: usize, reason: String },
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    /// Optimizer steps actually taken.
    pub steps: usize,
    pub final_loss: Option<f32>,
    pub cancelled: bool,
    /// Tensor buffers still held by the model when the run ended, 0 unless something leaked.
    pub live_tensors: usize,
}

/// Starts training runs, one at a time, and reports their progress through a channel.
pub struct TrainingController {
    phase: Rc<Cell<Phase>>,
    events: UnboundedSender<TrainingEvent>,
    cancel: CancellationToken,
    sample_every: NonZeroUsize,
    seed: Option<u64>,
}

impl TrainingController {
    /// Creates a new `TrainingController`.
    ///
    /// # Returns
    /// The controller and the receiving end of its events.
    pub fn new(config: &VizConfig) -> (Self, UnboundedReceiver<TrainingEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let controller = Self {
            phase: Rc::new(Cell::new(Phase::Idle)),
            events: tx,
            cancel: CancellationToken::new(),
            sample_every: config.sample_every,
            seed: config.seed,
        };

        (controller, rx)
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase(), Phase::Running | Phase::Sampling)
    }

    /// Prepares a run over `params` and moves to `Running`.
    ///
    /// The run only makes progress once its `run` future is polled. `params` are copied, later
    /// edits don't reach a run in flight.
    ///
    /// # Returns
    /// The run, or `None` if one is already in progress or `params` are invalid.
    pub fn start(&mut self, params: &NetworkParams) -> Option<TrainingRun> {
        if self.phase() != Phase::Idle {
            debug!("start ignored, phase is {:?}", self.phase());
            return None;
        }

        if let Err(e) = params.validate() {
            warn!("refusing to start: {e}");
            return None;
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let model = match Mlp::new(params.m, params.k, params.n, &mut rng) {
            Ok(model) => model,
            Err(e) => {
                warn!("refusing to start: {e}");
                return None;
            }
        };

        let inputs = random_normal(&mut rng, 1, params.m);
        let targets = random_normal(&mut rng, 1, params.n);

        self.cancel = CancellationToken::new();
        self.phase.set(Phase::Running);
        info!("starting run: {params}");

        let run = TrainingRun {
            params: *params,
            model,
            inputs,
            targets,
            optimizer: GradientDescent::new(params.lr),
            phase: Rc::clone(&self.phase),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
            sample_every: self.sample_every,
        };
        run.emit(TrainingEvent::Started { params: *params });

        Some(run)
    }

    /// Asks the run in progress to stop before its next step.
    pub fn cancel(&self) {
        if self.is_running() {
            info!("cancelling run");
            self.cancel.cancel();
        }
    }
}

/// A training run handed out by `TrainingController::start`.
///
/// Dropping it, whether it ran to completion or not, returns the controller to `Idle`.
pub struct TrainingRun {
    params: NetworkParams,
    model: Mlp,
    inputs: Array2<f32>,
    targets: Array2<f32>,
    optimizer: GradientDescent,
    phase: Rc<Cell<Phase>>,
    events: UnboundedSender<TrainingEvent>,
    cancel: CancellationToken,
    sample_every: NonZeroUsize,
}

impl TrainingRun {
    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Steps the model `params.steps` times over a fixed random batch.
    ///
    /// Every `sample_every` steps, starting at step 0, a snapshot is captured and the run yields
    /// to the scheduler so the host can drain events and repaint. A cancellation request is
    /// honoured before the next step.
    ///
    /// # Returns
    /// A summary of the run, or the model error that aborted it.
    pub async fn run(mut self) -> Result<RunOutcome> {
        let mut final_loss = None;

        for step in 0..self.params.steps {
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(step, final_loss));
            }

            let fitted = self.model.fit(
                self.inputs.view(),
                self.targets.view(),
                &mut self.optimizer,
                &Mse,
            );
            let loss = match fitted {
                Ok(loss) => loss,
                Err(e) => return Err(self.failed(step, e.into())),
            };
            final_loss = Some(loss);
            self.emit(TrainingEvent::Loss(LossSample { step, loss }));

            if step % self.sample_every.get() == 0 {
                if let Err(e) = self.sample(step) {
                    return Err(self.failed(step, e));
                }
                next_frame().await;
            }
        }

        let steps = self.params.steps;
        self.phase.set(Phase::Idle);
        info!(steps = steps; "run finished");
        self.emit(TrainingEvent::Finished { steps });

        Ok(RunOutcome {
            steps,
            final_loss,
            cancelled: false,
            live_tensors: self.model.live_tensors(),
        })
    }

    fn sample(&self, step: usize) -> Result<()> {
        self.phase.set(Phase::Sampling);
        let snapshot = snapshot::capture(
            &self.model,
            self.inputs.view(),
            self.targets.view(),
            step,
        )?;
        debug!(step = step, live_tensors = self.model.live_tensors(); "captured snapshot");

        self.emit(TrainingEvent::Snapshot(snapshot));
        self.phase.set(Phase::Running);
        Ok(())
    }

    fn cancelled(&self, at_step: usize, final_loss: Option<f32>) -> RunOutcome {
        self.phase.set(Phase::Cancelled);
        info!(at_step = at_step; "run cancelled");
        self.emit(TrainingEvent::Cancelled { at_step });

        RunOutcome {
            steps: at_step,
            final_loss,
            cancelled: true,
            live_tensors: self.model.live_tensors(),
        }
    }

    fn failed(&self, at_step: usize, err: VizErr) -> VizErr {
        self.phase.set(Phase::Idle);
        error!(at_step = at_step; "run failed: {err}");
        self.emit(TrainingEvent::Failed {
            at_step,
            reason: err.to_string(),
        });
        err
    }

    fn emit(&self, event: TrainingEvent) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}

impl Drop for TrainingRun {
    fn drop(&mut self) {
        self.phase.set(Phase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(steps: usize) -> VizConfig {
        VizConfig {
            params: NetworkParams {
                m: 2,
                k: 3,
                n: 1,
                lr: 0.01,
                steps,
            },
            seed: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn start_moves_to_running() {
        let config = config(5);
        let (mut controller, mut rx) = TrainingController::new(&config);

        let run = controller.start(&config.params).unwrap();
        assert_eq!(controller.phase(), Phase::Running);
        assert!(matches!(rx.try_recv(), Ok(TrainingEvent::Started { .. })));

        drop(run);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn start_is_refused_while_running() {
        let config = config(5);
        let (mut controller, _rx) = TrainingController::new(&config);

        let _run = controller.start(&config.params).unwrap();
        assert!(controller.start(&config.params).is_none());
    }

    #[test]
    fn invalid_params_are_refused() {
        let config = config(5);
        let (mut controller, mut rx) = TrainingController::new(&config);

        let params = NetworkParams {
            m: 0,
            ..config.params
        };
        assert!(controller.start(&params).is_none());
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn zero_steps_finishes_immediately() {
        let config = config(0);
        let (mut controller, mut rx) = TrainingController::new(&config);

        let outcome = controller.start(&config.params).unwrap().run().await.unwrap();
        assert_eq!(outcome.steps, 0);
        assert_eq!(outcome.final_loss, None);
        assert_eq!(controller.phase(), Phase::Idle);

        assert!(matches!(rx.try_recv(), Ok(TrainingEvent::Started { .. })));
        assert!(matches!(
            rx.try_recv(),
            Ok(TrainingEvent::Finished { steps: 0 })
        ));
    }

    #[tokio::test]
    async fn model_error_ends_the_run_with_a_failure() {
        let config = config(20);
        let (mut controller, mut rx) = TrainingController::new(&config);

        let mut run = controller.start(&config.params).unwrap();
        run.targets = Array2::zeros((3, 7));

        let err = run.run().await.unwrap_err();
        assert!(matches!(err, VizErr::Model(_)));
        assert_eq!(controller.phase(), Phase::Idle);

        assert!(matches!(rx.try_recv(), Ok(TrainingEvent::Started { .. })));
        match rx.try_recv() {
            Ok(TrainingEvent::Failed { at_step, reason }) => {
                assert_eq!(at_step, 0);
                assert_eq!(reason, err.to_string());
            }
            other => panic!("expected a failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_before_first_step() {
        let config = config(50);
        let (mut controller, mut rx) = TrainingController::new(&config);

        let run = controller.start(&config.params).unwrap();
        controller.cancel();

        let outcome = run.run().await.unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.steps, 0);
        assert_eq!(controller.phase(), Phase::Idle);

        rx.try_recv().unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(TrainingEvent::Cancelled { at_step: 0 })
        ));
    }
}
