use log::{debug, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

use crate::{
    config::VizConfig,
    controller::{Phase, TrainingController, TrainingEvent, TrainingRun},
    history::LossHistory,
    layout::DiagramKind,
    params::{NetworkParams, ParamField},
    render::{DrawList, Frame, RenderPipeline},
    snapshot::ModelSnapshot,
    tooltip::{TooltipCoordinator, TooltipState},
};

/// What happened to the last run, as last reported by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunStatus {
    Running { step: usize, loss: f32 },
    Finished { steps: usize },
    Cancelled { at_step: usize },
    Failed { at_step: usize },
}

/// Everything a host displays, kept in sync with the training controller.
///
/// Every mutation re-renders all four diagrams; the draw lists are never patched.
pub struct VizState {
    params: NetworkParams,
    history: LossHistory,
    snapshot: Option<ModelSnapshot>,
    tooltip: TooltipCoordinator,
    status: Option<RunStatus>,
    pipeline: RenderPipeline,
    diagrams: [DrawList; 4],
    controller: TrainingController,
    events: UnboundedReceiver<TrainingEvent>,
}

impl VizState {
    pub fn new(config: &VizConfig) -> Self {
        let (controller, events) = TrainingController::new(config);
        let pipeline = RenderPipeline::new(config.viewports);
        let params = config.params;
        let history = LossHistory::new();

        let frame = Frame {
            params: &params,
            snapshot: None,
            history: &history,
        };
        let diagrams = DiagramKind::ALL.map(|kind| pipeline.render(kind, &frame));

        Self {
            params,
            history,
            snapshot: None,
            tooltip: TooltipCoordinator::new(),
            status: None,
            pipeline,
            diagrams,
            controller,
            events,
        }
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn history(&self) -> &LossHistory {
        &self.history
    }

    pub fn snapshot(&self) -> Option<&ModelSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn tooltip(&self) -> &TooltipState {
        self.tooltip.state()
    }

    pub fn status(&self) -> Option<RunStatus> {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn diagram(&self, kind: DiagramKind) -> &DrawList {
        &self.diagrams[slot(kind)]
    }

    pub fn diagrams(&self) -> &[DrawList] {
        &self.diagrams
    }

    /// Starts a run with the current params.
    ///
    /// # Returns
    /// The run for the host to drive, `None` if one is already in progress or the params are
    /// invalid.
    pub fn start(&mut self) -> Option<TrainingRun> {
        let run = self.controller.start(&self.params)?;

        self.history.clear();
        self.snapshot = None;
        self.status = None;
        self.redraw();
        Some(run)
    }

    pub fn cancel(&self) {
        self.controller.cancel();
    }

    /// Replaces the params. The snapshot no longer describes them and is dropped.
    ///
    /// A run in flight keeps its own params.
    pub fn set_params(&mut self, params: NetworkParams) {
        if params == self.params {
            return;
        }

        info!("params changed: {params}");
        self.params = params;
        self.snapshot = None;
        self.tooltip.on_leave();
        self.redraw();
    }

    /// Moves a field to its next (or previous) picker option.
    pub fn cycle(&mut self, field: ParamField, forward: bool) {
        let mut params = self.params;
        field.cycle(&mut params, forward);
        self.set_params(params);
    }

    /// Applies every pending training event.
    ///
    /// # Returns
    /// The amount of events applied.
    pub fn tick(&mut self) -> usize {
        let mut applied = 0;

        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("training event channel closed");
                    break;
                }
            }
        }

        if applied > 0 {
            self.redraw();
        }

        applied
    }

    /// Routes a pointer at `(x, y)` of a diagram to the tooltip.
    pub fn hover(&mut self, kind: DiagramKind, x: f32, y: f32) {
        match self.diagrams[slot(kind)].hit_test(x, y) {
            Some(meta) => self.tooltip.on_hover(meta, x, y),
            None => self.tooltip.on_leave(),
        }
    }

    pub fn leave(&mut self) {
        self.tooltip.on_leave();
    }

    fn apply(&mut self, event: TrainingEvent) {
        match event {
            TrainingEvent::Started { params } => {
                debug!("run started: {params}");
                self.history.clear();
                self.snapshot = None;
                self.status = None;
            }
            TrainingEvent::Loss(sample) => {
                self.status = Some(RunStatus::Running {
                    step: sample.step,
                    loss: sample.loss,
                });
                if let Err(e) = self.history.push(sample) {
                    warn!("dropping loss sample: {e}");
                }
            }
            TrainingEvent::Snapshot(snapshot) => {
                if snapshot.matches(&self.params) {
                    self.snapshot = Some(snapshot);
                } else {
                    debug!(step = snapshot.step; "discarding snapshot of stale params");
                }
            }
            TrainingEvent::Finished { steps } => {
                self.status = Some(RunStatus::Finished { steps });
            }
            TrainingEvent::Cancelled { at_step } => {
                self.status = Some(RunStatus::Cancelled { at_step });
            }
            TrainingEvent::Failed { at_step, reason } => {
                warn!(at_step = at_step; "run failed: {reason}");
                self.status = Some(RunStatus::Failed { at_step });
            }
        }
    }

    fn redraw(&mut self) {
        let frame = Frame {
            params: &self.params,
            snapshot: self.snapshot.as_ref(),
            history: &self.history,
        };

        self.diagrams = DiagramKind::ALL.map(|kind| self.pipeline.render(kind, &frame));
    }
}

fn slot(kind: DiagramKind) -> usize {
    match kind {
        DiagramKind::WeightMatrix => 0,
        DiagramKind::ActivationVector => 1,
        DiagramKind::GradientMatrix => 2,
        DiagramKind::LossCurve => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::LossSample;

    #[test]
    fn a_failed_run_reports_where_it_stopped() {
        let mut state = VizState::new(&VizConfig::default());

        state.apply(TrainingEvent::Loss(LossSample { step: 0, loss: 0.5 }));
        state.apply(TrainingEvent::Failed {
            at_step: 1,
            reason: "model error".to_string(),
        });

        assert_eq!(state.status(), Some(RunStatus::Failed { at_step: 1 }));
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn started_resets_what_the_last_run_left() {
        let mut state = VizState::new(&VizConfig::default());

        state.apply(TrainingEvent::Loss(LossSample { step: 0, loss: 0.5 }));
        state.apply(TrainingEvent::Finished { steps: 1 });
        let params = *state.params();
        state.apply(TrainingEvent::Started { params });

        assert!(state.history().is_empty());
        assert!(state.snapshot().is_none());
        assert_eq!(state.status(), None);
    }
}
