pub mod chart;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod layout;
pub mod params;
pub mod render;
pub mod snapshot;
pub mod state;
pub mod tooltip;

pub use config::{Viewport, VizConfig};
pub use controller::{Phase, RunOutcome, TrainingController, TrainingEvent, TrainingRun};
pub use error::{Result, VizErr};
pub use history::{LossHistory, LossSample};
pub use layout::DiagramKind;
pub use params::{NetworkParams, ParamField};
pub use render::{DrawList, Frame, RenderPipeline};
pub use snapshot::ModelSnapshot;
pub use state::VizState;
pub use tooltip::{CellMeta, TooltipCoordinator, TooltipState};
