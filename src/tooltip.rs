use serde::Serialize;

/// Which activation vector a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivationLayer {
    Input,
    HiddenPre,
    HiddenPost,
    Output,
}

impl ActivationLayer {
    pub const ALL: [ActivationLayer; 4] = [
        Self::Input,
        Self::HiddenPre,
        Self::HiddenPost,
        Self::Output,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::HiddenPre => "Hidden (Pre-ReLU)",
            Self::HiddenPost => "Hidden (Post-ReLU)",
            Self::Output => "Output",
        }
    }
}

/// What a hovered cell stands for. Indices are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CellMeta {
    /// `stage` 0 is input-hidden, 1 is hidden-output.
    Weight {
        stage: usize,
        i: usize,
        j: usize,
        value: f32,
    },
    Gradient {
        stage: usize,
        i: usize,
        j: usize,
        value: f32,
    },
    Activation {
        layer: ActivationLayer,
        i: usize,
        value: f32,
    },
}

impl CellMeta {
    /// The tooltip text, numbering nodes from 1 like the axis labels do.
    pub fn describe(&self) -> String {
        match *self {
            CellMeta::Weight { i, j, value, .. } => {
                format!("Weight[{},{}]: {value:.4}", i + 1, j + 1)
            }
            CellMeta::Gradient { i, j, value, .. } => {
                format!("Gradient[{},{}]: {value:.6}", i + 1, j + 1)
            }
            CellMeta::Activation { layer, i, value } => {
                format!("{}[{}]: {value:.4}", layer.name(), i + 1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TooltipState {
    pub visible: bool,
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Owns the one tooltip shared by every diagram. The last call wins.
#[derive(Debug, Default)]
pub struct TooltipCoordinator {
    state: TooltipState,
}

impl TooltipCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    /// Shows the description of `meta` at the pointer position.
    pub fn on_hover(&mut self, meta: &CellMeta, x: f32, y: f32) {
        self.state = TooltipState {
            visible: true,
            text: meta.describe(),
            x,
            y,
        };
    }

    pub fn on_leave(&mut self) {
        self.state = TooltipState::default();
    }
}
