use log::debug;
use serde::Serialize;

use crate::{
    chart::{self, LinearScale, LogScale},
    color::{Color, ColorDomain, Palette},
    config::{Viewport, Viewports},
    history::LossHistory,
    layout::{self, Anchor, DiagramKind, Label, TEXT_COLOR},
    params::NetworkParams,
    snapshot::ModelSnapshot,
    tooltip::{ActivationLayer, CellMeta},
};

const CELL_STROKE: Color = TEXT_COLOR;
const LOSS_STROKE: Color = Color::rgb(110, 122, 234);
const LOSS_STROKE_WIDTH: f32 = 2.0;
/// Floor of the log scale when no loss is positive.
const MIN_LOG_LOSS: f32 = 1e-12;
const TICK_COUNT: usize = 5;
const TICK_LEN: f32 = 6.0;
const TICK_FONT_SIZE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Margins {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

const LOSS_MARGINS: Margins = Margins {
    top: 20.0,
    right: 20.0,
    bottom: 30.0,
    left: 50.0,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Color,
        stroke: Option<Color>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        stroke: Color,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        stroke: Color,
        width: f32,
    },
    Text(Label),
}

impl Shape {
    fn contains(&self, px: f32, py: f32) -> bool {
        match *self {
            Shape::Rect {
                x,
                y,
                width,
                height,
                ..
            } => px >= x && px < x + width && py >= y && py < y + height,
            _ => false,
        }
    }
}

/// A shape plus what to show when the pointer enters it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawCmd {
    pub shape: Shape,
    pub hover: Option<CellMeta>,
}

/// Everything needed to paint one diagram, back to front.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawList {
    pub kind: DiagramKind,
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCmd>,
}

impl DrawList {
    fn new(kind: DiagramKind, viewport: Viewport) -> Self {
        Self {
            kind,
            width: viewport.width,
            height: viewport.height,
            commands: Vec::new(),
        }
    }

    fn push(&mut self, shape: Shape) {
        self.commands.push(DrawCmd { shape, hover: None });
    }

    fn push_hoverable(&mut self, shape: Shape, meta: CellMeta) {
        self.commands.push(DrawCmd {
            shape,
            hover: Some(meta),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The metadata of the top-most hoverable shape under `(x, y)`.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&CellMeta> {
        self.commands
            .iter()
            .rev()
            .filter(|cmd| cmd.shape.contains(x, y))
            .find_map(|cmd| cmd.hover.as_ref())
    }

    /// The cell rectangles with their fill and metadata.
    pub fn cells(&self) -> impl Iterator<Item = (&Shape, &CellMeta)> {
        self.commands
            .iter()
            .filter_map(|cmd| cmd.hover.as_ref().map(|meta| (&cmd.shape, meta)))
    }

    pub fn texts(&self) -> impl Iterator<Item = &Label> {
        self.commands.iter().filter_map(|cmd| match &cmd.shape {
            Shape::Text(label) => Some(label),
            _ => None,
        })
    }
}

/// What a render pass reads. Nothing in it is mutated.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub params: &'a NetworkParams,
    pub snapshot: Option<&'a ModelSnapshot>,
    pub history: &'a LossHistory,
}

/// Turns a `Frame` into a fresh draw list for any of the four diagrams.
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    viewports: Viewports,
    palette: Palette,
}

impl RenderPipeline {
    pub fn new(viewports: Viewports) -> Self {
        Self {
            viewports,
            palette: Palette::DIVERGING,
        }
    }

    pub fn viewport(&self, kind: DiagramKind) -> Viewport {
        self.viewports.get(kind)
    }

    /// Renders one diagram from scratch.
    ///
    /// A snapshot whose dimensions don't match `frame.params` is ignored, every cell then shows
    /// the value 0.
    ///
    /// # Arguments
    /// * `kind` - The diagram to draw.
    /// * `frame` - The state to draw.
    ///
    /// # Returns
    /// The complete draw list of the diagram.
    pub fn render(&self, kind: DiagramKind, frame: &Frame<'_>) -> DrawList {
        let viewport = self.viewport(kind);
        match kind {
            DiagramKind::LossCurve => self.render_loss(viewport, frame.history),
            _ => {
                let snapshot = frame.snapshot.filter(|s| s.matches(frame.params));
                self.render_cells(kind, viewport, frame.params, snapshot)
            }
        }
    }

    fn render_cells(
        &self,
        kind: DiagramKind,
        viewport: Viewport,
        params: &NetworkParams,
        snapshot: Option<&ModelSnapshot>,
    ) -> DrawList {
        let mut list = DrawList::new(kind, viewport);
        let geometry = layout::layout(kind, params, viewport);
        let domain = match kind {
            DiagramKind::GradientMatrix => ColorDomain::GRADIENTS,
            _ => ColorDomain::WEIGHTS,
        };

        for (p, panel) in geometry.panels.iter().enumerate() {
            let values = snapshot.map(|s| panel_values(kind, p, s)).unwrap_or(&[]);

            for (idx, cell) in panel.cells.iter().enumerate() {
                let (i, j) = (idx / panel.cols, idx % panel.cols);
                let value = values.get(idx).copied().unwrap_or(0.0);

                let meta = match kind {
                    DiagramKind::WeightMatrix => CellMeta::Weight {
                        stage: p,
                        i,
                        j,
                        value,
                    },
                    DiagramKind::GradientMatrix => CellMeta::Gradient {
                        stage: p,
                        i,
                        j,
                        value,
                    },
                    _ => CellMeta::Activation {
                        layer: ActivationLayer::ALL[p % ActivationLayer::ALL.len()],
                        i: j,
                        value,
                    },
                };

                list.push_hoverable(
                    Shape::Rect {
                        x: cell.x,
                        y: cell.y,
                        width: cell.size,
                        height: cell.size,
                        fill: self.palette.map(value, domain),
                        stroke: Some(CELL_STROKE),
                    },
                    meta,
                );
            }
        }

        for panel in &geometry.panels {
            for label in panel.row_labels.iter().chain(&panel.col_labels) {
                list.push(Shape::Text(label.clone()));
            }
            list.push(Shape::Text(panel.title.clone()));
        }

        if let Some(caption) = geometry.caption {
            list.push(Shape::Text(caption));
        }

        list
    }

    fn render_loss(&self, viewport: Viewport, history: &LossHistory) -> DrawList {
        let mut list = DrawList::new(DiagramKind::LossCurve, viewport);
        if history.is_empty() {
            return list;
        }

        let Margins {
            top,
            right,
            bottom,
            left,
        } = LOSS_MARGINS;
        let (x0, x1) = (left, (viewport.width - right).max(left));
        let (y0, y1) = (top, (viewport.height - bottom).max(top));

        let floor = history.min_positive_loss().unwrap_or(MIN_LOG_LOSS);
        let mut clamped = 0;
        let points: Vec<(usize, f32)> = history
            .iter()
            .map(|s| {
                if s.loss.is_finite() && s.loss > 0.0 {
                    (s.step, s.loss)
                } else {
                    clamped += 1;
                    (s.step, floor)
                }
            })
            .collect();

        if clamped > 0 {
            debug!(clamped = clamped, floor = floor; "clamped losses off the log scale");
        }

        let (lo, hi) = points
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, l)| {
                (lo.min(l), hi.max(l))
            });
        let max_step = history.max_step().unwrap_or(0) as f32;

        let xs = LinearScale::new((0.0, max_step), (x0, x1));
        let ys = LogScale::new((lo, hi), (y1, y0));

        list.push(Shape::Line {
            from: (x0, y1),
            to: (x1, y1),
            stroke: TEXT_COLOR,
        });
        list.push(Shape::Line {
            from: (x0, y0),
            to: (x0, y1),
            stroke: TEXT_COLOR,
        });

        for tick in xs.ticks(TICK_COUNT) {
            let x = xs.apply(tick);
            list.push(Shape::Line {
                from: (x, y1),
                to: (x, y1 + TICK_LEN),
                stroke: TEXT_COLOR,
            });
            list.push(Shape::Text(
                Label::new(chart::format_tick(tick), x, y1 + TICK_LEN + 10.0, TEXT_COLOR)
                    .font_size(TICK_FONT_SIZE),
            ));
        }

        for tick in ys.ticks(TICK_COUNT) {
            let y = ys.apply(tick);
            list.push(Shape::Line {
                from: (x0 - TICK_LEN, y),
                to: (x0, y),
                stroke: TEXT_COLOR,
            });
            list.push(Shape::Text(
                Label::new(chart::format_tick(tick), x0 - TICK_LEN - 2.0, y, TEXT_COLOR)
                    .anchor(Anchor::End)
                    .font_size(TICK_FONT_SIZE),
            ));
        }

        list.push(Shape::Text(Label::new(
            "Training Steps",
            (x0 + x1) / 2.0,
            viewport.height - 2.0,
            TEXT_COLOR,
        )));
        list.push(Shape::Text(
            Label::new("Loss (log scale)", 12.0, (y0 + y1) / 2.0, TEXT_COLOR).rotation(-90.0),
        ));

        list.push(Shape::Polyline {
            points: points
                .iter()
                .map(|&(step, loss)| (xs.apply(step as f32), ys.apply(loss)))
                .collect(),
            stroke: LOSS_STROKE,
            width: LOSS_STROKE_WIDTH,
        });

        list
    }
}

/// The snapshot values drawn by panel `p` of a cell diagram, row-major.
fn panel_values(kind: DiagramKind, p: usize, snapshot: &ModelSnapshot) -> &[f32] {
    let a = &snapshot.activations;
    let g = &snapshot.gradients;

    match (kind, p) {
        (DiagramKind::WeightMatrix, 0) => &snapshot.input_hidden_weights,
        (DiagramKind::WeightMatrix, 1) => &snapshot.hidden_output_weights,
        (DiagramKind::GradientMatrix, 0) => &g.input_hidden,
        (DiagramKind::GradientMatrix, 1) => &g.hidden_output,
        (DiagramKind::ActivationVector, 0) => &a.input,
        (DiagramKind::ActivationVector, 1) => &a.hidden_pre,
        (DiagramKind::ActivationVector, 2) => &a.hidden_post,
        (DiagramKind::ActivationVector, 3) => &a.output,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        history::LossSample,
        snapshot::{Activations, Gradients},
    };

    fn params() -> NetworkParams {
        NetworkParams {
            m: 2,
            k: 2,
            n: 1,
            ..Default::default()
        }
    }

    fn snapshot() -> ModelSnapshot {
        ModelSnapshot {
            step: 0,
            input_hidden_weights: vec![-1.0, 0.0, 0.5, 1.0],
            hidden_output_weights: vec![2.0, -2.0],
            activations: Activations {
                input: vec![0.1, 0.2],
                hidden_pre: vec![-0.3, 0.4],
                hidden_post: vec![0.0, 0.4],
                output: vec![0.7],
            },
            gradients: Gradients {
                input_hidden: vec![0.1, -0.1, 0.0, 0.05],
                hidden_output: vec![0.2, 0.0],
            },
        }
    }

    fn fills(list: &DrawList) -> Vec<Color> {
        list.cells()
            .filter_map(|(shape, _)| match shape {
                Shape::Rect { fill, .. } => Some(*fill),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn weights_are_colored_by_value() {
        let pipeline = RenderPipeline::new(Viewports::default());
        let (params, snapshot, history) = (params(), snapshot(), LossHistory::new());
        let frame = Frame {
            params: &params,
            snapshot: Some(&snapshot),
            history: &history,
        };

        let list = pipeline.render(DiagramKind::WeightMatrix, &frame);
        let fills = fills(&list);
        let p = Palette::DIVERGING;

        assert_eq!(fills.len(), 6);
        assert_eq!(fills[0], p.cold);
        assert_eq!(fills[1], p.neutral);
        assert_eq!(fills[3], p.warm);
        assert_eq!(fills[4], p.warm);
        assert_eq!(fills[5], p.cold);
    }

    #[test]
    fn missing_snapshot_draws_zeros() {
        let pipeline = RenderPipeline::new(Viewports::default());
        let (params, history) = (params(), LossHistory::new());
        let frame = Frame {
            params: &params,
            snapshot: None,
            history: &history,
        };

        for kind in [
            DiagramKind::WeightMatrix,
            DiagramKind::GradientMatrix,
            DiagramKind::ActivationVector,
        ] {
            let list = pipeline.render(kind, &frame);
            assert!(fills(&list).iter().all(|c| *c == Color::WHITE));
            assert!(list.cells().all(|(_, meta)| meta.describe().ends_with("0.0000")
                || meta.describe().ends_with("0.000000")));
        }
    }

    #[test]
    fn activation_cells_name_their_layer() {
        let pipeline = RenderPipeline::new(Viewports::default());
        let (params, snapshot, history) = (params(), snapshot(), LossHistory::new());
        let frame = Frame {
            params: &params,
            snapshot: Some(&snapshot),
            history: &history,
        };

        let list = pipeline.render(DiagramKind::ActivationVector, &frame);
        let texts: Vec<_> = list.cells().map(|(_, meta)| meta.describe()).collect();
        assert_eq!(
            texts,
            [
                "Input[1]: 0.1000",
                "Input[2]: 0.2000",
                "Hidden (Pre-ReLU)[1]: -0.3000",
                "Hidden (Pre-ReLU)[2]: 0.4000",
                "Hidden (Post-ReLU)[1]: 0.0000",
                "Hidden (Post-ReLU)[2]: 0.4000",
                "Output[1]: 0.7000",
            ]
        );
    }

    #[test]
    fn hit_test_finds_the_cell_under_the_pointer() {
        let pipeline = RenderPipeline::new(Viewports::default());
        let (params, snapshot, history) = (params(), snapshot(), LossHistory::new());
        let frame = Frame {
            params: &params,
            snapshot: Some(&snapshot),
            history: &history,
        };

        let list = pipeline.render(DiagramKind::GradientMatrix, &frame);
        let Some((
            Shape::Rect {
                x,
                y,
                width,
                height,
                ..
            },
            _,
        )) = list.cells().nth(3)
        else {
            panic!("expected a cell");
        };

        let meta = list.hit_test(x + width / 2.0, y + height / 2.0).unwrap();
        assert_eq!(meta.describe(), "Gradient[2,2]: 0.050000");
        assert!(list.hit_test(-1.0, -1.0).is_none());
    }

    #[test]
    fn empty_history_draws_nothing() {
        let pipeline = RenderPipeline::new(Viewports::default());
        let (params, history) = (params(), LossHistory::new());
        let frame = Frame {
            params: &params,
            snapshot: None,
            history: &history,
        };

        assert!(pipeline.render(DiagramKind::LossCurve, &frame).is_empty());
    }

    #[test]
    fn loss_curve_stays_inside_the_plot() {
        let pipeline = RenderPipeline::new(Viewports::default());
        let params = params();
        let mut history = LossHistory::new();
        for (step, loss) in [1.0, 0.5, 0.0, -0.2, 0.1].into_iter().enumerate() {
            history.push(LossSample { step, loss }).unwrap();
        }
        let frame = Frame {
            params: &params,
            snapshot: None,
            history: &history,
        };

        let list = pipeline.render(DiagramKind::LossCurve, &frame);
        let points = list
            .commands
            .iter()
            .find_map(|cmd| match &cmd.shape {
                Shape::Polyline { points, stroke, .. } => {
                    assert_eq!(*stroke, LOSS_STROKE);
                    Some(points.clone())
                }
                _ => None,
            })
            .unwrap();

        assert_eq!(points.len(), 5);
        for (x, y) in &points {
            assert!(x.is_finite() && y.is_finite());
            assert!((50.0..=580.0).contains(x));
            assert!((20.0 - 1e-3..=370.0 + 1e-3).contains(y));
        }
        // clamped to the smallest positive loss, drawn at the bottom
        assert_eq!(points[2].1, points[4].1);
        assert!((points[2].1 - 370.0).abs() < 1e-3);

        assert!(list.texts().any(|l| l.text == "Loss (log scale)" && l.rotation == -90.0));
    }

    #[test]
    fn single_sample_maps_to_the_middle() {
        let pipeline = RenderPipeline::new(Viewports::default());
        let params = params();
        let mut history = LossHistory::new();
        history.push(LossSample { step: 0, loss: 0.4 }).unwrap();
        let frame = Frame {
            params: &params,
            snapshot: None,
            history: &history,
        };

        let list = pipeline.render(DiagramKind::LossCurve, &frame);
        let point = list.commands.iter().find_map(|cmd| match &cmd.shape {
            Shape::Polyline { points, .. } => points.first().copied(),
            _ => None,
        });

        assert_eq!(point, Some((315.0, 195.0)));
    }
}
