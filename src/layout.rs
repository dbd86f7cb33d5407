//! Cell geometry and labels of the matrix and vector diagrams.
//!
//! Every diagram is a row of panels laid out by a [`LayoutPolicy`]. A panel is a `rows × cols`
//! grid of square cells sharing one cell size across the whole diagram, so the same node is
//! drawn at the same scale in both stages.

use serde::Serialize;

use crate::{color::Color, config::Viewport, params::NetworkParams};

/// Marker standing in for the elided middle of a long label sequence.
pub const ELLIPSIS: &str = "...";

/// Layers with more nodes than this get their labels elided.
const MAX_FULL_LABELS: usize = 10;
const ELIDED_EDGE: usize = 3;

const ROW_LABEL_GAP: f32 = 25.0;
const COL_LABEL_GAP: f32 = 10.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const CAPTION_FONT_SIZE: f32 = 13.0;
const CAPTION_BOTTOM_GAP: f32 = 50.0;

pub const TEXT_COLOR: Color = Color::rgb(0x21, 0x25, 0x29);
const CAPTION_COLOR: Color = Color::rgba(0x21, 0x25, 0x29, 0xaa);
const INPUT_COLOR: Color = Color::rgb(0xff, 0x7f, 0x0e);
const HIDDEN_COLOR: Color = Color::rgb(0x2c, 0xa0, 0x2c);
const OUTPUT_COLOR: Color = Color::rgb(0xd6, 0x27, 0x28);

/// The four diagrams drawn for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagramKind {
    WeightMatrix,
    GradientMatrix,
    ActivationVector,
    LossCurve,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 4] = [
        Self::WeightMatrix,
        Self::ActivationVector,
        Self::GradientMatrix,
        Self::LossCurve,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::WeightMatrix => "Weights",
            Self::GradientMatrix => "Gradients",
            Self::ActivationVector => "Activations",
            Self::LossCurve => "Loss",
        }
    }

    /// The geometry policy of a cell diagram, `None` for the loss curve.
    pub fn policy(self) -> Option<&'static LayoutPolicy> {
        match self {
            Self::WeightMatrix => Some(&WEIGHTS),
            Self::GradientMatrix => Some(&GRADIENTS),
            Self::ActivationVector => Some(&ACTIVATIONS),
            Self::LossCurve => None,
        }
    }
}

/// The constants that tell one cell diagram apart from another.
#[derive(Debug)]
pub struct LayoutPolicy {
    /// Horizontal room per node of the widest layer, in cells.
    pub width_factor: f32,
    /// Vertical room for the whole diagram, in cells.
    pub height_factor: f32,
    /// Horizontal centre of each panel as a fraction of the width.
    pub centers: &'static [f32],
    pub titles: &'static [&'static str],
    pub title_offset: f32,
    pub title_size: f32,
    /// Whether panels get row and column node labels.
    pub axis_labels: bool,
    pub caption: Option<&'static str>,
}

static WEIGHTS: LayoutPolicy = LayoutPolicy {
    width_factor: 2.5,
    height_factor: 4.0,
    centers: &[1.0 / 3.0, 0.8],
    titles: &["Input-Hidden Weights", "Hidden-Output Weights"],
    title_offset: 50.0,
    title_size: 16.0,
    axis_labels: true,
    caption: Some("Red (positive), White (near zero), Blue (negative)"),
};

static GRADIENTS: LayoutPolicy = LayoutPolicy {
    width_factor: 2.0,
    height_factor: 4.0,
    centers: &[1.0 / 3.0, 5.0 / 6.0],
    titles: &["Input-Hidden Gradients", "Hidden-Output Gradients"],
    title_offset: 30.0,
    title_size: 17.0,
    axis_labels: true,
    caption: None,
};

static ACTIVATIONS: LayoutPolicy = LayoutPolicy {
    width_factor: 4.0,
    height_factor: 2.0,
    centers: &[1.0 / 8.0, 3.0 / 8.0, 5.0 / 8.0, 7.0 / 8.0],
    titles: &["Input", "Hidden (Pre-ReLU)", "Hidden (Post-ReLU)", "Output"],
    title_offset: 30.0,
    title_size: 14.0,
    axis_labels: false,
    caption: None,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub anchor: Anchor,
    pub font_size: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
}

impl Label {
    pub fn new(text: impl Into<String>, x: f32, y: f32, color: Color) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            color,
            anchor: Anchor::Middle,
            font_size: LABEL_FONT_SIZE,
            rotation: 0.0,
        }
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }
}

/// The top-left corner and side of one square cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellGeometry {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl CellGeometry {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.size && y >= self.y && y < self.y + self.size
    }
}

/// One `rows × cols` grid of a diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub rows: usize,
    pub cols: usize,
    /// Row-major, `cells[i * cols + j]`.
    pub cells: Vec<CellGeometry>,
    pub row_labels: Vec<Label>,
    pub col_labels: Vec<Label>,
    pub title: Label,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Geometry {
    pub cell_size: f32,
    pub panels: Vec<Panel>,
    pub caption: Option<Label>,
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.panels.iter().map(|p| p.cells.len()).sum()
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellGeometry> {
        self.panels.iter().flat_map(|p| p.cells.iter())
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.panels
            .iter()
            .flat_map(|p| p.row_labels.iter().chain(&p.col_labels))
    }
}

/// Which layers sit on the rows and columns of a panel.
#[derive(Debug, Clone, Copy)]
enum Layer {
    Input,
    Hidden,
    Output,
}

impl Layer {
    fn prefix(self) -> &'static str {
        match self {
            Layer::Input => "I",
            Layer::Hidden => "H",
            Layer::Output => "O",
        }
    }

    fn color(self) -> Color {
        match self {
            Layer::Input => INPUT_COLOR,
            Layer::Hidden => HIDDEN_COLOR,
            Layer::Output => OUTPUT_COLOR,
        }
    }
}

struct PanelShape {
    rows: usize,
    cols: usize,
    axes: Option<(Layer, Layer)>,
}

fn panel_shapes(kind: DiagramKind, params: &NetworkParams) -> Vec<PanelShape> {
    let NetworkParams { m, k, n, .. } = *params;
    let matrix = |rows, cols, axes| PanelShape {
        rows,
        cols,
        axes: Some(axes),
    };
    let vector = |cols| PanelShape {
        rows: 1,
        cols,
        axes: None,
    };

    match kind {
        DiagramKind::WeightMatrix | DiagramKind::GradientMatrix => vec![
            matrix(m, k, (Layer::Input, Layer::Hidden)),
            matrix(k, n, (Layer::Hidden, Layer::Output)),
        ],
        DiagramKind::ActivationVector => vec![vector(m), vector(k), vector(k), vector(n)],
        DiagramKind::LossCurve => Vec::new(),
    }
}

/// The label texts of a layer with `count` nodes, numbered from 1.
///
/// Layers of more than 10 nodes keep their first and last 3 labels around an [`ELLIPSIS`].
pub fn elide_labels(count: usize, prefix: &str) -> Vec<String> {
    let label = |i: usize| format!("{prefix}{i}");

    if count <= MAX_FULL_LABELS {
        return (1..=count).map(label).collect();
    }

    (1..=ELIDED_EDGE)
        .map(label)
        .chain(std::iter::once(ELLIPSIS.to_string()))
        .chain((count - ELIDED_EDGE + 1..=count).map(label))
        .collect()
}

/// Offsets of `len` labels spread over `count` cells, so the first and last labels sit on the
/// centres of the first and last cells.
fn label_offsets(len: usize, count: usize, cell_size: f32) -> impl Iterator<Item = f32> {
    (0..len).map(move |i| {
        let frac = if len > 1 {
            i as f32 / (len - 1) as f32
        } else {
            0.0
        };
        frac * count.saturating_sub(1) as f32 * cell_size + cell_size / 2.0
    })
}

/// Computes the geometry of a diagram.
///
/// # Arguments
/// * `kind` - The diagram.
/// * `params` - The layer widths, only `m`, `k` and `n` are read.
/// * `viewport` - The drawing area.
///
/// # Returns
/// The diagram's panels and labels, or an empty geometry if any layer is empty or the diagram
/// isn't made of cells.
pub fn layout(kind: DiagramKind, params: &NetworkParams, viewport: Viewport) -> Geometry {
    let Some(policy) = kind.policy() else {
        return Geometry::default();
    };
    if params.m == 0 || params.k == 0 || params.n == 0 {
        return Geometry::default();
    }

    let Viewport { width, height } = viewport;
    let shapes = panel_shapes(kind, params);
    let widest = params.m.max(params.k).max(params.n) as f32;

    let mut cell_size = (width / (policy.width_factor * widest)).min(height / policy.height_factor);
    for (shape, &center) in shapes.iter().zip(policy.centers) {
        let slot = 2.0 * center.min(1.0 - center) * width;
        cell_size = cell_size
            .min(slot / shape.cols as f32)
            .min(height / shape.rows as f32);
    }
    let cell_size = cell_size.max(0.0);

    let panels = shapes
        .iter()
        .zip(policy.centers)
        .zip(policy.titles)
        .map(|((shape, &center), &title)| {
            let start_x = center * width - cell_size * shape.cols as f32 / 2.0;
            let start_y = (height - cell_size * shape.rows as f32) / 2.0;

            let cells = (0..shape.rows)
                .flat_map(|i| (0..shape.cols).map(move |j| (i, j)))
                .map(|(i, j)| CellGeometry {
                    x: start_x + j as f32 * cell_size,
                    y: start_y + i as f32 * cell_size,
                    size: cell_size,
                })
                .collect();

            let (row_labels, col_labels) = match shape.axes {
                Some((row_layer, col_layer)) if policy.axis_labels => {
                    let rows = elide_labels(shape.rows, row_layer.prefix());
                    let row_labels = label_offsets(rows.len(), shape.rows, cell_size)
                        .zip(rows)
                        .map(|(dy, text)| {
                            Label::new(
                                text,
                                start_x - ROW_LABEL_GAP,
                                start_y + dy,
                                row_layer.color(),
                            )
                            .anchor(Anchor::End)
                        })
                        .collect();

                    let cols = elide_labels(shape.cols, col_layer.prefix());
                    let col_labels = label_offsets(cols.len(), shape.cols, cell_size)
                        .zip(cols)
                        .map(|(dx, text)| {
                            Label::new(
                                text,
                                start_x + dx,
                                start_y - COL_LABEL_GAP,
                                col_layer.color(),
                            )
                        })
                        .collect();

                    (row_labels, col_labels)
                }
                _ => (Vec::new(), Vec::new()),
            };

            Panel {
                rows: shape.rows,
                cols: shape.cols,
                cells,
                row_labels,
                col_labels,
                title: Label::new(
                    title,
                    center * width,
                    start_y - policy.title_offset,
                    TEXT_COLOR,
                )
                .font_size(policy.title_size),
            }
        })
        .collect();

    let caption = policy.caption.map(|text| {
        Label::new(
            text,
            width / 1.8,
            height - CAPTION_BOTTOM_GAP,
            CAPTION_COLOR,
        )
        .font_size(CAPTION_FONT_SIZE)
    });

    Geometry {
        cell_size,
        panels,
        caption,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(m: usize, k: usize, n: usize) -> NetworkParams {
        NetworkParams {
            m,
            k,
            n,
            ..Default::default()
        }
    }

    #[test]
    fn short_layers_keep_every_label() {
        assert_eq!(elide_labels(3, "H"), ["H1", "H2", "H3"]);
        assert_eq!(elide_labels(10, "I").len(), 10);
        assert!(elide_labels(0, "I").is_empty());
    }

    #[test]
    fn long_layers_are_elided() {
        assert_eq!(
            elide_labels(16, "H"),
            ["H1", "H2", "H3", ELLIPSIS, "H14", "H15", "H16"]
        );
        assert_eq!(elide_labels(11, "O").len(), 7);
    }

    #[test]
    fn cell_size_follows_the_widest_layer() {
        let vp = Viewport::new(700.0, 500.0);
        let geometry = layout(DiagramKind::WeightMatrix, &params(4, 8, 2), vp);

        // min(700 / (2.5 * 8), 500 / 4)
        assert_eq!(geometry.cell_size, 35.0);
        assert_eq!(geometry.cell_count(), 4 * 8 + 8 * 2);
    }

    #[test]
    fn activation_panels_are_vectors() {
        let geometry = layout(
            DiagramKind::ActivationVector,
            &params(2, 5, 3),
            Viewport::new(800.0, 200.0),
        );

        let widths: Vec<_> = geometry.panels.iter().map(|p| (p.rows, p.cols)).collect();
        assert_eq!(widths, [(1, 2), (1, 5), (1, 5), (1, 3)]);
        assert!(geometry.labels().next().is_none());
        assert_eq!(geometry.panels[1].title.text, "Hidden (Pre-ReLU)");
    }

    #[test]
    fn label_positions_hit_cell_centres() {
        let geometry = layout(
            DiagramKind::GradientMatrix,
            &params(3, 16, 2),
            Viewport::new(800.0, 500.0),
        );
        let panel = &geometry.panels[0];
        let cs = geometry.cell_size;

        let first = &panel.col_labels[0];
        let last = &panel.col_labels[6];
        assert_eq!(last.text, "H16");
        assert!((first.x - (panel.cells[0].x + cs / 2.0)).abs() < 1e-3);
        assert!((last.x - (panel.cells[15].x + cs / 2.0)).abs() < 1e-3);

        let row = &panel.row_labels[2];
        assert_eq!(row.anchor, Anchor::End);
        assert!((row.y - (panel.cells[2 * 16].y + cs / 2.0)).abs() < 1e-3);
    }

    #[test]
    fn stage_prefixes() {
        let geometry = layout(
            DiagramKind::WeightMatrix,
            &params(2, 2, 1),
            Viewport::new(700.0, 500.0),
        );

        let texts = |labels: &Vec<Label>| labels.iter().map(|l| l.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts(&geometry.panels[0].row_labels), ["I1", "I2"]);
        assert_eq!(texts(&geometry.panels[1].row_labels), ["H1", "H2"]);
        assert_eq!(texts(&geometry.panels[1].col_labels), ["O1"]);
        assert!(geometry.caption.is_some());
    }

    #[test]
    fn empty_layer_yields_empty_geometry() {
        for p in [params(0, 4, 2), params(4, 0, 2), params(4, 4, 0)] {
            for kind in DiagramKind::ALL {
                assert!(layout(kind, &p, Viewport::new(700.0, 500.0)).is_empty());
            }
        }
    }
}
