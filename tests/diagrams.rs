use mlp_viz::{
    CellMeta, DiagramKind, NetworkParams, TooltipCoordinator, TooltipState, Viewport, VizConfig,
    VizState,
    color::{self, ColorDomain, Palette},
    config::Viewports,
    layout::{self, ELLIPSIS},
};

const SIZES: [usize; 6] = [1, 2, 4, 8, 11, 16];

fn each_architecture() -> impl Iterator<Item = NetworkParams> {
    SIZES.iter().flat_map(|&m| {
        SIZES.iter().flat_map(move |&k| {
            SIZES.iter().map(move |&n| NetworkParams {
                m,
                k,
                n,
                ..Default::default()
            })
        })
    })
}

#[test]
fn cell_counts_follow_the_layer_sizes() {
    let viewports = Viewports::default();

    for params in each_architecture() {
        let NetworkParams { m, k, n, .. } = params;

        for kind in [DiagramKind::WeightMatrix, DiagramKind::GradientMatrix] {
            let geometry = layout::layout(kind, &params, viewports.get(kind));
            let rows: usize = geometry.panels.iter().map(|p| p.rows).sum();

            assert_eq!(rows, m + k);
            assert_eq!(geometry.cell_count(), m * k + k * n);
        }

        let geometry = layout::layout(
            DiagramKind::ActivationVector,
            &params,
            viewports.activations,
        );
        assert_eq!(geometry.cell_count(), m + k + k + n);
    }
}

#[test]
fn cells_stay_inside_the_viewport() {
    let viewports = Viewports::default();
    let eps = 1e-3;

    for params in each_architecture() {
        for kind in [
            DiagramKind::WeightMatrix,
            DiagramKind::GradientMatrix,
            DiagramKind::ActivationVector,
        ] {
            let Viewport { width, height } = viewports.get(kind);
            let geometry = layout::layout(kind, &params, viewports.get(kind));

            for cell in geometry.cells() {
                assert!(cell.size > 0.0);
                assert!(cell.x >= -eps && cell.y >= -eps, "{kind:?} {params}");
                assert!(cell.x + cell.size <= width + eps, "{kind:?} {params}");
                assert!(cell.y + cell.size <= height + eps, "{kind:?} {params}");
            }
        }
    }
}

#[test]
fn cells_of_one_diagram_never_overlap() {
    let params = NetworkParams {
        m: 8,
        k: 16,
        n: 8,
        ..Default::default()
    };
    let viewports = Viewports::default();
    let geometry = layout::layout(DiagramKind::WeightMatrix, &params, viewports.weights);

    let (left, right) = (&geometry.panels[0], &geometry.panels[1]);
    let left_edge = left.cells.iter().map(|c| c.x + c.size).fold(0.0, f32::max);
    let right_edge = right.cells.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
    assert!(left_edge <= right_edge);
}

#[test]
fn label_elision_depends_only_on_the_count() {
    for count in 0..40 {
        let labels = layout::elide_labels(count, "H");
        if count <= 10 {
            assert_eq!(labels.len(), count);
            assert!(!labels.iter().any(|l| l == ELLIPSIS));
        } else {
            assert_eq!(labels.len(), 7);
            assert_eq!(labels[3], ELLIPSIS);
            assert_eq!(labels[6], format!("H{count}"));
        }
    }
}

#[test]
fn hidden_labels_agree_across_diagrams() {
    let params = NetworkParams {
        m: 3,
        k: 12,
        n: 2,
        ..Default::default()
    };
    let viewports = Viewports::default();

    let texts = |kind: DiagramKind| -> Vec<String> {
        let geometry = layout::layout(kind, &params, viewports.get(kind));
        geometry.panels[0]
            .col_labels
            .iter()
            .map(|l| l.text.clone())
            .collect()
    };

    assert_eq!(
        texts(DiagramKind::WeightMatrix),
        texts(DiagramKind::GradientMatrix)
    );
    assert_eq!(texts(DiagramKind::WeightMatrix).len(), 7);
}

#[test]
fn color_stops_and_clamping() {
    let p = Palette::DIVERGING;

    assert_eq!(color::map(-1.0, ColorDomain::WEIGHTS).to_string(), "#0074d9");
    assert_eq!(color::map(0.0, ColorDomain::WEIGHTS).to_string(), "#ffffff");
    assert_eq!(color::map(1.0, ColorDomain::WEIGHTS).to_string(), "#ff4136");

    for x in [-3.0, -1.5, 1.5, 42.0] {
        assert_eq!(
            color::map(x, ColorDomain::WEIGHTS),
            color::map(x.clamp(-1.0, 1.0), ColorDomain::WEIGHTS)
        );
    }
    assert_eq!(color::map(-0.5, ColorDomain::GRADIENTS), p.cold);
}

#[test]
fn tooltip_hover_then_leave() {
    let mut tooltip = TooltipCoordinator::new();
    let meta = CellMeta::Weight {
        stage: 0,
        i: 0,
        j: 1,
        value: 0.1234,
    };

    tooltip.on_hover(&meta, 10.0, 20.0);
    assert_eq!(tooltip.state().text, "Weight[1,2]: 0.1234");

    tooltip.on_leave();
    assert_eq!(
        *tooltip.state(),
        TooltipState {
            visible: false,
            text: String::new(),
            x: 0.0,
            y: 0.0,
        }
    );
}

#[test]
fn pointer_over_a_cell_shows_its_value() {
    let mut state = VizState::new(&VizConfig::default());
    let geometry = layout::layout(
        DiagramKind::WeightMatrix,
        state.params(),
        Viewports::default().weights,
    );
    let cell = geometry.panels[1].cells[0];

    state.hover(
        DiagramKind::WeightMatrix,
        cell.x + cell.size / 2.0,
        cell.y + cell.size / 2.0,
    );
    assert!(state.tooltip().visible);
    assert_eq!(state.tooltip().text, "Weight[1,1]: 0.0000");

    state.hover(DiagramKind::WeightMatrix, 0.0, 0.0);
    assert_eq!(*state.tooltip(), TooltipState::default());
}

#[test]
fn invalid_params_render_empty_diagrams() {
    let mut state = VizState::new(&VizConfig::default());
    state.set_params(NetworkParams {
        n: 0,
        ..*state.params()
    });

    for kind in DiagramKind::ALL {
        assert!(state.diagram(kind).is_empty(), "{kind:?}");
    }
    assert!(state.start().is_none());
}
