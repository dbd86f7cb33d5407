use mlp_viz::{Phase, ParamField, state::RunStatus};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::state::session::Session;

use super::theme::Theme;

pub fn header(session: &Session) -> Paragraph<'_> {
    let viz = session.viz();

    let (phase, phase_style) = match viz.phase() {
        Phase::Idle => ("IDLE", Theme::dim()),
        Phase::Running => ("RUNNING", Theme::ok()),
        Phase::Sampling => ("SAMPLING", Theme::ok()),
        Phase::Cancelled => ("CANCELLED", Theme::warn()),
    };

    let status = match viz.status() {
        Some(RunStatus::Running { step, loss }) => format!("step {step}  loss {loss:.6}"),
        Some(RunStatus::Finished { steps }) => format!("finished after {steps} steps"),
        Some(RunStatus::Cancelled { at_step }) => format!("cancelled at step {at_step}"),
        Some(RunStatus::Failed { at_step }) => format!("failed at step {at_step}"),
        None => String::new(),
    };

    let line1 = Line::from(vec![
        Span::styled("MLP Training Visualizer", Theme::title()),
        Span::raw("  |  "),
        Span::styled(phase, phase_style),
        Span::raw("  "),
        Span::styled(status, Theme::text()),
    ]);

    let mut pickers = Vec::new();
    for field in ParamField::ALL {
        let style = if field == session.selected() {
            Theme::selected()
        } else {
            Theme::text()
        };
        pickers.push(Span::styled(
            format!(" {}: {} ", field.label(), field.value(viz.params())),
            style,
        ));
        pickers.push(Span::raw(" "));
    }

    let params = if viz.params().is_valid() {
        Line::from(pickers)
    } else {
        Line::from(
            pickers
                .into_iter()
                .chain([Span::styled("invalid params", Theme::error())])
                .collect::<Vec<_>>(),
        )
    };

    let help = Line::from(Span::styled(
        "s start  c cancel  tab/shift-tab select  ↑/↓ change  q quit",
        Theme::muted(),
    ));

    Paragraph::new(vec![line1, params, help])
        .style(Theme::base())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title("Overview"),
        )
        .wrap(Wrap { trim: true })
}

/// The bordered frame around a diagram.
pub fn diagram_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(Span::styled(title, Theme::title()))
}

/// The tooltip box, placed just below-right of the pointer and kept on screen.
///
/// # Returns
/// The widget and where to draw it, or `None` if the tooltip is hidden.
pub fn tooltip(session: &Session, screen: Rect) -> Option<(Paragraph<'_>, Rect)> {
    let state = session.viz().tooltip();
    let (col, row) = session.pointer()?;
    if !state.visible {
        return None;
    }

    let width = (state.text.chars().count() as u16 + 2).min(screen.width);
    let x = (col + 1).min(screen.right().saturating_sub(width));
    let y = (row + 1).min(screen.bottom().saturating_sub(1));

    let widget = Paragraph::new(Span::styled(format!(" {} ", state.text), Theme::tooltip()));
    Some((widget, Rect::new(x, y, width, 1)))
}
