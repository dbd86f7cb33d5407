use ratatui::{
    Frame,
    widgets::{Block, Clear},
};

use crate::state::session::Session;

use super::{canvas::DrawListView, layout, theme::Theme, widgets};

/// Draws the entire UI, recording where each diagram landed.
pub fn draw(f: &mut Frame, session: &mut Session) {
    let area = f.size();
    f.render_widget(Block::default().style(Theme::base()), area);

    let (header_area, body_area) = layout::vertical(area);
    f.render_widget(widgets::header(session), header_area);

    for (kind, cell) in layout::grid(body_area) {
        let block = widgets::diagram_block(kind.title());
        let inner = block.inner(cell);
        f.render_widget(block, cell);
        f.render_widget(DrawListView::new(session.viz().diagram(kind)), inner);
        session.set_area(kind, inner);
    }

    if let Some((tooltip, at)) = widgets::tooltip(session, area) {
        f.render_widget(Clear, at);
        f.render_widget(tooltip, at);
    }
}
