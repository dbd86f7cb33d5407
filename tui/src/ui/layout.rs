use mlp_viz::DiagramKind;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Computes the main layout regions.
///
/// # Returns
/// (header, body)
pub fn vertical(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(10)])
        .split(area);

    (chunks[0], chunks[1])
}

/// Splits the body into a 2×2 grid, one cell per diagram.
///
/// # Returns
/// The area of each diagram, in `DiagramKind::ALL` order.
pub fn grid(area: Rect) -> [(DiagramKind, Rect); 4] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let halves = |row: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(row)
    };
    let (top, bottom) = (halves(rows[0]), halves(rows[1]));

    let [a, b, c, d] = DiagramKind::ALL;
    [(a, top[0]), (b, top[1]), (c, bottom[0]), (d, bottom[1])]
}
