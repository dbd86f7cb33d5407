use mlp_viz::{
    DrawList,
    layout::{Anchor, Label},
    render::Shape,
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use super::theme::{Theme, rgb};

/// Maps draw-list units onto the cells of a terminal area and back.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    area: Rect,
    /// Terminal cells per draw-list unit.
    sx: f32,
    sy: f32,
}

impl Projection {
    pub fn new(area: Rect, width: f32, height: f32) -> Self {
        let scale = |cells: u16, units: f32| {
            if units > 0.0 {
                cells as f32 / units
            } else {
                0.0
            }
        };

        Self {
            area,
            sx: scale(area.width, width),
            sy: scale(area.height, height),
        }
    }

    fn col(&self, x: f32) -> i32 {
        self.area.x as i32 + (x * self.sx).floor() as i32
    }

    fn row(&self, y: f32) -> i32 {
        self.area.y as i32 + (y * self.sy).floor() as i32
    }

    fn inside(&self, col: i32, row: i32) -> bool {
        let a = self.area;
        col >= a.x as i32 && col < a.right() as i32 && row >= a.y as i32 && row < a.bottom() as i32
    }

    /// The draw-list point at the centre of a terminal cell.
    pub fn to_point(&self, col: u16, row: u16) -> Option<(f32, f32)> {
        if !self.inside(col as i32, row as i32) || self.sx == 0.0 || self.sy == 0.0 {
            return None;
        }

        let x = (col - self.area.x) as f32 + 0.5;
        let y = (row - self.area.y) as f32 + 0.5;
        Some((x / self.sx, y / self.sy))
    }
}

/// Paints a `DrawList` into a terminal area, stretched to fit.
pub struct DrawListView<'a> {
    list: &'a DrawList,
}

impl<'a> DrawListView<'a> {
    pub fn new(list: &'a DrawList) -> Self {
        Self { list }
    }
}

impl Widget for DrawListView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(Theme::PAPER));
        let proj = Projection::new(area, self.list.width, self.list.height);

        for cmd in &self.list.commands {
            match &cmd.shape {
                Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    ..
                } => fill_rect(buf, &proj, (*x, *y, *width, *height), rgb(*fill)),
                Shape::Line { from, to, stroke } => {
                    let symbol = if from.1 == to.1 {
                        "─"
                    } else if from.0 == to.0 {
                        "│"
                    } else {
                        "·"
                    };
                    plot(buf, &proj, *from, *to, symbol, rgb(*stroke));
                }
                Shape::Polyline { points, stroke, .. } => {
                    for segment in points.windows(2) {
                        plot(buf, &proj, segment[0], segment[1], "•", rgb(*stroke));
                    }
                    if let [only] = points.as_slice() {
                        plot(buf, &proj, *only, *only, "•", rgb(*stroke));
                    }
                }
                Shape::Text(label) => text(buf, &proj, label),
            }
        }
    }
}

fn fill_rect(buf: &mut Buffer, proj: &Projection, (x, y, w, h): (f32, f32, f32, f32), fill: Color) {
    let area = proj.area;
    let c0 = area.x as i32 + (x * proj.sx).round() as i32;
    let c1 = (area.x as i32 + ((x + w) * proj.sx).round() as i32).max(c0 + 1);
    let r0 = area.y as i32 + (y * proj.sy).round() as i32;
    let r1 = (area.y as i32 + ((y + h) * proj.sy).round() as i32).max(r0 + 1);

    for row in r0..r1 {
        for col in c0..c1 {
            if proj.inside(col, row) {
                buf.get_mut(col as u16, row as u16)
                    .set_symbol(" ")
                    .set_bg(fill);
            }
        }
    }
}

fn plot(
    buf: &mut Buffer,
    proj: &Projection,
    from: (f32, f32),
    to: (f32, f32),
    symbol: &str,
    color: Color,
) {
    let (c0, r0) = (proj.col(from.0), proj.row(from.1));
    let (c1, r1) = (proj.col(to.0), proj.row(to.1));
    let steps = (c1 - c0).abs().max((r1 - r0).abs()).max(1);

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let col = c0 + ((c1 - c0) as f32 * t).round() as i32;
        let row = r0 + ((r1 - r0) as f32 * t).round() as i32;
        if proj.inside(col, row) {
            buf.get_mut(col as u16, row as u16)
                .set_symbol(symbol)
                .set_fg(color);
        }
    }
}

fn text(buf: &mut Buffer, proj: &Projection, label: &Label) {
    let style = Style::default().fg(rgb(label.color));
    let chars: Vec<char> = label.text.chars().collect();
    let len = chars.len() as i32;
    let (col, row) = (proj.col(label.x), proj.row(label.y));

    if label.rotation != 0.0 {
        for (i, ch) in chars.iter().enumerate() {
            let r = row - len / 2 + i as i32;
            if proj.inside(col, r) {
                buf.get_mut(col as u16, r as u16)
                    .set_char(*ch)
                    .set_style(style);
            }
        }
        return;
    }

    let start = match label.anchor {
        Anchor::Start => col,
        Anchor::Middle => col - len / 2,
        Anchor::End => col - len,
    };

    for (i, ch) in chars.iter().enumerate() {
        let c = start + i as i32;
        if proj.inside(c, row) {
            buf.get_mut(c as u16, row as u16)
                .set_char(*ch)
                .set_style(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use mlp_viz::{DiagramKind, VizConfig, VizState};

    use super::*;

    #[test]
    fn projection_round_trips_cell_centres() {
        let proj = Projection::new(Rect::new(10, 5, 70, 25), 700.0, 500.0);

        let (x, y) = proj.to_point(10, 5).unwrap();
        assert!((x - 5.0).abs() < 1e-3 && (y - 10.0).abs() < 1e-3);
        assert_eq!((proj.col(x), proj.row(y)), (10, 5));

        assert!(proj.to_point(9, 5).is_none());
        assert!(proj.to_point(80, 5).is_none());
    }

    #[test]
    fn cells_are_painted_with_their_fill() {
        let state = VizState::new(&VizConfig::default());
        let area = Rect::new(0, 0, 70, 25);
        let mut buf = Buffer::empty(area);

        DrawListView::new(state.diagram(DiagramKind::WeightMatrix)).render(area, &mut buf);

        let white = Color::Rgb(255, 255, 255);
        let painted = (0..area.height)
            .flat_map(|row| (0..area.width).map(move |col| (col, row)))
            .filter(|&(col, row)| buf.get(col, row).bg == white)
            .count();
        assert!(painted > 0);
        assert_eq!(buf.get(0, 0).bg, Theme::PAPER);
    }

    #[test]
    fn text_is_clipped_to_the_area() {
        let mut list = VizState::new(&VizConfig::default())
            .diagram(DiagramKind::ActivationVector)
            .clone();
        list.commands.clear();
        list.commands.push(mlp_viz::render::DrawCmd {
            shape: Shape::Text(
                Label::new("far too long to fit", 0.0, 10.0, mlp_viz::color::Color::WHITE)
                    .anchor(Anchor::End),
            ),
            hover: None,
        });

        let area = Rect::new(0, 0, 8, 4);
        let mut buf = Buffer::empty(area);
        DrawListView::new(&list).render(area, &mut buf);

        assert_eq!(buf.get(0, 0).symbol(), " ");
    }
}
