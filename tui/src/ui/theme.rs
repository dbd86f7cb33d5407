use mlp_viz::color::Color as VizColor;
use ratatui::style::{Color, Modifier, Style};

/// Neon-green cyber theme around light diagram canvases.
pub struct Theme;

impl Theme {
    pub const BG: Color = Color::Rgb(0, 0, 0);
    pub const FG_NEON: Color = Color::Rgb(57, 255, 20);
    pub const FG_DIM: Color = Color::Rgb(0, 190, 0);
    pub const FG_MUTED: Color = Color::Rgb(80, 90, 80);

    pub const ACCENT_CYAN: Color = Color::Rgb(0, 255, 255);
    pub const ACCENT_YELLOW: Color = Color::Rgb(255, 255, 0);
    pub const ACCENT_RED: Color = Color::Rgb(255, 70, 70);

    /// Diagrams are drawn on paper so their dark labels stay readable.
    pub const PAPER: Color = Color::Rgb(248, 249, 250);

    pub fn base() -> Style {
        Style::default().fg(Self::FG_NEON).bg(Self::BG)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::FG_NEON).bg(Self::BG)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::FG_NEON)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG_NEON)
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::FG_MUTED)
    }

    /// The parameter picker that arrow keys currently edit.
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::FG_NEON)
            .add_modifier(Modifier::BOLD)
    }

    pub fn ok() -> Style {
        Style::default()
            .fg(Self::FG_NEON)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warn() -> Style {
        Style::default()
            .fg(Self::ACCENT_YELLOW)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ACCENT_RED)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tooltip() -> Style {
        Style::default()
            .fg(Self::ACCENT_CYAN)
            .bg(Self::BG)
            .add_modifier(Modifier::BOLD)
    }
}

/// Converts a draw-list color, dropping its alpha.
pub fn rgb(color: VizColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
