use crossterm::event::KeyCode;
use log::debug;
use mlp_viz::{DiagramKind, ParamField, TrainingRun, VizConfig, VizState};
use ratatui::layout::Rect;

use crate::ui::canvas::Projection;

/// What the event loop must do after an input.
pub enum Action {
    None,
    Quit,
    /// A run was started and must be spawned.
    Start(TrainingRun),
}

/// Drives the visualizer state from terminal input.
pub struct Session {
    viz: VizState,
    selected: ParamField,
    /// Where each diagram was last drawn, inside its border.
    areas: Vec<(DiagramKind, Rect)>,
    pointer: Option<(u16, u16)>,
}

impl Session {
    pub fn new(config: &VizConfig) -> Self {
        Self {
            viz: VizState::new(config),
            selected: ParamField::M,
            areas: Vec::new(),
            pointer: None,
        }
    }

    pub fn viz(&self) -> &VizState {
        &self.viz
    }

    pub fn selected(&self) -> ParamField {
        self.selected
    }

    pub fn pointer(&self) -> Option<(u16, u16)> {
        self.pointer
    }

    /// Records where a diagram was drawn so pointer positions can be mapped back onto it.
    pub fn set_area(&mut self, kind: DiagramKind, area: Rect) {
        match self.areas.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => slot.1 = area,
            None => self.areas.push((kind, area)),
        }
    }

    /// Applies pending training events. Non-blocking.
    ///
    /// Should be called once per TUI frame tick.
    pub fn tick(&mut self) {
        self.viz.tick();
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('s') => match self.viz.start() {
                Some(run) => Action::Start(run),
                None => Action::None,
            },
            KeyCode::Char('c') => {
                self.viz.cancel();
                Action::None
            }
            KeyCode::Tab => {
                self.selected = self.selected.next();
                Action::None
            }
            KeyCode::BackTab => {
                self.selected = self.selected.prev();
                Action::None
            }
            KeyCode::Up => {
                self.viz.cycle(self.selected, true);
                Action::None
            }
            KeyCode::Down => {
                self.viz.cycle(self.selected, false);
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Routes the pointer to whichever diagram lies under it.
    pub fn handle_mouse(&mut self, col: u16, row: u16) {
        self.pointer = Some((col, row));

        let hit = self.areas.iter().find_map(|&(kind, area)| {
            let list = self.viz.diagram(kind);
            Projection::new(area, list.width, list.height)
                .to_point(col, row)
                .map(|(x, y)| (kind, x, y))
        });

        match hit {
            Some((kind, x, y)) => {
                debug!("pointer over {kind:?} at ({x:.1}, {y:.1})");
                self.viz.hover(kind, x, y);
            }
            None => self.viz.leave(),
        }
    }
}
