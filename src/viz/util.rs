use crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::style::Color;

use crate::gym::grid_world::Cell;

/// Takes an event, checks if it is a key press event, and returns the [`KeyCode`]
pub(super) fn event_keycode(event: &Event) -> Option<KeyCode> {
    let Event::Key(key) = event else {
        return None;
    };

    if key.kind != KeyEventKind::Press {
        return None;
    }

    Some(key.code)
}

/// Fill color of a board square
pub(super) fn cell_color(cell: Cell) -> Color {
    match cell {
        Cell::Empty => Color::Rgb(255, 255, 255),
        Cell::Agent => Color::Rgb(0, 100, 255),
        Cell::Gem => Color::Rgb(0, 255, 0),
        Cell::Mine => Color::Rgb(255, 0, 0),
        Cell::Barrier => Color::Rgb(100, 100, 100),
    }
}
