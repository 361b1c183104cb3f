pub mod common;
pub mod debug;
pub mod feed;
pub mod help_overlay;
pub mod spinner;
pub mod status_bar;

use ratatui::layout::{Constraint, Layout, Rect};

/// Height of the debug pane when shown.
pub const DEBUG_PANE_ROWS: u16 = 10;

/// Screen regions. The feed pane's height is what the session scrolls over.
pub struct Panes {
    pub feed: Rect,
    pub status: Rect,
    pub debug: Option<Rect>,
}

pub fn split(area: Rect, show_debug: bool) -> Panes {
    if show_debug {
        let chunks = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(DEBUG_PANE_ROWS),
        ])
        .split(area);
        Panes {
            feed: chunks[0],
            status: chunks[1],
            debug: Some(chunks[2]),
        }
    } else {
        let chunks = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(area);
        Panes {
            feed: chunks[0],
            status: chunks[1],
            debug: None,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use ratatui::{Frame, Terminal, backend::TestBackend};

    use super::*;

    pub fn render_to_string<F>(width: u16, height: u16, render_fn: F) -> String
    where
        F: FnOnce(&mut Frame),
    {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_fn(frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut output = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                output.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            output.push('\n');
        }
        output
    }

    #[test]
    fn split_reserves_status_and_debug_rows() {
        let area = Rect::new(0, 0, 80, 40);

        let panes = split(area, false);
        assert_eq!(panes.feed.height, 39);
        assert!(panes.debug.is_none());

        let panes = split(area, true);
        assert_eq!(panes.feed.height, 40 - 1 - DEBUG_PANE_ROWS);
        assert_eq!(panes.debug.unwrap().height, DEBUG_PANE_ROWS);
    }
}
