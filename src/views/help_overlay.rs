//! Keybinding popup, grouped by what each key acts on.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
};

use crate::app::App;
use crate::help::{HelpSection, feed_overlay_sections};
use crate::keys::{Keymap, feed_keymap, global_keymap};
use crate::theme::Theme;

struct Group {
    title: &'static str,
    rows: Vec<(String, &'static str)>,
}

fn groups(sections: Vec<HelpSection>, keymap: &Keymap) -> Vec<Group> {
    sections
        .into_iter()
        .map(|section| Group {
            title: section.title,
            rows: section
                .items
                .iter()
                .filter_map(|item| item.format_for_overlay(keymap))
                .collect(),
        })
        .filter(|group| !group.rows.is_empty())
        .collect()
}

fn sound_line<'a>(app: &App, theme: &Theme) -> Option<Line<'a>> {
    let session = app.session.as_ref()?;
    let (text, style) = if session.playback().is_muted() {
        ("videos muted", theme.dim_style())
    } else {
        ("sound on", Style::default().fg(theme.success))
    };
    Some(Line::from(Span::styled(text, style)))
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.help_overlay {
        return;
    }

    let theme = &app.theme;
    let keymap = global_keymap().extend(feed_keymap());
    let groups = groups(feed_overlay_sections(), &keymap);

    let key_width = groups
        .iter()
        .flat_map(|g| g.rows.iter().map(|(k, _)| k.len()))
        .max()
        .unwrap_or(0);
    let heading = Style::default()
        .fg(theme.primary)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(group.title, heading)));
        for (keys, label) in &group.rows {
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<key_width$}  "), theme.dim_style()),
                Span::styled(*label, Style::default().fg(theme.foreground)),
            ]));
        }
    }
    if let Some(sound) = sound_line(app, theme) {
        lines.push(Line::default());
        lines.push(sound);
    }

    let content_width = lines.iter().map(Line::width).max().unwrap_or(0);
    // Borders plus one column of padding on each side.
    let popup_width = (content_width as u16 + 4).min(area.width.saturating_sub(2));
    let popup_height = (lines.len() as u16 + 4).min(area.height.saturating_sub(2));
    let popup_area = centered_rect(popup_width, popup_height, area);

    frame.render_widget(Clear, popup_area);
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.focused_border_style())
            .title(" Keys ")
            .title_style(theme.title_style())
            .padding(Padding::uniform(1)),
    );
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
