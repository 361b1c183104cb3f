use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .title(" Debug ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.foreground_dim));

    let Some(session) = app.session.as_ref() else {
        let line = Line::from(Span::styled("No session", theme.dim_style()));
        frame.render_widget(Paragraph::new(line).block(block), area);
        return;
    };
    let debug = &session.debug;

    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Session ", theme.dim_style()),
        Span::styled(
            format!(
                "gen {} · window {}/{} · admitted {} · buffered {} · visible {} · animations {}",
                session.generation(),
                session.window().len(),
                session.window().max_items(),
                session.window().total_admitted(),
                session.cache().len(),
                session.visibility().visible().len(),
                session.likes().active_animations(),
            ),
            Style::default().fg(theme.foreground),
        ),
    ]));

    let task_count = debug.running_tasks.len();
    lines.push(Line::from(vec![
        Span::styled("Tasks: ", theme.dim_style()),
        Span::styled(
            task_count.to_string(),
            Style::default().fg(if task_count > 0 {
                theme.primary
            } else {
                theme.foreground
            }),
        ),
    ]));

    for task in &debug.running_tasks {
        let elapsed = task.started_at.elapsed();
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("[{}] ", task.id), theme.dim_style()),
            Span::styled(&task.description, Style::default().fg(theme.foreground)),
            Span::styled(
                format!(" ({:.1?})", elapsed),
                Style::default().fg(theme.author),
            ),
        ]));
    }

    // Recent log entries (newest first, limit to fit area)
    let available_lines = area.height.saturating_sub(4) as usize;
    let log_lines = available_lines.saturating_sub(debug.running_tasks.len());

    for entry in debug.log.iter().rev().take(log_lines) {
        lines.push(Line::from(Span::styled(
            format!("  {}", entry.message),
            theme.dim_style(),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}
