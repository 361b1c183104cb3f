//! The feed pane: rendered records drawn as bordered cards, scrolled by the
//! session's viewport.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::app::App;
use crate::feed::viewport::Placement;
use crate::feed::window::RenderedRecord;
use crate::likes::LikeState;
use crate::playback::{VideoPhase, VideoState};
use crate::session::FeedSession;
use crate::theme::Theme;
use crate::views::common::{render_error, spans_width, truncate};
use crate::views::spinner::spinner_frame;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let Some(session) = app.session.as_ref() else {
        match &app.startup_error {
            Some(err) => render_error(frame, err, theme, area),
            None => render_notice(frame, "Starting…", theme, area),
        }
        return;
    };

    if session.window().is_empty() {
        let notice = if session.cache().is_exhausted() {
            "Nothing to show.".to_string()
        } else if let Some(err) = session.last_error() {
            err.to_string()
        } else {
            let started = session.debug.running_tasks.first().map(|t| t.started_at);
            format!("{} Loading feed…", spinner_frame(started))
        };
        render_notice(frame, &notice, theme, area);
        return;
    }

    let viewport = session.viewport();
    let top = viewport.offset();
    let bottom = top + usize::from(area.height);
    let on_screen: Vec<&Placement> = session
        .layout()
        .iter()
        .filter(|p| p.bottom() > top && p.top < bottom)
        .collect();
    let Some(first) = on_screen.first() else {
        return;
    };
    let skip = top.saturating_sub(first.top);

    let width = usize::from(area.width);
    let mut lines = Vec::new();
    for placement in &on_screen {
        if let Some(record) = session.window().get(&placement.id) {
            lines.extend(card_lines(session, record, placement.rows, width, theme));
        }
    }

    let paragraph = Paragraph::new(lines).scroll((skip as u16, 0));
    frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, text: &str, theme: &Theme, area: Rect) {
    let widget = Paragraph::new(text)
        .style(theme.dim_style())
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

/// Exactly `rows` lines for one card.
fn card_lines(
    session: &FeedSession,
    record: &RenderedRecord,
    rows: usize,
    width: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let item = &record.item;
    let focused = session.focused() == Some(&item.id);
    let border = if focused {
        theme.focused_border_style()
    } else {
        theme.border_style()
    };
    let inner = width.saturating_sub(4);

    let mut lines = vec![header(
        item.author(),
        item.media_type.label(),
        width,
        border,
        theme,
    )];

    let url = truncate(&item.media_url, inner.saturating_sub(2));
    let icon = if item.is_video() { "▶ " } else { "▣ " };
    lines.push(framed(
        vec![
            Span::styled(icon, theme.media_style()),
            Span::styled(url, theme.media_style()),
        ],
        width,
        border,
    ));

    if item.is_video()
        && let Some(state) = session.playback().state(&item.id)
    {
        lines.push(framed(video_spans(state, theme), width, border));
    }

    if let Some(state) = session.likes().state(&item.id) {
        let animating = session.likes().is_animating(&item.id);
        lines.push(framed(like_spans(state, animating, theme), width, border));
    }

    lines.truncate(rows.saturating_sub(1));
    while lines.len() < rows.saturating_sub(1) {
        lines.push(framed(Vec::new(), width, border));
    }
    lines.push(footer(width, border));
    lines
}

fn header(author: &str, kind: &str, width: usize, border: Style, theme: &Theme) -> Line<'static> {
    let author = truncate(&format!("@{author}"), width.saturating_sub(kind.len() + 8));
    let mut spans = vec![
        Span::styled("╭─ ", border),
        Span::styled(author, theme.author_style()),
        Span::raw(" "),
    ];
    let tail = vec![
        Span::raw(" "),
        Span::styled(kind.to_string(), theme.dim_style()),
        Span::styled(" ─╮", border),
    ];
    let fill = width.saturating_sub(spans_width(&spans) + spans_width(&tail));
    spans.push(Span::styled("─".repeat(fill), border));
    spans.extend(tail);
    Line::from(spans)
}

fn footer(width: usize, border: Style) -> Line<'static> {
    let fill = width.saturating_sub(2);
    Line::from(Span::styled(format!("╰{}╯", "─".repeat(fill)), border))
}

/// A content row between the side borders.
fn framed(content: Vec<Span<'static>>, width: usize, border: Style) -> Line<'static> {
    let pad = width.saturating_sub(spans_width(&content) + 4);
    let mut spans = vec![Span::styled("│ ", border)];
    spans.extend(content);
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::styled(" │", border));
    Line::from(spans)
}

fn video_spans(state: VideoState, theme: &Theme) -> Vec<Span<'static>> {
    let phase = match state.phase {
        VideoPhase::Playing => Span::styled(
            "▶ playing",
            Style::default()
                .fg(theme.success)
                .add_modifier(Modifier::BOLD),
        ),
        VideoPhase::Paused => Span::styled("‖ paused", theme.dim_style()),
        VideoPhase::Blocked => Span::styled("⊘ autoplay blocked", theme.warning_style()),
    };
    let mut spans = vec![
        phase,
        Span::styled(" · ", theme.dim_style()),
        Span::styled(
            if state.muted { "muted" } else { "sound on" },
            theme.dim_style(),
        ),
    ];
    if state.controls {
        spans.push(Span::styled("  [space] play", theme.dim_style()));
    }
    spans
}

fn like_spans(state: LikeState, animating: bool, theme: &Theme) -> Vec<Span<'static>> {
    let heart = if state.liked { "♥" } else { "♡" };
    let mut style = theme.like_style(state.liked);
    if animating {
        style = style.add_modifier(Modifier::REVERSED);
    }
    let mut spans = vec![
        Span::styled(format!("{heart} "), style),
        Span::styled(state.like_count.to_string(), style),
    ];
    if state.is_pending() {
        spans.push(Span::styled(" saving…", theme.dim_style()));
    }
    spans
}
