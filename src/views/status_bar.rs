use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::App;
use crate::help::feed_help;
use crate::keys::{feed_keymap, global_keymap};
use crate::theme::Theme;
use crate::views::spinner::spinner_frame;

/// Builder for the one-line status bar.
///
/// Layout: `[Label] [Loading?] Position | Stats | Notice? | Help Text`
pub struct StatusBar<'a> {
    theme: &'a Theme,
    label: &'a str,
    loading_text: Option<&'a str>,
    position: Option<(u64, u64)>,
    stats: Option<String>,
    notice: Option<(&'a str, Style)>,
    help_text: &'a str,
}

impl<'a> StatusBar<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            label: "",
            loading_text: None,
            position: None,
            stats: None,
            notice: None,
            help_text: "",
        }
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn loading(mut self, text: &'a str) -> Self {
        self.loading_text = Some(text);
        self
    }

    pub fn position(mut self, current: u64, total: u64) -> Self {
        self.position = Some((current, total));
        self
    }

    pub fn stats(mut self, stats: String) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn error(mut self, text: &'a str) -> Self {
        self.notice = Some((text, self.theme.error_style()));
        self
    }

    pub fn notice(mut self, text: &'a str) -> Self {
        self.notice = Some((text, self.theme.warning_style()));
        self
    }

    pub fn help(mut self, text: &'a str) -> Self {
        self.help_text = text;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let separator = || Span::styled(" | ", self.theme.dim_style());
        let mut spans = vec![
            Span::styled(format!(" {} ", self.label), self.theme.status_bar_style()),
            Span::raw(" "),
        ];

        if let Some(loading) = self.loading_text {
            spans.push(Span::styled(loading.to_string(), self.theme.spinner_style()));
            spans.push(separator());
        }

        if let Some((current, total)) = self.position {
            spans.push(Span::styled(
                format!("{}/{}", current, total),
                self.theme.dim_style(),
            ));
            spans.push(separator());
        }

        if let Some(stats) = self.stats {
            spans.push(Span::styled(stats, self.theme.dim_style()));
            spans.push(separator());
        }

        if let Some((text, style)) = self.notice {
            spans.push(Span::styled(text.to_string(), style));
            spans.push(separator());
        }

        spans.push(Span::styled(
            self.help_text.to_string(),
            self.theme.dim_style(),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// The app's status bar: focus position, window and buffer sizes, fetch
/// state, end of feed, mute, and the last error.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let keymap = global_keymap().extend(feed_keymap());
    let help = feed_help().format(&keymap, false);
    let mut bar = StatusBar::new(&app.theme).label("Feed");

    let Some(session) = app.session.as_ref() else {
        if let Some(err) = &app.startup_error {
            bar = bar.error(err);
        }
        bar.help(&help).render(frame, area);
        return;
    };

    let started = session.debug.running_tasks.first().map(|t| t.started_at);
    let loading = format!("{} fetching", spinner_frame(started));
    if session.cache().is_in_flight() {
        bar = bar.loading(&loading);
    }
    if let Some(record) = session.focused().and_then(|id| session.window().get(id)) {
        bar = bar.position(record.admitted_at + 1, session.window().total_admitted());
    }

    let mute = if session.playback().is_muted() {
        "muted"
    } else {
        "sound"
    };
    bar = bar.stats(format!(
        "{} shown · {} buffered · {}",
        session.window().len(),
        session.cache().len(),
        mute
    ));

    if let Some(err) = session.last_error() {
        bar = bar.error(err);
    } else if session.cache().is_exhausted() {
        bar = bar.notice("end of feed");
    }

    bar.help(&help).render(frame, area);
}
