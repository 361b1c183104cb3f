use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

/// Backgrounds brighter than this get the light palette.
const LIGHT_LUMA: f32 = 0.6;

impl ThemeVariant {
    fn from_luma(luma: f32) -> Self {
        if luma > LIGHT_LUMA {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

/// Guess the variant from the terminal background, falling back to dark
/// when the terminal won't say.
pub fn detect_terminal_variant() -> ThemeVariant {
    match terminal_light::luma() {
        Ok(luma) => ThemeVariant::from_luma(luma),
        Err(_) => ThemeVariant::Dark,
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub variant: ThemeVariant,
    pub foreground: Color,
    pub foreground_dim: Color,
    pub border: Color,
    pub border_focused: Color,
    pub selection_bg: Color,
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub author: Color,
    pub media: Color,
    pub like: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub spinner: Color,
}

impl Theme {
    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            variant: ThemeVariant::Dark,
            foreground: Color::White,
            foreground_dim: Color::Rgb(0x6A, 0x9A, 0x9A),
            border: Color::Rgb(0x6A, 0x9A, 0x9A),
            border_focused: Color::Yellow,
            selection_bg: Color::DarkGray,
            primary: Color::Yellow,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            author: Color::Cyan,
            media: Color::Rgb(0xA6, 0xE2, 0x2E),
            like: Color::Rgb(0xF9, 0x26, 0x72),
            status_bar_bg: Color::Rgb(0x3E, 0x3D, 0x32),
            status_bar_fg: Color::White,
            spinner: Color::Yellow,
        }
    }

    pub fn light() -> Self {
        Self {
            variant: ThemeVariant::Light,
            foreground: Color::Black,
            foreground_dim: Color::Gray,
            border: Color::Gray,
            border_focused: Color::Blue,
            selection_bg: Color::Rgb(0xE0, 0xE0, 0xE0),
            primary: Color::Blue,
            success: Color::Green,
            warning: Color::Rgb(0xB5, 0x89, 0x00),
            error: Color::Red,
            author: Color::Magenta,
            media: Color::Rgb(0x00, 0x80, 0x80),
            like: Color::Rgb(0xD0, 0x1B, 0x5A),
            status_bar_bg: Color::Rgb(0xD0, 0xD0, 0xD0),
            status_bar_fg: Color::Black,
            spinner: Color::Blue,
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.foreground_dim)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn author_style(&self) -> Style {
        Style::default()
            .fg(self.author)
            .add_modifier(Modifier::BOLD)
    }

    pub fn media_style(&self) -> Style {
        Style::default().fg(self.media)
    }

    pub fn like_style(&self, liked: bool) -> Style {
        if liked {
            Style::default().fg(self.like).add_modifier(Modifier::BOLD)
        } else {
            self.dim_style()
        }
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn spinner_style(&self) -> Style {
        Style::default().fg(self.spinner)
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .bg(self.status_bar_bg)
            .fg(self.status_bar_fg)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
