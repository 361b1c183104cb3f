use anyhow::{Context, Result};
use ratatui::DefaultTerminal;

pub use crate::event::EventHandler;

pub fn init() -> Result<DefaultTerminal> {
    ratatui::try_init().context("Failed to initialize terminal")
}

pub fn restore() -> Result<()> {
    ratatui::try_restore().context("Failed to restore terminal")
}
