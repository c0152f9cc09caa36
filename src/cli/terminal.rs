//! Colour and width checks for the opportunities table.
//!
//! Colour is only emitted when stdout supports it, so piped output and the
//! JSON format stay plain.

use owo_colors::{OwoColorize, colors::css};

/// Below this many columns the table leaves out the closing date.
const NARROW_WIDTH: u16 = 60;

/// Whether stage highlights and status messages may be coloured.
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// The width of the attached terminal, if there is one.
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Whether the table should drop its closing-date column.
///
/// Output that is not going to a terminal always gets the full table.
pub fn is_narrow() -> bool {
    terminal_width().is_some_and(|w| w < NARROW_WIDTH)
}

/// Session styling for status lines and stage cells.
pub trait Colorize {
    /// Confirmations and won deals.
    fn success(&self) -> String;
    /// Errors, missing records and lost deals.
    fn warning(&self) -> String;
    /// Banners, display ids and open stages.
    fn info(&self) -> String;
    /// Headers, filter summaries and hints.
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, |s| s.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self, |s| s.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        paint(self, |s| s.fg::<css::LightBlue>().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}
