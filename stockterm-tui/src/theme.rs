//! Neon-on-charcoal palette and the styles built from it.
//!
//! Gains are neon green, losses hot pink, focus electric cyan.

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT: Color = Color::White;

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT)
}

/// Green for gains (zero included), pink for losses.
pub fn change(value: f64) -> Style {
    if value >= 0.0 {
        positive()
    } else {
        negative()
    }
}

/// Overbought (>70) pink, oversold (<30) green, otherwise neutral.
pub fn rsi(value: f64) -> Style {
    match value {
        v if v > 70.0 => negative(),
        v if v < 30.0 => positive(),
        _ => neutral(),
    }
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_color_sign() {
        assert_eq!(change(1.5), positive());
        assert_eq!(change(0.0), positive());
        assert_eq!(change(-0.1), negative());
    }

    #[test]
    fn rsi_bands() {
        assert_eq!(rsi(75.0), negative());
        assert_eq!(rsi(50.0), neutral());
        assert_eq!(rsi(20.0), positive());
    }
}
