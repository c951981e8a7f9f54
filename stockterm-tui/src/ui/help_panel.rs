//! Panel 7 (Help): keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::theme;

pub fn render(f: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Navigation");
    key(&mut lines, "1-7", "Switch panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "j / k", "Select stock (scroll in News)");
    key(&mut lines, "m p n t c l ?", "Market, Portfolio, News, Analysis, Chart, Leaderboard, Help");
    lines.push(Line::from(""));

    section(&mut lines, "Trading");
    key(&mut lines, "b", "Buy: symbol or row number, then quantity or 'max'");
    key(&mut lines, "s", "Sell: symbol or row number, then quantity or 'all'");
    key(&mut lines, "a", "Add player");
    key(&mut lines, "w", "Switch player");
    key(&mut lines, "e", "Export portfolio (json / csv)");
    lines.push(Line::from(""));

    section(&mut lines, "Market & News");
    key(&mut lines, "r", "Start / stop price updates");
    key(&mut lines, "f", "Refresh real news (falls back to generated)");
    key(&mut lines, "g", "Generate a news item");
    key(&mut lines, "n", "Open news and mark all read");
    lines.push(Line::from(""));

    section(&mut lines, "Saving");
    key(&mut lines, "S", "Save game");
    key(&mut lines, "v / o / x", "Save / load / delete named session");
    key(&mut lines, "L", "List sessions");
    key(&mut lines, "B", "Write a backup");
    key(&mut lines, "E", "Error history");
    key(&mut lines, "q / Ctrl+C", "Save and quit");

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {keys:>16}  "), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
