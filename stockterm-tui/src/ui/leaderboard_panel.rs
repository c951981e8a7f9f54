//! Panel 6 (Leaderboard): players ranked by total value.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use stockterm_runner::Snapshot;

use crate::theme;
use crate::ui::truncate;

pub fn render(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let board = snap.market.leaderboard();
    let current = snap.market.current_player().map(|p| p.name.as_str());
    let mut lines: Vec<Line> = Vec::new();

    if board.is_empty() {
        lines.push(Line::from(Span::styled(
            "No players yet. Press 'a' to add one.",
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    lines.push(Line::from(Span::styled(
        format!(
            "{:>4} {:<20} {:>14} {:>12} {:>9}",
            "Rank", "Player", "Total", "Profit", "Profit%"
        ),
        theme::accent_bold(),
    )));
    for entry in &board {
        let is_current = current == Some(entry.name.as_str());
        let base = if is_current {
            theme::accent().add_modifier(Modifier::BOLD)
        } else {
            theme::text()
        };
        let medal = match entry.rank {
            1 => theme::warning(),
            _ => base,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>4} ", entry.rank), medal),
            Span::styled(format!("{:<20} ", truncate(&entry.name, 20)), base),
            Span::styled(format!("{:>14.2} ", entry.total_value), base),
            Span::styled(format!("{:>+12.2} ", entry.profit), theme::change(entry.profit)),
            Span::styled(
                format!("{:>+8.2}%", entry.profit_percent),
                theme::change(entry.profit),
            ),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
