//! Panel 1 (Market): stock table with a summary header.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use stockterm_runner::Snapshot;

use crate::app::AppState;
use crate::theme;
use crate::ui::truncate;

pub fn render(f: &mut Frame, area: Rect, app: &AppState, snap: &Snapshot) {
    let market = &snap.market;
    let summary = market.summary();
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled(format!("{} stocks | avg ", summary.total_stocks), theme::muted()),
        Span::styled(
            format!("{:+.2}%", summary.avg_change),
            theme::change(summary.avg_change),
        ),
        Span::styled(" | trend ", theme::muted()),
        Span::styled(summary.market_trend.to_string(), theme::accent()),
        Span::styled(" | top ", theme::muted()),
        Span::styled(
            summary.top_gainer.unwrap_or_else(|| "-".into()),
            theme::positive(),
        ),
        Span::styled(" / ", theme::muted()),
        Span::styled(
            summary.top_loser.unwrap_or_else(|| "-".into()),
            theme::negative(),
        ),
        Span::styled(" | most volatile ", theme::muted()),
        Span::styled(
            market
                .most_volatile(3)
                .iter()
                .map(|s| s.symbol.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            theme::warning(),
        ),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        format!(
            "{:>3} {:<6} {:<26} {:>10} {:>9} {:>8} {:>6}",
            "#", "Symbol", "Name", "Price", "Change", "Change%", "Held"
        ),
        theme::accent_bold(),
    )));

    let held = |symbol: &str| {
        market
            .current_player()
            .map(|p| p.quantity_of(symbol))
            .unwrap_or(0)
    };

    let visible = area.height.saturating_sub(3) as usize;
    let start = app.cursor.saturating_sub(visible.saturating_sub(1));
    for (i, stock) in market.stocks().iter().enumerate().skip(start).take(visible) {
        let is_cursor = i == app.cursor;
        let base = if is_cursor {
            theme::accent().add_modifier(Modifier::REVERSED)
        } else {
            theme::text()
        };
        let change_style = if is_cursor {
            base
        } else {
            theme::change(stock.price_change())
        };
        let qty = held(&stock.symbol);
        lines.push(Line::from(vec![
            Span::styled(format!("{:>3} ", i + 1), base),
            Span::styled(format!("{:<6} ", stock.symbol), base),
            Span::styled(format!("{:<26} ", truncate(&stock.name, 26)), base),
            Span::styled(format!("{:>10.2} ", stock.price()), base),
            Span::styled(format!("{:>+9.2} ", stock.price_change()), change_style),
            Span::styled(format!("{:>+7.2}% ", stock.price_change_percent()), change_style),
            Span::styled(
                if qty > 0 { format!("{qty:>6}") } else { format!("{:>6}", "") },
                base,
            ),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
