//! Panel 2 (Portfolio): valuation, diversification, risk, recent trades.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use stockterm_core::domain::TradeSide;
use stockterm_core::ledger::DiversificationScore;
use stockterm_runner::Snapshot;

use crate::theme;
use crate::ui::truncate;

pub fn render(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let stocks = snap.market.stocks();
    let Some(player) = snap.market.current_player() else {
        f.render_widget(
            Paragraph::new(Span::styled(
                "No active player. Press 'a' to add one.",
                theme::muted(),
            )),
            area,
        );
        return;
    };

    let v = player.valuation(stocks);
    let risk = player.risk_metrics(stocks);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        format!("Player: {}", player.name),
        theme::accent_bold(),
    )));
    value_line(&mut lines, "Cash", format!("${:.2}", v.cash), theme::text());
    value_line(&mut lines, "Portfolio", format!("${:.2}", v.portfolio_value), theme::text());
    value_line(&mut lines, "Total", format!("${:.2}", v.total_value), theme::accent());
    value_line(
        &mut lines,
        "Profit",
        format!("${:.2} ({:+.2}%)", v.profit, v.profit_percent),
        theme::change(v.profit),
    );
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Risk", theme::accent_bold())));
    value_line(&mut lines, "Positions", risk.total_positions.to_string(), theme::text());
    value_line(
        &mut lines,
        "Concentration",
        format!("{:.1}%", risk.concentration_risk),
        if risk.concentration_risk > 50.0 {
            theme::warning()
        } else {
            theme::text()
        },
    );
    let (label, style) = match risk.diversification_score {
        DiversificationScore::WellDiversified => ("well diversified", theme::positive()),
        DiversificationScore::ModeratelyDiversified => ("moderately diversified", theme::neutral()),
        DiversificationScore::Concentrated => ("concentrated", theme::warning()),
    };
    value_line(&mut lines, "Diversification", label.to_string(), style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        format!(
            "{:<6} {:<22} {:>6} {:>12} {:>7}",
            "Symbol", "Name", "Qty", "Value", "Share"
        ),
        theme::accent_bold(),
    )));
    let breakdown = player.diversification(stocks);
    if breakdown.is_empty() {
        lines.push(Line::from(Span::styled("  No holdings", theme::muted())));
    }
    for h in &breakdown {
        lines.push(Line::from(Span::styled(
            format!(
                "{:<6} {:<22} {:>6} {:>12.2} {:>6.1}%",
                h.symbol,
                truncate(&h.name, 22),
                h.quantity,
                h.value,
                h.percentage
            ),
            theme::text(),
        )));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Recent transactions", theme::accent_bold())));
    let recent = player.recent_transactions(10);
    if recent.is_empty() {
        lines.push(Line::from(Span::styled("  None yet", theme::muted())));
    }
    for t in recent {
        let side_style = match t.kind {
            TradeSide::Buy => theme::positive(),
            TradeSide::Sell => theme::negative(),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", t.timestamp.format("%H:%M:%S")), theme::muted()),
            Span::styled(format!("{:<4} ", t.kind.label().to_uppercase()), side_style),
            Span::styled(
                format!("{:>5} {:<6} @ ${:.2} = ${:.2}", t.quantity, t.symbol, t.price, t.total),
                theme::text(),
            ),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn value_line(lines: &mut Vec<Line<'_>>, label: &str, value: String, style: ratatui::style::Style) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {label:>16}: "), theme::muted()),
        Span::styled(value, style),
    ]));
}
