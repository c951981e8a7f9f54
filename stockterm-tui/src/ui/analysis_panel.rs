//! Panel 4 (Analysis): indicators for the selected stock, plus news mentioning it.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use stockterm_core::indicators::{analyze, Trend, DEFAULT_SMA_PERIOD};
use stockterm_runner::Snapshot;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState, snap: &Snapshot) {
    let Some(stock) = snap.market.stocks().get(app.cursor) else {
        f.render_widget(
            Paragraph::new(Span::styled("No stock selected.", theme::muted())),
            area,
        );
        return;
    };
    let ta = analyze(stock);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled(format!("{} ", stock.symbol), theme::accent_bold()),
        Span::styled(format!("{}  ", stock.name), theme::text()),
        Span::styled(format!("${:.2} ", stock.price()), theme::text()),
        Span::styled(
            format!("({:+.2}%)", stock.price_change_percent()),
            theme::change(stock.price_change()),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        format!("  {} price points  [j/k] select stock", stock.history().len()),
        theme::muted(),
    )));
    lines.push(Line::from(""));

    match ta.sma20 {
        Some(sma) => {
            let above = stock.price() >= sma;
            metric(
                &mut lines,
                &format!("SMA({DEFAULT_SMA_PERIOD})"),
                format!("{sma:.2} (price {})", if above { "above" } else { "below" }),
                theme::change(stock.price() - sma),
            );
        }
        None => missing(&mut lines, &format!("SMA({DEFAULT_SMA_PERIOD})")),
    }
    match ta.rsi {
        Some(rsi) => {
            let note = if rsi > 70.0 {
                " overbought"
            } else if rsi < 30.0 {
                " oversold"
            } else {
                ""
            };
            metric(&mut lines, "RSI(14)", format!("{rsi:.1}{note}"), theme::rsi(rsi));
        }
        None => missing(&mut lines, "RSI(14)"),
    }
    let trend_style = match ta.trend {
        Trend::Bullish => theme::positive(),
        Trend::Bearish => theme::negative(),
        Trend::Sideways => theme::neutral(),
        Trend::InsufficientData => theme::muted(),
    };
    metric(&mut lines, "Trend", ta.trend.to_string(), trend_style);
    match ta.volatility {
        Some(vol) => metric(&mut lines, "Volatility (ann.)", format!("{vol:.2}%"), theme::warning()),
        None => missing(&mut lines, "Volatility"),
    }
    match ta.support_resistance {
        Some(levels) => {
            metric(&mut lines, "Support", format!("{:.2}", levels.support), theme::positive());
            metric(&mut lines, "Resistance", format!("{:.2}", levels.resistance), theme::negative());
        }
        None => missing(&mut lines, "Support / Resistance"),
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Related news", theme::accent_bold())));
    let related = snap.feed.for_stock(&stock.symbol);
    if related.is_empty() {
        lines.push(Line::from(Span::styled("  None", theme::muted())));
    }
    for news in related.into_iter().take(5) {
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", news.impact), theme::neutral()),
            Span::styled(news.title.clone(), theme::text()),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn metric(lines: &mut Vec<Line<'_>>, label: &str, value: String, style: Style) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {label:>20}: "), theme::muted()),
        Span::styled(value, style),
    ]));
}

fn missing(lines: &mut Vec<Line<'_>>, label: &str) {
    metric(lines, label, "not enough history".into(), theme::muted());
}
