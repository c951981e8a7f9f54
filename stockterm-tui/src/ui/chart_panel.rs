//! Panel 5 (Chart): price history of the selected stock with its SMA(20).

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use stockterm_core::indicators::{sma, DEFAULT_SMA_PERIOD};

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    match app.selected_stock() {
        Some(stock) if stock.history().len() >= 2 => {
            let label = format!("{} ${:.2}", stock.symbol, stock.price());
            render_chart(f, area, stock.history(), &label);
        }
        Some(stock) => render_empty(f, area, &stock.symbol),
        None => render_empty(f, area, "-"),
    }
}

fn render_empty(f: &mut Frame, area: Rect, symbol: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Not enough price history for {symbol} yet."),
            theme::muted(),
        )),
        Line::from(Span::styled(
            "Prices update every few seconds while updates are running ('r').",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// Rolling SMA aligned to the history index; starts once the window fills.
fn sma_points(history: &[f64], period: usize) -> Vec<(f64, f64)> {
    (period..=history.len())
        .filter_map(|end| sma(&history[..end], period).map(|v| ((end - 1) as f64, v)))
        .collect()
}

fn render_chart(f: &mut Frame, area: Rect, history: &[f64], label: &str) {
    let min_y = history.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let padding = ((max_y - min_y).abs() * 0.05).max(0.01);
    let y_min = min_y - padding;
    let y_max = max_y + padding;
    let x_max = history.len().saturating_sub(1) as f64;

    let prices: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();
    let averages = sma_points(history, DEFAULT_SMA_PERIOD);

    let mut datasets = vec![Dataset::default()
        .name(label)
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(theme::ACCENT))
        .graph_type(GraphType::Line)
        .data(&prices)];
    if !averages.is_empty() {
        datasets.push(
            Dataset::default()
                .name(format!("SMA({DEFAULT_SMA_PERIOD})"))
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(theme::NEUTRAL))
                .graph_type(GraphType::Line)
                .data(&averages),
        );
    }

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title(Span::styled("Ticks", theme::muted()))
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled("0", theme::muted()),
                    Span::styled(format!("{}", history.len()), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Price", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.2}"), theme::muted()),
                    Span::styled(format!("{y_max:.2}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
