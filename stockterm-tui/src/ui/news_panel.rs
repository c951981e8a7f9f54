//! Panel 3 (News): feed with sentiment, newest first.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use stockterm_core::domain::{Impact, Qualitative};
use stockterm_core::news::MarketSentiment;
use stockterm_runner::Snapshot;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState, snap: &Snapshot) {
    let summary = snap.feed.summary();
    let sentiment_style = match summary.sentiment {
        MarketSentiment::Bullish => theme::positive(),
        MarketSentiment::Bearish => theme::negative(),
        MarketSentiment::Neutral => theme::neutral(),
    };

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled(
                format!("{} items, {} unread | sentiment ", summary.total, summary.unread),
                theme::muted(),
            ),
            Span::styled(summary.sentiment.to_string(), sentiment_style),
            Span::styled("  [j/k]scroll [f]refresh [g]generate", theme::muted()),
        ]),
        Line::from(""),
    ];

    if snap.feed.is_empty() {
        lines.push(Line::from(Span::styled(
            "No news yet. Press 'g' to generate or 'f' to fetch.",
            theme::muted(),
        )));
    }

    for news in snap.feed.items().skip(app.news_scroll) {
        let impact_style = match news.impact {
            Impact::Numeric(x) => theme::change(x),
            Impact::Qualitative(Qualitative::Positive) => theme::positive(),
            Impact::Qualitative(Qualitative::Negative) => theme::negative(),
            Impact::Qualitative(Qualitative::Neutral) => theme::neutral(),
        };
        let title_style = if news.is_read {
            theme::text()
        } else {
            theme::text().add_modifier(Modifier::BOLD)
        };
        let mut header = vec![
            Span::styled(format!("{} ", news.timestamp.format("%H:%M")), theme::muted()),
            Span::styled(format!("[{}] ", news.impact), impact_style),
            Span::styled(news.title.clone(), title_style),
        ];
        if news.is_real {
            let source = news.source.as_deref().unwrap_or("external");
            header.push(Span::styled(format!("  ({source})"), theme::neutral()));
        }
        lines.push(Line::from(header));
        if !news.affected_stocks.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("      affects: {}", news.affected_stocks.join(", ")),
                theme::accent(),
            )));
        }
        if !news.content.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("      {}", news.content),
                theme::muted(),
            )));
        }
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}
