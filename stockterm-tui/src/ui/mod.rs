//! Top-level UI layout: header line, active panel, status bar, overlays.

pub mod analysis_panel;
pub mod chart_panel;
pub mod help_panel;
pub mod leaderboard_panel;
pub mod market_panel;
pub mod news_panel;
pub mod overlays;
pub mod portfolio_panel;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Overlay, Panel};
use crate::theme;

pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], app);
    draw_panel(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);

    let main_area = chunks[1];
    match &app.overlay {
        Overlay::None => {}
        Overlay::Welcome => overlays::render_welcome(f, main_area),
        Overlay::Prompt(prompt) => overlays::render_prompt(f, main_area, prompt),
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::Sessions(sessions) => overlays::render_sessions(f, main_area, sessions),
    }
}

/// Player, cash and total value, update state.
fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled(" STOCKTERM ", theme::accent_bold())];
    if let Some(snap) = &app.snapshot {
        match snap.market.current_player() {
            Some(player) => {
                let v = player.valuation(snap.market.stocks());
                spans.push(Span::styled(format!("| {} ", player.name), theme::text()));
                spans.push(Span::styled(format!("cash ${:.2} ", v.cash), theme::muted()));
                spans.push(Span::styled(
                    format!("total ${:.2} ({:+.2}%) ", v.total_value, v.profit_percent),
                    theme::change(v.profit),
                ));
            }
            None => spans.push(Span::styled("| no player ", theme::warning())),
        }
        let (label, style) = if snap.price_updates {
            ("| LIVE ", theme::positive())
        } else {
            ("| PAUSED ", theme::warning())
        };
        spans.push(Span::styled(label, style));
        let unread = snap.feed.unread_count();
        if unread > 0 {
            spans.push(Span::styled(format!("| {unread} unread news "), theme::neutral()));
        }
        if snap.fetching_news {
            spans.push(Span::styled("| fetching news... ", theme::muted()));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(snap) = &app.snapshot else {
        f.render_widget(
            Paragraph::new(Span::styled("Waiting for market data...", theme::muted())),
            inner,
        );
        return;
    };

    match panel {
        Panel::Market => market_panel::render(f, inner, app, snap),
        Panel::Portfolio => portfolio_panel::render(f, inner, snap),
        Panel::News => news_panel::render(f, inner, app, snap),
        Panel::Analysis => analysis_panel::render(f, inner, app, snap),
        Panel::Chart => chart_panel::render(f, inner, app),
        Panel::Leaderboard => leaderboard_panel::render(f, inner, snap),
        Panel::Help => help_panel::render(f, inner),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use stockterm_core::market::Market;
    use stockterm_core::news::NewsFeed;
    use stockterm_runner::Snapshot;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn every_panel_renders_with_a_snapshot() {
        let mut market = Market::default();
        market.add_player("ada");
        market.buy("AAPL", 5).unwrap();
        let mut app = AppState::new();
        app.overlay = Overlay::None;
        app.apply_snapshot(Snapshot {
            market,
            feed: NewsFeed::default(),
            price_updates: false,
            fetching_news: false,
            seed: 7,
        });

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for i in 0..7 {
            app.active_panel = Panel::from_index(i).unwrap();
            terminal.draw(|f| draw(f, &app)).unwrap();
            let text = buffer_text(&terminal);
            assert!(text.contains(app.active_panel.label()));
            assert!(text.contains("PAUSED"));
        }
    }

    #[test]
    fn renders_before_first_snapshot() {
        let app = AppState::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Welcome"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("Apple Inc.", 20), "Apple Inc.");
        assert_eq!(truncate("Advanced Micro Devices", 8), "Advance.");
    }
}
