//! Keyboard input dispatch: overlays then global keys then panel-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use stockterm_runner::Command;

use crate::app::{
    parse_export_format, parse_quantity, resolve_symbol, AppState, ErrorCategory, Overlay, Panel,
    Prompt, PromptKind, Request,
};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.running = false;
        return;
    }

    // 1. Overlays consume input first.
    match &mut app.overlay {
        Overlay::None => {}
        Overlay::Welcome | Overlay::Sessions(_) => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::Prompt(prompt) => {
            match key.code {
                KeyCode::Esc => app.overlay = Overlay::None,
                KeyCode::Enter => {
                    let prompt = prompt.clone();
                    app.overlay = Overlay::None;
                    submit_prompt(app, prompt);
                }
                KeyCode::Backspace => {
                    prompt.input.pop();
                }
                KeyCode::Char(c) => prompt.input.push(c),
                _ => {}
            }
            return;
        }
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char(c @ '1'..='7') => {
            if let Some(panel) = Panel::from_index(c as usize - '1' as usize) {
                app.active_panel = panel;
            }
        }
        KeyCode::Tab => app.active_panel = app.active_panel.next(),
        KeyCode::BackTab => app.active_panel = app.active_panel.prev(),

        KeyCode::Char('b') => open_symbol_prompt(app, PromptKind::BuySymbol),
        KeyCode::Char('s') => open_symbol_prompt(app, PromptKind::SellSymbol),
        KeyCode::Char('a') => app.overlay = Overlay::Prompt(Prompt::new(PromptKind::AddPlayer)),
        KeyCode::Char('w') => {
            let names = app
                .snapshot
                .as_ref()
                .map(|s| {
                    s.market
                        .players()
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            if names.is_empty() {
                app.set_warning("No players yet. Press 'a' to add one.");
            } else {
                app.overlay = Overlay::Prompt(
                    Prompt::new(PromptKind::SwitchPlayer).with_hint(format!("Players: {names}")),
                );
            }
        }
        KeyCode::Char('e') => {
            if current_player_name(app).is_none() {
                app.set_warning("No active player to export.");
            } else {
                app.overlay = Overlay::Prompt(Prompt::new(PromptKind::ExportFormat));
            }
        }

        KeyCode::Char('n') => {
            app.active_panel = Panel::News;
            app.news_scroll = 0;
            app.request(Command::MarkAllRead);
        }
        KeyCode::Char('m') => app.active_panel = Panel::Market,
        KeyCode::Char('p') => app.active_panel = Panel::Portfolio,
        KeyCode::Char('t') => app.active_panel = Panel::Analysis,
        KeyCode::Char('c') => app.active_panel = Panel::Chart,
        KeyCode::Char('l') => app.active_panel = Panel::Leaderboard,
        KeyCode::Char('?') => app.active_panel = Panel::Help,

        KeyCode::Char('r') => app.requests.push(Request::TogglePriceUpdates),
        KeyCode::Char('f') => {
            app.request(Command::RefreshNews);
            app.set_status("Refreshing news...");
        }
        KeyCode::Char('g') => app.request(Command::GenerateNews),

        KeyCode::Char('S') => app.request(Command::Save),
        KeyCode::Char('v') => app.overlay = Overlay::Prompt(Prompt::new(PromptKind::SaveSession)),
        KeyCode::Char('o') => app.overlay = Overlay::Prompt(Prompt::new(PromptKind::LoadSession)),
        KeyCode::Char('x') => {
            app.overlay = Overlay::Prompt(Prompt::new(PromptKind::DeleteSession))
        }
        KeyCode::Char('L') => app.request(Command::ListSessions),
        KeyCode::Char('B') => app.request(Command::Backup),
        KeyCode::Char('E') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
        }

        _ => handle_panel_key(app, key),
    }
}

fn handle_panel_key(app: &mut AppState, key: KeyEvent) {
    match app.active_panel {
        Panel::News => match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let len = app.snapshot.as_ref().map(|s| s.feed.len()).unwrap_or(0);
                if app.news_scroll + 1 < len {
                    app.news_scroll += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.news_scroll = app.news_scroll.saturating_sub(1);
            }
            _ => {}
        },
        _ => match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if app.cursor + 1 < app.stocks().len() {
                    app.cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.cursor = app.cursor.saturating_sub(1);
            }
            _ => {}
        },
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('E') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn current_player_name(app: &AppState) -> Option<&str> {
    app.snapshot
        .as_ref()
        .and_then(|s| s.market.current_player())
        .map(|p| p.name.as_str())
}

fn open_symbol_prompt(app: &mut AppState, kind: PromptKind) {
    if current_player_name(app).is_none() {
        app.set_warning("No active player. Press 'a' to add one.");
        return;
    }
    let hint = app
        .selected_stock()
        .map(|s| format!("Enter for selected: {} (${:.2})", s.symbol, s.price()));
    let mut prompt = Prompt::new(kind);
    prompt.hint = hint;
    app.overlay = Overlay::Prompt(prompt);
}

/// Symbol from prompt input; empty input means the highlighted row.
fn prompt_symbol(app: &mut AppState, input: &str) -> Option<String> {
    let symbol = if input.trim().is_empty() {
        app.selected_stock().map(|s| s.symbol.clone())
    } else {
        resolve_symbol(input, app.stocks())
    };
    if symbol.is_none() {
        app.push_error(ErrorCategory::Trade, format!("Unknown stock '{}'", input.trim()));
    }
    symbol
}

fn submit_prompt(app: &mut AppState, prompt: Prompt) {
    let input = prompt.input.trim().to_string();
    match prompt.kind {
        PromptKind::BuySymbol => {
            let Some(symbol) = prompt_symbol(app, &input) else {
                return;
            };
            let hint = trade_limits(app, &symbol).map(|(price, max, _)| {
                format!("Price ${price:.2} | max affordable: {max}")
            });
            let mut next = Prompt::new(PromptKind::BuyQuantity { symbol });
            next.hint = hint;
            app.overlay = Overlay::Prompt(next);
        }
        PromptKind::SellSymbol => {
            let Some(symbol) = prompt_symbol(app, &input) else {
                return;
            };
            let held = trade_limits(app, &symbol).map(|(_, _, held)| held).unwrap_or(0);
            if held == 0 {
                app.set_warning(format!("You don't own any {symbol}"));
                return;
            }
            app.overlay = Overlay::Prompt(
                Prompt::new(PromptKind::SellQuantity { symbol }).with_hint(format!("Held: {held}")),
            );
        }
        PromptKind::BuyQuantity { symbol } => {
            let max = trade_limits(app, &symbol).map(|(_, max, _)| max).unwrap_or(0);
            match parse_quantity(&input, max) {
                Some(quantity) => app.request(Command::Buy { symbol, quantity }),
                None => app.push_error(ErrorCategory::Trade, format!("Invalid quantity '{input}'")),
            }
        }
        PromptKind::SellQuantity { symbol } => {
            let held = trade_limits(app, &symbol).map(|(_, _, held)| held).unwrap_or(0);
            match parse_quantity(&input, held) {
                Some(quantity) => app.request(Command::Sell { symbol, quantity }),
                None => app.push_error(ErrorCategory::Trade, format!("Invalid quantity '{input}'")),
            }
        }
        PromptKind::ExportFormat => match parse_export_format(&input) {
            Some(format) => app.request(Command::Export(format)),
            None => app.set_warning(format!("Unknown export format '{input}'")),
        },
        kind => {
            if input.is_empty() {
                app.set_warning("Name cannot be empty");
                return;
            }
            let command = match kind {
                PromptKind::AddPlayer => Command::AddPlayer(input),
                PromptKind::SwitchPlayer => Command::SwitchPlayer(input),
                PromptKind::SaveSession => Command::SaveSession(input),
                PromptKind::LoadSession => Command::LoadSession(input),
                _ => Command::DeleteSession(input),
            };
            app.request(command);
        }
    }
}

/// (price, max affordable, held) for the current player and `symbol`.
fn trade_limits(app: &AppState, symbol: &str) -> Option<(f64, u64, u64)> {
    let market = &app.snapshot.as_ref()?.market;
    let stock = market.stock(symbol)?;
    let player = market.current_player()?;
    Some((stock.price(), player.max_affordable(stock), player.quantity_of(symbol)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use stockterm_core::market::Market;
    use stockterm_core::news::NewsFeed;
    use stockterm_runner::Snapshot;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_str(app: &mut AppState, s: &str) {
        for c in s.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    fn app_with_player() -> AppState {
        let mut market = Market::default();
        market.add_player("ada");
        let mut app = AppState::new();
        app.overlay = Overlay::None;
        app.apply_snapshot(Snapshot {
            market,
            feed: NewsFeed::default(),
            price_updates: true,
            fetching_news: false,
            seed: 1,
        });
        app
    }

    #[test]
    fn welcome_dismisses_on_any_key() {
        let mut app = AppState::new();
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.overlay, Overlay::None);
        assert!(app.running);
    }

    #[test]
    fn buy_flow_by_row_number() {
        let mut app = app_with_player();
        handle_key(&mut app, press(KeyCode::Char('b')));
        type_str(&mut app, "3");
        handle_key(&mut app, press(KeyCode::Enter));
        match &app.overlay {
            Overlay::Prompt(p) => {
                assert_eq!(p.kind, PromptKind::BuyQuantity { symbol: "MSFT".into() });
                assert!(p.hint.as_deref().unwrap().contains("max affordable: 33"));
            }
            other => panic!("expected quantity prompt, got {other:?}"),
        }
        type_str(&mut app, "5");
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(
            app.requests,
            vec![Request::Engine(Command::Buy {
                symbol: "MSFT".into(),
                quantity: 5
            })]
        );
    }

    #[test]
    fn buy_with_empty_symbol_uses_selection() {
        let mut app = app_with_player();
        handle_key(&mut app, press(KeyCode::Down));
        handle_key(&mut app, press(KeyCode::Char('b')));
        handle_key(&mut app, press(KeyCode::Enter));
        type_str(&mut app, "max");
        handle_key(&mut app, press(KeyCode::Enter));
        // GOOGL at 2800 from 10000 cash.
        assert_eq!(
            app.requests,
            vec![Request::Engine(Command::Buy {
                symbol: "GOOGL".into(),
                quantity: 3
            })]
        );
    }

    #[test]
    fn sell_without_holdings_warns() {
        let mut app = app_with_player();
        handle_key(&mut app, press(KeyCode::Char('s')));
        type_str(&mut app, "aapl");
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.overlay, Overlay::None);
        assert!(app.requests.is_empty());
        assert!(app.status_message.as_ref().unwrap().0.contains("AAPL"));
    }

    #[test]
    fn unknown_symbol_is_recorded() {
        let mut app = app_with_player();
        handle_key(&mut app, press(KeyCode::Char('b')));
        type_str(&mut app, "nope");
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.error_history.len(), 1);
        assert!(app.requests.is_empty());
    }

    #[test]
    fn trading_requires_a_player() {
        let mut app = AppState::new();
        app.overlay = Overlay::None;
        handle_key(&mut app, press(KeyCode::Char('b')));
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn add_player_and_toggle() {
        let mut app = AppState::new();
        app.overlay = Overlay::None;
        handle_key(&mut app, press(KeyCode::Char('a')));
        type_str(&mut app, "grace");
        handle_key(&mut app, press(KeyCode::Enter));
        handle_key(&mut app, press(KeyCode::Char('r')));
        assert_eq!(
            app.requests,
            vec![
                Request::Engine(Command::AddPlayer("grace".into())),
                Request::TogglePriceUpdates,
            ]
        );
    }

    #[test]
    fn escape_cancels_prompt() {
        let mut app = app_with_player();
        handle_key(&mut app, press(KeyCode::Char('v')));
        type_str(&mut app, "abc");
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.overlay, Overlay::None);
        assert!(app.requests.is_empty());
    }

    #[test]
    fn digits_switch_panels_and_q_quits() {
        let mut app = app_with_player();
        handle_key(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.active_panel, Panel::News);
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_panel, Panel::Analysis);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }
}
