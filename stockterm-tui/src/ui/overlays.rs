//! Overlay widgets: welcome, text prompt, error history, session list.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use stockterm_runner::SessionInfo;

use crate::app::{AppState, Prompt};
use crate::theme;
use crate::ui::centered_rect;

pub fn render_welcome(f: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 50, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Welcome to Stockterm ")
        .title_style(theme::accent_bold());

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Getting started:", theme::accent_bold())),
        Line::from(""),
        Line::from(Span::styled("  1. Press a to create a player", theme::muted())),
        Line::from(Span::styled("  2. Move with j/k and press b to buy", theme::muted())),
        Line::from(Span::styled("  3. Watch the news: it moves prices", theme::muted())),
        Line::from(Span::styled("  4. Press ? for all keys", theme::muted())),
        Line::from(""),
        Line::from(Span::styled("Press any key to dismiss...", theme::neutral())),
    ];

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

pub fn render_prompt(f: &mut Frame, area: Rect, prompt: &Prompt) {
    let popup = centered_rect(50, 25, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(format!(" {} [Enter]ok [Esc]cancel ", prompt.kind.title()))
        .title_style(theme::accent_bold());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut text = vec![Line::from("")];
    if let Some(hint) = &prompt.hint {
        text.push(Line::from(Span::styled(hint.as_str(), theme::muted())));
        text.push(Line::from(""));
    }
    text.push(Line::from(vec![
        Span::styled("> ", theme::accent()),
        Span::styled(prompt.input.as_str(), theme::accent_bold()),
        Span::styled("_", theme::accent()),
    ]));

    f.render_widget(Paragraph::new(text), inner);
}

pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No errors recorded.", theme::muted())),
            inner,
        );
        return;
    }

    let lines: Vec<Line> = app
        .error_history
        .iter()
        .enumerate()
        .skip(app.error_scroll)
        .take(inner.height as usize)
        .map(|(i, err)| {
            let style = if i == app.error_scroll {
                theme::negative().add_modifier(Modifier::BOLD)
            } else {
                theme::muted()
            };
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", err.timestamp.format("%H:%M:%S")),
                    theme::muted(),
                ),
                Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
                Span::styled(err.message.as_str(), style),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

pub fn render_sessions(f: &mut Frame, area: Rect, sessions: &[SessionInfo]) {
    let popup = centered_rect(60, 50, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(format!(" Saved Sessions ({}) [any key]close ", sessions.len()))
        .title_style(theme::accent_bold());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if sessions.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No saved sessions.", theme::muted())),
            inner,
        );
        return;
    }

    let lines: Vec<Line> = sessions
        .iter()
        .map(|s| {
            Line::from(vec![
                Span::styled(format!("  {:<24} ", s.name), theme::accent()),
                Span::styled(
                    format!(
                        "{}  {} player(s)",
                        s.saved_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                        s.players
                    ),
                    theme::muted(),
                ),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}
