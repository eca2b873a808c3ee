use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

use std::{
    path::Path,
    time::{Duration, Instant},
};

use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::{
    auth::AuthClient,
    form::{Field, Mode, NoticeKind},
    ui::app::{Action, App},
    utils::save_session,
};

/// Shows the login/signup form until the user quits.
///
/// Sessions handed out by the auth service are saved to `store` as soon as
/// they arrive.
pub fn run_form<C: AuthClient + ?Sized>(client: &C, mode: Mode, store: &Path) -> anyhow::Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();

    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(250);
    let mut app = App::new(mode);

    let res = run_app(&mut terminal, &mut app, client, store, tick_rate);

    // restore terminal
    disable_raw_mode()?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    terminal.show_cursor()?;

    res
}

/// Moves a freshly issued session from the form into the credentials file
fn persist_session(app: &mut App, store: &Path) -> anyhow::Result<()> {
    if let Some(session) = app.session.take() {
        save_session(store, &session)?;
    }

    Ok(())
}

fn run_app<B: Backend, C: AuthClient + ?Sized>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &C,
    store: &Path,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match app.handle_key(key) {
                    Action::Quit => return Ok(()),
                    Action::Submit => {
                        app.submit_with(client, |app| terminal.draw(|f| ui(f, app)).map(|_| ()))?;
                        persist_session(app, store)?;
                    }
                    Action::None => {}
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick(Instant::now());
            last_tick = Instant::now();
        }
    }
}

/// Rect of `percent_x` width centered horizontally in `area`
fn centered_rect(percent_x: u16, area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(area)[1]
}

fn draw_header<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let text = Text::from(vec![
        Spans::from(Span::styled(
            "Tarot Trader",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Spans::from(Span::styled(
            app.form.mode().subtitle(),
            Style::default().fg(Color::Gray),
        )),
    ]);

    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

/// The end of `text` that fits in `width` columns, leaving one for the cursor
fn visible_tail(text: &str, width: usize) -> &str {
    let keep = width.saturating_sub(1);
    let len = text.chars().count();

    if len <= keep {
        return text;
    }

    match text.char_indices().nth(len - keep) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}

fn draw_field<B: Backend>(f: &mut Frame<B>, app: &App, field: Field, area: Rect) {
    let value = app.form.field(field);
    let masked;
    let full = if field.is_secret() {
        masked = "*".repeat(value.chars().count());
        masked.as_str()
    } else {
        value
    };

    let inner_width = area.width.saturating_sub(2);
    let shown = visible_tail(full, inner_width as usize);

    let focused = app.focus == field;
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let input = Paragraph::new(shown).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} *", field.label()))
            .border_style(border_style),
    );

    f.render_widget(input, area);

    if focused && !app.form.is_loading() && inner_width > 0 {
        let offset = shown.chars().count().min(inner_width as usize - 1) as u16;
        f.set_cursor(area.x + 1 + offset, area.y + 1);
    }
}

fn draw_submit<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let mode = app.form.mode();

    let (label, style) = if app.form.is_loading() {
        (mode.loading_label(), Style::default().fg(Color::Gray))
    } else if app.form.can_submit() {
        (
            mode.submit_label(),
            Style::default()
                .fg(Color::White)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (mode.submit_label(), Style::default().fg(Color::DarkGray))
    };

    let button = Paragraph::new(Spans::from(Span::styled(label, style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(button, area);
}

fn draw_toggle<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let mode = app.form.mode();

    let text = Text::from(vec![
        Spans::from(vec![
            Span::raw(mode.toggle_prompt()),
            Span::raw(" "),
            Span::styled(
                mode.toggle_label(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" (Ctrl-T)"),
        ]),
        Spans::from(vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next field, "),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" submit, "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" quit"),
        ]),
    ]);

    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

// Draws the notice if one is showing
fn draw_notice<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let notice = match &app.notice {
        Some(active) => &active.notice,
        None => return,
    };

    let color = match notice.kind {
        NoticeKind::Success => Color::Green,
        NoticeKind::Error => Color::Red,
    };

    let paragraph = Paragraph::new(Spans::from(Span::styled(
        notice.description.as_str(),
        Style::default().fg(color),
    )))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(notice.title.as_str(), Style::default().fg(color)))
            .border_style(Style::default().fg(color)),
    );

    f.render_widget(paragraph, area);
}

fn ui<B: Backend>(f: &mut Frame<B>, app: &App) {
    let fields = app.form.visible_fields();

    let mut constraints = vec![Constraint::Length(3)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(centered_rect(60, f.size()));

    draw_header(f, app, chunks[0]);

    for (i, field) in fields.iter().enumerate() {
        draw_field(f, app, *field, chunks[i + 1]);
    }

    let rest = fields.len() + 1;
    draw_submit(f, app, chunks[rest]);
    draw_toggle(f, app, chunks[rest + 1]);
    draw_notice(f, app, chunks[rest + 2]);
}
