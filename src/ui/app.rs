use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    auth::AuthClient,
    form::{AuthForm, Field, Mode, Notice, Outcome},
    models::session_model::Session,
};

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Submit,
    Quit,
}

pub struct ActiveNotice {
    pub notice: Notice,
    pub shown_at: Instant,
}

impl ActiveNotice {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.notice.duration
    }
}

/// State of the terminal form: the form itself plus focus and the notice
/// currently on screen.
pub struct App {
    pub form: AuthForm,
    pub focus: Field,
    pub notice: Option<ActiveNotice>,
    /// Last session handed out by the auth service
    pub session: Option<Session>,
}

impl App {
    pub fn new(mode: Mode) -> App {
        App {
            form: AuthForm::new(mode),
            focus: Field::Email,
            notice: None,
            session: None,
        }
    }

    /// Drops the notice once its duration has run out
    pub fn on_tick(&mut self, now: Instant) {
        if self.notice.as_ref().map_or(false, |n| n.is_expired(now)) {
            self.notice = None;
        }
    }

    pub fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(ActiveNotice {
            notice,
            shown_at: Instant::now(),
        });
    }

    pub fn dismiss_notice(&mut self) -> bool {
        self.notice.take().is_some()
    }

    fn focus_offset(&mut self, offset: usize) {
        let fields = self.form.visible_fields();
        let current = fields.iter().position(|f| *f == self.focus).unwrap_or(0);

        self.focus = fields[(current + offset) % fields.len()];
    }

    pub fn focus_next(&mut self) {
        self.focus_offset(1);
    }

    pub fn focus_previous(&mut self) {
        let len = self.form.visible_fields().len();
        self.focus_offset(len - 1);
    }

    pub fn toggle_mode(&mut self) {
        self.form.toggle_mode();

        if !self.form.visible_fields().contains(&self.focus) {
            self.focus = Field::Password;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.form.is_loading() {
            return Action::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::Char('t') if ctrl => self.toggle_mode(),
            KeyCode::Esc => {
                if !self.dismiss_notice() {
                    return Action::Quit;
                }
            }
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            KeyCode::Enter => return Action::Submit,
            KeyCode::Backspace => {
                self.form.field_mut(self.focus).pop();
            }
            KeyCode::Char(c) if !ctrl => {
                self.form.field_mut(self.focus).push(c);
            }
            _ => {}
        }

        Action::None
    }

    /// Runs one submission. `before_send` is called after the form has gone
    /// into its loading state and before the request blocks.
    pub fn submit_with<C, F>(&mut self, client: &C, before_send: F) -> std::io::Result<()>
    where
        C: AuthClient + ?Sized,
        F: FnOnce(&App) -> std::io::Result<()>,
    {
        let submission = match self.form.begin_submit() {
            None => {
                if let Some(field) = self.form.missing_fields().first() {
                    self.focus = *field;
                }
                return Ok(());
            }
            Some(Err(e)) => {
                self.show_notice(e.into());
                return Ok(());
            }
            Some(Ok(submission)) => submission,
        };

        let drawn = before_send(self);

        let result = submission.send(client);
        let outcome = self.form.finish_submit(&submission, result);
        self.apply_outcome(outcome);

        drawn
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        if let Some(session) = outcome.response.and_then(|r| r.session) {
            self.session = Some(session);
        }

        self.show_notice(outcome.notice);
    }
}
