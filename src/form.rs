use std::time::Duration;

use crate::{
    auth::{
        dtos::{AuthResponse, Credentials},
        errors::AuthError,
        AuthClient,
    },
    errors::FormError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Login,
    Signup,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Login
    }
}

impl Mode {
    pub fn toggled(self) -> Mode {
        match self {
            Mode::Login => Mode::Signup,
            Mode::Signup => Mode::Login,
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Mode::Login => "Sign in to your account",
            Mode::Signup => "Create a new account",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            Mode::Login => "Sign in",
            Mode::Signup => "Sign up",
        }
    }

    pub fn loading_label(self) -> &'static str {
        match self {
            Mode::Login => "Signing in...",
            Mode::Signup => "Signing up...",
        }
    }

    /// Text shown next to the control that switches mode
    pub fn toggle_prompt(self) -> &'static str {
        match self {
            Mode::Login => "Don't have an account?",
            Mode::Signup => "Already have an account?",
        }
    }

    pub fn toggle_label(self) -> &'static str {
        self.toggled().submit_label()
    }

    fn success_description(self) -> &'static str {
        match self {
            Mode::Login => "Logged in successfully!",
            Mode::Signup => "Account created! Please check your email to confirm your account.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Email => "Email address",
            Field::Password => "Password",
            Field::ConfirmPassword => "Confirm Password",
        }
    }

    pub fn is_secret(self) -> bool {
        !matches!(self, Field::Email)
    }
}

const LOGIN_FIELDS: &[Field] = &[Field::Email, Field::Password];
const SIGNUP_FIELDS: &[Field] = &[Field::Email, Field::Password, Field::ConfirmPassword];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient notification for the outcome of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
    pub duration: Duration,
}

impl Notice {
    pub fn success<T: Into<String>>(description: T) -> Self {
        Notice {
            kind: NoticeKind::Success,
            title: String::from("Success"),
            description: description.into(),
            duration: Duration::from_millis(3000),
        }
    }

    pub fn error<T: Into<String>>(description: T) -> Self {
        Notice {
            kind: NoticeKind::Error,
            title: String::from("Error"),
            description: description.into(),
            duration: Duration::from_millis(5000),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl From<FormError> for Notice {
    fn from(e: FormError) -> Self {
        Notice::error(e.to_string())
    }
}

/// A validated request, ready to go to the auth service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub mode: Mode,
    pub credentials: Credentials,
}

impl Submission {
    pub fn send<C: AuthClient + ?Sized>(&self, client: &C) -> Result<AuthResponse, AuthError> {
        match self.mode {
            Mode::Login => client.sign_in_with_password(&self.credentials),
            Mode::Signup => client.sign_up(&self.credentials),
        }
    }
}

/// Result of a finished submission
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub notice: Notice,
    pub response: Option<AuthResponse>,
}

impl From<FormError> for Outcome {
    fn from(e: FormError) -> Self {
        Outcome {
            notice: e.into(),
            response: None,
        }
    }
}

/// Login/signup form state. Field values survive mode switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    mode: Mode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    loading: bool,
}

impl AuthForm {
    pub fn new(mode: Mode) -> Self {
        AuthForm {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Fields rendered in the current mode, every one of them required
    pub fn visible_fields(&self) -> &'static [Field] {
        match self.mode {
            Mode::Login => LOGIN_FIELDS,
            Mode::Signup => SIGNUP_FIELDS,
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        self.visible_fields()
            .iter()
            .copied()
            .filter(|field| self.field(*field).is_empty())
            .collect()
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        !self.loading && self.missing_fields().is_empty()
    }

    /// Validates the form and marks it loading.
    ///
    /// `None` means the submit control is disabled (a request is in flight or
    /// a required field is empty) and nothing happened. A password mismatch
    /// in signup mode fails here, before anything is sent.
    pub fn begin_submit(&mut self) -> Option<Result<Submission, FormError>> {
        if !self.can_submit() {
            return None;
        }

        if self.mode == Mode::Signup && self.password != self.confirm_password {
            return Some(Err(FormError::PasswordMismatch));
        }

        self.loading = true;

        log::debug!("submitting {:?} for {}", self.mode, self.email);

        Some(Ok(Submission {
            mode: self.mode,
            credentials: Credentials::new(self.email.as_str(), self.password.as_str()),
        }))
    }

    /// Clears the loading flag and turns the service's answer into a notice
    pub fn finish_submit(
        &mut self,
        submission: &Submission,
        result: Result<AuthResponse, AuthError>,
    ) -> Outcome {
        self.loading = false;

        match result {
            Ok(response) => {
                log::info!("{:?} succeeded for {}", submission.mode, submission.credentials.email);

                Outcome {
                    notice: Notice::success(submission.mode.success_description()),
                    response: Some(response),
                }
            }
            Err(e) => {
                log::warn!("{:?} failed: {}", submission.mode, e);

                FormError::from(e).into()
            }
        }
    }

    /// Runs a whole submission against `client`
    pub fn submit<C: AuthClient + ?Sized>(&mut self, client: &C) -> Option<Outcome> {
        let submission = match self.begin_submit()? {
            Ok(submission) => submission,
            Err(e) => return Some(e.into()),
        };

        let result = submission.send(client);

        Some(self.finish_submit(&submission, result))
    }
}
