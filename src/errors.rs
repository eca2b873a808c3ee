use derive_more::Display;

use crate::auth::errors::AuthError;

/// Why a form submission failed. Either kind ends that attempt.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum FormError {
    /// Signup password and confirmation differ, nothing was sent
    #[display(fmt = "Passwords do not match!")]
    PasswordMismatch,

    /// Message from the auth service, untouched
    #[display(fmt = "{}", _0)]
    Upstream(String),
}

impl std::error::Error for FormError {}

impl From<AuthError> for FormError {
    fn from(e: AuthError) -> Self {
        FormError::Upstream(e.message)
    }
}
