use std::path::Path;

use chrono::Utc;
use inquire::{Password, Text};

use crate::{
    auth::{AuthClient, SessionClient},
    form::{AuthForm, Field, Mode, Outcome},
    utils::{clear_session, load_session, save_session},
};

/// Prompt for credentials in `mode` and submit them once
pub fn prompt_auth<C: AuthClient + ?Sized>(
    mode: Mode,
    client: &C,
    store: &Path,
) -> anyhow::Result<()> {
    println!("{}", mode.subtitle());

    let mut form = AuthForm::new(mode);

    form.email = Text::new(Field::Email.label())
        .with_help_message("Enter Email")
        .prompt()?;

    form.password = Password::new(Field::Password.label()).prompt()?;

    if mode == Mode::Signup {
        form.confirm_password = Password::new(Field::ConfirmPassword.label()).prompt()?;
    }

    println!("{}", mode.loading_label());

    match form.submit(client) {
        Some(outcome) => {
            let message = report_outcome(outcome, store)?;
            println!("{}", message);
            Ok(())
        }
        None => {
            let missing: Vec<&str> = form
                .missing_fields()
                .into_iter()
                .map(Field::label)
                .collect();

            anyhow::bail!("Required: {}", missing.join(", "))
        }
    }
}

/// Stores any session and turns the notice into the line shown to the user.
/// Error notices come back as `Err` carrying the description unchanged.
fn report_outcome(outcome: Outcome, store: &Path) -> anyhow::Result<String> {
    let notice = outcome.notice;

    if notice.is_error() {
        anyhow::bail!(notice.description);
    }

    if let Some(session) = outcome.response.and_then(|r| r.session) {
        save_session(store, &session)?;
    }

    Ok(format!("{}: {}", notice.title, notice.description))
}

/// Revoke and forget the saved session. The local copy goes even when the
/// server refuses to revoke it.
pub fn logout<C: SessionClient + ?Sized>(client: &C, store: &Path) -> anyhow::Result<String> {
    let session = match load_session(store)? {
        Some(session) => session,
        None => return Ok(String::from("Not logged in")),
    };

    if let Err(e) = client.sign_out(&session.access_token) {
        log::warn!("sign out failed: {}", e);
    }

    clear_session(store)?;

    Ok(String::from("Logged out"))
}

/// Describe who the saved session belongs to
pub fn whoami<C: SessionClient + ?Sized>(client: &C, store: &Path) -> anyhow::Result<String> {
    let session = match load_session(store)? {
        Some(session) => session,
        None => return Ok(String::from("Not logged in")),
    };

    if session.is_expired(Utc::now()) {
        return Ok(String::from("Session expired, log in again"));
    }

    let user = client.get_user(&session.access_token)?;

    let mut message = format!(
        "{} ({})",
        user.email.as_deref().unwrap_or("<no email>"),
        user.id
    );

    if !user.is_confirmed() {
        message.push_str("\nEmail not confirmed yet");
    }

    Ok(message)
}
