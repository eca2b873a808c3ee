use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{config::CREDENTIALS_PATH, models::session_model::Session};

pub fn make_auth_url(base_url: &str, resource: &str) -> String {
    format!("{}/auth/v1/{}", base_url.trim_end_matches('/'), resource)
}

/// Where the session is kept, `~/tarot/credentials` unless `TAROT_CREDENTIALS` says otherwise
pub fn credentials_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = CREDENTIALS_PATH.as_ref() {
        return Ok(path.clone());
    }

    let mut path = dirs::home_dir().context("Could not locate home directory")?;
    path.push("tarot");
    path.push("credentials");

    Ok(path)
}

/// Saves the auth session, replacing whatever was stored before
pub fn save_session(path: &Path, session: &Session) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Could not open {}", path.display()))?;

    file.write_all(serde_json::to_string(session)?.as_bytes())?;

    log::debug!("session saved to {}", path.display());

    Ok(())
}

/// Get the saved session, if any
pub fn load_session(path: &Path) -> anyhow::Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)?;

    let session = serde_json::from_str(&contents)
        .with_context(|| format!("Corrupt credentials file {}", path.display()))?;

    Ok(Some(session))
}

/// Removes the saved session. Returns whether there was one.
pub fn clear_session(path: &Path) -> anyhow::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    std::fs::remove_file(path)?;

    Ok(true)
}

#[cfg(test)]
mod utils_test {
    use super::{clear_session, load_session, make_auth_url, save_session};
    use crate::models::session_model::{Session, User};

    fn session() -> Session {
        Session {
            access_token: String::from("randombytesisthe"),
            token_type: String::from("bearer"),
            expires_in: 3600,
            expires_at: Some(1_700_003_600),
            refresh_token: String::from("refresh"),
            user: User {
                id: uuid::Uuid::nil(),
                email: Some(String::from("a@b.com")),
                created_at: None,
                email_confirmed_at: None,
            },
        }
    }

    #[test]
    fn test_make_auth_url() {
        assert_eq!(
            make_auth_url("http://localhost:54321", "signup"),
            String::from("http://localhost:54321/auth/v1/signup")
        );
        assert_eq!(
            make_auth_url("https://abc.supabase.co/", "token?grant_type=password"),
            String::from("https://abc.supabase.co/auth/v1/token?grant_type=password")
        );
    }

    #[test]
    fn test_session_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tarot").join("credentials");

        assert_eq!(load_session(&path).unwrap(), None);

        save_session(&path, &session()).unwrap();
        assert_eq!(load_session(&path).unwrap(), Some(session()));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.contains("randombytesisthe"), true);

        assert_eq!(clear_session(&path).unwrap(), true);
        assert_eq!(clear_session(&path).unwrap(), false);
        assert_eq!(load_session(&path).unwrap(), None);
    }

    #[test]
    fn test_corrupt_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(&path, "{\"token\":").unwrap();

        assert_eq!(load_session(&path).is_err(), true);
    }
}
