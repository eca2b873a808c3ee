use std::time::Duration;

use chrono::Utc;
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde_json::Value;

use crate::{
    config::{HTTP_TIMEOUT_SECS, SUPABASE_ANON_KEY, SUPABASE_URL},
    models::session_model::{Session, User},
    utils::make_auth_url,
};

use super::{
    dtos::{AuthResponse, Credentials},
    errors::AuthError,
    AuthClient, SessionClient,
};

/// Client for the Supabase Auth (GoTrue) REST API
pub struct SupabaseAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthClient {
    pub fn new<T: Into<String>>(
        base_url: T,
        anon_key: T,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self::with_client(base_url, anon_key, client))
    }

    pub fn with_client<T: Into<String>>(base_url: T, anon_key: T, client: Client) -> Self {
        SupabaseAuthClient {
            client,
            base_url: base_url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Build a client from `SUPABASE_URL` / `SUPABASE_ANON_KEY`
    pub fn from_config() -> Result<Self, AuthError> {
        if SUPABASE_ANON_KEY.is_empty() {
            log::warn!("SUPABASE_ANON_KEY is not set, requests will likely be rejected");
        }

        Self::new(
            SUPABASE_URL.as_str(),
            SUPABASE_ANON_KEY.as_str(),
            Duration::from_secs(*HTTP_TIMEOUT_SECS),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, resource: &str, bearer: &str) -> RequestBuilder {
        self.client
            .request(method, make_auth_url(&self.base_url, resource))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
            .header(CONTENT_TYPE, "application/json")
    }

    fn send_credentials(
        &self,
        resource: &str,
        credentials: &Credentials,
    ) -> Result<AuthResponse, AuthError> {
        log::debug!("POST {} for {}", resource, credentials.email);

        let response = self
            .request(reqwest::Method::POST, resource, &self.anon_key)
            .json(credentials)
            .send()?;

        let body = handle_response(response)?;

        parse_auth_response(&body)
    }
}

impl AuthClient for SupabaseAuthClient {
    fn sign_in_with_password(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        self.send_credentials("token?grant_type=password", credentials)
    }

    fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        self.send_credentials("signup", credentials)
    }
}

impl SessionClient for SupabaseAuthClient {
    fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "logout", access_token)
            .send()?;

        handle_response(response)?;

        Ok(())
    }

    fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        let response = self
            .request(reqwest::Method::GET, "user", access_token)
            .send()?;

        let body = handle_response(response)?;

        Ok(serde_json::from_str(&body)?)
    }
}

/// Body text of a 2xx response, the extracted error message otherwise
fn handle_response(response: Response) -> Result<String, AuthError> {
    let status = response.status();
    let body = response.text()?;

    if status.is_success() {
        Ok(body)
    } else {
        log::debug!("auth server answered {}: {}", status, body);
        Err(AuthError::from_response(status, &body))
    }
}

/// A body with an `access_token` is a session; otherwise the user sits either
/// under `user` or at the top level.
pub fn parse_auth_response(body: &str) -> Result<AuthResponse, AuthError> {
    let mut value: Value = serde_json::from_str(body)?;

    if value.get("access_token").is_some() {
        let session: Session = serde_json::from_value(value)?;
        let session = session.with_expiry_from(Utc::now());

        return Ok(AuthResponse {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user = match value.get_mut("user").map(Value::take) {
        Some(user) if !user.is_null() => user,
        _ => value,
    };

    Ok(AuthResponse {
        user: serde_json::from_value(user)?,
        session: None,
    })
}

#[cfg(test)]
mod supabase_test {
    use std::net::TcpListener;

    use reqwest::blocking::Client;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{parse_auth_response, SupabaseAuthClient};
    use crate::auth::{dtos::Credentials, errors::AuthError, AuthClient, SessionClient};
    use crate::models::session_model::User;

    const SESSION_BODY: &str = r#"{
        "access_token": "jwt-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-token",
        "user": {
            "id": "8d7e1c3a-2b4f-4e6a-9c1d-3f5a7b9c0d2e",
            "email": "a@b.com",
            "created_at": "2024-02-01T10:00:00.123456Z",
            "email_confirmed_at": "2024-02-01T10:05:00Z"
        }
    }"#;

    const PENDING_USER_BODY: &str = r#"{
        "id": "8d7e1c3a-2b4f-4e6a-9c1d-3f5a7b9c0d2e",
        "email": "new@b.com",
        "created_at": "2024-02-01T10:00:00Z",
        "email_confirmed_at": null
    }"#;

    fn json_response(status: u16, body: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "application/json")
    }

    /// Runs `call` against a fresh client on a blocking thread. The blocking
    /// reqwest client must be built and dropped outside the async runtime.
    async fn run_blocking<T, F>(base_url: String, call: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(&SupabaseAuthClient) -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let client = Client::builder().no_proxy().build().unwrap();
            let client = SupabaseAuthClient::with_client(base_url, String::from("anon-key"), client);
            call(&client)
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_parse_session_response() {
        let response = parse_auth_response(SESSION_BODY).unwrap();

        let session = response.session.unwrap();
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(session.expires_at.is_some(), true);
        assert_eq!(response.user.email.as_deref(), Some("a@b.com"));
        assert_eq!(response.user.is_confirmed(), true);
    }

    #[test]
    fn test_parse_pending_signup_response() {
        let response = parse_auth_response(PENDING_USER_BODY).unwrap();

        assert_eq!(response.session, None);
        assert_eq!(response.user.email.as_deref(), Some("new@b.com"));
        assert_eq!(response.user.is_confirmed(), false);

        let wrapped = format!(r#"{{"user": {}, "session": null}}"#, PENDING_USER_BODY);
        let response = parse_auth_response(&wrapped).unwrap();
        assert_eq!(response.user.email.as_deref(), Some("new@b.com"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sign_in_posts_to_token_endpoint() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(body_json(json!({"email": "a@b.com", "password": "p"})))
            .respond_with(json_response(200, SESSION_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = run_blocking(mock_server.uri(), |client| {
            client.sign_in_with_password(&Credentials::new("a@b.com", "p"))
        })
        .await
        .unwrap();

        assert_eq!(response.session.unwrap().access_token, "jwt-token");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sign_up_error_message_is_passed_through() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(header("apikey", "anon-key"))
            .respond_with(json_response(
                422,
                r#"{"code":422,"error_code":"weak_password","msg":"Password should be at least 6 characters."}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = run_blocking(mock_server.uri(), |client| {
            client.sign_up(&Credentials::new("a@b.com", "p"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.message, "Password should be at least 6 characters.");
        assert_eq!(err.status, Some(422));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_user_sends_access_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(json_response(200, PENDING_USER_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;

        let user: User = run_blocking(mock_server.uri(), |client| client.get_user("user-token"))
            .await
            .unwrap();

        assert_eq!(user.email.as_deref(), Some("new@b.com"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sign_out_revokes_user_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = run_blocking(mock_server.uri(), |client| client.sign_out("user-token")).await;

        assert_eq!(result, Ok(()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sign_out_with_stale_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(json_response(
                401,
                r#"{"code":401,"error_code":"bad_jwt","msg":"invalid JWT: token is expired"}"#,
            ))
            .mount(&mock_server)
            .await;

        let result = run_blocking(mock_server.uri(), |client| client.sign_out("stale")).await;

        assert_eq!(
            result,
            Err(AuthError {
                message: String::from("invalid JWT: token is expired"),
                status: Some(401),
            })
        );
    }

    #[test]
    fn test_unreachable_server_is_an_error() {
        // grab a free port, then close it so nothing listens there
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = SupabaseAuthClient::with_client(
            address,
            String::from("anon-key"),
            Client::builder().no_proxy().build().unwrap(),
        );
        let err = client
            .sign_in_with_password(&Credentials::new("a@b.com", "p"))
            .unwrap_err();

        assert_eq!(err.status, None);
        assert_eq!(err.message.is_empty(), false);
    }
}
