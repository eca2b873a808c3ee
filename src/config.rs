use std::path::PathBuf;

lazy_static::lazy_static! {
    pub static ref SUPABASE_URL: String = std::env::var("SUPABASE_URL").unwrap_or_else(|_| String::from("http://localhost:54321"));
    pub static ref SUPABASE_ANON_KEY: String = std::env::var("SUPABASE_ANON_KEY").unwrap_or_default();
    pub static ref HTTP_TIMEOUT_SECS: u64 = std::env::var("TAROT_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|secs| secs.parse().ok())
        .unwrap_or(30);
    pub static ref CREDENTIALS_PATH: Option<PathBuf> = std::env::var_os("TAROT_CREDENTIALS").map(PathBuf::from);
}
