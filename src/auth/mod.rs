pub mod dtos;
pub mod errors;
pub mod supabase;

use self::{
    dtos::{AuthResponse, Credentials},
    errors::AuthError,
};
use crate::models::session_model::User;

/// The two operations the form needs from the hosted auth service
pub trait AuthClient {
    fn sign_in_with_password(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError>;

    fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError>;
}

/// Calls made on behalf of an already signed in user
pub trait SessionClient {
    /// Revoke the session behind `access_token`
    fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Fetch the user that owns `access_token`
    fn get_user(&self, access_token: &str) -> Result<User, AuthError>;
}
