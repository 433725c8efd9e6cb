//! Identity-provider boundary: the async trait the session controller drives,
//! plus the shared outcome/error model every auth operation resolves to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Failure categories observed across provider operations. Each operation
/// recognizes a subset; everything else falls through to `Unknown` at
/// translation time. `MissingUsername` and `PasswordMismatch` are produced
/// client-side by the register pre-checks and never by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    MissingEmail,
    MissingPassword,
    MissingUsername,
    PasswordMismatch,
    InvalidEmail,
    WrongPassword,
    UserNotFound,
    InvalidRecipientEmail,
    EmailAlreadyInUse,
    WeakPassword,
    Cancelled,
    SessionExpired,
    TooManyRequests,
    Unknown,
}

/// Categorized failure of an auth operation. `raw_code` keeps the provider's
/// original identifier for diagnostics; it is never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("auth failure: {category:?} (raw={raw_code})")]
pub struct AuthFailure {
    pub category: ErrorCategory,
    pub raw_code: String,
}

impl AuthFailure {
    pub fn new<S: Into<String>>(category: ErrorCategory, raw_code: S) -> Self {
        Self { category, raw_code: raw_code.into() }
    }

    pub fn unknown<S: Into<String>>(raw_code: S) -> Self {
        Self::new(ErrorCategory::Unknown, raw_code)
    }
}

pub type ProviderResult<T> = Result<T, AuthFailure>;

/// Result of a controller-level operation: completed, or a categorized failure
/// that has already been translated and surfaced to the UI collaborator.
pub type AuthOutcome = Result<(), AuthFailure>;

/// Provider-side snapshot of an authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

/// Input bundle for login. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Input bundle for registration. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Profile fields a registration sets after account creation.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Push notification payload: the provider's current user, or `None` after a
/// provider-side sign-out (e.g. token revocation).
pub type AuthStateChange = Option<UserHandle>;

/// Remote identity provider. Long-running calls are async and resolve to a
/// categorized outcome; `sign_out` and the session reads are synchronous.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify runtime prerequisites before any auth call is attempted.
    fn check_prerequisites(&self) -> ProviderResult<()>;

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<UserHandle>;

    async fn create_account(&self, email: &str, password: &str) -> ProviderResult<UserHandle>;

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> ProviderResult<()>;

    async fn send_verification_email(&self, user_id: &str) -> ProviderResult<()>;

    /// Re-fetch the handle to pick up server-side changes (verification flag).
    async fn reload(&self, user_id: &str) -> ProviderResult<UserHandle>;

    /// Whatever session the provider currently holds, without interaction.
    fn current_user(&self) -> Option<UserHandle>;

    /// Provider-side sign-out. Failures are logged by callers, never surfaced.
    fn sign_out(&self) -> ProviderResult<()>;

    /// Subscribe to provider-pushed auth-state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;
}
