//! In-process identity provider: a complete `IdentityProvider` backed by an
//! in-memory account table with Argon2 password hashes. Backs the demo binary
//! and the integration tests; a deployment would swap in a remote provider
//! behind the same trait.

use std::collections::HashMap;
use std::time::Duration;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use base64::Engine;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use regex::Regex;
use tokio::sync::broadcast;
use tracing::info;

use crate::provider::{
    AuthFailure, AuthStateChange, ErrorCategory, IdentityProvider, ProfileUpdate, ProviderResult,
    UserHandle,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

// Minimum the provider accepts before reporting WeakPassword.
const MIN_PASSWORD_LEN: usize = 6;

fn gen_id() -> String {
    // 128-bit random id, base64url without padding
    let mut buf = [0u8; 16];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

fn hash_password(password: &str) -> ProviderResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AuthFailure::unknown(format!("SALT_FAILURE:{e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthFailure::unknown(format!("SALT_FAILURE:{e}")))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthFailure::unknown(format!("HASH_FAILURE:{e}")))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

#[derive(Debug, Clone)]
struct AccountRecord {
    id: String,
    display_name: String,
    email: String,
    password_phc: String,
    verified: bool,
    created_at: DateTime<Utc>,
    last_verification_sent: Option<DateTime<Utc>>,
}

impl AccountRecord {
    fn handle(&self) -> UserHandle {
        UserHandle {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            email_verified: self.verified,
        }
    }
}

pub struct MemoryProvider {
    // Keyed by lower-cased email.
    accounts: RwLock<HashMap<String, AccountRecord>>,
    // Email key of the signed-in account, if any.
    current: RwLock<Option<String>>,
    changes: broadcast::Sender<AuthStateChange>,
    verification_cooldown: Duration,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::with_verification_cooldown(Duration::from_secs(30))
    }

    /// Cooldown between verification emails to the same account; a dispatch
    /// inside the window reports `TooManyRequests`.
    pub fn with_verification_cooldown(cooldown: Duration) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            changes,
            verification_cooldown: cooldown,
        }
    }

    /// Insert an account directly, bypassing the sign-up path. Demo/test
    /// seeding only.
    pub fn seed(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
        verified: bool,
    ) -> ProviderResult<()> {
        let phc = hash_password(password)?;
        let record = AccountRecord {
            id: gen_id(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            password_phc: phc,
            verified,
            created_at: Utc::now(),
            last_verification_sent: None,
        };
        self.accounts.write().insert(email.to_lowercase(), record);
        Ok(())
    }

    /// Stand-in for the user clicking the emailed verification link.
    /// Returns false when the address is unknown.
    pub fn mark_verified(&self, email: &str) -> bool {
        let mut accounts = self.accounts.write();
        match accounts.get_mut(&email.to_lowercase()) {
            Some(record) => {
                record.verified = true;
                info!(target: "signon::provider", "email verified for {}", record.email);
                true
            }
            None => false,
        }
    }

    /// Sign the seeded account in without going through `sign_in`. Lets the
    /// demo and the resume tests start with a provider that already holds a
    /// session.
    pub fn restore_session(&self, email: &str) -> bool {
        let key = email.to_lowercase();
        if !self.accounts.read().contains_key(&key) {
            return false;
        }
        *self.current.write() = Some(key);
        true
    }

    fn check_credentials(email: &str, password: &str) -> ProviderResult<()> {
        if email.is_empty() {
            return Err(AuthFailure::new(ErrorCategory::MissingEmail, "MISSING_EMAIL"));
        }
        if password.is_empty() {
            return Err(AuthFailure::new(ErrorCategory::MissingPassword, "MISSING_PASSWORD"));
        }
        if !EMAIL_RE.is_match(email) {
            return Err(AuthFailure::new(ErrorCategory::InvalidEmail, "INVALID_EMAIL"));
        }
        Ok(())
    }

    fn find_by_id(&self, user_id: &str) -> Option<AccountRecord> {
        self.accounts.read().values().find(|r| r.id == user_id).cloned()
    }

    fn push(&self, change: AuthStateChange) {
        // No subscribers is fine; the send error just means nobody listens yet.
        let _ = self.changes.send(change);
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MemoryProvider {
    fn check_prerequisites(&self) -> ProviderResult<()> {
        // In-process storage has no runtime dependencies to resolve.
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<UserHandle> {
        Self::check_credentials(email, password)?;
        let key = email.to_lowercase();
        let handle = {
            let accounts = self.accounts.read();
            let Some(record) = accounts.get(&key) else {
                return Err(AuthFailure::new(ErrorCategory::UserNotFound, "EMAIL_NOT_FOUND"));
            };
            if !verify_password(&record.password_phc, password) {
                return Err(AuthFailure::new(ErrorCategory::WrongPassword, "INVALID_PASSWORD"));
            }
            record.handle()
        };
        *self.current.write() = Some(key);
        info!(target: "signon::provider", "sign-in ok user={}", handle.id);
        self.push(Some(handle.clone()));
        Ok(handle)
    }

    async fn create_account(&self, email: &str, password: &str) -> ProviderResult<UserHandle> {
        Self::check_credentials(email, password)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthFailure::new(ErrorCategory::WeakPassword, "WEAK_PASSWORD"));
        }
        let key = email.to_lowercase();
        let handle = {
            let mut accounts = self.accounts.write();
            if accounts.contains_key(&key) {
                return Err(AuthFailure::new(ErrorCategory::EmailAlreadyInUse, "EMAIL_EXISTS"));
            }
            let record = AccountRecord {
                id: gen_id(),
                display_name: String::new(),
                email: email.to_string(),
                password_phc: hash_password(password)?,
                verified: false,
                created_at: Utc::now(),
                last_verification_sent: None,
            };
            let handle = record.handle();
            info!(target: "signon::provider", "account created user={} at={}", handle.id, record.created_at);
            accounts.insert(key.clone(), record);
            handle
        };
        *self.current.write() = Some(key);
        self.push(Some(handle.clone()));
        Ok(handle)
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> ProviderResult<()> {
        let signed_in = self
            .current
            .read()
            .as_ref()
            .and_then(|key| self.accounts.read().get(key).map(|r| r.id.clone()));
        if signed_in.as_deref() != Some(user_id) {
            return Err(AuthFailure::new(ErrorCategory::SessionExpired, "NO_CURRENT_USER"));
        }
        let mut accounts = self.accounts.write();
        let Some(record) = accounts.values_mut().find(|r| r.id == user_id) else {
            return Err(AuthFailure::new(ErrorCategory::SessionExpired, "USER_GONE"));
        };
        if let Some(name) = update.display_name {
            record.display_name = name;
        }
        // photo_url is accepted and dropped; this provider stores no media.
        Ok(())
    }

    async fn send_verification_email(&self, user_id: &str) -> ProviderResult<()> {
        let now = Utc::now();
        let mut accounts = self.accounts.write();
        let Some(record) = accounts.values_mut().find(|r| r.id == user_id) else {
            return Err(AuthFailure::new(ErrorCategory::SessionExpired, "USER_GONE"));
        };
        if !EMAIL_RE.is_match(&record.email) {
            return Err(AuthFailure::new(
                ErrorCategory::InvalidRecipientEmail,
                "INVALID_RECIPIENT_EMAIL",
            ));
        }
        if let Some(last) = record.last_verification_sent {
            let elapsed = (now - last).to_std().unwrap_or_default();
            if elapsed < self.verification_cooldown {
                return Err(AuthFailure::new(
                    ErrorCategory::TooManyRequests,
                    "TOO_MANY_ATTEMPTS_TRY_LATER",
                ));
            }
        }
        record.last_verification_sent = Some(now);
        info!(target: "signon::provider", "verification email queued for {}", record.email);
        Ok(())
    }

    async fn reload(&self, user_id: &str) -> ProviderResult<UserHandle> {
        self.find_by_id(user_id)
            .map(|record| record.handle())
            .ok_or_else(|| AuthFailure::new(ErrorCategory::SessionExpired, "USER_GONE"))
    }

    fn current_user(&self) -> Option<UserHandle> {
        let current = self.current.read();
        let key = current.as_ref()?;
        self.accounts.read().get(key).map(|record| record.handle())
    }

    fn sign_out(&self) -> ProviderResult<()> {
        let had_session = self.current.write().take().is_some();
        if had_session {
            self.push(None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.changes.subscribe()
    }
}
