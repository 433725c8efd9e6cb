//! Session controller: owns the session value and the authentication phase
//! machine, serializes provider operations, and drives the UI and navigation
//! collaborators.
//!
//! Concurrency model: login/register/resume queue behind an async mutex so
//! two operations never race over the session; sign-out bypasses the queue,
//! cancels whatever is in flight and always completes. The session itself
//! lives behind one lock and is only ever replaced wholesale.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{watch, Mutex as AsyncMutex, Notify};
use tracing::{info, warn};

use crate::config::Config;
use crate::gate::VerificationGate;
use crate::provider::{
    AuthFailure, AuthOutcome, ErrorCategory, IdentityProvider, LoginRequest, ProfileUpdate,
    ProviderResult, RegisterRequest, UserHandle,
};
use crate::session::Session;
use crate::translate::{translate, AuthOp};
use crate::ui::{Navigator, OutputScope, UiSink};

/// Lifecycle phase. No terminal state; the machine cycles for the process
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Uninitialized,
    Resolving,
    SignedOut,
    AwaitingVerification,
    SignedIn,
}

// Raw codes for failures synthesized locally rather than by the provider.
const RAW_SIGNED_OUT: &str = "signed_out";
const RAW_DEADLINE: &str = "deadline_exceeded";
const RAW_PRECHECK: &str = "client_precheck";

struct AuthState {
    phase: AuthPhase,
    session: Option<Session>,
}

pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    ui: Arc<dyn UiSink>,
    nav: Arc<dyn Navigator>,
    gate: VerificationGate,
    config: Config,
    state: RwLock<AuthState>,
    // Serializes login/register/resume; sign-out never takes it.
    op_gate: AsyncMutex<()>,
    cancel: Notify,
    phase_tx: watch::Sender<AuthPhase>,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        ui: Arc<dyn UiSink>,
        nav: Arc<dyn Navigator>,
        config: Config,
    ) -> Self {
        let (phase_tx, _) = watch::channel(AuthPhase::Uninitialized);
        let gate = VerificationGate::new(provider.clone(), ui.clone(), config.op_timeout);
        Self {
            provider,
            ui,
            nav,
            gate,
            config,
            state: RwLock::new(AuthState { phase: AuthPhase::Uninitialized, session: None }),
            op_gate: AsyncMutex::new(()),
            cancel: Notify::new(),
            phase_tx,
        }
    }

    /// Snapshot of the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }

    pub fn phase(&self) -> AuthPhase {
        self.state.read().phase
    }

    /// Phase-change notifications for anything that wants to observe the
    /// lifecycle without polling.
    pub fn subscribe_phase(&self) -> watch::Receiver<AuthPhase> {
        self.phase_tx.subscribe()
    }

    /// Credential login. Input validation is delegated to the provider; raw
    /// values are forwarded as-is. Failure is translated with the
    /// login-scoped table and leaves the phase unchanged.
    pub async fn login(&self, req: &LoginRequest) -> AuthOutcome {
        let _serial = self.op_gate.lock().await;
        info!(target: "signon::auth", "login email={}", req.email);
        match self.guarded(self.provider.sign_in(&req.email, &req.password)).await {
            Ok(handle) => self.admit(handle).await,
            Err(failure) => {
                self.report_failure(OutputScope::Login, AuthOp::Login, &failure);
                Err(failure)
            }
        }
    }

    /// Account creation. Username and confirm-password are checked client
    /// side, in that order, before any provider call; the display-name write
    /// after a successful creation reports through the narrower
    /// profile-update message table.
    pub async fn register(&self, req: &RegisterRequest) -> AuthOutcome {
        let _serial = self.op_gate.lock().await;
        if req.username.is_empty() {
            let failure = AuthFailure::new(ErrorCategory::MissingUsername, RAW_PRECHECK);
            self.report_failure(OutputScope::Register, AuthOp::Register, &failure);
            return Err(failure);
        }
        if req.password != req.confirm_password {
            let failure = AuthFailure::new(ErrorCategory::PasswordMismatch, RAW_PRECHECK);
            self.report_failure(OutputScope::Register, AuthOp::Register, &failure);
            return Err(failure);
        }
        info!(target: "signon::auth", "register username={} email={}", req.username, req.email);
        let handle = match self
            .guarded(self.provider.create_account(&req.email, &req.password))
            .await
        {
            Ok(handle) => handle,
            Err(failure) => {
                self.report_failure(OutputScope::Register, AuthOp::Register, &failure);
                return Err(failure);
            }
        };
        // The account exists from here on; keep the session in step even if
        // the profile write below fails.
        self.replace_session(Some(Session::from_handle(&handle)));
        let update = ProfileUpdate { display_name: Some(req.username.clone()), photo_url: None };
        if let Err(failure) = self.guarded(self.provider.update_profile(&handle.id, update)).await {
            self.report_failure(OutputScope::Register, AuthOp::ProfileUpdate, &failure);
            return Err(failure);
        }
        let handle = UserHandle { display_name: req.username.clone(), ..handle };
        info!(target: "signon::auth", "account created user={} id={}", handle.display_name, handle.id);
        self.admit(handle).await
    }

    /// Resume whatever session the provider still holds, without user
    /// interaction. No stored credentials are consulted.
    pub async fn resume(&self) -> AuthOutcome {
        let _serial = self.op_gate.lock().await;
        self.set_phase(AuthPhase::Resolving);
        let Some(existing) = self.provider.current_user() else {
            self.replace_session(None);
            self.set_phase(AuthPhase::SignedOut);
            self.ui.show_login_form();
            return Ok(());
        };
        // Reload to pick up the latest verification status before admitting.
        match self.guarded(self.provider.reload(&existing.id)).await {
            Ok(handle) => self.admit(handle).await,
            Err(failure) => {
                warn!(target: "signon::auth", "resume reload failed: {}", failure);
                self.replace_session(None);
                self.set_phase(AuthPhase::SignedOut);
                self.ui.show_login_form();
                Err(failure)
            }
        }
    }

    /// Synchronous, unconditional sign-out. Local state is cleared first, any
    /// in-flight operation is cancelled, and the provider call is best-effort;
    /// nothing here is allowed to fail visibly.
    pub fn sign_out(&self) {
        self.replace_session(None);
        self.cancel.notify_waiters();
        if let Err(failure) = self.provider.sign_out() {
            warn!(target: "signon::auth", "provider sign-out failed (ignored): {}", failure);
        }
        self.set_phase(AuthPhase::SignedOut);
        self.ui.clear_outputs();
        self.nav.navigate_to(self.config.entry_scene);
        info!(target: "signon::auth", "signed out");
    }

    /// Provider-pushed auth-state change. Idempotent: a notification carrying
    /// the session we already hold (or absence on both sides) is a no-op, so
    /// the echo of a local sign-in/sign-out never double-fires.
    pub fn on_auth_state_changed(&self, current: Option<&UserHandle>) {
        enum Change {
            None,
            SignedOut,
            Replaced(String),
        }
        let change = {
            let mut st = self.state.write();
            let same = match (&st.session, current) {
                (Some(session), Some(handle)) => session.user_id == handle.id,
                (None, None) => true,
                _ => false,
            };
            if same {
                Change::None
            } else if let Some(handle) = current {
                st.session = Some(Session::from_handle(handle));
                Change::Replaced(handle.id.clone())
            } else {
                st.session = None;
                Change::SignedOut
            }
        };
        match change {
            Change::None => {}
            Change::Replaced(id) => {
                info!(target: "signon::auth", "provider pushed sign-in id={}", id);
            }
            Change::SignedOut => {
                info!(target: "signon::auth", "provider pushed sign-out");
                self.set_phase(AuthPhase::SignedOut);
                self.nav.navigate_to(self.config.entry_scene);
            }
        }
    }

    /// Admit a provider handle: replace the session, then either hand off to
    /// the application (verified) or enter the verification gate.
    async fn admit(&self, handle: UserHandle) -> AuthOutcome {
        let session = Session::from_handle(&handle);
        self.replace_session(Some(session.clone()));
        if session.email_verified {
            self.set_phase(AuthPhase::SignedIn);
            info!(target: "signon::auth", "signed in user={} ({})", session.display_name, session.user_id);
            self.nav.navigate_to(self.config.home_scene);
        } else {
            self.set_phase(AuthPhase::AwaitingVerification);
            // Dispatch failure is reported by the gate but never reverts the
            // transition.
            let _ = self.gate.send(Some(&session)).await;
        }
        Ok(())
    }

    /// Run one provider call with the configured timeout, racing a sign-out.
    /// Sign-out always wins; timeout expiry resolves as `Cancelled` instead
    /// of hanging.
    async fn guarded<T>(&self, call: impl Future<Output = ProviderResult<T>>) -> ProviderResult<T> {
        let mut cancelled = pin!(self.cancel.notified());
        // Register interest before polling the call so a sign-out racing the
        // operation start is not missed.
        cancelled.as_mut().enable();
        tokio::select! {
            biased;
            _ = &mut cancelled => Err(AuthFailure::new(ErrorCategory::Cancelled, RAW_SIGNED_OUT)),
            result = tokio::time::timeout(self.config.op_timeout, call) => match result {
                Ok(result) => result,
                Err(_) => Err(AuthFailure::new(ErrorCategory::Cancelled, RAW_DEADLINE)),
            },
        }
    }

    fn report_failure(&self, scope: OutputScope, op: AuthOp, failure: &AuthFailure) {
        warn!(target: "signon::auth", "{:?} failed: {}", op, failure);
        // An operation abandoned by a local sign-out gets no user feedback;
        // the user asked to leave.
        if failure.raw_code == RAW_SIGNED_OUT {
            return;
        }
        self.ui.set_output_text(scope, translate(op, failure.category));
    }

    fn replace_session(&self, next: Option<Session>) {
        // Wholesale replacement only; fields are never mutated in place.
        self.state.write().session = next;
    }

    fn set_phase(&self, next: AuthPhase) {
        let prev = {
            let mut st = self.state.write();
            std::mem::replace(&mut st.phase, next)
        };
        if prev != next {
            info!(target: "signon::auth", "phase {:?} -> {:?}", prev, next);
            let _ = self.phase_tx.send(next);
        }
    }
}
