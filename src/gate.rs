//! Verification gate: the sub-flow that sends a verification email to an
//! unverified account and reports the outcome to the UI collaborator. The
//! gate never blocks or reverts the controller's transition into
//! AwaitingVerification; a failed dispatch is reported and left at that.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::provider::{AuthFailure, AuthOutcome, ErrorCategory, IdentityProvider};
use crate::session::Session;
use crate::translate::{translate, AuthOp};
use crate::ui::UiSink;

pub struct VerificationGate {
    provider: Arc<dyn IdentityProvider>,
    ui: Arc<dyn UiSink>,
    op_timeout: Duration,
}

impl VerificationGate {
    pub fn new(provider: Arc<dyn IdentityProvider>, ui: Arc<dyn UiSink>, op_timeout: Duration) -> Self {
        Self { provider, ui, op_timeout }
    }

    /// Dispatch one verification email for the given session. An absent
    /// session is a no-op, not an error.
    pub async fn send(&self, session: Option<&Session>) -> AuthOutcome {
        let Some(session) = session else { return Ok(()) };
        let dispatch = self.provider.send_verification_email(&session.user_id);
        let result = match tokio::time::timeout(self.op_timeout, dispatch).await {
            Ok(result) => result,
            Err(_) => Err(AuthFailure::new(ErrorCategory::Cancelled, "deadline_exceeded")),
        };
        match result {
            Ok(()) => {
                info!(target: "signon::gate", "verification email sent to {}", session.email);
                self.ui.notify_verification_pending(true, &session.email, None);
                Ok(())
            }
            Err(failure) => {
                warn!(target: "signon::gate", "verification email to {} failed: {}", session.email, failure);
                let message = translate(AuthOp::SendVerification, failure.category);
                self.ui.notify_verification_pending(false, &session.email, Some(message));
                Err(failure)
            }
        }
    }
}
