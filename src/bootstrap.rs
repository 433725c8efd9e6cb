//! One-shot startup sequence: prerequisite check, push subscription, resume.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::controller::SessionController;
use crate::provider::IdentityProvider;

/// Validate the provider's runtime prerequisites, subscribe to its pushed
/// auth-state changes, and resume any existing session.
///
/// A prerequisite failure is fatal-but-non-crashing: it is logged, no resume
/// is attempted, and the caller must not present any auth surface. Resume
/// failures are not fatal; the controller has already shown the login form.
pub async fn bootstrap(
    provider: Arc<dyn IdentityProvider>,
    controller: Arc<SessionController>,
) -> anyhow::Result<()> {
    if let Err(failure) = provider.check_prerequisites() {
        error!(target: "signon::bootstrap", "identity provider prerequisites unsatisfied: {}", failure);
        anyhow::bail!("identity provider unavailable: {failure}");
    }

    // Reflect provider-side sign-outs (e.g. token revocation) without polling.
    let mut changes = provider.subscribe();
    let listener = controller.clone();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => listener.on_auth_state_changed(change.as_ref()),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "signon::bootstrap", "auth-state stream lagged, skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    info!(target: "signon::bootstrap", "provider ready, resuming session");
    if let Err(failure) = controller.resume().await {
        warn!(target: "signon::bootstrap", "resume did not restore a session: {}", failure);
    }
    Ok(())
}
