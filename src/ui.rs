//! Collaborator traits invoked by the auth core, plus the console-backed
//! implementations used by the demo binary. The core never renders anything
//! itself; it hands short display strings and scene indexes to these seams.

use tracing::info;

/// Which output line a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputScope {
    Login,
    Register,
}

/// UI collaborator. Implementations must be cheap and non-blocking; the core
/// calls these while an operation resolves.
pub trait UiSink: Send + Sync {
    /// Present the login form (no prior session, or resume failed).
    fn show_login_form(&self);

    /// Report the outcome of a verification-email dispatch. `sent == true`
    /// means "check your inbox" and carries no message.
    fn notify_verification_pending(&self, sent: bool, email: &str, message: Option<&str>);

    /// Write a translated failure message to the login or register output.
    fn set_output_text(&self, scope: OutputScope, message: &str);

    fn clear_outputs(&self);
}

/// Scene navigation collaborator.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, scene: usize);
}

/// Console UI for the demo binary: prints to stdout, nothing more.
pub struct ConsoleUi;

impl UiSink for ConsoleUi {
    fn show_login_form(&self) {
        println!("-- sign in required (login <email> <password> | register <username> <email> <password> <confirm>)");
    }

    fn notify_verification_pending(&self, sent: bool, email: &str, message: Option<&str>) {
        if sent {
            println!("-- verification email sent to {email}, check your inbox");
        } else {
            println!("-- verification email to {email} failed: {}", message.unwrap_or(""));
        }
    }

    fn set_output_text(&self, scope: OutputScope, message: &str) {
        println!("-- {scope:?}: {message}");
    }

    fn clear_outputs(&self) {}
}

/// Navigator that only records the transition in the log; the demo has no
/// real scene graph.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate_to(&self, scene: usize) {
        info!(target: "signon::nav", "navigate scene={}", scene);
        println!("-- entering scene {scene}");
    }
}
