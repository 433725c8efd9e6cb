//! Per-operation mapping from failure categories to short user-facing
//! messages. Translation is total: categories an operation does not recognize
//! fall through to that operation's unknown-error message, so an unrecognized
//! provider code never leaves the user without feedback.

use crate::provider::ErrorCategory;

/// The operation a failure was raised by. The same category translates to
/// different wording depending on the operation (e.g. `Cancelled`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOp {
    Login,
    Register,
    ProfileUpdate,
    SendVerification,
}

pub const UNKNOWN_MESSAGE: &str = "Unknown Error, Try Again!";

/// Map an operation-scoped failure category to a display string.
pub fn translate(op: AuthOp, category: ErrorCategory) -> &'static str {
    use ErrorCategory::*;
    match op {
        AuthOp::Login => match category {
            MissingEmail => "Please Enter Your Email",
            MissingPassword => "Please Enter Your Password",
            InvalidEmail => "Invalid Email",
            WrongPassword => "Incorrect Password",
            UserNotFound => "Account Does Not Exist",
            _ => UNKNOWN_MESSAGE,
        },
        AuthOp::Register => match category {
            MissingUsername => "Please Enter Your Username",
            PasswordMismatch => "Password Does Not Match!",
            MissingEmail => "Please Enter Your Email",
            MissingPassword => "Please Enter Your Password",
            InvalidEmail => "Invalid Email",
            InvalidRecipientEmail => "Invalid Recipient Email",
            EmailAlreadyInUse => "Email Already In Use",
            WeakPassword => "Weak Password",
            _ => UNKNOWN_MESSAGE,
        },
        AuthOp::ProfileUpdate => match category {
            Cancelled => "Profile Update Was Cancelled, Try Again!",
            SessionExpired => "Session Expired, Try Again!",
            _ => UNKNOWN_MESSAGE,
        },
        AuthOp::SendVerification => match category {
            Cancelled => "Verification Request Was Cancelled, Try Again!",
            InvalidRecipientEmail => "Invalid Email",
            TooManyRequests => "Too Many Requests, Try Again Later!",
            _ => UNKNOWN_MESSAGE,
        },
    }
}
