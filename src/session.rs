//! The locally held representation of the authenticated identity.

use serde::{Deserialize, Serialize};

use crate::provider::UserHandle;

/// Current authentication identity. Owned exclusively by the session
/// controller and replaced wholesale on every provider state change; absence
/// is modeled as `Option<Session>`, never as a sentinel value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

impl Session {
    pub fn from_handle(handle: &UserHandle) -> Self {
        Self {
            user_id: handle.id.clone(),
            display_name: handle.display_name.clone(),
            email: handle.email.clone(),
            email_verified: handle.email_verified,
        }
    }
}
