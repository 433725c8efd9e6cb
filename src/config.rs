//! Environment-driven settings, read once at startup.

use std::time::Duration;

/// Controller settings. Scene indexes mirror the two destinations the
/// navigation collaborator knows about: the pre-auth entry scene and the
/// post-auth home scene.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on any single provider call; expiry resolves the operation
    /// as `Cancelled` instead of hanging.
    pub op_timeout: Duration,
    pub entry_scene: usize,
    pub home_scene: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { op_timeout: Duration::from_secs(30), entry_scene: 0, home_scene: 1 }
    }
}

impl Config {
    /// Read `SIGNON_OP_TIMEOUT_SECS`, `SIGNON_ENTRY_SCENE` and
    /// `SIGNON_HOME_SCENE`, falling back to defaults on unset or unparsable
    /// values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let op_timeout = env_parse("SIGNON_OP_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.op_timeout);
        Self {
            op_timeout,
            entry_scene: env_parse("SIGNON_ENTRY_SCENE").unwrap_or(defaults.entry_scene),
            home_scene: env_parse("SIGNON_HOME_SCENE").unwrap_or(defaults.home_scene),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
