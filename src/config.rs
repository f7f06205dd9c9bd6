use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`crate::store::FirebaseStore`].
///
/// Read from the environment (a `.env` file is loaded by the binary):
///
/// | Variable                | Meaning                                   |
/// |-------------------------|-------------------------------------------|
/// | `FIREBASE_DATABASE_URL` | Database root, e.g. `https://x.firebaseio.com` |
/// | `FIREBASE_AUTH_TOKEN`   | Optional token sent as the `auth` parameter |
/// | `FIREBASE_TIMEOUT_SECS` | Timeout for reads and writes, default 30  |
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("FIREBASE_DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .context("FIREBASE_DATABASE_URL must be set (or pass --demo)")?;

        let auth_token = lookup("FIREBASE_AUTH_TOKEN").filter(|token| !token.is_empty());

        let timeout_secs = match lookup("FIREBASE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("FIREBASE_TIMEOUT_SECS is not a number: '{raw}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url: database_url.trim().to_string(),
            auth_token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
