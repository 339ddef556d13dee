//! Settings for the role client factory.
//!
//! Read from the process environment (a `.env` file is honored by the CLI):
//!
//! | Variable                    | Meaning                                   |
//! |-----------------------------|-------------------------------------------|
//! | `FSA_ROLE_SESSION_DURATION` | default session lifetime in seconds       |
//! | `FSA_VERSION_TAG`           | tag embedded in generated session names   |

use anyhow::{Context, Result};

pub const ROLE_SESSION_DURATION_VAR: &str = "FSA_ROLE_SESSION_DURATION";
pub const VERSION_TAG_VAR: &str = "FSA_VERSION_TAG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Used when a descriptor has no `roleSessionDuration`. When this is
    /// also unset the STS default (3600 seconds) applies.
    pub default_session_duration: Option<u64>,
    pub version_tag: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_session_duration: None,
            version_tag: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ROLE_SESSION_DURATION_VAR).filter(|v| !v.trim().is_empty()) {
            let seconds = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ROLE_SESSION_DURATION_VAR}='{raw}' is not a number of seconds"))?;
            settings.default_session_duration = Some(seconds);
        }

        if let Some(tag) = lookup(VERSION_TAG_VAR).filter(|v| !v.trim().is_empty()) {
            settings.version_tag = tag.trim().to_string();
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.default_session_duration, None);
        assert_eq!(settings.version_tag, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (ROLE_SESSION_DURATION_VAR, "900"),
            (VERSION_TAG_VAR, "v7"),
        ]))
        .unwrap();
        assert_eq!(settings.default_session_duration, Some(900));
        assert_eq!(settings.version_tag, "v7");
    }

    #[test]
    fn test_invalid_duration() {
        let err = Settings::from_lookup(lookup(&[(ROLE_SESSION_DURATION_VAR, "an hour")]))
            .unwrap_err();
        assert!(err.to_string().contains(ROLE_SESSION_DURATION_VAR));
    }
}
