// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::crisis::ExceptionScope;
use crate::escalation::EscalationSettings;
use crate::providers::gemini;
use crate::services::Therapist;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub classifier: ClassifierSettings,
    pub escalation: EscalationConfig,
    pub provider: ProviderSettings,
    pub mail: MailSettings,
    /// Seed list for the in-memory therapist directory
    pub therapists: Vec<Therapist>,
}

impl Config {
    /// Reject values that would make the server misbehave at runtime
    pub fn validate(&self) -> Result<()> {
        if self.server.max_sessions == 0 {
            bail!("server.max_sessions must be greater than zero");
        }

        if self.server.auth_enabled && self.auth.tokens.is_empty() {
            bail!("auth is enabled but no [[auth.tokens]] are configured");
        }

        for entry in &self.auth.tokens {
            let valid = entry.token_sha256.len() == 64
                && entry.token_sha256.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                bail!(
                    "Token for user '{}' is not a hex SHA-256 digest",
                    entry.user_id
                );
            }
        }

        let e = &self.escalation;
        if e.lookup_timeout_ms == 0 || e.booking_timeout_ms == 0 || e.notify_timeout_ms == 0 {
            bail!("escalation timeouts must be greater than zero");
        }

        for (index, therapist) in self.therapists.iter().enumerate() {
            if therapist.id.trim().is_empty() {
                bail!("therapists[{}] has an empty id", index);
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub max_sessions: usize,
    pub auth_enabled: bool,
    /// Messages of history included in the companion prompt
    pub history_messages: usize,
    pub history_chars: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            max_sessions: 1000,
            auth_enabled: true,
            history_messages: 20,
            history_chars: 8000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub tokens: Vec<TokenEntry>,
}

/// A bearer token, stored as its SHA-256 hex digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token_sha256: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub exception_scope: ExceptionScope,
    /// JSON rule file replacing the built-in table
    pub patterns_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub lookup_timeout_ms: u64,
    pub booking_timeout_ms: u64,
    pub notify_timeout_ms: u64,
    pub ops_email: Option<String>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        let defaults = EscalationSettings::default();
        Self {
            lookup_timeout_ms: defaults.lookup_timeout.as_millis() as u64,
            booking_timeout_ms: defaults.booking_timeout.as_millis() as u64,
            notify_timeout_ms: defaults.notify_timeout.as_millis() as u64,
            ops_email: None,
        }
    }
}

impl EscalationConfig {
    pub fn to_settings(&self) -> EscalationSettings {
        EscalationSettings {
            lookup_timeout: Duration::from_millis(self.lookup_timeout_ms),
            booking_timeout: Duration::from_millis(self.booking_timeout_ms),
            notify_timeout: Duration::from_millis(self.notify_timeout_ms),
            ops_email: self.ops_email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: gemini::DEFAULT_MODEL.to_string(),
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// HTTP mail relay; notifications are only logged when unset
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            from: "Solace Alerts <alerts@solace.local>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(user: &str) -> TokenEntry {
        TokenEntry {
            token_sha256: "a".repeat(64),
            user_id: user.to_string(),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1:8000");
        assert_eq!(config.provider.model, "gemini-1.5-flash");
        assert_eq!(config.classifier.exception_scope, ExceptionScope::Overlap);
        assert_eq!(config.escalation.notify_timeout_ms, 2000);
        assert!(config.therapists.is_empty());
    }

    #[test]
    fn test_validate_requires_tokens_when_auth_enabled() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.auth.tokens.push(token("u1"));
        assert!(config.validate().is_ok());

        config.auth.tokens.clear();
        config.server.auth_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_digest() {
        let mut config = Config::default();
        config.auth.tokens.push(TokenEntry {
            token_sha256: "plaintext-token".to_string(),
            user_id: "u1".to_string(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("u1"));
    }

    #[test]
    fn test_escalation_settings_conversion() {
        let config = EscalationConfig {
            lookup_timeout_ms: 100,
            booking_timeout_ms: 200,
            notify_timeout_ms: 300,
            ops_email: Some("ops@solace.test".to_string()),
        };
        let settings = config.to_settings();
        assert_eq!(settings.lookup_timeout, Duration::from_millis(100));
        assert_eq!(settings.notify_timeout, Duration::from_millis(300));
        assert_eq!(settings.ops_email.as_deref(), Some("ops@solace.test"));
    }
}
