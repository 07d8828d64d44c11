// Configuration loader
// Loads ~/.solace/config.toml (or an explicit path) and applies env overrides

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;
use crate::errors;

/// Default config location: ~/.solace/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".solace/config.toml"))
}

/// Load configuration.
///
/// An explicit path must exist. A missing default file yields the built-in
/// defaults. `SOLACE_BIND` and `GEMINI_API_KEY` override the file.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                bail!(errors::config_not_found_error(&path.display().to_string()));
            }
            read_config(path)?
        }
        None => {
            let default_path = default_config_path()?;
            if default_path.exists() {
                read_config(&default_path)?
            } else {
                tracing::info!(
                    path = %default_path.display(),
                    "No config file found, using defaults"
                );
                Config::default()
            }
        }
    };

    apply_overrides(
        &mut config,
        non_empty_env("SOLACE_BIND"),
        non_empty_env("GEMINI_API_KEY"),
    );

    Ok(config)
}

fn read_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow!(errors::config_parse_error(&e.to_string())))?;

    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Environment values win over the file
fn apply_overrides(config: &mut Config, bind: Option<String>, api_key: Option<String>) {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    if let Some(key) = api_key {
        config.provider.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crisis::ExceptionScope;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
[server]
bind_address = "0.0.0.0:9000"
max_sessions = 5

[[auth.tokens]]
token_sha256 = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
user_id = "user-1"

[classifier]
exception_scope = "message"

[escalation]
notify_timeout_ms = 500
ops_email = "ops@solace.test"

[provider]
model = "gemini-1.5-pro"

[mail]
endpoint = "http://localhost:8025/send"

[[therapists]]
id = "t1"
username = "dr_smith"
email = "dr.smith@therapy.test"
"#,
        );

        let config = read_config(file.path()).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.server.max_sessions, 5);
        assert!(config.server.auth_enabled);
        assert_eq!(config.auth.tokens[0].user_id, "user-1");
        assert_eq!(config.classifier.exception_scope, ExceptionScope::Message);
        assert_eq!(config.escalation.notify_timeout_ms, 500);
        assert_eq!(config.escalation.booking_timeout_ms, 5000);
        assert_eq!(config.provider.model, "gemini-1.5-pro");
        assert_eq!(config.therapists.len(), 1);
        assert!(config.therapists[0].available);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = read_config(file.path()).unwrap();
        assert_eq!(config.server.max_sessions, 1000);
        assert!(config.mail.endpoint.is_none());
    }

    #[test]
    fn test_parse_error_is_friendly() {
        let file = write_config("[server\nbind_address = ");
        let err = read_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            Some("0.0.0.0:1234".to_string()),
            Some("env-key".to_string()),
        );
        assert_eq!(config.server.bind_address, "0.0.0.0:1234");
        assert_eq!(config.provider.api_key.as_deref(), Some("env-key"));

        apply_overrides(&mut config, None, None);
        assert_eq!(config.server.bind_address, "0.0.0.0:1234");
    }
}
