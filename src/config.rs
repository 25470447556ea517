//! Application-level configuration loading (invite links and mail relay).

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GLUBS_BACK_CONFIG_PATH";
/// Base URL used for invite links when no configuration is provided.
const DEFAULT_INVITE_BASE_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    invite_base_url: String,
    mailer: Option<MailerConfig>,
}

/// Outbound mail relay settings; absent means delivery is disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    /// HTTP endpoint the relay accepts `{to, subject, html}` payloads on.
    pub endpoint: String,
    /// Sender display address placed in outgoing mails.
    pub sender: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        invite_base_url = %config.invite_base_url,
                        mailer = config.mailer.is_some(),
                        "loaded application config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Build the invite link shared out of band for the given code.
    pub fn invite_link(&self, invite_code: &str) -> String {
        format!(
            "{}/teams/invite/{}",
            self.invite_base_url.trim_end_matches('/'),
            invite_code
        )
    }

    /// Mail relay configuration, when delivery is enabled.
    pub fn mailer(&self) -> Option<&MailerConfig> {
        self.mailer.as_ref()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            invite_base_url: DEFAULT_INVITE_BASE_URL.to_owned(),
            mailer: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    invite_base_url: String,
    #[serde(default)]
    mailer: Option<MailerConfig>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            invite_base_url: value.invite_base_url,
            mailer: value.mailer,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
