use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://vocal-pdf-backend.onrender.com";
pub const SETTINGS_FILE: &str = "vocal_pdf.toml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid extraction service url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("extraction service url '{0}' must use http or https")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    /// Per-request timeout. `None` lets a hung request stay pending.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: None,
        }
    }
}

impl ClientSettings {
    /// Base url with a trailing slash so endpoint paths join underneath it.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let url = Url::parse(&format!("{trimmed}/")).map_err(|err| {
            SettingsError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: err.to_string(),
            }
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(SettingsError::UnsupportedScheme(self.base_url.clone())),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Defaults, then `vocal_pdf.toml` in the working directory, then the environment.
pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    settings
}

fn apply_file_overrides(settings: &mut ClientSettings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            tracing::warn!("ignoring unreadable {SETTINGS_FILE}: {err}");
            return;
        }
    };

    if let Some(toml::Value::String(v)) = file_cfg.get("base_url") {
        settings.base_url = v.clone();
    }
    match file_cfg.get("request_timeout_secs") {
        Some(toml::Value::Integer(v)) if *v >= 0 => {
            settings.request_timeout_secs = Some(*v as u64);
        }
        Some(toml::Value::String(v)) => {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                settings.request_timeout_secs = Some(parsed);
            }
        }
        _ => {}
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("VOCAL_PDF_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_hosted_backend_without_timeout() {
        let settings = ClientSettings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = ClientSettings::default();
        apply_file_overrides(
            &mut settings,
            "base_url = \"http://127.0.0.1:5000\"\nrequest_timeout_secs = 30\n",
        );
        assert_eq!(settings.base_url, "http://127.0.0.1:5000");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn malformed_file_keeps_defaults() {
        let mut settings = ClientSettings::default();
        apply_file_overrides(&mut settings, "base_url = ");
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn app_prefixed_env_wins_over_plain_env() {
        let mut settings = ClientSettings::default();
        apply_env_overrides(&mut settings, |name| match name {
            "VOCAL_PDF_BASE_URL" => Some("http://plain.local".to_string()),
            "APP__BASE_URL" => Some("http://app.local".to_string()),
            "APP__REQUEST_TIMEOUT_SECS" => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(settings.base_url, "http://app.local");
        assert_eq!(settings.request_timeout_secs, None);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let settings = ClientSettings {
            base_url: "http://localhost:5000/api//".into(),
            request_timeout_secs: None,
        };
        let url = settings.base_url().expect("valid url");
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("get-pages").expect("join").as_str(),
            "http://localhost:5000/api/get-pages"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let settings = ClientSettings {
            base_url: "ftp://files.example.com".into(),
            request_timeout_secs: None,
        };
        assert!(matches!(
            settings.base_url(),
            Err(SettingsError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let settings = ClientSettings {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: Some(0),
        };
        assert_eq!(settings.request_timeout(), None);
    }
}
