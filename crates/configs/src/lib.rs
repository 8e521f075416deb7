use std::time::Duration;

use anyhow::{anyhow, Result};
use common::utils::logging::LogFormat;
use datalayer::ClearPolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub datalayer: DataLayerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), log_format: LogFormat::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataLayerConfig {
    /// GTM container id, e.g. `GTM-XXXXXXX`. `GTM_ID` fills it when empty.
    #[serde(default)]
    pub tag_id: String,
    #[serde(default)]
    pub clear_policy: ClearPolicy,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Sessions untouched for this long are evicted from memory
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for DataLayerConfig {
    fn default() -> Self {
        Self {
            tag_id: String::new(),
            clear_policy: ClearPolicy::default(),
            session_cookie: default_session_cookie(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_session_cookie() -> String { "dl_session".into() }
fn default_session_idle_secs() -> u64 { 1800 }

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `CONFIG_PATH` (falling back to defaults when the file is absent),
    /// then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = config_path();
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.datalayer.normalize_from_env();
        self.datalayer.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        Ok(())
    }
}

impl DataLayerConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(id) = std::env::var("GTM_ID") {
            if !id.trim().is_empty() {
                self.tag_id = id;
            }
        }
        self.tag_id = self.tag_id.trim().to_string();
        if self.session_cookie.trim().is_empty() {
            self.session_cookie = default_session_cookie();
        }
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_idle_secs == 0 {
            return Err(anyhow!("datalayer.session_idle_secs must be positive"));
        }
        if self.tag_id.is_empty() {
            return Err(anyhow!("datalayer.tag_id is empty; set it in config.toml or the GTM_ID environment variable"));
        }
        if !self.session_cookie.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(anyhow!("datalayer.session_cookie may only contain ASCII letters, digits, '_' and '-'"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            log_format = "json"

            [datalayer]
            tag_id = "GTM-ABC"
            clear_policy = "persisted_only"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.log_format, LogFormat::Json);
        assert_eq!(cfg.datalayer.tag_id, "GTM-ABC");
        assert_eq!(cfg.datalayer.clear_policy, ClearPolicy::PersistedOnly);
        assert_eq!(cfg.datalayer.session_cookie, "dl_session");
        assert_eq!(cfg.datalayer.session_idle(), Duration::from_secs(1800));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = load_from_str("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.datalayer.clear_policy, ClearPolicy::Both);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut dl = DataLayerConfig { tag_id: "GTM-1".into(), ..Default::default() };
        assert!(dl.validate().is_ok());
        dl.session_cookie = "bad cookie;".into();
        assert!(dl.validate().is_err());
        let zero_idle = DataLayerConfig { tag_id: "GTM-1".into(), session_idle_secs: 0, ..Default::default() };
        assert!(zero_idle.validate().is_err());
        let dl = DataLayerConfig::default();
        assert!(dl.validate().is_err());

        let mut server = ServerConfig { port: 0, ..Default::default() };
        assert!(server.normalize().is_err());
    }
}
