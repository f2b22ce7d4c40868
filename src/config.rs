use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const REDACTED: &str = "********";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_mapping_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub receivers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_true")]
    pub send_when_unchanged: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub db_path: Option<String>,
    pub mapping_path: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub receivers: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// Reads the job's environment variables. Unset or blank variables are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            base_url: get("BASE_URL"),
            api_token: get("API_PRIVATE_TOKEN"),
            db_path: get("PREMIUM_WATCH_DB"),
            mapping_path: get("MAPPING_PATH"),
            smtp_host: get("SMTP_HOST"),
            smtp_port: get("SMTP_PORT").and_then(|v| v.trim().parse().ok()),
            sender: get("EMAIL_SENDER"),
            password: get("EMAIL_PASSWORD"),
            receivers: get("EMAIL_RECEIVERS").map(|raw| split_receivers(&raw)),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/premium-watch/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.pricing.base_url = base_url;
        }
        if let Some(api_token) = overrides.api_token {
            self.pricing.api_token = api_token;
        }
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path;
        }
        if let Some(mapping_path) = overrides.mapping_path {
            self.mapping.path = mapping_path;
        }
        if let Some(smtp_host) = overrides.smtp_host {
            self.email.smtp_host = smtp_host;
        }
        if let Some(smtp_port) = overrides.smtp_port {
            self.email.smtp_port = smtp_port;
        }
        if let Some(sender) = overrides.sender {
            self.email.sender = sender;
        }
        if let Some(password) = overrides.password {
            self.email.password = password;
        }
        if let Some(receivers) = overrides.receivers {
            self.email.receivers = receivers;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_mapping_path(&self) -> PathBuf {
        expand_tilde(&self.mapping.path)
    }

    /// Copy safe to print: token and mail password masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.pricing.api_token.is_empty() {
            copy.pricing.api_token = REDACTED.to_string();
        }
        if !copy.email.password.is_empty() {
            copy.email.password = REDACTED.to_string();
        }
        copy
    }

    pub fn default_template() -> String {
        let template = r#"[pricing]
base_url = "https://stage-connect.fiztrade.com"
api_token = ""
timeout_secs = 20

[storage]
db_path = "~/.local/share/premium-watch/readings.db"

[mapping]
path = "mapping.json"

[email]
enabled = true
smtp_host = "smtp.gmail.com"
smtp_port = 587
sender = ""
password = ""
receivers = []

[report]
send_when_unchanged = true
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn split_receivers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            path: default_mapping_path(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            sender: String::new(),
            password: String::new(),
            receivers: Vec::new(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            send_when_unchanged: true,
        }
    }
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_db_path() -> String {
    "~/.local/share/premium-watch/readings.db".to_string()
}

fn default_mapping_path() -> String {
    "mapping.json".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{split_receivers, Config, ConfigOverrides};

    #[test]
    fn template_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("template parses");
        assert_eq!(parsed.email.smtp_port, 587);
        assert_eq!(parsed.mapping.path, "mapping.json");
        assert!(parsed.report.send_when_unchanged);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[pricing]\nbase_url = \"https://x\"\n").expect("parse");
        assert_eq!(parsed.pricing.base_url, "https://x");
        assert_eq!(parsed.pricing.timeout_secs, 20);
        assert_eq!(parsed.email.smtp_host, "smtp.gmail.com");
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BASE_URL", "https://stage.example.com"),
            ("API_PRIVATE_TOKEN", "secret"),
            ("EMAIL_RECEIVERS", "a@example.com, b@example.com,,"),
            ("SMTP_PORT", "2525"),
            ("EMAIL_SENDER", "  "),
        ]);
        let overrides = ConfigOverrides::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        let mut config = Config::default();
        config.email.sender = "file@example.com".to_string();
        config.apply_overrides(overrides);

        assert_eq!(config.pricing.base_url, "https://stage.example.com");
        assert_eq!(config.email.receivers, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.email.sender, "file@example.com");

        let redacted = config.redacted();
        assert_eq!(redacted.pricing.api_token, "********");
        assert_eq!(redacted.email.password, "");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config::load(Some(&dir.path().join("absent.toml"))).expect("load");
        assert!(config.email.enabled);
    }

    #[test]
    fn splits_receivers() {
        assert_eq!(split_receivers(" x@y.z ,"), vec!["x@y.z"]);
    }
}
