pub mod generate;

use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    general: Option<General>,
    server: Option<Server>,
    mail: Option<Mail>,
    records: Option<Records>,
    duplicate_check: Option<DuplicateCheck>,
    program: Option<Program>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        Ok(Self {
            general: Some(config.general),
            server: Some(config.server),
            mail: Some(config.mail),
            records: Some(config.records),
            duplicate_check: Some(config.duplicate_check),
            program: Some(config.program),
        })
    }

    /// Applies `RESEND_API_KEY`, `DATABASE_URL`, `APP_MODE` and `PORT` on top
    /// of whatever the file provided.
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    pub fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = present("RESEND_API_KEY") {
            self.mail.get_or_insert_with(Mail::default).api_key = Some(key);
        }
        if let Some(url) = present("DATABASE_URL") {
            self.records.get_or_insert_with(Records::default).url = Some(url);
        }
        if let Some(mode) = present("APP_MODE") {
            self = self.with_mode(Mode::from_name(&mode));
        }
        if let Some(port) = present("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self = self.with_port(port);
        }
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        let server = self.server.get_or_insert_with(Server::default);
        server.port = port;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        let general = self.general.get_or_insert_with(General::default);
        general.mode = mode;
        self
    }

    pub fn with_mail(mut self, mail: Mail) -> Self {
        self.mail = Some(mail);
        self
    }

    pub fn with_records(mut self, records: Records) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_duplicate_check(mut self, duplicate_check: DuplicateCheck) -> Self {
        self.duplicate_check = Some(duplicate_check);
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let config = Config {
            general: self.general.unwrap_or_default(),
            server: self.server.unwrap_or_default(),
            mail: self.mail.unwrap_or_default(),
            records: self.records.unwrap_or_default(),
            duplicate_check: self.duplicate_check.unwrap_or_default(),
            program: self.program.unwrap_or_default(),
        };

        if config.duplicate_check.attempts == 0 {
            return Err(ConfigError::Invalid("duplicate_check.attempts must be at least 1".to_string()));
        }

        if !IDENTIFIER.is_match(&config.records.table) {
            return Err(ConfigError::Invalid(format!(
                "records.table is not a plain SQL identifier: {}",
                config.records.table
            )));
        }

        if config.mail.from.trim().is_empty() {
            return Err(ConfigError::Invalid("mail.from must not be empty".to_string()));
        }

        if !config.server.route.starts_with('/') {
            return Err(ConfigError::Invalid("server.route must start with '/'".to_string()));
        }

        Ok(config)
    }
}

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub mail: Mail,
    #[serde(default)]
    pub records: Records,
    #[serde(default)]
    pub duplicate_check: DuplicateCheck,
    #[serde(default)]
    pub program: Program,
}

impl Config {
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    /// Anything other than "development" runs as production.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("development") {
            Mode::Development
        } else {
            Mode::Production
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl From<String> for Mode {
    fn from(name: String) -> Self {
        Mode::from_name(&name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    pub mode: Mode,
    pub log_dir: String,
}

impl Default for General {
    fn default() -> Self {
        General {
            mode: Mode::Production,
            log_dir: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub route: String,
    pub allow_origin: String,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            host: "0.0.0.0".to_string(),
            port: 3000,
            route: "/api/send-email".to_string(),
            allow_origin: "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Mail {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub from: String,
    pub timeout_secs: u64,
}

impl Default for Mail {
    fn default() -> Self {
        Mail {
            api_key: None,
            endpoint: "https://api.resend.com".to_string(),
            from: "Vinamilk GTP 2025 <onboarding@resend.dev>".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Records {
    pub url: Option<String>,
    pub table: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for Records {
    fn default() -> Self {
        Records {
            url: None,
            table: "applicants".to_string(),
            max_connections: 5,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateCheck {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl DuplicateCheck {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for DuplicateCheck {
    fn default() -> Self {
        DuplicateCheck {
            attempts: 3,
            delay_ms: 1000,
        }
    }
}

/// Copy interpolated into the confirmation email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Program {
    pub name: String,
    pub organization: String,
    pub short_name: String,
    pub contact_email: String,
    pub website: String,
}

impl Default for Program {
    fn default() -> Self {
        Program {
            name: "GTP 2025".to_string(),
            organization: "Vietnam Dairy Products Joint Stock Company (Vinamilk)".to_string(),
            short_name: "Vinamilk".to_string(),
            contact_email: "hr@vinamilk.com.vn".to_string(),
            website: "vinamilk.com.vn".to_string(),
        }
    }
}
