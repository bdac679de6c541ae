//! Configuration module for Parlor.

use serde::Deserialize;
use std::path::Path;

use crate::{ParlorError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Chat configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Predefined rooms, in display order.
    #[serde(default = "default_rooms")]
    pub rooms: Vec<String>,
    /// Room used when a join does not name one.
    #[serde(default = "default_room")]
    pub default_room: String,
    /// Maximum messages kept per room (and per private conversation).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Page size used when a page request does not give one.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Upper bound for requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Number of characters kept in notification previews.
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    /// Seconds after which a typing flag is dropped (0 = never).
    #[serde(default)]
    pub typing_timeout_secs: u64,
}

fn default_rooms() -> Vec<String> {
    ["general", "random", "tech", "gaming"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

fn default_room() -> String {
    "general".to_string()
}

fn default_history_limit() -> usize {
    500
}

fn default_page_size() -> usize {
    50
}

fn default_max_page_size() -> usize {
    100
}

fn default_preview_length() -> usize {
    50
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            rooms: default_rooms(),
            default_room: default_room(),
            history_limit: default_history_limit(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            preview_length: default_preview_length(),
            typing_timeout_secs: 0,
        }
    }
}

/// Web configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:5173",
        "http://localhost:5174",
        "http://localhost:3000",
    ]
    .iter()
    .map(|o| o.to_string())
    .collect()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Extra per-target directives, e.g. `tower_http=debug,parlor::chat=trace`.
    #[serde(default)]
    pub filter: String,
    /// Path to the log file (empty = console only).
    #[serde(default = "default_log_file")]
    pub file: String,
    /// Append to an existing log file instead of truncating it.
    #[serde(default = "default_log_append")]
    pub append: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/parlor.log".to_string()
}

fn default_log_append() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            filter: String::new(),
            file: default_log_file(),
            append: default_log_append(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat configuration.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Web configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ParlorError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ParlorError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PARLOR_PORT`: Override the listening port
    /// - `PARLOR_CLIENT_URL`: Replace the CORS origins with a single origin
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PARLOR_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PARLOR_PORT"),
            }
        }

        if let Ok(client_url) = std::env::var("PARLOR_CLIENT_URL") {
            if !client_url.is_empty() {
                self.web.cors_origins = vec![client_url];
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.chat.validate()?;
        crate::logging::filter_directives(&self.logging)?;
        Ok(())
    }
}

impl ChatConfig {
    /// Upper bound for `typing_timeout_secs`.
    pub const MAX_TYPING_TIMEOUT_SECS: u64 = 86_400;

    /// Typing timeout in seconds, capped at one day. None when disabled.
    pub fn typing_timeout(&self) -> Option<u64> {
        match self.typing_timeout_secs {
            0 => None,
            secs => Some(secs.min(Self::MAX_TYPING_TIMEOUT_SECS)),
        }
    }

    /// Validate the chat section.
    ///
    /// Returns an error if:
    /// - No rooms are configured, or a room name is blank or repeated
    /// - The default room is not one of the rooms
    /// - A size limit is zero
    /// - The typing timeout exceeds one day
    pub fn validate(&self) -> Result<()> {
        if self.rooms.is_empty() {
            return Err(ParlorError::Config("at least one room is required".to_string()));
        }
        for (i, room) in self.rooms.iter().enumerate() {
            if room.trim().is_empty() {
                return Err(ParlorError::Config("room names must not be blank".to_string()));
            }
            if self.rooms[..i].contains(room) {
                return Err(ParlorError::Config(format!("duplicate room: {room}")));
            }
        }
        if !self.rooms.contains(&self.default_room) {
            return Err(ParlorError::Config(format!(
                "default_room {} is not one of the rooms",
                self.default_room
            )));
        }
        if self.history_limit == 0 || self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ParlorError::Config(
                "history_limit, default_page_size and max_page_size must be positive".to_string(),
            ));
        }
        if self.typing_timeout_secs > Self::MAX_TYPING_TIMEOUT_SECS {
            return Err(ParlorError::Config(format!(
                "typing_timeout_secs must be at most {}",
                Self::MAX_TYPING_TIMEOUT_SECS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);

        assert_eq!(config.chat.rooms, vec!["general", "random", "tech", "gaming"]);
        assert_eq!(config.chat.default_room, "general");
        assert_eq!(config.chat.history_limit, 500);
        assert_eq!(config.chat.default_page_size, 50);
        assert_eq!(config.chat.max_page_size, 100);
        assert_eq!(config.chat.preview_length, 50);
        assert_eq!(config.chat.typing_timeout_secs, 0);

        assert_eq!(config.web.cors_origins.len(), 3);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/parlor.log");
        assert!(config.logging.filter.is_empty());
        assert!(config.logging.append);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080

[chat]
rooms = ["lobby", "dev"]
default_room = "dev"
history_limit = 100
default_page_size = 20
max_page_size = 40
preview_length = 30
typing_timeout_secs = 8

[web]
cors_origins = ["https://chat.example.com"]

[logging]
level = "debug"
filter = "tower_http=warn"
file = ""
append = false
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chat.rooms, vec!["lobby", "dev"]);
        assert_eq!(config.chat.default_room, "dev");
        assert_eq!(config.chat.history_limit, 100);
        assert_eq!(config.chat.default_page_size, 20);
        assert_eq!(config.chat.max_page_size, 40);
        assert_eq!(config.chat.preview_length, 30);
        assert_eq!(config.chat.typing_timeout_secs, 8);
        assert_eq!(config.web.cors_origins, vec!["https://chat.example.com"]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.filter, "tower_http=warn");
        assert!(config.logging.file.is_empty());
        assert!(!config.logging.append);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 3000
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chat.default_room, "general");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(ParlorError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(ParlorError::Io(_))));
    }

    #[test]
    fn test_validate_default_room_missing() {
        let mut config = Config::default();
        config.chat.default_room = "lobby".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(ParlorError::Config(msg)) if msg.contains("lobby")));
    }

    #[test]
    fn test_validate_no_rooms() {
        let mut config = Config::default();
        config.chat.rooms.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_duplicate_room() {
        let mut config = Config::default();
        config.chat.rooms.push("general".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_history_limit() {
        let mut config = Config::default();
        config.chat.history_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ParlorError::Config(msg)) if msg.contains("loud")
        ));
    }

    #[test]
    fn test_typing_timeout_is_capped() {
        let mut config = Config::default();
        assert_eq!(config.chat.typing_timeout(), None);

        config.chat.typing_timeout_secs = 8;
        assert_eq!(config.chat.typing_timeout(), Some(8));

        config.chat.typing_timeout_secs = u64::MAX;
        assert_eq!(
            config.chat.typing_timeout(),
            Some(ChatConfig::MAX_TYPING_TIMEOUT_SECS)
        );
        assert!(matches!(
            config.validate(),
            Err(ParlorError::Config(msg)) if msg.contains("typing_timeout_secs")
        ));
    }

    #[test]
    fn test_apply_env_overrides() {
        let original_port = std::env::var("PARLOR_PORT").ok();
        let original_url = std::env::var("PARLOR_CLIENT_URL").ok();

        std::env::set_var("PARLOR_PORT", "6001");
        std::env::set_var("PARLOR_CLIENT_URL", "https://example.org");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.server.port, 6001);
        assert_eq!(config.web.cors_origins, vec!["https://example.org"]);

        match original_port {
            Some(val) => std::env::set_var("PARLOR_PORT", val),
            None => std::env::remove_var("PARLOR_PORT"),
        }
        match original_url {
            Some(val) => std::env::set_var("PARLOR_CLIENT_URL", val),
            None => std::env::remove_var("PARLOR_CLIENT_URL"),
        }
    }
}
