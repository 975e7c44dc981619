//! Explicit configuration record for the service, replacing a
//! duck-typed config map with a typed structure that rejects unknown
//! keys at the TOML-overlay boundary instead of silently ignoring them.

use std::env;
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: String, reason: String },
    Missing { field: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::Missing { field } => write!(f, "missing required configuration: {field}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "fatal" => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "error",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime: Duration,
    pub conn_max_idle_time: Duration,
    /// When set (`DATABASE_URL`), overrides every discrete field above.
    pub url_override: Option<String>,
}

impl DatabaseConfig {
    /// The effective connection string, honoring `url_override`.
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url_override {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.dbname, self.sslmode
        )
    }
}

#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct MemoryConfig {
    pub max_memories: i64,
    pub similarity_threshold: f32,
}

#[derive(Clone, Debug)]
pub struct EncryptionConfig {
    pub enabled: bool,
    pub master_key: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub debug_pretty: bool,
    pub file: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub embedding: EmbeddingConfig,
    pub memory: MemoryConfig,
    pub jwt_secret: Option<String>,
    pub http_port: u16,
    pub http_allow_origins: Vec<String>,
    pub encryption: EncryptionConfig,
    pub logging: LoggingConfig,
    /// Minutes east of UTC (`LOCAL_UTC_OFFSET_MINUTES`) used to anchor the
    /// activity dashboard's "today"/"this week"/"this month" windows to
    /// the deployment's local calendar instead of UTC's.
    pub local_utc_offset_minutes: i32,
}

/// The subset of options an operator may override via `--config <path>`.
/// Unknown keys are rejected rather than silently ignored.
#[derive(Debug, Default)]
pub struct ConfigOverlay {
    pub database_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub memory_max_memories: Option<i64>,
    pub memory_similarity_threshold: Option<f32>,
    pub jwt_secret: Option<String>,
    pub http_port: Option<u16>,
    pub http_allow_origins: Option<String>,
    pub encryption_enabled: Option<bool>,
    pub encryption_master_key: Option<String>,
    pub log_level: Option<String>,
    pub debug: Option<bool>,
    pub log_file: Option<String>,
    pub local_utc_offset_minutes: Option<i32>,
}

impl AppConfig {
    /// Load from environment, then overlay a TOML file if `config_path`
    /// is given, then validate eagerly. Invalid configuration returns an
    /// error and never panics mid-request.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut raw = RawEnv::from_env();

        if let Some(path) = config_path {
            let text = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
                field: "config file".to_string(),
                reason: e.to_string(),
            })?;
            let overlay: ConfigOverlay = toml_from_str(&text)?;
            raw.apply_overlay(overlay);
        }

        raw.into_config()
    }
}

/// `toml` is not in the workspace dependency table; the overlay format is
/// intentionally restricted to flat `key = value` pairs so a tiny
/// hand-rolled parser suffices rather than reaching for a crate when a
/// dozen lines do the job.
fn toml_from_str(text: &str) -> Result<ConfigOverlay, ConfigError> {
    let mut map = std::collections::HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::InvalidValue {
                field: "config file".to_string(),
                reason: format!("malformed line: {line}"),
            });
        };
        let key = key.trim().to_string();
        let value = value.trim().trim_matches('"').to_string();
        map.insert(key, value);
    }

    let known = [
        "database_url",
        "openai_api_key",
        "openai_model",
        "memory_max_memories",
        "memory_similarity_threshold",
        "jwt_secret",
        "http_port",
        "http_allow_origins",
        "encryption_enabled",
        "encryption_master_key",
        "log_level",
        "debug",
        "log_file",
        "local_utc_offset_minutes",
    ];
    for key in map.keys() {
        if !known.contains(&key.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "config file".to_string(),
                reason: format!("unknown key: {key}"),
            });
        }
    }

    Ok(ConfigOverlay {
        database_url: map.get("database_url").cloned(),
        openai_api_key: map.get("openai_api_key").cloned(),
        openai_model: map.get("openai_model").cloned(),
        memory_max_memories: map.get("memory_max_memories").and_then(|v| v.parse().ok()),
        memory_similarity_threshold: map
            .get("memory_similarity_threshold")
            .and_then(|v| v.parse().ok()),
        jwt_secret: map.get("jwt_secret").cloned(),
        http_port: map.get("http_port").and_then(|v| v.parse().ok()),
        http_allow_origins: map.get("http_allow_origins").cloned(),
        encryption_enabled: map.get("encryption_enabled").and_then(|v| v.parse().ok()),
        encryption_master_key: map.get("encryption_master_key").cloned(),
        log_level: map.get("log_level").cloned(),
        debug: map.get("debug").and_then(|v| v.parse().ok()),
        log_file: map.get("log_file").cloned(),
        local_utc_offset_minutes: map.get("local_utc_offset_minutes").and_then(|v| v.parse().ok()),
    })
}

/// Plain string bag read from `std::env`, overlaid by the config file,
/// then parsed and validated once in [`RawEnv::into_config`].
struct RawEnv {
    database_url: Option<String>,
    database_host: String,
    database_port: String,
    database_user: String,
    database_password: String,
    database_dbname: String,
    database_sslmode: String,
    database_max_connections: String,
    database_max_idle_conns: String,
    database_conn_max_lifetime: String,
    database_conn_max_idle_time: String,
    openai_api_key: Option<String>,
    openai_model: String,
    openai_max_retries: String,
    openai_timeout: String,
    memory_max_memories: String,
    memory_similarity_threshold: String,
    jwt_secret: Option<String>,
    http_port: String,
    http_allow_origins: String,
    encryption_enabled: String,
    encryption_master_key: Option<String>,
    log_level: String,
    debug: String,
    log_file: Option<String>,
    local_utc_offset_minutes: String,
}

impl RawEnv {
    fn from_env() -> Self {
        let get = |k: &str| env::var(k).ok();
        let get_or = |k: &str, default: &str| get(k).unwrap_or_else(|| default.to_string());

        Self {
            database_url: get("DATABASE_URL"),
            database_host: get_or("DATABASE_HOST", "localhost"),
            database_port: get_or("DATABASE_PORT", "5432"),
            database_user: get_or("DATABASE_USER", "postgres"),
            database_password: get_or("DATABASE_PASSWORD", ""),
            database_dbname: get_or("DATABASE_DBNAME", "memory_service"),
            database_sslmode: get_or("DATABASE_SSLMODE", "disable"),
            database_max_connections: get_or("DATABASE_MAX_CONNECTIONS", "25"),
            database_max_idle_conns: get_or("DATABASE_MAX_IDLE_CONNS", "10"),
            database_conn_max_lifetime: get_or("DATABASE_CONN_MAX_LIFETIME", "300"),
            database_conn_max_idle_time: get_or("DATABASE_CONN_MAX_IDLE_TIME", "60"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get_or("OPENAI_MODEL", "text-embedding-3-small"),
            openai_max_retries: get_or("OPENAI_MAX_RETRIES", "3"),
            openai_timeout: get_or("OPENAI_TIMEOUT", "30"),
            memory_max_memories: get_or("MEMORY_MAX_MEMORIES", "1000"),
            memory_similarity_threshold: get_or("MEMORY_SIMILARITY_THRESHOLD", "0.7"),
            jwt_secret: get("JWT_SECRET"),
            http_port: get_or("HTTP_PORT", "8082"),
            http_allow_origins: get_or("HTTP_ALLOW_ORIGINS", ""),
            encryption_enabled: get_or("ENCRYPTION_ENABLED", "false"),
            encryption_master_key: get("ENCRYPTION_MASTER_KEY"),
            log_level: get_or("LOG_LEVEL", "info"),
            debug: get_or("DEBUG", "false"),
            log_file: get("LOG_FILE"),
            local_utc_offset_minutes: get_or("LOCAL_UTC_OFFSET_MINUTES", "0"),
        }
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.database_url {
            self.database_url = Some(v);
        }
        if let Some(v) = overlay.openai_api_key {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = overlay.openai_model {
            self.openai_model = v;
        }
        if let Some(v) = overlay.memory_max_memories {
            self.memory_max_memories = v.to_string();
        }
        if let Some(v) = overlay.memory_similarity_threshold {
            self.memory_similarity_threshold = v.to_string();
        }
        if let Some(v) = overlay.jwt_secret {
            self.jwt_secret = Some(v);
        }
        if let Some(v) = overlay.http_port {
            self.http_port = v.to_string();
        }
        if let Some(v) = overlay.http_allow_origins {
            self.http_allow_origins = v;
        }
        if let Some(v) = overlay.encryption_enabled {
            self.encryption_enabled = v.to_string();
        }
        if let Some(v) = overlay.encryption_master_key {
            self.encryption_master_key = Some(v);
        }
        if let Some(v) = overlay.log_level {
            self.log_level = v;
        }
        if let Some(v) = overlay.debug {
            self.debug = v.to_string();
        }
        if let Some(v) = overlay.log_file {
            self.log_file = Some(v);
        }
        if let Some(v) = overlay.local_utc_offset_minutes {
            self.local_utc_offset_minutes = v.to_string();
        }
    }

    fn into_config(self) -> Result<AppConfig, ConfigError> {
        let parse_u16 = |field: &str, s: &str| -> Result<u16, ConfigError> {
            s.parse().map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("'{s}' is not a valid port"),
            })
        };
        let parse_u32 = |field: &str, s: &str| -> Result<u32, ConfigError> {
            s.parse().map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("'{s}' is not a non-negative integer"),
            })
        };
        let parse_f32 = |field: &str, s: &str| -> Result<f32, ConfigError> {
            s.parse().map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("'{s}' is not a number"),
            })
        };
        let parse_bool = |field: &str, s: &str| -> Result<bool, ConfigError> {
            match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" | "" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{s}' is not a boolean"),
                }),
            }
        };

        let database_port = parse_u16("DATABASE_PORT", &self.database_port)?;
        let max_connections = parse_u32("DATABASE_MAX_CONNECTIONS", &self.database_max_connections)?;
        let max_idle_conns = parse_u32("DATABASE_MAX_IDLE_CONNS", &self.database_max_idle_conns)?;
        if max_idle_conns > max_connections {
            return Err(ConfigError::InvalidValue {
                field: "DATABASE_MAX_IDLE_CONNS".to_string(),
                reason: "must not exceed DATABASE_MAX_CONNECTIONS".to_string(),
            });
        }
        let conn_max_lifetime_secs: u64 =
            self.database_conn_max_lifetime.parse().map_err(|_| ConfigError::InvalidValue {
            field: "DATABASE_CONN_MAX_LIFETIME".to_string(),
            reason: "must be seconds as an integer".to_string(),
        })?;
        let conn_max_idle_time_secs: u64 =
            self.database_conn_max_idle_time.parse().map_err(|_| ConfigError::InvalidValue {
            field: "DATABASE_CONN_MAX_IDLE_TIME".to_string(),
            reason: "must be seconds as an integer".to_string(),
        })?;

        let http_port = parse_u16("HTTP_PORT", &self.http_port)?;

        let similarity_threshold =
            parse_f32("MEMORY_SIMILARITY_THRESHOLD", &self.memory_similarity_threshold)?;
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "MEMORY_SIMILARITY_THRESHOLD".to_string(),
                reason: "must be within [0, 1]".to_string(),
            });
        }

        let max_memories: i64 =
            self.memory_max_memories.parse().map_err(|_| ConfigError::InvalidValue {
            field: "MEMORY_MAX_MEMORIES".to_string(),
            reason: "must be a positive integer".to_string(),
        })?;

        let log_level = LogLevel::parse(&self.log_level).ok_or_else(|| ConfigError::InvalidValue {
            field: "LOG_LEVEL".to_string(),
            reason: format!("'{}' is not one of debug,info,warn,error,fatal", self.log_level),
        })?;

        let encryption_enabled = parse_bool("ENCRYPTION_ENABLED", &self.encryption_enabled)?;
        if encryption_enabled && self.encryption_master_key.is_none() {
            return Err(ConfigError::Missing { field: "ENCRYPTION_MASTER_KEY".to_string() });
        }

        let openai_max_retries = parse_u32("OPENAI_MAX_RETRIES", &self.openai_max_retries)?;
        let openai_timeout_secs: u64 =
            self.openai_timeout.parse().map_err(|_| ConfigError::InvalidValue {
            field: "OPENAI_TIMEOUT".to_string(),
            reason: "must be seconds as an integer".to_string(),
        })?;

        let debug_pretty = parse_bool("DEBUG", &self.debug)?;

        let parse_i32 = |field: &str, s: &str| -> Result<i32, ConfigError> {
            s.parse().map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("'{s}' is not an integer"),
            })
        };
        let local_utc_offset_minutes =
            parse_i32("LOCAL_UTC_OFFSET_MINUTES", &self.local_utc_offset_minutes)?;
        if !(-1440..=1440).contains(&local_utc_offset_minutes) {
            return Err(ConfigError::InvalidValue {
                field: "LOCAL_UTC_OFFSET_MINUTES".to_string(),
                reason: "must be within [-1440, 1440]".to_string(),
            });
        }

        let http_allow_origins = self
            .http_allow_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(AppConfig {
            database: DatabaseConfig {
                host: self.database_host,
                port: database_port,
                user: self.database_user,
                password: self.database_password,
                dbname: self.database_dbname,
                sslmode: self.database_sslmode,
                max_connections,
                max_idle_conns,
                conn_max_lifetime: Duration::from_secs(conn_max_lifetime_secs),
                conn_max_idle_time: Duration::from_secs(conn_max_idle_time_secs),
                url_override: self.database_url,
            },
            embedding: EmbeddingConfig {
                api_key: self.openai_api_key,
                model: self.openai_model,
                max_retries: openai_max_retries,
                // The embedding path overrides this to a 60s floor
                // regardless of what operators configure.
                timeout: Duration::from_secs(openai_timeout_secs),
            },
            memory: MemoryConfig { max_memories, similarity_threshold },
            jwt_secret: self.jwt_secret,
            http_port,
            http_allow_origins,
            encryption: EncryptionConfig {
                enabled: encryption_enabled,
                master_key: self.encryption_master_key,
            },
            logging: LoggingConfig { level: log_level, debug_pretty, file: self.log_file },
            local_utc_offset_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RawEnv {
        RawEnv {
            database_url: None,
            database_host: "localhost".into(),
            database_port: "5432".into(),
            database_user: "postgres".into(),
            database_password: "".into(),
            database_dbname: "memory_service".into(),
            database_sslmode: "disable".into(),
            database_max_connections: "25".into(),
            database_max_idle_conns: "10".into(),
            database_conn_max_lifetime: "300".into(),
            database_conn_max_idle_time: "60".into(),
            openai_api_key: None,
            openai_model: "text-embedding-3-small".into(),
            openai_max_retries: "3".into(),
            openai_timeout: "30".into(),
            memory_max_memories: "1000".into(),
            memory_similarity_threshold: "0.7".into(),
            jwt_secret: None,
            http_port: "8082".into(),
            http_allow_origins: "".into(),
            encryption_enabled: "false".into(),
            encryption_master_key: None,
            log_level: "info".into(),
            debug: "false".into(),
            log_file: None,
            local_utc_offset_minutes: "0".into(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(base().into_config().is_ok());
    }

    #[test]
    fn invalid_port_rejected() {
        let mut raw = base();
        raw.http_port = "not-a-port".into();
        assert!(raw.into_config().is_err());
    }

    #[test]
    fn max_idle_exceeding_max_connections_rejected() {
        let mut raw = base();
        raw.database_max_idle_conns = "50".into();
        raw.database_max_connections = "10".into();
        assert!(raw.into_config().is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut raw = base();
        raw.log_level = "verbose".into();
        assert!(raw.into_config().is_err());
    }

    #[test]
    fn encryption_enabled_without_key_rejected() {
        let mut raw = base();
        raw.encryption_enabled = "true".into();
        raw.encryption_master_key = None;
        assert!(raw.into_config().is_err());
    }

    #[test]
    fn similarity_threshold_outside_unit_interval_rejected() {
        let mut raw = base();
        raw.memory_similarity_threshold = "1.5".into();
        assert!(raw.into_config().is_err());
    }

    #[test]
    fn local_utc_offset_out_of_range_rejected() {
        let mut raw = base();
        raw.local_utc_offset_minutes = "2000".into();
        assert!(raw.into_config().is_err());
    }

    #[test]
    fn database_url_overrides_discrete_fields() {
        let mut raw = base();
        raw.database_url = Some("postgres://u:p@host:5432/db".to_string());
        let cfg = raw.into_config().unwrap();
        assert_eq!(cfg.database.connection_string(), "postgres://u:p@host:5432/db");
    }
}
