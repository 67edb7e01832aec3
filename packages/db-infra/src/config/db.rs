use std::fmt;
use std::path::Path;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;

use crate::error::DbInfraError;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 50;
pub const DEFAULT_MAX_CONN_LIFETIME: &str = "5m";
pub const DEFAULT_MIGRATE_TIMEOUT: &str = "120s";

/// Characters escaped in the userinfo part of a connection URL.
const USERINFO: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Pool purpose, used to pick sizing and to label logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPurpose {
    /// Single connection used only while migrating
    Migration,
    /// Long-lived pool used to serve requests
    App,
}

impl fmt::Display for PoolPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolPurpose::Migration => f.write_str("migration"),
            PoolPurpose::App => f.write_str("app"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_lifetime: Duration::from_secs(5 * 60),
        }
    }
}

/// Database settings loaded from the JSON config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    pub pool: PoolSettings,
    pub migrate_timeout: Duration,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DbConfigFile {
    host: String,
    #[serde(default)]
    port: Option<PortValue>,
    user: String,
    #[serde(default)]
    password: Option<String>,
    name: String,
    #[serde(default)]
    max_connections: Option<u32>,
    #[serde(default)]
    max_conn_lifetime: Option<String>,
    #[serde(default)]
    migrate_timeout: Option<String>,
}

impl DbConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DbInfraError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbInfraError::config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            DbInfraError::Config { message } => {
                DbInfraError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, DbInfraError> {
        let file: DbConfigFile = serde_json::from_str(raw)
            .map_err(|e| DbInfraError::config(format!("malformed config: {e}")))?;

        let port = match file.port {
            None => DEFAULT_PORT,
            Some(PortValue::Number(port)) => port,
            Some(PortValue::Text(text)) => text
                .trim()
                .parse::<u16>()
                .map_err(|_| DbInfraError::config(format!("invalid port '{text}'")))?,
        };

        for (field, value) in [("host", &file.host), ("user", &file.user), ("name", &file.name)] {
            if value.trim().is_empty() {
                return Err(DbInfraError::config(format!("'{field}' must not be empty")));
            }
        }

        let max_connections = file.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(DbInfraError::config("'max_connections' must be at least 1"));
        }
        let max_lifetime = parse_duration(
            file.max_conn_lifetime
                .as_deref()
                .unwrap_or(DEFAULT_MAX_CONN_LIFETIME),
        )?;
        let migrate_timeout = parse_duration(
            file.migrate_timeout
                .as_deref()
                .unwrap_or(DEFAULT_MIGRATE_TIMEOUT),
        )?;

        Ok(Self {
            host: file.host,
            port,
            user: file.user,
            // an empty password means "no password"
            password: file.password.filter(|p| !p.is_empty()),
            name: file.name,
            pool: PoolSettings {
                max_connections,
                max_lifetime,
            },
            migrate_timeout,
        })
    }

    /// Key/value connection string, password omitted when not configured.
    pub fn connection_info(&self, max_conns: u32, max_conn_lifetime: Duration) -> String {
        let lifetime = format_duration(max_conn_lifetime);
        match &self.password {
            Some(password) => format!(
                "host={} port={} user={} password={} dbname={} sslmode=disable pool_max_conns={} pool_max_conn_lifetime={}",
                self.host, self.port, self.user, password, self.name, max_conns, lifetime
            ),
            None => format!(
                "host={} port={} user={} dbname={} sslmode=disable pool_max_conns={} pool_max_conn_lifetime={}",
                self.host, self.port, self.user, self.name, max_conns, lifetime
            ),
        }
    }

    /// [`DbConfig::connection_info`] with the password masked, for logs.
    pub fn redacted_connection_info(&self, max_conns: u32, max_conn_lifetime: Duration) -> String {
        let masked = Self {
            password: self.password.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        };
        masked.connection_info(max_conns, max_conn_lifetime)
    }

    /// PostgreSQL URL equivalent of [`DbConfig::connection_info`].
    pub fn database_url(&self) -> String {
        let user = utf8_percent_encode(&self.user, USERINFO);
        let name = utf8_percent_encode(&self.name, USERINFO);
        match &self.password {
            Some(password) => format!(
                "postgresql://{user}:{}@{}:{}/{name}?sslmode=disable",
                utf8_percent_encode(password, USERINFO),
                self.host,
                self.port
            ),
            None => format!(
                "postgresql://{user}@{}:{}/{name}?sslmode=disable",
                self.host, self.port
            ),
        }
    }
}

/// Parse a duration like `5m`, `90s`, `1h30m` or `250ms`.
pub fn parse_duration(text: &str) -> Result<Duration, DbInfraError> {
    let invalid = |why: &str| DbInfraError::config(format!("invalid duration '{text}': {why}"));

    let s = text.trim();
    if s.is_empty() {
        return Err(invalid("empty"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid("expected a number"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| invalid("number out of range"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let secs_per_unit = match &rest[..unit_len] {
            "ms" => None,
            "s" => Some(1),
            "m" => Some(60),
            "h" => Some(3600),
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        };
        rest = &rest[unit_len..];

        let part = match secs_per_unit {
            None => Duration::from_millis(value),
            Some(mult) => value
                .checked_mul(mult)
                .map(Duration::from_secs)
                .ok_or_else(|| invalid("number out of range"))?,
        };
        total = total
            .checked_add(part)
            .ok_or_else(|| invalid("number out of range"))?;
    }
    Ok(total)
}

/// Inverse of [`parse_duration`] for whole milliseconds.
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut out = String::new();
    for (value, unit) in [(hours, "h"), (minutes, "m"), (seconds, "s"), (millis, "ms")] {
        if value > 0 {
            out.push_str(&format!("{value}{unit}"));
        }
    }
    out
}
