use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(serde::Deserialize)]
pub struct ApplicationSettings {
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_secs: u64,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub shutdown_grace_secs: u64,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(serde::Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: SecretString,
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    pub database_name: String,
    pub require_ssl: bool,

    /// How long a pooled connection may sit unused before it is closed.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub db_idle_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.db_idle_timeout_secs)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db()
            .database(&self.database_name)
            .log_statements(tracing_log::log::LevelFilter::Trace)
    }

    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
    }
}

#[derive(serde::Deserialize, Default)]
pub struct TelemetrySettings {
    /// OTLP/gRPC collector, e.g. `http://localhost:4317`. Spans are only exported when set.
    pub otlp_endpoint: Option<String>,
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn to_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`",
                other
            )),
        }
    }
}

/// The `POSTGRES_*` variables the service has always been deployed with.
/// `POSTGRES_URL` is `host` or `host:port`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostgresEnv {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
}

impl PostgresEnv {
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let (host, port) = match var("POSTGRES_URL") {
            Some(url) => split_host_port(&url)?,
            None => (None, None),
        };
        Ok(Self {
            user: var("POSTGRES_USER"),
            password: var("POSTGRES_PASSWORD"),
            host,
            port,
            database: var("POSTGRES_DB"),
        })
    }
}

fn split_host_port(url: &str) -> Result<(Option<String>, Option<u16>), ConfigError> {
    match url.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                ConfigError::Message(format!("POSTGRES_URL has an invalid port: {url}"))
            })?;
            Ok((Some(host.to_string()), Some(port)))
        }
        None => Ok((Some(url.to_string()), None)),
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {e}")))?;
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    load_configuration(
        &base_path.join("configurations"),
        environment,
        PostgresEnv::from_env()?,
    )
}

pub fn load_configuration(
    configuration_directory: &Path,
    environment: Environment,
    postgres: PostgresEnv,
) -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base")))
        .add_source(File::from(
            configuration_directory.join(environment.to_str()),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"), // Use double underscore to represent nested struct fields (e.g., APP_DATABASE__USERNAME)
        )
        .set_override_option("database.username", postgres.user)?
        .set_override_option("database.password", postgres.password)?
        .set_override_option("database.host", postgres.host)?
        .set_override_option("database.port", postgres.port.map(i64::from))?
        .set_override_option("database.database_name", postgres.database)?;

    settings.build()?.try_deserialize()
}
