//! Process configuration.
//!
//! Sources, lowest precedence first: built-in defaults, a YAML config file,
//! `RELAY_*` environment variables, command-line flags.
//! The configuration is loaded once at startup and validated before anything
//! binds; an invalid configuration aborts startup.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum, parser::ValueSource};
use figment::{
    Figment,
    providers::{Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{domain::RoutingPolicy, error::ServerError, infrastructure::inbox::OverflowPolicy};

/// File looked up in `.` and then `./config` when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Registrar used in local mode when no URL is given.
pub const LOCAL_REGISTRATION_URL: &str = "http://localhost:3030/webservers/register";

/// Service name used in local mode.
pub const LOCAL_SERVICE_NAME: &str = "local_service";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Routes owned by the HTTP API.
const RESERVED_PATHS: [&str; 2] = ["/api/health", "/api/connections"];

/// What a sender does when the inbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowMode {
    /// Wait for room, up to `--enqueue-timeout-ms`.
    Wait,
    /// Drop the message immediately.
    Reject,
}

/// Real-time WebSocket message relay
#[derive(Parser, Serialize, Deserialize, Debug, Clone)]
#[command(name = "relay-server", version, about = "Real-time WebSocket message relay")]
pub struct Config {
    /// Path to a YAML config file (default: ./config.yml or ./config/config.yml)
    #[arg(long, env = "RELAY_CONFIG")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "RELAY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path serving the WebSocket upgrade
    #[arg(long, env = "RELAY_PATH", default_value = "/ws")]
    pub path: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, env = "RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Capacity of the inbox between receive loops and the dispatch loop
    #[arg(long, env = "RELAY_INBOX_CAPACITY", default_value_t = 1024)]
    pub inbox_capacity: usize,

    /// Behaviour of a sender when the inbox is full
    #[arg(long, env = "RELAY_OVERFLOW_POLICY", value_enum, default_value_t = OverflowMode::Wait)]
    pub overflow_policy: OverflowMode,

    /// How long a sender waits for inbox room under the `wait` policy
    #[arg(long, env = "RELAY_ENQUEUE_TIMEOUT_MS", default_value_t = 1000)]
    pub enqueue_timeout_ms: u64,

    /// Upper bound on a single outbound write before the recipient is evicted
    #[arg(long, env = "RELAY_WRITE_TIMEOUT_MS", default_value_t = 5000)]
    pub write_timeout_ms: u64,

    /// Recipient selection (exclude-sender, exclude-sender-name, all)
    #[arg(long, env = "RELAY_ROUTING", default_value = "exclude-sender")]
    pub routing: RoutingPolicy,

    /// Allowed values of the Origin header; empty accepts every origin
    #[arg(
        long = "allowed-origin",
        env = "RELAY_ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Local mode: generate a service id and register with the local registrar
    #[arg(long, env = "RELAY_LOCAL")]
    pub local: bool,

    /// Registrar endpoint; enables startup registration
    #[arg(long, env = "RELAY_REGISTRATION_URL")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_url: Option<String>,

    /// Service name sent to the registrar (or the name of an env var holding it)
    #[arg(long, env = "RELAY_SERVICE_NAME")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Service identifier sent to the registrar (or the name of an env var holding it)
    #[arg(long, env = "RELAY_SERVICE_ID")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,

    /// Public WebSocket URL advertised to the registrar
    #[arg(long, env = "RELAY_PUBLIC_URL")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Keep running when registration fails
    #[arg(long, env = "RELAY_OPTIONAL_REGISTRATION")]
    pub optional_registration: bool,
}

/// Registration parameters resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSettings {
    pub registrar_url: String,
    pub service_name: String,
    pub service_id: String,
    pub websocket_url: String,
    /// Whether a failed registration aborts startup.
    pub required: bool,
}

impl RegistrationSettings {
    /// Route the registered service is reachable on.
    pub fn connect_path(&self) -> String {
        format!("/connect/{}", self.service_id)
    }
}

impl Config {
    /// Parse the command line and layer the config file under it.
    ///
    /// Exits the process on `--help`, `--version` and malformed flags, like
    /// [`Parser::parse`].
    pub fn load() -> Result<Self, ServerError> {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches, Path::new("."))
    }

    /// Build the configuration from parsed arguments.
    ///
    /// Without `--config`, `config.yml` is looked up in `base_dir` and then in
    /// `base_dir/config`; no file there means flags, env and defaults only.
    /// File values override defaults, while flags and environment variables
    /// override the file.
    pub fn from_matches(matches: &ArgMatches, base_dir: &Path) -> Result<Self, ServerError> {
        let cli = Self::from_arg_matches(matches)
            .map_err(|e| ServerError::InvalidConfig(e.to_string()))?;

        let path = match &cli.config {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                return Err(ServerError::InvalidConfig(format!(
                    "config file '{}' not found",
                    path.display()
                )));
            }
            None => match find_config_file(base_dir) {
                Some(path) => path,
                None => return Ok(cli),
            },
        };

        let overrides = cli.explicit_values(matches)?;
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(&cli))
            .merge(Yaml::file(&path))
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(|source| ServerError::ConfigFile {
                path: path.display().to_string(),
                source: Box::new(source),
            })?;
        config.config = Some(path);
        Ok(config)
    }

    /// Fields set by a flag or an environment variable, keyed by field name.
    fn explicit_values(
        &self,
        matches: &ArgMatches,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ServerError> {
        let serde_json::Value::Object(mut fields) =
            serde_json::to_value(self).map_err(|e| ServerError::InvalidConfig(e.to_string()))?
        else {
            return Ok(serde_json::Map::new());
        };
        fields.retain(|key, _| {
            matches!(
                matches.value_source(key),
                Some(ValueSource::CommandLine | ValueSource::EnvVariable)
            )
        });
        Ok(fields)
    }

    /// Check the fields that cannot be expressed as clap constraints.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ServerError::InvalidConfig("port must not be 0".to_string()));
        }
        check_route(&self.path)?;
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ServerError::InvalidConfig(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        if self.inbox_capacity == 0 {
            return Err(ServerError::InvalidConfig(
                "inbox capacity must be greater than 0".to_string(),
            ));
        }
        if self.write_timeout_ms == 0 {
            return Err(ServerError::InvalidConfig(
                "write timeout must be greater than 0".to_string(),
            ));
        }
        if self.overflow_policy == OverflowMode::Wait && self.enqueue_timeout_ms == 0 {
            return Err(ServerError::InvalidConfig(
                "enqueue timeout must be greater than 0 with the wait policy".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address to bind, as `host:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Every route serving the WebSocket upgrade: `path`, plus the service
    /// route when registration is on.
    pub fn websocket_paths(
        &self,
        registration: Option<&RegistrationSettings>,
    ) -> Result<Vec<String>, ServerError> {
        let mut paths = vec![self.path.clone()];
        if let Some(settings) = registration {
            paths.push(settings.connect_path());
        }

        for (i, path) in paths.iter().enumerate() {
            check_route(path)?;
            if paths[..i].contains(path) {
                return Err(ServerError::InvalidConfig(format!(
                    "path '{path}' collides with the service route"
                )));
            }
        }
        Ok(paths)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn inbox_overflow_policy(&self) -> OverflowPolicy {
        match self.overflow_policy {
            OverflowMode::Wait => OverflowPolicy::Wait(Duration::from_millis(self.enqueue_timeout_ms)),
            OverflowMode::Reject => OverflowPolicy::Reject,
        }
    }

    /// Resolve registration parameters, or `None` when registration is off.
    ///
    /// Local mode generates a fresh service id on every call.
    pub fn registration(&self) -> Option<RegistrationSettings> {
        if self.local {
            let service_id = Uuid::new_v4().simple().to_string();
            return Some(RegistrationSettings {
                registrar_url: self
                    .registration_url
                    .clone()
                    .unwrap_or_else(|| LOCAL_REGISTRATION_URL.to_string()),
                service_name: LOCAL_SERVICE_NAME.to_string(),
                websocket_url: format!("localhost:{}/connect/{}", self.port, service_id),
                service_id,
                required: !self.optional_registration,
            });
        }

        let registrar_url = self.registration_url.clone()?;
        let service_name = resolve_env_placeholder(self.service_name.as_deref().unwrap_or("relay"));
        let service_id = match self.service_id.as_deref() {
            Some(id) => resolve_env_placeholder(id),
            None => Uuid::new_v4().simple().to_string(),
        };
        let websocket_url = self
            .public_url
            .clone()
            .unwrap_or_else(|| format!("{}/connect/{}", self.listen_addr(), service_id));

        Some(RegistrationSettings {
            registrar_url,
            service_name,
            service_id,
            websocket_url,
            required: !self.optional_registration,
        })
    }
}

/// Reject paths the router cannot mount as a plain, non-conflicting route.
fn check_route(path: &str) -> Result<(), ServerError> {
    if !path.starts_with('/') {
        return Err(ServerError::InvalidConfig(format!(
            "path must start with '/' (got '{path}')"
        )));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with([':', '*']) || segment.contains(['{', '}']))
    {
        return Err(ServerError::InvalidConfig(format!(
            "path must not contain route parameters (got '{path}')"
        )));
    }
    if RESERVED_PATHS.contains(&path) {
        return Err(ServerError::InvalidConfig(format!(
            "path '{path}' is reserved for the HTTP API"
        )));
    }
    Ok(())
}

fn find_config_file(base_dir: &Path) -> Option<PathBuf> {
    [base_dir.to_path_buf(), base_dir.join("config")]
        .into_iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Return the value of the env var named `value`, or `value` itself.
fn resolve_env_placeholder(value: &str) -> String {
    std::env::var(value).unwrap_or_else(|_| value.to_string())
}
