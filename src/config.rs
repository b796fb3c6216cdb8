use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Require JWT authentication
    #[arg(long, env = "JWT_REQUIRED")]
    pub jwt_required: Option<bool>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,

    /// Disable the request timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub resilience: ResilienceConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt_required: bool,
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub timeout_disabled: bool,
    pub requests_per_second: f32,
    pub burst_size: f32,
    /// Per-request timeout for outbound webhook and admin service calls.
    pub relay_timeout_secs: u64,
}

/// Remote admin data service. Admin routes answer 503 when unconfigured.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub service_url: Option<String>,
    #[serde(default)]
    pub service_token: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Load configuration with explicit CLI args, for testability.
    ///
    /// Precedence, lowest to highest: built-in defaults, config file,
    /// `CHAT_RELAY_`-prefixed environment variables, CLI flags.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("security.jwt_required", true)?
            .set_default("security.jwt_secret", "")?
            .set_default("resilience.rate_limit_enabled", true)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.requests_per_second", 5.0)?
            .set_default("resilience.burst_size", 10.0)?
            .set_default("resilience.relay_timeout_secs", 30)?;

        // Config file: explicit path wins, otherwise ./config.{yaml,toml,...}
        // when present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path))),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // Environment variables, e.g. CHAT_RELAY_SERVER__PORT=8000.
        builder = builder.add_source(
            Environment::with_prefix("CHAT_RELAY")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags override everything else.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(required) = cli.jwt_required {
            builder = builder.set_override("security.jwt_required", required)?;
        }
        if let Some(enabled) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", enabled)?;
        }
        if let Some(disabled) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", disabled)?;
        }

        builder.build()?.try_deserialize()
    }
}
