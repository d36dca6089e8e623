//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `CAMPCTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `CAMPCTL_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database_url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `CAMPCTL_POOL__MAX_CONNECTIONS=20` sets the `pool.max_connections` field.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CAMPCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// PostgreSQL connection string
    pub database_url: String,
    /// Email address for the initial admin user (created on first startup)
    pub admin_email: String,
    /// Optional fixed API key for the initial admin user. If unset, a key is
    /// generated on first startup and logged once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_api_key: Option<String>,
    /// Connection pool settings
    pub pool: PoolSettings,
    /// Allowed CORS origins ("*" for any)
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "postgresql://localhost/campctl".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_api_key: None,
            pool: PoolSettings::default(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Connection pool settings controlling SQLx pool behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
}

impl Default for PoolSettings {
    /// Production defaults: balanced for reliability and resource usage
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the YAML file named in `args`, then apply
    /// `CAMPCTL_`-prefixed environment overrides and the `DATABASE_URL`
    /// special case.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("CAMPCTL_").split("__"))
            .extract()?;

        // DATABASE_URL wins over everything else, matching deployment conventions
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        Ok(config)
    }
}
