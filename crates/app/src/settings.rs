//! Application settings.
//!
//! Read from an optional TOML file (`settings.toml` unless `--config` says
//! otherwise), then from `UTILITY_TRACKER__SECTION__KEY` environment
//! variables. See `settings.example.toml` at the workspace root.

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "utility_tracker", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long, env = "UTILITY_TRACKER_CONFIG")]
    config: Option<String>,
    /// Override the log level (e.g. debug).
    #[arg(long)]
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    /// Left out, the server still starts and store-backed routes answer 503.
    pub database: Option<Database>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            database: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Identity {
    Supabase {
        supabase_url: String,
        service_role_key: String,
    },
    /// In-memory accounts, lost on restart.
    Static,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Entries {
    pub types: Vec<String>,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            types: ["electricity", "water", "fuel"]
                .map(str::to_string)
                .to_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub base_url: String,
    pub max_age_secs: u64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            base_url: "https://api.frankfurter.dev/".to_string(),
            max_age_secs: 4 * 60 * 60,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    /// Left out, every authenticated route answers 503.
    pub identity: Option<Identity>,
    pub entries: Entries,
    pub rates: Rates,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();

        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(args.config.is_some()))
            .add_source(
                Environment::with_prefix("UTILITY_TRACKER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("entries.types"),
            )
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        if let Some(level) = args.level {
            settings.app.level = level;
        }
        Ok(settings)
    }
}
