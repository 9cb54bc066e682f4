//! Configuration
//!
//! Layered: built-in defaults, then `formcraft.toml`, then environment
//! variables, then command-line flags (applied by the binary).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STATIC_DIR: &str = "dist/spa";
pub const DEFAULT_DATA_DIR: &str = ".formcraft";
pub const DEFAULT_PING_MESSAGE: &str = "ping";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FormcraftConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Serve the built client from `static_dir`.
    pub production: bool,
    pub static_dir: PathBuf,
    pub ping_message: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            production: false,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            ping_message: DEFAULT_PING_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database to try first. `None` goes straight to the fallback.
    pub database_url: Option<String>,
    pub fallback: FallbackKind,
    /// Directory for the JSON file fallback.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            fallback: FallbackKind::Memory,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FallbackKind {
    #[default]
    Memory,
    File,
}

impl std::str::FromStr for FallbackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(FallbackKind::Memory),
            "file" | "json" => Ok(FallbackKind::File),
            other => Err(format!("unknown fallback store: {}", other)),
        }
    }
}

impl FormcraftConfig {
    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`.
    ///
    /// `DATABASE_URL` wins over `MONGODB_URI`; unparsable values are ignored
    /// with a warning.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("DATABASE_URL").or_else(|| non_empty("MONGODB_URI")) {
            self.storage.database_url = Some(url);
        }

        if let Some(port) = non_empty("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }

        if let Some(env) = non_empty("FORMCRAFT_ENV") {
            self.server.production = env.eq_ignore_ascii_case("production");
        }

        if let Some(dir) = non_empty("FORMCRAFT_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }

        if let Some(fallback) = non_empty("FORMCRAFT_FALLBACK") {
            match fallback.parse() {
                Ok(kind) => self.storage.fallback = kind,
                Err(e) => tracing::warn!("Ignoring FORMCRAFT_FALLBACK: {}", e),
            }
        }

        if let Some(dir) = non_empty("FORMCRAFT_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(message) = lookup("PING_MESSAGE") {
            self.server.ping_message = message;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("formcraft.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<FormcraftConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FormcraftConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &FormcraftConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Load the config file (if any) and overlay the environment.
pub fn resolve(path: Option<&Path>) -> anyhow::Result<FormcraftConfig> {
    let mut config = load_config(path)?.unwrap_or_default();
    config.apply_env();
    Ok(config)
}
