//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from an optional TOML file. Every field has
//! a built-in default, so the service starts with zero configuration.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--root-folder, --config)
//! 2. Environment variables (MAF_ROOT_FOLDER, MAF_CONFIG)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "MAF_ROOT_FOLDER";

/// Environment variable overriding the config file location
pub const CONFIG_FILE_ENV: &str = "MAF_CONFIG";

/// Application directory name under the platform config/data dirs
const APP_DIR: &str = "myanimefigures";

/// Default database file name inside the root folder
const DATABASE_FILE: &str = "myanimefigures.db";

/// Bootstrap configuration loaded from TOML file
///
/// Cannot change during runtime; restart to pick up edits.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database path; defaults to `{root_folder}/myanimefigures.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub lists: ListConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_path: None,
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            endpoints: EndpointConfig::default(),
            lists: ListConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Resolve the database file location for a given root folder
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Third-party API endpoints and HTTP client behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Anime list export endpoint (MyAnimeList)
    #[serde(default = "default_anime_list_url")]
    pub anime_list_url: String,

    /// Figure search endpoint (MyFigureCollection)
    #[serde(default = "default_figure_search_url")]
    pub figure_search_url: String,

    /// Figure thumbnail template; `{mfc_id}` is replaced by the item id
    #[serde(default = "default_figure_image_url")]
    pub figure_image_url: String,

    /// User-Agent sent with every outbound request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum spacing between requests to the same API
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            anime_list_url: default_anime_list_url(),
            figure_search_url: default_figure_search_url(),
            figure_image_url: default_figure_image_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }
}

/// List sizing and figure cache policy
#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    /// Maximum currently-watching series shown
    #[serde(default = "default_max_watching")]
    pub max_watching: usize,

    /// Number of most recently completed series shown
    #[serde(default = "default_recently_completed")]
    pub recently_completed: usize,

    /// Number of newest figures in the "recent figures" strip
    #[serde(default = "default_recent_figures")]
    pub recent_figures: usize,

    /// Age after which a page view re-queries figures for a series
    #[serde(default = "default_figure_cache_hours")]
    pub figure_cache_hours: u64,

    /// Age after which the batch refresher re-queries figures
    #[serde(default = "default_refresh_after_hours")]
    pub refresh_after_hours: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            max_watching: default_max_watching(),
            recently_completed: default_recently_completed(),
            recent_figures: default_recent_figures(),
            figure_cache_hours: default_figure_cache_hours(),
            refresh_after_hours: default_refresh_after_hours(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_anime_list_url() -> String {
    "http://myanimelist.net/malappinfo.php".to_string()
}

fn default_figure_search_url() -> String {
    "http://myfigurecollection.net/api.php".to_string()
}

fn default_figure_image_url() -> String {
    "http://s1.tsuki-board.net/pics/figure/{mfc_id}.jpg".to_string()
}

fn default_user_agent() -> String {
    format!("MyAnimeFigures/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_min_request_interval_ms() -> u64 {
    500
}

fn default_max_watching() -> usize {
    20
}

fn default_recently_completed() -> usize {
    10
}

fn default_recent_figures() -> usize {
    24
}

fn default_figure_cache_hours() -> u64 {
    24
}

fn default_refresh_after_hours() -> u64 {
    48
}

/// Parse a TOML configuration document
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load configuration from an explicit file, or from the default location
///
/// An explicit path that does not exist is an error; a missing default
/// config file silently yields built-in defaults.
pub fn load_toml_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    let explicit = cli_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from));

    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path
        }
        None => match default_config_file() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Root folder resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Platform config file location, e.g. ~/.config/myanimefigures/config.toml
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./myanimefigures_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_toml_config("").unwrap();
        assert_eq!(config.port, 5780);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.lists.max_watching, 20);
        assert_eq!(config.lists.recently_completed, 10);
        assert_eq!(config.lists.recent_figures, 24);
        assert_eq!(config.lists.figure_cache_hours, 24);
        assert_eq!(config.lists.refresh_after_hours, 48);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = parse_toml_config(
            r#"
            port = 9000

            [lists]
            max_watching = 5

            [endpoints]
            figure_search_url = "http://localhost:8081/api.php"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.lists.max_watching, 5);
        assert_eq!(config.lists.recently_completed, 10);
        assert_eq!(config.endpoints.figure_search_url, "http://localhost:8081/api.php");
        assert_eq!(
            config.endpoints.anime_list_url,
            "http://myanimelist.net/malappinfo.php"
        );
    }

    #[test]
    fn test_invalid_document_is_config_error() {
        let result = parse_toml_config("port = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_database_path_defaults_into_root_folder() {
        let config = TomlConfig::default();
        let path = config.database_path(Path::new("/srv/maf"));
        assert_eq!(path, PathBuf::from("/srv/maf/myanimefigures.db"));
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let config = parse_toml_config("database_path = \"/tmp/other.db\"").unwrap();
        let path = config.database_path(Path::new("/srv/maf"));
        assert_eq!(path, PathBuf::from("/tmp/other.db"));
    }
}
