use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the lecture catalog server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Lecture library settings
    pub library: LibraryConfig,

    /// Catalog storage settings
    pub database: DatabaseConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root directory holding subject/chapter/lecture trees
    pub root_dir: PathBuf,

    /// File extensions treated as lecture videos (no leading dot)
    pub video_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string for the catalog store
    pub url: String,

    /// Maximum pooled connections
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,
}

impl Config {
    /// Load configuration from file, falling back to environment variables
    pub fn load() -> Result<Self> {
        let config_paths = [
            "lecture-catalog.toml",
            "config/lecture-catalog.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Build configuration from defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("LECTURES_DIR") {
            config.library.root_dir = PathBuf::from(root);
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        if let Ok(port) = std::env::var("LECTURE_CATALOG_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| anyhow!("LECTURE_CATALOG_PORT is not a valid port: {}", port))?;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.library.video_extensions.is_empty() {
            return Err(anyhow!("video_extensions must not be empty"));
        }

        if self.database.url.is_empty() {
            return Err(anyhow!("database url must not be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow!("max_connections must be greater than 0"));
        }

        // A missing library root is not fatal: the scan logs the failure and
        // the catalog still serves whatever rows already exist.
        if !self.library.root_dir.exists() {
            tracing::warn!(
                "Library root does not exist: {}",
                self.library.root_dir.display()
            );
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Lecture Catalog Configuration:\n\
            - Library Root: {}\n\
            - Video Extensions: {}\n\
            - Database: {}\n\
            - Listen: {}:{}",
            self.library.root_dir.display(),
            self.library.video_extensions.join(", "),
            self.database.url,
            self.server.bind_address,
            self.server.port
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: LibraryConfig {
                root_dir: PathBuf::from("./lectures"),
                video_extensions: vec!["mp4".to_string()],
            },
            database: DatabaseConfig {
                url: "sqlite://catalog.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 5000,
            },
        }
    }
}
