use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Radiohead, the artist the tool was first written for
pub const DEFAULT_ARTIST: &str = "spotify:artist:4Z8W4fKeB5YxbusRsdQVPb";
pub const DEFAULT_MARKET: &str = "US";
pub const DEFAULT_HEAD_ROWS: usize = 5;

const CREDENTIALS_FILE: &str = "spotify_credentials.toml";
const DOTENV_FILE: &str = ".env";

const CLIENT_ID_VAR: &str = "CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";

/// Load `.env` from the working directory (or a parent) into the process
/// environment. Variables that are already set are left alone.
pub fn init_environment() -> Option<PathBuf> {
    let path = dotenvy::dotenv().ok()?;
    // Print to stderr because logging has not been initialized yet
    eprintln!("Loaded environment from dotenv file {:?}", path);
    Some(path)
}

// ── Credentials ──────────────────────────────────────────────────────────────

/// Client id + secret for the client-credentials grant.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct CredentialsFile {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Credentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Use the explicitly given values (flags or `CLIENT_ID`/`CLIENT_SECRET`)
    /// when both are present, otherwise fall back to `.env` in the working
    /// directory, then to a credentials file.
    pub fn resolve(client_id: Option<String>, client_secret: Option<String>) -> Result<Self> {
        match (non_empty(client_id), non_empty(client_secret)) {
            (Some(id), Some(secret)) => Ok(Credentials::new(id, secret)),
            _ => Self::load_dotenv(Path::new(DOTENV_FILE))
                .or_else(|| {
                    Self::credential_paths()
                        .iter()
                        .find_map(|path| Self::load_from(path))
                })
                .ok_or_else(|| {
                    Error::Auth(format!(
                        "no client credentials: set {} and {}, add them to {} or create {}",
                        CLIENT_ID_VAR, CLIENT_SECRET_VAR, DOTENV_FILE, CREDENTIALS_FILE
                    ))
                }),
        }
    }

    /// Read `CLIENT_ID`/`CLIENT_SECRET` from a dotenv file without touching
    /// the process environment. None if missing or incomplete.
    pub fn load_dotenv(path: &Path) -> Option<Self> {
        let (mut id, mut secret) = (None, None);
        for item in dotenvy::from_path_iter(path).ok()? {
            let (key, value) = item.ok()?;
            match key.as_str() {
                CLIENT_ID_VAR => id = Some(value),
                CLIENT_SECRET_VAR => secret = Some(value),
                _ => {}
            }
        }
        let credentials = Credentials::new(non_empty(id)?, non_empty(secret)?);
        tracing::debug!("Loaded credentials from {}", path.display());
        Some(credentials)
    }

    /// Read a credentials file, None if it is missing or incomplete.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        let file: CredentialsFile = toml::from_str(&content).ok()?;
        tracing::debug!("Loaded credentials from {}", path.display());
        Some(Credentials::new(
            non_empty(Some(file.client_id))?,
            non_empty(Some(file.client_secret))?,
        ))
    }

    fn credential_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // Working directory
            PathBuf::from(CREDENTIALS_FILE),
            // System-wide
            Path::new("/etc/toptracks").join(CREDENTIALS_FILE),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config/toptracks")
                    .join(CREDENTIALS_FILE),
            );
        }
        paths
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Saved defaults ───────────────────────────────────────────────────────────

/// Configuration defaults that can be saved to a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_rows: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_plot: Option<bool>,
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Config::default()
    }

    /// Get the config file path (~/.config/toptracks/defaults.toml)
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Config("HOME environment variable not set".to_string()))?;
        Ok(Path::new(&home)
            .join(".config")
            .join("toptracks")
            .join("defaults.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from file, an absent file yields an empty config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::new());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_string =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.artist.is_some() {
            self.artist = other.artist.clone();
        }
        if other.market.is_some() {
            self.market = other.market.clone();
        }
        if other.head_rows.is_some() {
            self.head_rows = other.head_rows;
        }
        if other.no_plot.is_some() {
            self.no_plot = other.no_plot;
        }
    }

    pub fn artist(&self) -> &str {
        self.artist.as_deref().unwrap_or(DEFAULT_ARTIST)
    }

    pub fn market(&self) -> &str {
        self.market.as_deref().unwrap_or(DEFAULT_MARKET)
    }

    pub fn head_rows(&self) -> usize {
        self.head_rows.unwrap_or(DEFAULT_HEAD_ROWS)
    }

    pub fn no_plot(&self) -> bool {
        self.no_plot.unwrap_or(false)
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(artist) = &self.artist {
            println!("  Artist:     {}", artist);
        }
        if let Some(market) = &self.market {
            println!("  Market:     {}", market);
        }
        if let Some(head_rows) = self.head_rows {
            println!("  Head rows:  {}", head_rows);
        }
        if let Some(no_plot) = self.no_plot {
            println!("  Plots:      {}", if no_plot { "disabled" } else { "enabled" });
        }
    }
}
