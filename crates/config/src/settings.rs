// Application settings
// Loaded from ~/.config/pokedex/settings.toml

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    Parse(String),
    /// Parsed, but a value is out of range.
    Validation(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the data lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// CSV source the index is built from
    pub csv_path: PathBuf,

    /// SQLite index file
    pub db_path: PathBuf,

    /// Field delimiter; None = sniff from the file
    pub delimiter: Option<char>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("pokemon.csv"),
            db_path: PathBuf::from("pokemon.db"),
            delimiter: None,
        }
    }
}

impl DataSettings {
    /// Delimiter as the byte the CSV reader wants.
    pub fn delimiter_byte(&self) -> Option<u8> {
        // Validated ASCII on load
        self.delimiter.map(|c| c as u8)
    }
}

/// How results are shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Names per line when listing Pokemon of a type
    pub names_per_line: usize,

    /// Open the Pokemon's image in the system viewer
    pub show_images: bool,

    /// Directory image file names are resolved against
    pub images_dir: PathBuf,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            names_per_line: 10,
            show_images: false,
            images_dir: PathBuf::from("images"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub display: DisplaySettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pokedex");
        config_dir.join("settings.toml")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Load settings from an explicit file. Unlike [`Settings::load`], a
    /// missing or invalid file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values that TOML types alone cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(d) = self.data.delimiter {
            if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
                return Err(ConfigError::Validation(format!(
                    "data.delimiter must be a single ASCII character other than quote or newline, got {d:?}"
                )));
            }
        }
        if self.display.names_per_line == 0 {
            return Err(ConfigError::Validation(
                "display.names_per_line must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
