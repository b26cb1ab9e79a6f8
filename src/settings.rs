use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetailError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data_file: Option<String>,
    #[serde(default = "default_countries")]
    pub default_countries: Vec<String>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_countries() -> Vec<String> {
    vec!["United Kingdom".to_string()]
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: None,
            default_countries: default_countries(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `$TILLROLL_CONFIG_DIR`, else `~/.config/tillroll`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("TILLROLL_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tillroll")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| RetailError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// The `--file` flag wins over the saved default.
pub fn resolve_data_file(cli_file: Option<&str>, settings: &Settings) -> Result<PathBuf> {
    cli_file
        .map(str::to_string)
        .or_else(|| settings.data_file.clone())
        .map(|p| PathBuf::from(shellexpand_path(&p)))
        .ok_or(RetailError::NoDataFile)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
