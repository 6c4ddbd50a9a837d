// User configuration and best-time records
// Persisted as TOML under the platform config directory

use anyhow::{Context, Result};
use chrono::Local;
use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::mns_game::Difficulty;

const APP_NAME: &str = "mnswpr";

/// Record entry for best completion time
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub secs: u64,    // Completion time in seconds
    pub date: String, // Date in ISO format (YYYY-MM-DD)
}

/// User configuration and game records
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,

    pub best_easy: Option<Record>,
    pub best_medium: Option<Record>,
    pub best_hard: Option<Record>,

    pub seed: Option<u64>,   // Fixed seed for reproducible games
    pub ascii_icons: bool,   // Use ASCII fallback glyphs
    pub sound: bool,         // Ring the terminal bell on explosions and wins
    pub language: String,    // "en" or "zh"
}

impl Default for Config {
    fn default() -> Self {
        // Auto-detect system language on first run
        let system_lang = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
        let language = if system_lang.to_lowercase().starts_with("zh") {
            "zh".to_string()
        } else {
            "en".to_string()
        };

        Config {
            difficulty: Difficulty::Easy,
            best_easy: None,
            best_medium: None,
            best_hard: None,
            seed: None,
            ascii_icons: false,
            sound: true,
            language,
        }
    }
}

impl Config {
    fn slot(&self, d: Difficulty) -> &Option<Record> {
        match d {
            Difficulty::Easy => &self.best_easy,
            Difficulty::Medium => &self.best_medium,
            Difficulty::Hard => &self.best_hard,
        }
    }

    fn slot_mut(&mut self, d: Difficulty) -> &mut Option<Record> {
        match d {
            Difficulty::Easy => &mut self.best_easy,
            Difficulty::Medium => &mut self.best_medium,
            Difficulty::Hard => &mut self.best_hard,
        }
    }

    /// Best time in seconds for a difficulty
    pub fn get_record(&self, d: Difficulty) -> Option<u64> {
        self.slot(d).as_ref().map(|r| r.secs)
    }

    /// Best time and the date it was set
    pub fn get_record_detail(&self, d: Difficulty) -> Option<(u64, String)> {
        self.slot(d).as_ref().map(|r| (r.secs, r.date.clone()))
    }

    /// Store `secs` if it beats the current record. Returns true on a new record.
    pub fn set_record(&mut self, d: Difficulty, secs: u64) -> bool {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let slot = self.slot_mut(d);
        if slot.as_ref().is_none_or(|r| secs < r.secs) {
            *slot = Some(Record { secs, date });
            true
        } else {
            false
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "mnswpr", APP_NAME)
}

fn file_in_config_dir(file: &str) -> Option<PathBuf> {
    match project_dirs() {
        Some(proj) => Some(proj.config_dir().join(file)),
        // fallback to current directory
        None => env::current_dir().ok().map(|d| d.join(file)),
    }
}

/// Get the configuration file path
/// e.g. ~/.config/mnswpr/mnswpr.toml on Linux
pub fn config_path() -> Option<PathBuf> {
    file_in_config_dir(&format!("{}.toml", APP_NAME))
}

/// Log file next to the config file; the terminal owns stdout and stderr
pub fn log_path() -> Option<PathBuf> {
    file_in_config_dir(&format!("{}.log", APP_NAME))
}

/// Parse a config file body
pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("invalid config file")
}

/// Read a config file from disk
pub fn read_config(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_config(&s)
}

/// Write a config file, creating its directory if needed
pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string(cfg).context("serializing config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Load configuration from disk, or create the default if missing or unreadable
pub fn load_or_create_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if path.exists() {
        match read_config(&path) {
            Ok(cfg) => {
                info!("loaded config from {}", path.display());
                return cfg;
            }
            Err(e) => warn!("{:#}; using defaults", e),
        }
    }
    let cfg = Config::default();
    if let Err(e) = write_config(&path, &cfg) {
        warn!("{:#}", e);
    }
    cfg
}

/// Save configuration to disk; failures are logged, never fatal
pub fn save_config(cfg: &Config) {
    if let Some(path) = config_path() {
        if let Err(e) = write_config(&path, cfg) {
            warn!("{:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let mut cfg = Config::default();
        cfg.difficulty = Difficulty::Hard;
        cfg.seed = Some(99);
        cfg.best_medium = Some(Record {
            secs: 88,
            date: "2026-01-22".to_string(),
        });
        let s = toml::to_string(&cfg).unwrap();
        assert!(s.contains("difficulty = \"Hard\""));
        assert_eq!(parse_config(&s).unwrap(), cfg);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let cfg = parse_config("difficulty = \"Medium\"\nlanguage = \"zh\"\n").unwrap();
        assert_eq!(cfg.difficulty, Difficulty::Medium);
        assert_eq!(cfg.language, "zh");
        assert!(cfg.sound);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.get_record(Difficulty::Easy), None);
    }

    #[test]
    fn test_bad_config_is_an_error() {
        assert!(parse_config("difficulty = \"Impossible\"").is_err());
        assert!(parse_config("sound = 3").is_err());
    }

    #[test]
    fn test_set_record_keeps_best() {
        let mut cfg = Config::default();
        assert!(cfg.set_record(Difficulty::Easy, 40));
        assert!(!cfg.set_record(Difficulty::Easy, 55));
        assert!(!cfg.set_record(Difficulty::Easy, 40));
        assert!(cfg.set_record(Difficulty::Easy, 31));
        assert_eq!(cfg.get_record(Difficulty::Easy), Some(31));
        let (_, date) = cfg.get_record_detail(Difficulty::Easy).unwrap();
        assert_eq!(date.len(), 10);
        assert_eq!(cfg.get_record(Difficulty::Hard), None);
    }

    #[test]
    fn test_write_then_read() {
        let path = env::temp_dir().join(format!("mnswpr-test-{}", std::process::id())).join("cfg.toml");
        let mut cfg = Config::default();
        cfg.ascii_icons = true;
        write_config(&path, &cfg).unwrap();
        assert_eq!(read_config(&path).unwrap(), cfg);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
