use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub client_id: String,
    pub user_email: Option<String>,
    pub imap_server: Option<String>,
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub snooze: SnoozeConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SnoozeConfig {
    /// Parent label all snooze labels live under.
    pub grouping_label: String,
    /// Mark threads unread when they come back to the inbox.
    pub mark_unread: bool,
    pub labels: SnoozeLabels,
    pub hours: TriggerHours,
}

impl Default for SnoozeConfig {
    fn default() -> Self {
        Self {
            grouping_label: "Remind me".to_string(),
            mark_unread: true,
            labels: SnoozeLabels::default(),
            hours: TriggerHours::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SnoozeLabels {
    pub evening: String,
    pub tomorrow: String,
    pub saturday: String,
}

impl Default for SnoozeLabels {
    fn default() -> Self {
        Self {
            evening: "In the evening".to_string(),
            tomorrow: "Tomorrow".to_string(),
            saturday: "On Saturday".to_string(),
        }
    }
}

impl SnoozeLabels {
    pub fn all(&self) -> [&str; 3] {
        [&self.evening, &self.tomorrow, &self.saturday]
    }
}

/// Local hour (0-23) each release tick fires at.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TriggerHours {
    pub evening: u32,
    pub tomorrow: u32,
    pub saturday: u32,
}

impl Default for TriggerHours {
    fn default() -> Self {
        Self {
            evening: 18,
            tomorrow: 6,
            saturday: 6,
        }
    }
}

impl SnoozeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grouping_label.trim().is_empty() {
            return Err(anyhow!("snooze.grouping_label must not be empty"));
        }
        for name in self.labels.all() {
            if name.trim().is_empty() {
                return Err(anyhow!("snooze labels must not be empty"));
            }
            if name.contains('/') {
                return Err(anyhow!("snooze label '{name}' must not contain '/'"));
            }
        }
        let h = self.hours;
        for (tick, hour) in [
            ("evening", h.evening),
            ("tomorrow", h.tomorrow),
            ("saturday", h.saturday),
        ] {
            if hour > 23 {
                return Err(anyhow!("snooze.hours.{tick} must be 0-23, got {hour}"));
            }
        }
        Ok(())
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join("gmail_snooze");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Loads and validates `path`. A missing file is replaced by a template and
/// reported as an error so the user edits it first.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config {
            client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
            user_email: Some("you@example.com".to_string()),
            imap_server: Some("imap.gmail.com".to_string()),
            redirect_uri: Some("http://127.0.0.1:8080/callback".to_string()),
            snooze: SnoozeConfig::default(),
        };
        fs::write(path, toml::to_string_pretty(&sample)?)?;
        return Err(anyhow!(
            "Created template config at {} — edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    cfg.snooze.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn imap_server(&self) -> String {
        self.imap_server
            .clone()
            .unwrap_or_else(|| "imap.gmail.com".to_string())
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| "http://127.0.0.1:8080/callback".to_string())
    }

    pub fn user_email(&self) -> Result<String> {
        self.user_email
            .clone()
            .ok_or_else(|| anyhow!("user_email not set in config"))
    }
}
