use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

const DATABASE_FILE: &str = "visit-tracker.db";
const LOG_FILE: &str = "visit-tracker.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_path: String,
    #[serde(default = "default_reminder_width")]
    pub reminder_width_percent: u16,
    #[serde(default = "default_buyer_options")]
    pub buyer_options: Vec<String>,
    #[serde(default = "default_form_close_delay_ms")]
    pub form_close_delay_ms: u64,
    #[serde(default = "default_status_message_secs")]
    pub status_message_secs: u64,
    #[serde(default = "default_change_poll_ms")]
    pub change_poll_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub quit: String,
    pub help: String,
    pub save: String,
    pub edit: String,
    pub open_day: String,
    pub new_visit: String,
    pub today: String,
    pub goto: String,
    pub back: String,
    pub toggle_reminders: String,
    pub undo: String,
    pub word_left: String,
    pub word_right: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: "q".to_string(),
            help: "F1".to_string(),
            save: "Ctrl+s".to_string(),
            edit: "e".to_string(),
            open_day: "o".to_string(),
            new_visit: "n".to_string(),
            today: "t".to_string(),
            goto: "g".to_string(),
            back: "Esc".to_string(),
            toggle_reminders: "r".to_string(),
            undo: "Ctrl+z".to_string(),
            word_left: "Ctrl+Left".to_string(),
            word_right: "Ctrl+Right".to_string(),
        }
    }
}

impl KeyBindings {
    /// Put the default back for every binding that does not parse.
    /// Returns the names that were reset.
    pub fn reset_invalid(&mut self) -> Vec<&'static str> {
        let defaults = KeyBindings::default();
        let mut reset = Vec::new();
        for (name, binding, default) in [
            ("quit", &mut self.quit, defaults.quit),
            ("help", &mut self.help, defaults.help),
            ("save", &mut self.save, defaults.save),
            ("edit", &mut self.edit, defaults.edit),
            ("open_day", &mut self.open_day, defaults.open_day),
            ("new_visit", &mut self.new_visit, defaults.new_visit),
            ("today", &mut self.today, defaults.today),
            ("goto", &mut self.goto, defaults.goto),
            ("back", &mut self.back, defaults.back),
            ("toggle_reminders", &mut self.toggle_reminders, defaults.toggle_reminders),
            ("undo", &mut self.undo, defaults.undo),
            ("word_left", &mut self.word_left, defaults.word_left),
            ("word_right", &mut self.word_right, defaults.word_right),
        ] {
            if utils::parse_key_binding(binding).is_err() {
                *binding = default;
                reset.push(name);
            }
        }
        reset
    }

    /// (name, binding) pairs, used for validation and the help overlay
    pub fn entries(&self) -> [(&'static str, &str); 13] {
        [
            ("quit", self.quit.as_str()),
            ("help", self.help.as_str()),
            ("save", self.save.as_str()),
            ("edit", self.edit.as_str()),
            ("open_day", self.open_day.as_str()),
            ("new_visit", self.new_visit.as_str()),
            ("today", self.today.as_str()),
            ("goto", self.goto.as_str()),
            ("back", self.back.as_str()),
            ("toggle_reminders", self.toggle_reminders.as_str()),
            ("undo", self.undo.as_str()),
            ("word_left", self.word_left.as_str()),
            ("word_right", self.word_right.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub fg: String,
    pub bg: String,
    pub highlight_bg: String,
    /// Empty means "pick a readable color for `highlight_bg`"
    pub highlight_fg: String,
    pub accent: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::preset("white", "black", "blue", "white", "cyan")
    }
}

impl Theme {
    fn preset(fg: &str, bg: &str, highlight_bg: &str, highlight_fg: &str, accent: &str) -> Self {
        Self {
            fg: fg.to_string(),
            bg: bg.to_string(),
            highlight_bg: highlight_bg.to_string(),
            highlight_fg: highlight_fg.to_string(),
            accent: accent.to_string(),
        }
    }

    /// Themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        HashMap::from([
            ("default".to_string(), Theme::default()),
            ("dark".to_string(), Theme::preset("white", "black", "cyan", "black", "yellow")),
            ("light".to_string(), Theme::preset("black", "white", "blue", "white", "magenta")),
            ("green".to_string(), Theme::preset("green", "black", "yellow", "black", "lightgreen")),
        ])
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: String::new(),
            reminder_width_percent: default_reminder_width(),
            buyer_options: default_buyer_options(),
            form_close_delay_ms: default_form_close_delay_ms(),
            status_message_secs: default_status_message_secs(),
            change_poll_ms: default_change_poll_ms(),
            log_level: default_log_level(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes: HashMap::new(),
            config_version: default_config_version(),
        }
    }
}

fn default_reminder_width() -> u16 {
    30
}

fn default_buyer_options() -> Vec<String> {
    ["Buyer A", "Buyer B", "Buyer C"].map(String::from).to_vec()
}

fn default_form_close_delay_ms() -> u64 {
    500
}

fn default_status_message_secs() -> u64 {
    4
}

fn default_change_poll_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Theme not found: {0}")]
    ThemeNotFound(String),
    #[error("Invalid key binding for {name}: {reason}")]
    InvalidKeyBinding { name: String, reason: String },
}

impl Config {
    /// Load configuration from `path` (or the profile's default location),
    /// writing a default file first if none exists
    pub fn load_with_profile(profile: utils::Profile, path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::get_config_path(profile)?,
        };

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            Self::parse(&contents)?
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            if let Err(e) = config.save_to(&config_path) {
                eprintln!("ERROR: Failed to save config file: {}", e);
                eprintln!("Config path: {:?}", config_path);
                return Err(e);
            }
            config
        };

        if config.database_path.trim().is_empty() {
            config.database_path = Self::default_database_path_for_profile(profile);
        }
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save_to(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        match utils::get_data_dir(profile) {
            Some(data_dir) => data_dir.join(DATABASE_FILE).to_string_lossy().to_string(),
            None => match profile {
                utils::Profile::Dev => format!("~/.local/share/visit-tracker-dev/{}", DATABASE_FILE),
                utils::Profile::Prod => format!("~/.local/share/visit-tracker/{}", DATABASE_FILE),
            },
        }
    }

    /// Expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Log file, kept next to the database
    pub fn get_log_path(&self) -> PathBuf {
        let db = self.get_database_path();
        match db.parent() {
            Some(dir) => dir.join(LOG_FILE),
            None => PathBuf::from(LOG_FILE),
        }
    }

    /// Currently active theme. Unknown names fall back to the default preset.
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = self
            .themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().remove(&self.current_theme))
            .unwrap_or_default();

        if theme.highlight_fg.is_empty() {
            let calculated = get_contrast_text_color(parse_color(&theme.highlight_bg));
            theme.highlight_fg = format_color_for_display(&calculated);
        }
        theme
    }

    /// Problems that do not stop the app but should be reported
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();
        if !self.themes.contains_key(&self.current_theme)
            && !Theme::get_preset_themes().contains_key(&self.current_theme)
        {
            problems.push(ConfigError::ThemeNotFound(self.current_theme.clone()));
        }
        for (name, binding) in self.key_bindings.entries() {
            if let Err(reason) = utils::parse_key_binding(binding) {
                problems.push(ConfigError::InvalidKeyBinding {
                    name: name.to_string(),
                    reason,
                });
            }
        }
        problems
    }
}
