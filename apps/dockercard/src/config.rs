use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "dockercard.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub hass_url: Option<String>,
    pub hass_token: Option<String>,
    pub card_path: PathBuf,
    pub language: String,
    pub translations_dir: Option<PathBuf>,
    pub hold_delay_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hass_url: None,
            hass_token: None,
            card_path: PathBuf::from("docker-card.yaml"),
            language: "en".into(),
            translations_dir: None,
            hold_delay_ms: None,
        }
    }
}

impl Settings {
    pub fn hold_delay(&self) -> Option<Duration> {
        self.hold_delay_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    hass_url: Option<String>,
    hass_token: Option<String>,
    card_path: Option<PathBuf>,
    language: Option<String>,
    translations_dir: Option<PathBuf>,
    hold_delay_ms: Option<u64>,
}

/// Defaults, then the settings file, then the environment.
pub fn load_settings(path: Option<PathBuf>) -> Settings {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(&path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!("ignoring malformed settings file: {err}");
            return;
        }
    };
    if let Some(v) = file_cfg.hass_url {
        settings.hass_url = Some(v);
    }
    if let Some(v) = file_cfg.hass_token {
        settings.hass_token = Some(v);
    }
    if let Some(v) = file_cfg.card_path {
        settings.card_path = v;
    }
    if let Some(v) = file_cfg.language {
        settings.language = v;
    }
    if let Some(v) = file_cfg.translations_dir {
        settings.translations_dir = Some(v);
    }
    if let Some(v) = file_cfg.hold_delay_ms {
        settings.hold_delay_ms = Some(v);
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("HASS_URL") {
        settings.hass_url = Some(v);
    }
    if let Some(v) = var("APP__HASS_URL") {
        settings.hass_url = Some(v);
    }

    if let Some(v) = var("HASS_TOKEN") {
        settings.hass_token = Some(v);
    }
    if let Some(v) = var("APP__HASS_TOKEN") {
        settings.hass_token = Some(v);
    }

    if let Some(v) = var("DOCKERCARD_CARD") {
        settings.card_path = PathBuf::from(v);
    }
    if let Some(v) = var("APP__CARD_PATH") {
        settings.card_path = PathBuf::from(v);
    }

    if let Some(v) = var("DOCKERCARD_LANGUAGE") {
        settings.language = v;
    }
    if let Some(v) = var("APP__LANGUAGE") {
        settings.language = v;
    }

    if let Some(v) = var("APP__TRANSLATIONS_DIR") {
        settings.translations_dir = Some(PathBuf::from(v));
    }

    if let Some(v) = var("APP__HOLD_DELAY_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.hold_delay_ms = Some(parsed),
            Err(_) => warn!("ignoring APP__HOLD_DELAY_MS={v:?}: not a number of milliseconds"),
        }
    }
}
