//! Dotted-key translation lookup with a built-in English catalog.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read translation catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid translation catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("translation catalog {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
}

pub fn default_catalog() -> Value {
    json!({
        "common": {
            "card_title": "Docker Card",
            "container": "container",
            "containers": "Containers"
        },
        "placeholders": {
            "waiting": "Waiting for Home Assistant…",
            "no_containers": "No containers configured."
        },
        "overview": {
            "running_total": "Running / Total",
            "images": "Images",
            "docker": "Docker",
            "os": "OS",
            "running_total_aria": "Open running containers details",
            "images_aria": "Open Docker images details",
            "docker_aria": "Open Docker version details",
            "os_aria": "Open operating system details"
        },
        "aria": {
            "open_status_details": "Open Docker status details",
            "collapse_containers": "Collapse container list",
            "expand_containers": "Expand container list"
        },
        "resources": {
            "cpu": "CPU",
            "memory": "Memory"
        },
        "actions": {
            "start": "start",
            "stop": "stop",
            "restart": "Restart",
            "start_container": "Start container",
            "stop_container": "Stop container"
        },
        "notifications": {
            "starting": "Starting {name}…",
            "stopping": "Stopping {name}…",
            "failed_start": "Failed to start {name}. Check logs.",
            "failed_stop": "Failed to stop {name}. Check logs.",
            "restarting": "Restarting {name}…",
            "failed_restart": "Failed to restart {name}.",
            "missing_toggle": "No service configured to {action} {name}.",
            "missing_restart": "No restart service configured for {name}."
        },
        "status": {
            "online": "Online",
            "offline": "Offline",
            "idle": "Idle",
            "running": "Running",
            "stopped": "Stopped",
            "unknown": "Unknown",
            "starting": "Starting",
            "degraded": "Degraded",
            "paused": "Paused"
        }
    })
}

fn lookup<'a>(tree: &'a Value, key: &str) -> Option<&'a str> {
    key.split('.')
        .try_fold(tree, |node, segment| node.as_object()?.get(segment))?
        .as_str()
        .filter(|text| !text.is_empty())
}

/// Replaces `{name}` style placeholders; unknown placeholders stay verbatim.
pub fn apply_replacements(input: &str, replacements: &[(&str, &str)]) -> String {
    if replacements.is_empty() {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if close > 0 => {
                let name = &after[..close];
                match replacements.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone)]
pub struct Localizer {
    default_catalog: Value,
    catalogs: HashMap<String, Value>,
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizer {
    pub fn new() -> Self {
        Self {
            default_catalog: default_catalog(),
            catalogs: HashMap::new(),
        }
    }

    pub fn insert_catalog(&mut self, language: impl Into<String>, catalog: Value) {
        self.catalogs.insert(language.into(), catalog);
    }

    pub fn has_language(&self, language: &str) -> bool {
        language == DEFAULT_LANGUAGE || self.catalogs.contains_key(language)
    }

    pub fn load_file(&mut self, language: &str, path: &Path) -> Result<(), CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: Value = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if !catalog.is_object() {
            return Err(CatalogError::NotAnObject {
                path: path.to_path_buf(),
            });
        }
        self.insert_catalog(language, catalog);
        Ok(())
    }

    /// Loads every `<language>.json` in `dir`. Broken files are logged and
    /// skipped; the number of catalogs loaded is returned.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(language) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let language = language.to_string();
            match self.load_file(&language, &path) {
                Ok(()) => {
                    debug!(language = %language, "docker card: loaded translations");
                    loaded += 1;
                }
                Err(err) => warn!("docker card: {err}"),
            }
        }
        Ok(loaded)
    }

    /// Requested language, then the default catalog, then the key itself.
    pub fn localize(&self, language: &str, key: &str, replacements: &[(&str, &str)]) -> String {
        if key.is_empty() {
            return String::new();
        }
        let raw = self
            .catalogs
            .get(language)
            .or_else(|| self.catalogs.get(DEFAULT_LANGUAGE))
            .and_then(|catalog| lookup(catalog, key))
            .or_else(|| lookup(&self.default_catalog, key))
            .unwrap_or(key);
        apply_replacements(raw, replacements)
    }
}
