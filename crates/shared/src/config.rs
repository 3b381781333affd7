//! Card and container configuration as supplied by the host.
//!
//! The host hands over loosely shaped data (the Lovelace YAML/JSON card
//! config). Everything here is normalized once at ingestion and treated as
//! immutable afterwards.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::{domain::ContainerKey, error::ConfigError};

pub const DEFAULT_RUNNING_STATES: &[&str] = &["running", "on", "started", "up"];
pub const DEFAULT_STOPPED_STATES: &[&str] = &["stopped", "off", "exited", "down", "inactive"];
pub const DEFAULT_RUNNING_COLOR: &str = "var(--state-active-color, var(--success-color, #2e8f57))";
pub const DEFAULT_NOT_RUNNING_COLOR: &str = "var(--state-error-color, var(--error-color, #c22040))";
pub const DEFAULT_HOLD_DELAY: Duration = Duration::from_millis(500);

/// A remote call named in config: either `"domain.service"` or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceSpec {
    Name(String),
    Detailed(ServiceObject),
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
}

/// A tap/hold binding: string shorthand (`"toggle"`) or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionDescriptor {
    Shorthand(String),
    Detailed(ActionFields),
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status_entity: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub control_entity: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub switch_entity: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub restart_entity: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub cpu_entity: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub memory_entity: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub control_domain: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub switch_domain: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub restart_domain: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub running_states: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub stopped_states: Option<Vec<String>>,
    pub start_service: Option<ServiceSpec>,
    pub stop_service: Option<ServiceSpec>,
    pub restart_service: Option<ServiceSpec>,
    pub tap_action: Option<ActionDescriptor>,
    pub hold_action: Option<ActionDescriptor>,
    pub hold_delay: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub running_color: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub not_running_color: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub stopped_color: Option<String>,
}

/// Numbers and booleans are taken as their text; other non-scalars are
/// dropped with a warning and leave the field unset.
fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => {
            warn!("docker card: ignoring non-scalar value where text was expected: {other}");
            None
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_string(Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(items.into_iter().filter_map(scalar_string).collect())),
        other => {
            warn!("docker card: expected a list of states, got {other}; using defaults");
            Ok(None)
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ContainerConfig {
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    /// Entity whose state drives the status: status, then control, then switch.
    pub fn state_entity(&self) -> Option<&str> {
        present(&self.status_entity)
            .or_else(|| present(&self.control_entity))
            .or_else(|| present(&self.switch_entity))
    }

    pub fn control_entity(&self) -> Option<&str> {
        present(&self.control_entity).or_else(|| present(&self.switch_entity))
    }

    pub fn control_domain(&self) -> Option<&str> {
        present(&self.control_domain).or_else(|| present(&self.switch_domain))
    }

    pub fn restart_entity(&self) -> Option<&str> {
        present(&self.restart_entity)
    }

    pub fn restart_domain(&self) -> Option<&str> {
        present(&self.restart_domain)
    }

    pub fn cpu_entity(&self) -> Option<&str> {
        present(&self.cpu_entity)
    }

    pub fn memory_entity(&self) -> Option<&str> {
        present(&self.memory_entity)
    }

    /// First entity usable as a display-name source.
    pub fn naming_entity(&self) -> Option<&str> {
        self.state_entity().or_else(|| self.restart_entity())
    }

    pub fn hold_delay(&self) -> Duration {
        match self.hold_delay.as_ref().and_then(Value::as_f64) {
            Some(ms) if ms.is_finite() && ms >= 0.0 => Duration::from_secs_f64(ms / 1000.0),
            _ => DEFAULT_HOLD_DELAY,
        }
    }

    pub fn running_color<'a>(&'a self, card: &'a CardConfig) -> &'a str {
        present(&self.running_color).unwrap_or(card.running_color.as_str())
    }

    pub fn not_running_color<'a>(&'a self, card: &'a CardConfig) -> &'a str {
        present(&self.not_running_color)
            .or_else(|| present(&self.stopped_color))
            .unwrap_or(card.not_running_color.as_str())
    }
}

/// Entity ids feeding the header pill and the docker overview strip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    pub status: Option<String>,
    pub container_count: Option<String>,
    pub containers_running: Option<String>,
    pub image_count: Option<String>,
    pub docker_version: Option<String>,
    pub operating_system: Option<String>,
    pub operating_system_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerEntry {
    pub key: ContainerKey,
    pub config: ContainerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardConfig {
    pub title: Option<String>,
    pub containers: Vec<ContainerEntry>,
    pub running_states: Vec<String>,
    pub stopped_states: Vec<String>,
    pub running_color: String,
    pub not_running_color: String,
    pub overview: OverviewConfig,
    pub containers_expanded: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCardConfig {
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    containers: Option<Value>,
    container: Option<Value>,
    #[serde(deserialize_with = "lenient_list")]
    running_states: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    stopped_states: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_string")]
    running_color: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    not_running_color: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    stopped_color: Option<String>,
    docker_overview: Option<Value>,
    containers_expanded: Option<Value>,
}

impl CardConfig {
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Err(ConfigError::Missing);
        }
        // Only a null config is fatal; bad fields fall back to their defaults.
        let raw = if value.is_object() {
            serde_json::from_value::<RawCardConfig>(value).unwrap_or_else(|err| {
                warn!("docker card: ignoring malformed card configuration: {err}");
                RawCardConfig::default()
            })
        } else {
            warn!("docker card: card configuration is not an object: {value}");
            RawCardConfig::default()
        };

        let containers = raw
            .containers
            .as_ref()
            .or(raw.container.as_ref())
            .map(normalize_containers)
            .unwrap_or_default()
            .into_iter()
            .map(|config| ContainerEntry {
                key: container_key(&config),
                config,
            })
            .collect::<Vec<_>>();
        if containers.is_empty() {
            warn!("docker card: 'containers' is empty, the card will render a placeholder");
        }

        let overview = match raw.docker_overview {
            Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_else(|err| {
                warn!("docker card: ignoring malformed docker_overview: {err}");
                OverviewConfig::default()
            }),
            _ => OverviewConfig::default(),
        };

        let not_running_color = present(&raw.not_running_color)
            .or_else(|| present(&raw.stopped_color))
            .unwrap_or(DEFAULT_NOT_RUNNING_COLOR)
            .to_string();

        Ok(Self {
            title: raw.title.filter(|t| !t.is_empty()),
            containers,
            running_states: raw
                .running_states
                .unwrap_or_else(|| to_owned_list(DEFAULT_RUNNING_STATES)),
            stopped_states: raw
                .stopped_states
                .unwrap_or_else(|| to_owned_list(DEFAULT_STOPPED_STATES)),
            running_color: present(&raw.running_color)
                .unwrap_or(DEFAULT_RUNNING_COLOR)
                .to_string(),
            not_running_color,
            overview,
            containers_expanded: matches!(raw.containers_expanded, Some(Value::Bool(true))),
        })
    }

    pub fn container(&self, key: &ContainerKey) -> Option<&ContainerEntry> {
        self.containers.iter().find(|entry| &entry.key == key)
    }

    /// Looks a container up by key, then by case-insensitive display name.
    pub fn find_container(&self, needle: &str) -> Option<&ContainerEntry> {
        self.containers
            .iter()
            .find(|entry| entry.key.as_str() == needle)
            .or_else(|| {
                self.containers.iter().find(|entry| {
                    entry
                        .config
                        .name()
                        .is_some_and(|name| name.eq_ignore_ascii_case(needle))
                })
            })
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            title: None,
            containers: Vec::new(),
            running_states: to_owned_list(DEFAULT_RUNNING_STATES),
            stopped_states: to_owned_list(DEFAULT_STOPPED_STATES),
            running_color: DEFAULT_RUNNING_COLOR.to_string(),
            not_running_color: DEFAULT_NOT_RUNNING_COLOR.to_string(),
            overview: OverviewConfig::default(),
            containers_expanded: false,
        }
    }
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Accepts a list, a map of named container objects, or one container object.
/// A map counts as named containers once any value is an object; non-object
/// entries are skipped with a warning.
pub fn normalize_containers(input: &Value) -> Vec<ContainerConfig> {
    let candidates: Vec<&Value> = match input {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) if map.values().any(Value::is_object) => map.values().collect(),
        Value::Object(_) => vec![input],
        Value::Null => return Vec::new(),
        other => {
            warn!("docker card: containers configuration could not be parsed: {other}");
            return Vec::new();
        }
    };

    let result: Vec<ContainerConfig> = candidates
        .into_iter()
        .filter_map(|candidate| {
            if !candidate.is_object() {
                warn!("docker card: skipping non-object container entry: {candidate}");
                return None;
            }
            match serde_json::from_value::<ContainerConfig>(candidate.clone()) {
                Ok(mut config) => {
                    if present(&config.not_running_color).is_none() {
                        if let Some(alias) = present(&config.stopped_color) {
                            config.not_running_color = Some(alias.to_string());
                        }
                    }
                    Some(config)
                }
                Err(err) => {
                    warn!("docker card: skipping malformed container entry: {err}");
                    None
                }
            }
        })
        .collect();

    if result.is_empty() && !input.is_null() {
        warn!("docker card: containers configuration yielded no usable entries");
    }
    result
}

/// Explicit id, else name/status/control/switch entity, else a random token.
pub fn container_key(config: &ContainerConfig) -> ContainerKey {
    present(&config.id)
        .or_else(|| config.name())
        .or_else(|| present(&config.status_entity))
        .or_else(|| present(&config.control_entity))
        .or_else(|| present(&config.switch_entity))
        .map(ContainerKey::new)
        .unwrap_or_else(|| ContainerKey(format!("docker_{}", Uuid::new_v4().simple())))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
