use serde::Serialize;
use shared::{
    config::{CardConfig, ContainerConfig},
    domain::EntitySnapshot,
};

use crate::service::{can_restart, can_toggle};

/// Raw tokens with a dedicated label even when outside the running/stopped sets.
const TRANSITIONAL_LABELS: &[(&str, &str)] = &[
    ("starting", "status.starting"),
    ("degraded", "status.degraded"),
    ("paused", "status.paused"),
    ("unknown", "status.unknown"),
    ("idle", "status.idle"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Running,
    Stopped,
    Unknown,
}

impl StatusKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

/// Either a localization key or text to show as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Key(&'static str),
    Verbatim(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResult {
    pub entity_id: Option<String>,
    pub raw_state: Option<String>,
    pub is_running: bool,
    pub is_stopped: bool,
    pub label: StatusLabel,
    pub kind: StatusKind,
    pub can_toggle: bool,
    pub can_restart: bool,
}

/// Effective running/stopped token sets: container override, else card-wide.
#[derive(Debug, Clone, Copy)]
pub struct StateVocabulary<'a> {
    running: &'a [String],
    stopped: &'a [String],
}

impl<'a> StateVocabulary<'a> {
    pub fn new(running: &'a [String], stopped: &'a [String]) -> Self {
        Self { running, stopped }
    }

    pub fn for_container(config: &'a ContainerConfig, card: &'a CardConfig) -> Self {
        Self {
            running: config
                .running_states
                .as_deref()
                .unwrap_or(card.running_states.as_slice()),
            stopped: config
                .stopped_states
                .as_deref()
                .unwrap_or(card.stopped_states.as_slice()),
        }
    }

    fn contains(set: &[String], normalized: &str) -> bool {
        set.iter().any(|token| token.to_lowercase() == normalized)
    }

    pub fn classify(&self, raw: Option<&str>) -> StatusKind {
        let Some(normalized) = normalize(raw) else {
            return StatusKind::Unknown;
        };
        if Self::contains(self.running, &normalized) {
            StatusKind::Running
        } else if Self::contains(self.stopped, &normalized) {
            StatusKind::Stopped
        } else {
            StatusKind::Unknown
        }
    }

    pub fn label(&self, raw: Option<&str>) -> StatusLabel {
        let (Some(raw), Some(normalized)) = (raw, normalize(raw)) else {
            return StatusLabel::Key("status.unknown");
        };
        if Self::contains(self.running, &normalized) {
            return StatusLabel::Key("status.running");
        }
        if Self::contains(self.stopped, &normalized) {
            return StatusLabel::Key("status.stopped");
        }
        transitional_label(&normalized)
            .map(StatusLabel::Key)
            .unwrap_or_else(|| StatusLabel::Verbatim(capitalize(raw)))
    }
}

fn normalize(raw: Option<&str>) -> Option<String> {
    raw.filter(|r| !r.is_empty()).map(str::to_lowercase)
}

pub(crate) fn transitional_label(normalized: &str) -> Option<&'static str> {
    TRANSITIONAL_LABELS
        .iter()
        .find(|(token, _)| *token == normalized)
        .map(|(_, key)| *key)
}

pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn resolve_status(
    config: &ContainerConfig,
    card: &CardConfig,
    snapshot: &EntitySnapshot,
) -> StatusResult {
    let entity_id = config.state_entity();
    let raw_state = entity_id.and_then(|id| snapshot.state_of(id));
    let vocabulary = StateVocabulary::for_container(config, card);
    let kind = vocabulary.classify(raw_state);

    StatusResult {
        entity_id: entity_id.map(str::to_string),
        raw_state: raw_state.map(str::to_string),
        is_running: kind == StatusKind::Running,
        is_stopped: kind == StatusKind::Stopped,
        label: vocabulary.label(raw_state),
        kind,
        can_toggle: can_toggle(config),
        can_restart: can_restart(config),
    }
}

/// Configured name, else the friendly name (or id) of the first named entity.
/// `None` means the caller should fall back to a generic localized word.
pub fn resolve_display_name(config: &ContainerConfig, snapshot: &EntitySnapshot) -> Option<String> {
    if let Some(name) = config.name() {
        return Some(name.to_string());
    }
    let entity_id = config.naming_entity()?;
    let friendly = snapshot
        .get(entity_id)
        .and_then(|entity| entity.friendly_name())
        .unwrap_or(entity_id);
    Some(friendly.to_string())
}
