use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable identity of a configured container, derived once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerKey(pub String);

impl ContainerKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    Start,
    Stop,
    Restart,
}

impl PendingAction {
    pub fn for_toggle(should_run: bool) -> Self {
        if should_run {
            Self::Start
        } else {
            Self::Stop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single host entity, shaped like a Home Assistant state object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl EntityState {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
            last_changed: None,
            last_updated: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// Read-only view of the host state store. Replaced wholesale on every update.
#[derive(Debug, Clone, Default)]
pub struct EntitySnapshot {
    entities: HashMap<String, EntityState>,
}

impl EntitySnapshot {
    pub fn from_states(states: impl IntoIterator<Item = EntityState>) -> Self {
        states.into_iter().collect()
    }

    pub fn insert(&mut self, entity: EntityState) {
        self.entities.insert(entity.entity_id.clone(), entity);
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }

    pub fn state_of(&self, entity_id: &str) -> Option<&str> {
        self.get(entity_id).map(|entity| entity.state.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<EntityState> for EntitySnapshot {
    fn from_iter<I: IntoIterator<Item = EntityState>>(iter: I) -> Self {
        let mut snapshot = Self::default();
        for entity in iter {
            snapshot.insert(entity);
        }
        snapshot
    }
}

/// A remote invocation request: `domain.service` with a data payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            data: Map::new(),
            target: None,
        }
    }

    pub fn for_entity(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        let mut call = Self::new(domain, service);
        call.data
            .insert("entity_id".to_string(), Value::String(entity_id.into()));
        call
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.data.get("entity_id").and_then(Value::as_str)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }
}

/// Text before the first `.` of an entity id, if non-empty.
pub fn domain_from_entity_id(entity_id: &str) -> Option<&str> {
    match entity_id.find('.') {
        Some(idx) if idx > 0 => Some(&entity_id[..idx]),
        _ => None,
    }
}
