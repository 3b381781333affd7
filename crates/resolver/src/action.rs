//! Tap/hold action descriptors: normalization and effect planning.

use serde_json::{Map, Value};
use shared::{
    config::{ActionDescriptor, ActionFields},
    domain::ServiceCall,
};
use thiserror::Error;
use tracing::warn;

const DEFAULT_DOM_EVENT: &str = "ll-custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    None,
    MoreInfo,
    Navigate,
    Url,
    CallService,
    FireDomEvent,
    Toggle,
}

impl ActionKind {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "none" => Self::None,
            "more-info" => Self::MoreInfo,
            "navigate" => Self::Navigate,
            "url" => Self::Url,
            "call-service" => Self::CallService,
            "fire-dom-event" => Self::FireDomEvent,
            "toggle" => Self::Toggle,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MoreInfo => "more-info",
            Self::Navigate => "navigate",
            Self::Url => "url",
            Self::CallService => "call-service",
            Self::FireDomEvent => "fire-dom-event",
            Self::Toggle => "toggle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAction {
    pub kind: ActionKind,
    pub fields: ActionFields,
}

impl NormalizedAction {
    pub fn is_none(&self) -> bool {
        self.kind == ActionKind::None
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("unsupported action: {action}")]
pub struct UnsupportedAction {
    pub action: String,
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn has_value(value: &Option<Value>) -> bool {
    value.as_ref().is_some_and(|v| !v.is_null())
}

fn infer_kind(fields: &ActionFields) -> ActionKind {
    if has_text(&fields.service)
        || fields.service_data.is_some()
        || has_value(&fields.data)
        || has_value(&fields.target)
    {
        ActionKind::CallService
    } else if has_text(&fields.navigation_path) || has_text(&fields.path) {
        ActionKind::Navigate
    } else if has_text(&fields.url) || has_text(&fields.url_path) {
        ActionKind::Url
    } else {
        ActionKind::MoreInfo
    }
}

/// Explicit `action` wins; otherwise the kind is inferred from the fields
/// present, defaulting to more-info.
pub fn resolve_action(descriptor: &ActionDescriptor) -> Result<NormalizedAction, UnsupportedAction> {
    match descriptor {
        ActionDescriptor::Shorthand(action) if action.is_empty() => Ok(NormalizedAction {
            kind: ActionKind::None,
            fields: ActionFields::default(),
        }),
        ActionDescriptor::Shorthand(action) => {
            let kind = ActionKind::parse(action).ok_or_else(|| UnsupportedAction {
                action: action.clone(),
            })?;
            Ok(NormalizedAction {
                kind,
                fields: ActionFields {
                    action: Some(action.clone()),
                    ..Default::default()
                },
            })
        }
        ActionDescriptor::Detailed(fields) => {
            let kind = match fields.action.as_deref().filter(|a| !a.is_empty()) {
                Some(action) => ActionKind::parse(action).ok_or_else(|| UnsupportedAction {
                    action: action.to_string(),
                })?,
                None => infer_kind(fields),
            };
            let mut fields = fields.clone();
            fields.action = Some(kind.as_str().to_string());
            Ok(NormalizedAction { kind, fields })
        }
        ActionDescriptor::Other(value) => Err(UnsupportedAction {
            action: value.to_string(),
        }),
    }
}

/// Normalizes an optional binding, folding `none` and unsupported kinds into
/// `None`. Unsupported kinds are logged.
pub fn resolve_binding(descriptor: Option<&ActionDescriptor>) -> Option<NormalizedAction> {
    match resolve_action(descriptor?) {
        Ok(action) if action.is_none() => None,
        Ok(action) => Some(action),
        Err(err) => {
            warn!("docker card: {err}");
            None
        }
    }
}

/// A side effect the host must carry out for a resolved action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    MoreInfo { entity_id: String },
    Navigate { path: String },
    OpenUrl { url: String, new_tab: bool },
    CallService(ServiceCall),
    FireEvent { name: String, detail: Value },
}

fn first_text<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|candidate| candidate.as_deref().filter(|v| !v.is_empty()))
}

fn service_call_effect(fields: &ActionFields, default_entity: Option<&str>) -> Option<ActionEffect> {
    let mut domain = None;
    let mut service = None;
    if let Some(qualified) = first_text(&[&fields.service, &fields.service_name]) {
        let mut parts = qualified.split('.');
        if let (Some(d), Some(s)) = (parts.next(), parts.next()) {
            if !d.is_empty() && !s.is_empty() {
                domain = Some(d);
                service = Some(s);
            }
        }
    }
    let domain = domain.or_else(|| first_text(&[&fields.domain]));
    let service = service.or_else(|| first_text(&[&fields.service]));
    let (Some(domain), Some(service)) = (domain, service) else {
        warn!("docker card: call-service action missing domain/service: {fields:?}");
        return None;
    };

    let mut data: Map<String, Value> = fields
        .service_data
        .clone()
        .or_else(|| fields.data.as_ref().and_then(Value::as_object).cloned())
        .unwrap_or_default();
    if !data.contains_key("entity_id") {
        if let Some(entity) = first_text(&[&fields.entity]).or(default_entity) {
            data.insert("entity_id".to_string(), Value::String(entity.to_string()));
        }
    }

    let mut call = ServiceCall::new(domain, service);
    call.data = data;
    call.target = fields.target.clone().filter(|t| !t.is_null());
    Some(ActionEffect::CallService(call))
}

/// Turns a normalized action into the effect to perform. `default_entity`
/// is the container's status entity, used when the action names none.
pub fn plan_effect(action: &NormalizedAction, default_entity: Option<&str>) -> Option<ActionEffect> {
    let fields = &action.fields;
    let entity = || first_text(&[&fields.entity]).or(default_entity).map(str::to_string);

    match action.kind {
        ActionKind::None => None,
        ActionKind::MoreInfo => entity().map(|entity_id| ActionEffect::MoreInfo { entity_id }),
        ActionKind::Navigate => first_text(&[&fields.navigation_path, &fields.path])
            .map(|path| ActionEffect::Navigate { path: path.to_string() }),
        ActionKind::Url => {
            first_text(&[&fields.url_path, &fields.url]).map(|url| ActionEffect::OpenUrl {
                url: url.to_string(),
                new_tab: fields.new_tab != Some(false),
            })
        }
        ActionKind::CallService => service_call_effect(fields, default_entity),
        ActionKind::FireDomEvent => {
            let name =
                first_text(&[&fields.event, &fields.event_type]).unwrap_or(DEFAULT_DOM_EVENT);
            let detail = fields
                .event_data
                .clone()
                .filter(|d| !d.is_null())
                .or_else(|| fields.data.clone().filter(|d| !d.is_null()))
                .unwrap_or_else(|| Value::Object(Map::new()));
            Some(ActionEffect::FireEvent {
                name: name.to_string(),
                detail,
            })
        }
        ActionKind::Toggle => entity().map(|entity_id| {
            ActionEffect::CallService(ServiceCall::for_entity("homeassistant", "toggle", entity_id))
        }),
    }
}
