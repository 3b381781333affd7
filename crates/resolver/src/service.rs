//! Builds concrete `ServiceCall`s for start/stop/restart.

use serde_json::Value;
use shared::{
    config::{ContainerConfig, ServiceSpec},
    domain::ServiceCall,
};
use tracing::warn;

use crate::capability::{restart_capability, toggle_capability};

/// Splits `"domain.service"`; anything but exactly two non-empty parts is rejected.
pub fn split_service_name(name: &str) -> Option<(&str, &str)> {
    let mut parts = name.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(domain), Some(service), None) if !domain.is_empty() && !service.is_empty() => {
            Some((domain, service))
        }
        _ => None,
    }
}

pub fn normalize_service(spec: &ServiceSpec) -> Option<ServiceCall> {
    match spec {
        ServiceSpec::Name(name) => match split_service_name(name) {
            Some((domain, service)) => Some(ServiceCall::new(domain, service)),
            None => {
                warn!("docker card: invalid service string {name:?}");
                None
            }
        },
        ServiceSpec::Detailed(object) => {
            let explicit_domain = object.domain.as_deref().filter(|d| !d.is_empty());
            let service = object.service.as_deref().filter(|s| !s.is_empty());
            let (domain, service) = match (explicit_domain, service) {
                (Some(domain), Some(service)) => (domain, service),
                (None, Some(qualified)) => match split_service_name(qualified) {
                    Some(pair) => pair,
                    None => {
                        warn!("docker card: service object without domain: {object:?}");
                        return None;
                    }
                },
                _ => {
                    warn!("docker card: invalid service object: {object:?}");
                    return None;
                }
            };

            let mut call = ServiceCall::new(domain, service);
            if let Some(data) = object.service_data.as_ref().or(object.data.as_ref()) {
                call.data = data.clone();
            }
            if let Some(entity_id) = object.entity_id.as_deref().filter(|e| !e.is_empty()) {
                call.data
                    .entry("entity_id")
                    .or_insert_with(|| Value::String(entity_id.to_string()));
            }
            call.target = object.target.clone();
            Some(call)
        }
        ServiceSpec::Other(value) => {
            warn!("docker card: unsupported service definition: {value}");
            None
        }
    }
}

/// Domain table first, then the explicit `start_service`/`stop_service`.
pub fn resolve_toggle_call(config: &ContainerConfig, should_run: bool) -> Option<ServiceCall> {
    if let Some(capability) = toggle_capability(config.control_entity(), config.control_domain()) {
        return Some(capability.call(should_run));
    }
    let explicit = if should_run {
        config.start_service.as_ref()
    } else {
        config.stop_service.as_ref()
    };
    explicit.and_then(normalize_service)
}

/// `restart_entity` through the restart table first, then `restart_service`.
pub fn resolve_restart_call(config: &ContainerConfig) -> Option<ServiceCall> {
    if let Some(capability) = restart_capability(config.restart_entity(), config.restart_domain())
    {
        return Some(capability.call());
    }
    config.restart_service.as_ref().and_then(normalize_service)
}

/// Both directions must resolve for the switch to be usable.
pub fn can_toggle(config: &ContainerConfig) -> bool {
    resolve_toggle_call(config, true).is_some() && resolve_toggle_call(config, false).is_some()
}

pub fn can_restart(config: &ContainerConfig) -> bool {
    resolve_restart_call(config).is_some()
}
