//! Fixed domain tables deciding which service verbs an entity supports.

use shared::domain::{domain_from_entity_id, ServiceCall};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleVerbs {
    pub on: &'static str,
    pub off: &'static str,
}

const TURN_ON_OFF: ToggleVerbs = ToggleVerbs {
    on: "turn_on",
    off: "turn_off",
};

pub const TOGGLE_SERVICES: &[(&str, ToggleVerbs)] = &[
    ("switch", TURN_ON_OFF),
    ("input_boolean", TURN_ON_OFF),
    ("automation", TURN_ON_OFF),
    ("script", TURN_ON_OFF),
    ("light", TURN_ON_OFF),
    ("fan", TURN_ON_OFF),
];

pub const RESTART_SERVICES: &[(&str, &str)] = &[
    ("button", "press"),
    ("switch", "turn_on"),
    ("script", "turn_on"),
    ("automation", "trigger"),
];

pub fn toggle_verbs(domain: &str) -> Option<ToggleVerbs> {
    TOGGLE_SERVICES
        .iter()
        .find(|(d, _)| *d == domain)
        .map(|(_, verbs)| *verbs)
}

pub fn restart_verb(domain: &str) -> Option<&'static str> {
    RESTART_SERVICES
        .iter()
        .find(|(d, _)| *d == domain)
        .map(|(_, verb)| *verb)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleCapability {
    pub domain: String,
    pub entity_id: String,
    pub verbs: ToggleVerbs,
}

impl ToggleCapability {
    pub fn call(&self, should_run: bool) -> ServiceCall {
        let verb = if should_run {
            self.verbs.on
        } else {
            self.verbs.off
        };
        ServiceCall::for_entity(&self.domain, verb, &self.entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartCapability {
    pub domain: String,
    pub entity_id: String,
    pub service: &'static str,
}

impl RestartCapability {
    pub fn call(&self) -> ServiceCall {
        ServiceCall::for_entity(&self.domain, self.service, &self.entity_id)
    }
}

fn effective_domain<'a>(entity_id: &'a str, domain_override: Option<&'a str>) -> Option<&'a str> {
    domain_override
        .filter(|d| !d.is_empty())
        .or_else(|| domain_from_entity_id(entity_id))
}

/// The override domain, when given, replaces the entity-id prefix both for
/// the table lookup and for the emitted call.
pub fn toggle_capability(
    entity_id: Option<&str>,
    domain_override: Option<&str>,
) -> Option<ToggleCapability> {
    let entity_id = entity_id.filter(|e| !e.is_empty())?;
    let domain = effective_domain(entity_id, domain_override)?;
    let verbs = toggle_verbs(domain)?;
    Some(ToggleCapability {
        domain: domain.to_string(),
        entity_id: entity_id.to_string(),
        verbs,
    })
}

pub fn restart_capability(
    entity_id: Option<&str>,
    domain_override: Option<&str>,
) -> Option<RestartCapability> {
    let entity_id = entity_id.filter(|e| !e.is_empty())?;
    let domain = effective_domain(entity_id, domain_override)?;
    let service = restart_verb(domain)?;
    Some(RestartCapability {
        domain: domain.to_string(),
        entity_id: entity_id.to_string(),
        service,
    })
}
