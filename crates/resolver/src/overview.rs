//! Header pill and the docker overview strip.

use shared::{
    config::{CardConfig, OverviewConfig},
    domain::EntitySnapshot,
};

use crate::{
    status::{transitional_label, StatusLabel},
    values::{format_state_value, is_placeholder_value, parse_int_state, PLACEHOLDER},
};

const ONLINE_TOKENS: &[&str] = &["on", "running", "online", "ok", "true", "ready"];
const OFFLINE_TOKENS: &[&str] = &["off", "offline", "error", "problem", "false", "down"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Running,
    NotRunning,
    Idle,
}

impl Tone {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::NotRunning => "not-running",
            Self::Idle => "idle",
        }
    }

    /// Accent color for the tone; idle has none.
    pub fn accent<'a>(&self, card: &'a CardConfig) -> Option<&'a str> {
        match self {
            Self::Running => Some(card.running_color.as_str()),
            Self::NotRunning => Some(card.not_running_color.as_str()),
            Self::Idle => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallStatus {
    pub label: StatusLabel,
    pub css_class: &'static str,
    pub tone: Tone,
    pub entity_id: Option<String>,
}

pub fn normalize_overall_status(raw: Option<&str>) -> (StatusLabel, &'static str, Tone) {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return (StatusLabel::Key("status.unknown"), "idle", Tone::Idle);
    };
    let value = raw.to_lowercase();
    if ONLINE_TOKENS.contains(&value.as_str()) {
        return (StatusLabel::Key("status.online"), "running", Tone::Running);
    }
    if OFFLINE_TOKENS.contains(&value.as_str()) {
        return (StatusLabel::Key("status.offline"), "offline", Tone::NotRunning);
    }
    match transitional_label(&value) {
        Some(key) => (StatusLabel::Key(key), "idle", Tone::Idle),
        None => (
            StatusLabel::Verbatim(format_state_value(Some(raw))),
            "idle",
            Tone::Idle,
        ),
    }
}

pub fn overall_status(card: &CardConfig, snapshot: &EntitySnapshot) -> OverallStatus {
    let entity_id = card.overview.status.as_deref().filter(|e| !e.is_empty());
    let raw = entity_id.and_then(|id| snapshot.state_of(id));
    let (label, css_class, tone) = normalize_overall_status(raw);
    OverallStatus {
        label,
        css_class,
        tone,
        entity_id: entity_id.map(str::to_string),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewKind {
    RunningTotal,
    Images,
    Docker,
    Os,
}

impl OverviewKind {
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::RunningTotal => "overview.running_total",
            Self::Images => "overview.images",
            Self::Docker => "overview.docker",
            Self::Os => "overview.os",
        }
    }

    pub fn aria_key(&self) -> &'static str {
        match self {
            Self::RunningTotal => "overview.running_total_aria",
            Self::Images => "overview.images_aria",
            Self::Docker => "overview.docker_aria",
            Self::Os => "overview.os_aria",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::RunningTotal => "rt",
            Self::Images => "img",
            Self::Docker => "doc",
            Self::Os => "os",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewItem {
    pub kind: OverviewKind,
    pub value: String,
    pub tone: Option<Tone>,
    pub entity_id: Option<String>,
}

struct Reading<'a> {
    entity_id: Option<&'a str>,
    state: Option<&'a str>,
}

fn read<'a>(entity_id: &'a Option<String>, snapshot: &'a EntitySnapshot) -> Reading<'a> {
    let entity_id = entity_id.as_deref().filter(|e| !e.is_empty());
    Reading {
        entity_id,
        state: entity_id.and_then(|id| snapshot.state_of(id)),
    }
}

/// Items whose value is only placeholders are left out entirely.
pub fn overview_items(overview: &OverviewConfig, snapshot: &EntitySnapshot) -> Vec<OverviewItem> {
    let total = read(&overview.container_count, snapshot);
    let running = read(&overview.containers_running, snapshot);
    let images = read(&overview.image_count, snapshot);
    let docker = read(&overview.docker_version, snapshot);
    let os_name = read(&overview.operating_system, snapshot);
    let os_version = read(&overview.operating_system_version, snapshot);

    let mut items = Vec::new();
    let mut push = |kind, value: String, tone, entity_id: Option<&str>| {
        if !is_placeholder_value(&value) {
            items.push(OverviewItem {
                kind,
                value,
                tone,
                entity_id: entity_id.map(str::to_string),
            });
        }
    };

    let running_value = format!(
        "{} / {}",
        format_state_value(running.state),
        format_state_value(total.state)
    );
    let tone = match (
        parse_int_state(running.state),
        parse_int_state(total.state),
    ) {
        (Some(up), Some(all)) if up != all => Tone::NotRunning,
        _ => Tone::Running,
    };
    push(
        OverviewKind::RunningTotal,
        running_value,
        Some(tone),
        running.entity_id,
    );

    push(
        OverviewKind::Images,
        format_state_value(images.state),
        None,
        images.entity_id,
    );
    push(
        OverviewKind::Docker,
        format_state_value(docker.state),
        None,
        docker.entity_id,
    );

    let os_label = format_state_value(os_name.state);
    let os_version_label = format_state_value(os_version.state);
    let os_value = match (os_label != PLACEHOLDER, os_version_label != PLACEHOLDER) {
        (true, true) => format!("{os_label} · {os_version_label}"),
        (true, false) => os_label,
        (false, true) => os_version_label,
        (false, false) => String::new(),
    };
    push(
        OverviewKind::Os,
        os_value,
        None,
        os_version.entity_id.or(os_name.entity_id),
    );

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::EntityState;

    #[test]
    fn overall_status_maps_online_offline_and_transitional() {
        assert_eq!(
            normalize_overall_status(Some("Ready")),
            (StatusLabel::Key("status.online"), "running", Tone::Running)
        );
        assert_eq!(
            normalize_overall_status(Some("problem")),
            (StatusLabel::Key("status.offline"), "offline", Tone::NotRunning)
        );
        assert_eq!(
            normalize_overall_status(Some("degraded")),
            (StatusLabel::Key("status.degraded"), "idle", Tone::Idle)
        );
        assert_eq!(
            normalize_overall_status(None),
            (StatusLabel::Key("status.unknown"), "idle", Tone::Idle)
        );
        assert_eq!(
            normalize_overall_status(Some("unavailable")),
            (StatusLabel::Verbatim(PLACEHOLDER.into()), "idle", Tone::Idle)
        );
        assert_eq!(
            normalize_overall_status(Some("rebuilding")),
            (StatusLabel::Verbatim("rebuilding".into()), "idle", Tone::Idle)
        );
    }

    #[test]
    fn overview_skips_placeholder_items_and_flags_partial_running() {
        let overview = OverviewConfig {
            container_count: Some("sensor.docker_containers".into()),
            containers_running: Some("sensor.docker_running".into()),
            image_count: Some("sensor.docker_images".into()),
            docker_version: Some("sensor.docker_version".into()),
            operating_system: Some("sensor.os".into()),
            ..Default::default()
        };
        let snapshot = EntitySnapshot::from_states([
            EntityState::new("sensor.docker_containers", "5"),
            EntityState::new("sensor.docker_running", "3"),
            EntityState::new("sensor.docker_images", "unavailable"),
            EntityState::new("sensor.docker_version", "24.0.7"),
            EntityState::new("sensor.os", "Debian"),
        ]);

        let items = overview_items(&overview, &snapshot);
        let kinds: Vec<_> = items.iter().map(|item| item.kind).collect();
        assert_eq!(
            kinds,
            [OverviewKind::RunningTotal, OverviewKind::Docker, OverviewKind::Os]
        );
        assert_eq!(items[0].value, "3 / 5");
        assert_eq!(items[0].tone, Some(Tone::NotRunning));
        assert_eq!(items[0].entity_id.as_deref(), Some("sensor.docker_running"));
        assert_eq!(items[2].value, "Debian");
        assert_eq!(items[2].entity_id.as_deref(), Some("sensor.os"));
    }

    #[test]
    fn overview_is_empty_without_entities() {
        let items = overview_items(&OverviewConfig::default(), &EntitySnapshot::default());
        assert!(items.is_empty());
    }

    #[test]
    fn os_value_joins_name_and_version() {
        let overview = OverviewConfig {
            operating_system: Some("sensor.os".into()),
            operating_system_version: Some("sensor.os_version".into()),
            ..Default::default()
        };
        let snapshot = EntitySnapshot::from_states([
            EntityState::new("sensor.os", "Debian"),
            EntityState::new("sensor.os_version", "12"),
        ]);
        let items = overview_items(&overview, &snapshot);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].value, "Debian · 12");
        assert_eq!(items[0].entity_id.as_deref(), Some("sensor.os_version"));
    }
}
