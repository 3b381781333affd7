//! Render-ready view model. Everything a widget layer needs is already
//! localized and colored here.

use std::{collections::HashMap, time::Duration};

use resolver::{
    action::resolve_binding, overall_status, overview_items, resolve_display_name, resolve_status,
    OverviewKind, ResourceUsage, StatusKind, StatusLabel, Tone, UsageLevel,
};
use shared::{
    config::{CardConfig, ContainerConfig, ContainerEntry},
    domain::{ContainerKey, EntitySnapshot, PendingAction},
};

use crate::i18n::Localizer;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusPillView {
    pub label: String,
    pub css_class: &'static str,
    pub tone: Tone,
    pub accent: Option<String>,
    pub entity_id: Option<String>,
    pub aria_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewItemView {
    pub kind: OverviewKind,
    pub badge: &'static str,
    pub label: String,
    pub value: String,
    pub aria_label: String,
    pub tone: Option<Tone>,
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    Cpu,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageBar {
    pub kind: UsageKind,
    pub label: String,
    /// Clamped to `0..=100`.
    pub percentage: f64,
    pub level: UsageLevel,
    pub color: &'static str,
}

impl UsageBar {
    pub fn description(&self) -> String {
        format!("{} {:.1}%", self.label, self.percentage)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerView {
    pub key: ContainerKey,
    pub name: String,
    pub status_kind: StatusKind,
    pub status_label: String,
    pub entity_id: Option<String>,
    pub checked: bool,
    pub toggle_enabled: bool,
    pub toggle_label: String,
    pub restart_enabled: bool,
    pub restart_label: String,
    pub pending: Option<PendingAction>,
    pub running_color: String,
    pub not_running_color: String,
    pub usage: Vec<UsageBar>,
    pub actionable: bool,
    pub hold_delay: Duration,
}

impl ContainerView {
    pub fn usage_description(&self) -> String {
        self.usage
            .iter()
            .map(UsageBar::description)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub title: String,
    /// Set while no entity snapshot has arrived yet; nothing else is filled.
    pub placeholder: Option<String>,
    pub status: Option<StatusPillView>,
    pub overview: Vec<OverviewItemView>,
    pub containers_title: String,
    pub expanded: bool,
    pub expand_aria_label: String,
    pub empty_hint: Option<String>,
    pub containers: Vec<ContainerView>,
}

pub(crate) struct ViewContext<'a> {
    pub card: &'a CardConfig,
    pub snapshot: Option<&'a EntitySnapshot>,
    pub pending: &'a HashMap<ContainerKey, PendingAction>,
    pub expanded: bool,
    pub localizer: &'a Localizer,
    pub language: &'a str,
}

impl ViewContext<'_> {
    fn t(&self, key: &str) -> String {
        self.localizer.localize(self.language, key, &[])
    }

    fn label(&self, label: &StatusLabel) -> String {
        match label {
            StatusLabel::Key(key) => self.t(key),
            StatusLabel::Verbatim(text) => text.clone(),
        }
    }
}

pub(crate) fn display_name(
    config: &ContainerConfig,
    snapshot: &EntitySnapshot,
    localizer: &Localizer,
    language: &str,
) -> String {
    resolve_display_name(config, snapshot)
        .unwrap_or_else(|| localizer.localize(language, "common.container", &[]))
}

fn usage_bars(ctx: &ViewContext<'_>, usage: ResourceUsage) -> Vec<UsageBar> {
    [
        (UsageKind::Cpu, "resources.cpu", usage.cpu),
        (UsageKind::Memory, "resources.memory", usage.memory),
    ]
    .into_iter()
    .filter_map(|(kind, key, value)| {
        let percentage = resolver::values::clamp_percentage(value?);
        let level = UsageLevel::for_percentage(percentage);
        Some(UsageBar {
            kind,
            label: ctx.t(key),
            percentage,
            level,
            color: level.color(),
        })
    })
    .collect()
}

fn container_view(
    ctx: &ViewContext<'_>,
    snapshot: &EntitySnapshot,
    entry: &ContainerEntry,
) -> ContainerView {
    let config = &entry.config;
    let status = resolve_status(config, ctx.card, snapshot);
    let pending = ctx.pending.get(&entry.key).copied();
    let actionable = resolve_binding(config.tap_action.as_ref()).is_some()
        || resolve_binding(config.hold_action.as_ref()).is_some();

    ContainerView {
        key: entry.key.clone(),
        name: display_name(config, snapshot, ctx.localizer, ctx.language),
        status_kind: status.kind,
        status_label: ctx.label(&status.label),
        checked: status.is_running,
        toggle_enabled: status.can_toggle && pending.is_none(),
        toggle_label: if status.is_running {
            ctx.t("actions.stop_container")
        } else {
            ctx.t("actions.start_container")
        },
        restart_enabled: status.can_restart && pending.is_none(),
        restart_label: ctx.t("actions.restart"),
        entity_id: status.entity_id,
        pending,
        running_color: config.running_color(ctx.card).to_string(),
        not_running_color: config.not_running_color(ctx.card).to_string(),
        usage: usage_bars(ctx, ResourceUsage::resolve(config, snapshot)),
        actionable,
        hold_delay: config.hold_delay(),
    }
}

pub(crate) fn build_card_view(ctx: &ViewContext<'_>) -> CardView {
    let title = ctx
        .card
        .title
        .clone()
        .unwrap_or_else(|| ctx.t("common.card_title"));
    let expand_aria_label = if ctx.expanded {
        ctx.t("aria.collapse_containers")
    } else {
        ctx.t("aria.expand_containers")
    };

    let Some(snapshot) = ctx.snapshot else {
        return CardView {
            title,
            placeholder: Some(ctx.t("placeholders.waiting")),
            status: None,
            overview: Vec::new(),
            containers_title: ctx.t("common.containers"),
            expanded: ctx.expanded,
            expand_aria_label,
            empty_hint: None,
            containers: Vec::new(),
        };
    };

    let overall = overall_status(ctx.card, snapshot);
    let status = StatusPillView {
        label: ctx.label(&overall.label),
        css_class: overall.css_class,
        tone: overall.tone,
        accent: overall.tone.accent(ctx.card).map(str::to_string),
        entity_id: overall.entity_id,
        aria_label: ctx.t("aria.open_status_details"),
    };

    let overview = overview_items(&ctx.card.overview, snapshot)
        .into_iter()
        .map(|item| OverviewItemView {
            kind: item.kind,
            badge: item.kind.badge(),
            label: ctx.t(item.kind.label_key()),
            value: item.value,
            aria_label: ctx.t(item.kind.aria_key()),
            tone: item.tone,
            entity_id: item.entity_id,
        })
        .collect();

    let containers: Vec<_> = ctx
        .card
        .containers
        .iter()
        .map(|entry| container_view(ctx, snapshot, entry))
        .collect();
    let empty_hint = containers
        .is_empty()
        .then(|| ctx.t("placeholders.no_containers"));

    CardView {
        title,
        placeholder: None,
        status: Some(status),
        overview,
        containers_title: ctx.t("common.containers"),
        expanded: ctx.expanded,
        expand_aria_label,
        empty_hint,
        containers,
    }
}
