//! Plain-text rendering of a card view for the terminal.

use std::fmt::Write as _;

use card_core::{CardView, ContainerView};
use resolver::StatusKind;

fn status_marker(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Running => "●",
        StatusKind::Stopped => "○",
        StatusKind::Unknown => "?",
    }
}

fn usage_bar(percentage: f64) -> String {
    let filled = ((percentage / 10.0).round() as usize).min(10);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}

fn render_container(out: &mut String, container: &ContainerView) {
    let _ = write!(
        out,
        "  {} {:<24} {}",
        status_marker(container.status_kind),
        container.name,
        container.status_label
    );
    if let Some(pending) = container.pending {
        let _ = write!(out, " ({pending}…)");
    }
    let mut controls = Vec::new();
    if container.toggle_enabled {
        controls.push(container.toggle_label.as_str());
    }
    if container.restart_enabled {
        controls.push(container.restart_label.as_str());
    }
    if !controls.is_empty() {
        let _ = write!(out, "  [{}]", controls.join(" | "));
    }
    out.push('\n');
    for bar in &container.usage {
        let _ = writeln!(
            out,
            "      {:<8} {} {:>5.1}%",
            bar.label,
            usage_bar(bar.percentage),
            bar.percentage
        );
    }
}

pub fn render_card(view: &CardView) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", view.title);
    if let Some(status) = &view.status {
        let _ = write!(out, "  [{}]", status.label);
    }
    out.push('\n');

    if let Some(placeholder) = &view.placeholder {
        let _ = writeln!(out, "  {placeholder}");
        return out;
    }

    if !view.overview.is_empty() {
        let line = view
            .overview
            .iter()
            .map(|item| format!("{}: {}", item.label, item.value))
            .collect::<Vec<_>>()
            .join("  ·  ");
        let _ = writeln!(out, "  {line}");
    }

    let _ = writeln!(out, "{} ({})", view.containers_title, view.containers.len());
    if let Some(hint) = &view.empty_hint {
        let _ = writeln!(out, "  {hint}");
    }
    for container in &view.containers {
        render_container(&mut out, container);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use card_core::{ContainerController, Localizer, MissingServiceCaller};
    use serde_json::json;
    use shared::{
        config::CardConfig,
        domain::{EntitySnapshot, EntityState},
    };

    use super::*;

    fn controller() -> ContainerController {
        let card = CardConfig::from_value(json!({
            "docker_overview": {
                "status": "binary_sensor.docker",
                "container_count": "sensor.docker_total",
                "containers_running": "sensor.docker_running"
            },
            "containers": [{
                "name": "plex",
                "status_entity": "sensor.plex",
                "control_entity": "switch.plex",
                "memory_entity": "sensor.plex_memory"
            }]
        }))
        .expect("card config");
        ContainerController::new(card, Arc::new(MissingServiceCaller), Localizer::new())
    }

    #[test]
    fn renders_waiting_placeholder() {
        let text = render_card(&controller().view());
        assert_eq!(text, "Docker Card\n  Waiting for Home Assistant…\n");
    }

    #[test]
    fn renders_overview_and_containers() {
        let controller = controller();
        controller.set_snapshot(EntitySnapshot::from_states([
            EntityState::new("binary_sensor.docker", "on"),
            EntityState::new("sensor.docker_total", "4"),
            EntityState::new("sensor.docker_running", "4"),
            EntityState::new("sensor.plex", "exited"),
            EntityState::new("sensor.plex_memory", "81%"),
        ]));
        let view = controller.view();
        assert_eq!(view.containers[0].hold_delay, Duration::from_millis(500));

        let text = render_card(&view);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Docker Card  [Online]");
        assert_eq!(lines[1], "  Running / Total: 4 / 4");
        assert_eq!(lines[2], "Containers (1)");
        assert!(lines[3].contains("○ plex"));
        assert!(lines[3].contains("Stopped"));
        assert!(lines[3].ends_with("[Start container]"));
        assert_eq!(lines[4], "      Memory   [########..]  81.0%");
    }

    #[test]
    fn usage_bar_is_bounded() {
        assert_eq!(usage_bar(0.0), "[..........]");
        assert_eq!(usage_bar(100.0), "[##########]");
        assert_eq!(usage_bar(44.0), "[####......]");
    }
}
