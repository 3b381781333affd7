use super::*;

use std::sync::Arc;

use serde_json::json;
use shared::{
    config::CardConfig,
    domain::{EntitySnapshot, EntityState},
};
use tokio::sync::{broadcast, Mutex, Notify};

use crate::{gesture::GestureAction, i18n::Localizer};

struct TestServiceCaller {
    fail_with: Option<String>,
    gate: Option<Arc<Notify>>,
    calls: Arc<Mutex<Vec<ServiceCall>>>,
}

impl TestServiceCaller {
    fn ok() -> Self {
        Self {
            fail_with: None,
            gate: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing(err: impl Into<String>) -> Self {
        Self {
            fail_with: Some(err.into()),
            ..Self::ok()
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::ok()
        }
    }

    async fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ServiceCaller for TestServiceCaller {
    async fn call_service(&self, call: &ServiceCall) -> Result<()> {
        self.calls.lock().await.push(call.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        Ok(())
    }
}

fn card() -> CardConfig {
    CardConfig::from_value(json!({
        "title": "Media box",
        "containers": [
            {
                "name": "plex",
                "status_entity": "sensor.plex_state",
                "control_entity": "switch.plex",
                "restart_entity": "button.plex_restart",
                "cpu_entity": "sensor.plex_cpu",
                "tap_action": "more-info",
                "hold_action": {
                    "service": "script.plex_maintenance",
                    "data": {"mode": "full"}
                }
            },
            {
                "name": "ghost",
                "status_entity": "sensor.ghost"
            }
        ]
    }))
    .expect("card config")
}

fn snapshot() -> EntitySnapshot {
    EntitySnapshot::from_states([
        EntityState::new("sensor.plex_state", "running"),
        EntityState::new("switch.plex", "on"),
        EntityState::new("sensor.plex_cpu", "63.4%"),
        EntityState::new("sensor.ghost", "exited"),
    ])
}

fn controller(caller: Arc<TestServiceCaller>) -> ContainerController {
    let controller = ContainerController::new(card(), caller, Localizer::new());
    controller.set_snapshot(snapshot());
    controller
}

fn drain(rx: &mut broadcast::Receiver<CardEvent>) -> Vec<CardEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn notifications(events: &[CardEvent]) -> Vec<Notification> {
    events
        .iter()
        .filter_map(|event| match event {
            CardEvent::Notification(notification) => Some(notification.clone()),
            _ => None,
        })
        .collect()
}

fn plex() -> ContainerKey {
    ContainerKey::new("plex")
}

#[tokio::test]
async fn start_calls_switch_and_clears_pending() {
    let caller = Arc::new(TestServiceCaller::ok());
    let controller = controller(caller.clone());
    let mut rx = controller.subscribe_events();

    controller.toggle(&plex(), true).await.expect("start");

    assert_eq!(
        caller.calls().await,
        vec![ServiceCall::for_entity("switch", "turn_on", "switch.plex")]
    );
    assert_eq!(controller.pending(&plex()), None);

    let events = drain(&mut rx);
    assert_eq!(
        events.first(),
        Some(&CardEvent::PendingChanged {
            key: plex(),
            action: Some(PendingAction::Start),
        })
    );
    assert_eq!(
        events.last(),
        Some(&CardEvent::PendingChanged {
            key: plex(),
            action: None,
        })
    );
    assert_eq!(
        notifications(&events),
        vec![Notification::info("Starting plex…")]
    );
}

#[tokio::test]
async fn failed_stop_reports_and_still_clears_pending() {
    let caller = Arc::new(TestServiceCaller::failing("service unavailable"));
    let controller = controller(caller.clone());
    let mut rx = controller.subscribe_events();

    let err = controller
        .toggle(&plex(), false)
        .await
        .expect_err("stop should fail");
    assert!(matches!(
        err,
        ControlError::CallFailed {
            action: PendingAction::Stop,
            ..
        }
    ));
    assert!(err.to_string().contains("service unavailable"));
    assert_eq!(controller.pending(&plex()), None);
    assert!(controller.view().containers[0].toggle_enabled);

    let events = drain(&mut rx);
    assert_eq!(
        notifications(&events),
        vec![Notification::error("Failed to stop plex. Check logs.")]
    );
    assert!(events.contains(&CardEvent::PendingChanged {
        key: plex(),
        action: None,
    }));
}

#[tokio::test]
async fn second_action_while_pending_is_rejected_without_calling() {
    let gate = Arc::new(Notify::new());
    let caller = Arc::new(TestServiceCaller::gated(gate.clone()));
    let controller = Arc::new(controller(caller.clone()));
    let mut rx = controller.subscribe_events();

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.toggle(&plex(), true).await }
    });

    let event = rx.recv().await.expect("pending event");
    assert_eq!(
        event,
        CardEvent::PendingChanged {
            key: plex(),
            action: Some(PendingAction::Start),
        }
    );
    let view = controller.view();
    assert_eq!(view.containers[0].pending, Some(PendingAction::Start));
    assert!(!view.containers[0].toggle_enabled);
    assert!(!view.containers[0].restart_enabled);

    let err = controller
        .toggle(&plex(), false)
        .await
        .expect_err("busy");
    assert!(matches!(
        err,
        ControlError::Busy {
            action: PendingAction::Start,
            ..
        }
    ));
    let err = controller.restart(&plex()).await.expect_err("busy");
    assert!(matches!(err, ControlError::Busy { .. }));

    gate.notify_one();
    first.await.expect("join").expect("first toggle");
    assert_eq!(caller.calls().await.len(), 1);
    assert_eq!(controller.pending(&plex()), None);
}

#[tokio::test]
async fn missing_toggle_service_warns_and_calls_nothing() {
    let caller = Arc::new(TestServiceCaller::ok());
    let controller = controller(caller.clone());
    let mut rx = controller.subscribe_events();
    let ghost = ContainerKey::new("ghost");

    let err = controller.toggle(&ghost, true).await.expect_err("no service");
    assert!(matches!(
        err,
        ControlError::Unavailable {
            action: PendingAction::Start,
            ..
        }
    ));
    let err = controller.restart(&ghost).await.expect_err("no service");
    assert!(matches!(
        err,
        ControlError::Unavailable {
            action: PendingAction::Restart,
            ..
        }
    ));

    assert!(caller.calls().await.is_empty());
    assert_eq!(
        notifications(&drain(&mut rx)),
        vec![
            Notification::warning("No service configured to start ghost."),
            Notification::warning("No restart service configured for ghost."),
        ]
    );
}

#[tokio::test]
async fn restart_presses_button() {
    let caller = Arc::new(TestServiceCaller::ok());
    let controller = controller(caller.clone());
    let mut rx = controller.subscribe_events();

    controller.restart(&plex()).await.expect("restart");
    assert_eq!(
        caller.calls().await,
        vec![ServiceCall::for_entity("button", "press", "button.plex_restart")]
    );
    assert_eq!(
        notifications(&drain(&mut rx)),
        vec![Notification::info("Restarting plex…")]
    );
}

#[tokio::test]
async fn unknown_container_is_an_error() {
    let controller = controller(Arc::new(TestServiceCaller::ok()));
    let err = controller
        .toggle(&ContainerKey::new("nope"), true)
        .await
        .expect_err("unknown");
    assert!(matches!(err, ControlError::UnknownContainer(key) if key == "nope"));
}

#[tokio::test]
async fn tap_opens_more_info_for_status_entity() {
    let caller = Arc::new(TestServiceCaller::ok());
    let controller = controller(caller.clone());
    let mut rx = controller.subscribe_events();

    controller
        .perform(&plex(), GestureAction::Tap)
        .await
        .expect("tap");
    assert_eq!(
        drain(&mut rx),
        vec![CardEvent::MoreInfo {
            entity_id: "sensor.plex_state".into()
        }]
    );
    assert!(caller.calls().await.is_empty());
}

#[tokio::test]
async fn hold_calls_service_with_default_entity() {
    let caller = Arc::new(TestServiceCaller::ok());
    let controller = controller(caller.clone());

    controller
        .perform(&plex(), GestureAction::Hold)
        .await
        .expect("hold");
    let calls = caller.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].qualified_name(), "script.plex_maintenance");
    assert_eq!(
        serde_json::Value::Object(calls[0].data.clone()),
        json!({"mode": "full", "entity_id": "sensor.plex_state"})
    );
}

#[tokio::test]
async fn failed_action_call_is_reported() {
    let controller = controller(Arc::new(TestServiceCaller::failing("boom")));
    let err = controller
        .perform(&plex(), GestureAction::Hold)
        .await
        .expect_err("hold fails");
    assert!(matches!(
        err,
        ControlError::ActionFailed {
            gesture: GestureAction::Hold,
            ..
        }
    ));
}

#[tokio::test]
async fn unbound_gesture_does_nothing() {
    let caller = Arc::new(TestServiceCaller::ok());
    let controller = controller(caller.clone());
    let mut rx = controller.subscribe_events();
    let ghost = ContainerKey::new("ghost");

    controller
        .perform(&ghost, GestureAction::Tap)
        .await
        .expect("noop");
    assert!(drain(&mut rx).is_empty());
    assert!(caller.calls().await.is_empty());
    assert_eq!(
        controller.gesture_bindings(&ghost).expect("bindings"),
        GestureBindings::default()
    );
    assert_eq!(
        controller.gesture_bindings(&plex()).expect("bindings"),
        GestureBindings {
            tap: true,
            hold: true
        }
    );
}

#[tokio::test]
async fn missing_service_caller_fails_every_call() {
    let controller = ContainerController::new(card(), Arc::new(MissingServiceCaller), Localizer::new());
    let err = controller.toggle(&plex(), true).await.expect_err("no host");
    assert!(err.to_string().contains("switch.turn_on"));
    assert_eq!(controller.pending(&plex()), None);
}

#[test]
fn view_waits_for_snapshot() {
    let controller = ContainerController::new(
        card(),
        Arc::new(TestServiceCaller::ok()),
        Localizer::new(),
    );
    let view = controller.view();
    assert_eq!(view.title, "Media box");
    assert_eq!(
        view.placeholder.as_deref(),
        Some("Waiting for Home Assistant…")
    );
    assert!(view.containers.is_empty());
    assert!(view.status.is_none());
}

#[test]
fn view_reflects_status_capabilities_and_usage() {
    let controller = controller(Arc::new(TestServiceCaller::ok()));
    let view = controller.view();
    assert!(view.placeholder.is_none());
    assert!(!view.expanded);
    assert_eq!(view.expand_aria_label, "Expand container list");

    let plex = &view.containers[0];
    assert_eq!(plex.name, "plex");
    assert_eq!(plex.status_label, "Running");
    assert!(plex.checked);
    assert!(plex.toggle_enabled);
    assert!(plex.restart_enabled);
    assert_eq!(plex.toggle_label, "Stop container");
    assert!(plex.actionable);
    assert_eq!(plex.usage.len(), 1);
    assert_eq!(plex.usage_description(), "CPU 63.4%");

    let ghost = &view.containers[1];
    assert_eq!(ghost.status_label, "Stopped");
    assert!(!ghost.checked);
    assert!(!ghost.toggle_enabled);
    assert!(!ghost.restart_enabled);
    assert!(!ghost.actionable);
    assert!(ghost.usage.is_empty());

    assert!(controller.toggle_expanded());
    assert_eq!(
        controller.view().expand_aria_label,
        "Collapse container list"
    );
    assert!(!controller.toggle_expanded());
}

#[tokio::test]
async fn notifications_follow_selected_language() {
    let mut localizer = Localizer::new();
    localizer.insert_catalog(
        "de",
        json!({"notifications": {"starting": "{name} wird gestartet…"}}),
    );
    let controller = ContainerController::new(card(), Arc::new(TestServiceCaller::ok()), localizer);
    controller.set_snapshot(snapshot());
    controller.set_language("de");
    let mut rx = controller.subscribe_events();

    controller.toggle(&plex(), true).await.expect("start");
    assert_eq!(
        notifications(&drain(&mut rx)),
        vec![Notification::info("plex wird gestartet…")]
    );
    assert_eq!(controller.view().containers[0].status_label, "Running");
}
