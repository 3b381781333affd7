use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, RwLock,
    },
};

use resolver::{
    action::resolve_binding, plan_effect, resolve_restart_call, resolve_toggle_call, ActionEffect,
};
use shared::{
    config::{CardConfig, ContainerEntry},
    domain::{ContainerKey, EntitySnapshot, PendingAction, ServiceCall},
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    events::{CardEvent, Notification},
    gesture::{GestureAction, GestureBindings},
    i18n::{Localizer, DEFAULT_LANGUAGE},
    view::{build_card_view, display_name, CardView, ViewContext},
    ControlError, ServiceCaller,
};

type PendingMap = Arc<Mutex<HashMap<ContainerKey, PendingAction>>>;

fn lock_pending(pending: &PendingMap) -> MutexGuard<'_, HashMap<ContainerKey, PendingAction>> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Marks a container busy for as long as it lives.
struct PendingGuard {
    pending: PendingMap,
    events: broadcast::Sender<CardEvent>,
    key: ContainerKey,
}

impl PendingGuard {
    fn acquire(
        pending: &PendingMap,
        events: &broadcast::Sender<CardEvent>,
        key: &ContainerKey,
        action: PendingAction,
    ) -> Result<Self, ControlError> {
        {
            let mut map = lock_pending(pending);
            if let Some(existing) = map.get(key) {
                return Err(ControlError::Busy {
                    key: key.clone(),
                    action: *existing,
                });
            }
            map.insert(key.clone(), action);
        }
        let _ = events.send(CardEvent::PendingChanged {
            key: key.clone(),
            action: Some(action),
        });
        Ok(Self {
            pending: Arc::clone(pending),
            events: events.clone(),
            key: key.clone(),
        })
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        lock_pending(&self.pending).remove(&self.key);
        let _ = self.events.send(CardEvent::PendingChanged {
            key: self.key.clone(),
            action: None,
        });
    }
}

/// Drives one card: start/stop/restart flows, tap/hold dispatch and the
/// view model. Shared between tasks behind an `Arc`.
pub struct ContainerController {
    card: Arc<CardConfig>,
    caller: Arc<dyn ServiceCaller>,
    localizer: Arc<Localizer>,
    snapshot: RwLock<Option<Arc<EntitySnapshot>>>,
    language: RwLock<String>,
    expanded: AtomicBool,
    pending: PendingMap,
    events: broadcast::Sender<CardEvent>,
}

impl ContainerController {
    pub fn new(card: CardConfig, caller: Arc<dyn ServiceCaller>, localizer: Localizer) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            expanded: AtomicBool::new(card.containers_expanded),
            card: Arc::new(card),
            caller,
            localizer: Arc::new(localizer),
            snapshot: RwLock::new(None),
            language: RwLock::new(DEFAULT_LANGUAGE.to_string()),
            pending: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    pub fn card(&self) -> &CardConfig {
        &self.card
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CardEvent> {
        self.events.subscribe()
    }

    /// Replaces the entity snapshot wholesale.
    pub fn set_snapshot(&self, snapshot: EntitySnapshot) {
        let mut slot = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(Arc::new(snapshot));
    }

    fn snapshot(&self) -> Option<Arc<EntitySnapshot>> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_language(&self, language: impl Into<String>) {
        let language = language.into();
        if !self.localizer.has_language(&language) {
            debug!(language = %language, "docker card: no catalog loaded, falling back to default");
        }
        let mut slot = match self.language.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = language;
    }

    pub fn language(&self) -> String {
        match self.language.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn localize(&self, key: &str, replacements: &[(&str, &str)]) -> String {
        self.localizer.localize(&self.language(), key, replacements)
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded.load(Ordering::Relaxed)
    }

    /// Flips the container list open/closed and returns the new state.
    pub fn toggle_expanded(&self) -> bool {
        !self.expanded.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn pending(&self, key: &ContainerKey) -> Option<PendingAction> {
        lock_pending(&self.pending).get(key).copied()
    }

    pub fn pending_snapshot(&self) -> HashMap<ContainerKey, PendingAction> {
        lock_pending(&self.pending).clone()
    }

    pub fn gesture_bindings(&self, key: &ContainerKey) -> Result<GestureBindings, ControlError> {
        let entry = self.entry(key)?;
        Ok(GestureBindings {
            tap: resolve_binding(entry.config.tap_action.as_ref()).is_some(),
            hold: resolve_binding(entry.config.hold_action.as_ref()).is_some(),
        })
    }

    pub fn view(&self) -> CardView {
        let snapshot = self.snapshot();
        let pending = self.pending_snapshot();
        let language = self.language();
        build_card_view(&ViewContext {
            card: &self.card,
            snapshot: snapshot.as_deref(),
            pending: &pending,
            expanded: self.is_expanded(),
            localizer: &self.localizer,
            language: &language,
        })
    }

    fn entry(&self, key: &ContainerKey) -> Result<&ContainerEntry, ControlError> {
        self.card
            .container(key)
            .ok_or_else(|| ControlError::UnknownContainer(key.to_string()))
    }

    fn display_name(&self, entry: &ContainerEntry) -> String {
        let snapshot = self.snapshot().unwrap_or_default();
        display_name(&entry.config, &snapshot, &self.localizer, &self.language())
    }

    fn notify(&self, notification: Notification) {
        info!(text = %notification.message, "docker card: notification");
        let _ = self.events.send(CardEvent::Notification(notification));
    }

    /// Starts (`should_run`) or stops a container. On any error the host
    /// should revert its switch to the prior position.
    pub async fn toggle(&self, key: &ContainerKey, should_run: bool) -> Result<(), ControlError> {
        let entry = self.entry(key)?;
        let action = PendingAction::for_toggle(should_run);
        let name = self.display_name(entry);

        let Some(call) = resolve_toggle_call(&entry.config, should_run) else {
            let action_word = if should_run {
                self.localize("actions.start", &[])
            } else {
                self.localize("actions.stop", &[])
            };
            self.notify(Notification::warning(self.localize(
                "notifications.missing_toggle",
                &[("action", action_word.as_str()), ("name", name.as_str())],
            )));
            return Err(ControlError::Unavailable {
                key: key.clone(),
                action,
            });
        };

        let (ok_key, failed_key) = if should_run {
            ("notifications.starting", "notifications.failed_start")
        } else {
            ("notifications.stopping", "notifications.failed_stop")
        };
        self.run_pending(key, action, &name, call, ok_key, failed_key)
            .await
    }

    pub async fn restart(&self, key: &ContainerKey) -> Result<(), ControlError> {
        let entry = self.entry(key)?;
        let name = self.display_name(entry);

        let Some(call) = resolve_restart_call(&entry.config) else {
            self.notify(Notification::warning(
                self.localize("notifications.missing_restart", &[("name", name.as_str())]),
            ));
            return Err(ControlError::Unavailable {
                key: key.clone(),
                action: PendingAction::Restart,
            });
        };

        self.run_pending(
            key,
            PendingAction::Restart,
            &name,
            call,
            "notifications.restarting",
            "notifications.failed_restart",
        )
        .await
    }

    async fn run_pending(
        &self,
        key: &ContainerKey,
        action: PendingAction,
        name: &str,
        call: ServiceCall,
        ok_key: &str,
        failed_key: &str,
    ) -> Result<(), ControlError> {
        let _guard = PendingGuard::acquire(&self.pending, &self.events, key, action)?;
        info!(
            container = %key,
            %action,
            service = %call.qualified_name(),
            "docker card: calling service"
        );

        match self.caller.call_service(&call).await {
            Ok(()) => {
                self.notify(Notification::info(self.localize(ok_key, &[("name", name)])));
                Ok(())
            }
            Err(err) => {
                error!(container = %key, %action, "docker card: service call failed: {err:#}");
                self.notify(Notification::error(
                    self.localize(failed_key, &[("name", name)]),
                ));
                Err(ControlError::CallFailed {
                    key: key.clone(),
                    action,
                    source: err,
                })
            }
        }
    }

    /// Runs the container's tap or hold binding. Unbound gestures do nothing.
    pub async fn perform(
        &self,
        key: &ContainerKey,
        gesture: GestureAction,
    ) -> Result<(), ControlError> {
        let entry = self.entry(key)?;
        let descriptor = match gesture {
            GestureAction::Tap => entry.config.tap_action.as_ref(),
            GestureAction::Hold => entry.config.hold_action.as_ref(),
        };
        let Some(action) = resolve_binding(descriptor) else {
            debug!(container = %key, ?gesture, "docker card: no action bound");
            return Ok(());
        };
        let Some(effect) = plan_effect(&action, entry.config.state_entity()) else {
            debug!(
                container = %key,
                ?gesture,
                kind = action.kind.as_str(),
                "docker card: action has no effect"
            );
            return Ok(());
        };
        self.handle_effect(effect)
            .await
            .map_err(|source| ControlError::ActionFailed {
                key: key.clone(),
                gesture,
                source,
            })
    }

    /// Carries out a planned effect: remote calls go to the caller, the rest
    /// are published for the host.
    pub async fn handle_effect(&self, effect: ActionEffect) -> anyhow::Result<()> {
        let event = match effect {
            ActionEffect::CallService(call) => {
                if let Err(err) = self.caller.call_service(&call).await {
                    warn!(
                        service = %call.qualified_name(),
                        "docker card: action call failed: {err:#}"
                    );
                    return Err(err);
                }
                return Ok(());
            }
            ActionEffect::MoreInfo { entity_id } => CardEvent::MoreInfo { entity_id },
            ActionEffect::Navigate { path } => CardEvent::Navigate { path },
            ActionEffect::OpenUrl { url, new_tab } => CardEvent::OpenUrl { url, new_tab },
            ActionEffect::FireEvent { name, detail } => CardEvent::FireEvent { name, detail },
        };
        let _ = self.events.send(event);
        Ok(())
    }
}
