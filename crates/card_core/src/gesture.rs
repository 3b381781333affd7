//! Tap/hold detection for a container row.
//!
//! [`GestureMachine`] is a pure state machine: it consumes input events and
//! returns what to fire and what to do with the hold timer. [`GestureDriver`]
//! wraps it with a single abortable tokio timer and reports fired actions on
//! a channel.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureAction {
    Tap,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Other,
}

impl Key {
    /// Maps a DOM-style key name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            " " | "Space" | "Spacebar" => Self::Space,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureInput {
    /// `button` 0 is the primary button. `on_control` marks presses that
    /// land on an inner switch or button of the row.
    PointerDown { button: u8, on_control: bool },
    PointerUp { on_control: bool },
    PointerCancel,
    PointerLeave,
    /// The row lost focus.
    Blur,
    Click { on_control: bool },
    KeyDown(Key),
    KeyUp(Key),
    HoldElapsed { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Armed { generation: u64 },
    FiredHold,
    SuppressedTap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Keep,
    Start { generation: u64, delay: Duration },
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureStep {
    pub fire: Option<GestureAction>,
    pub timer: TimerCommand,
}

impl GestureStep {
    fn none() -> Self {
        Self {
            fire: None,
            timer: TimerCommand::Keep,
        }
    }

    fn cancel() -> Self {
        Self {
            fire: None,
            timer: TimerCommand::Cancel,
        }
    }
}

/// Which actions are bound on the row. A row with neither is not actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureBindings {
    pub tap: bool,
    pub hold: bool,
}

#[derive(Debug, Clone)]
pub struct GestureMachine {
    bindings: GestureBindings,
    hold_delay: Duration,
    state: GestureState,
    generation: u64,
}

impl GestureMachine {
    pub fn new(bindings: GestureBindings, hold_delay: Duration) -> Self {
        Self {
            bindings,
            hold_delay,
            state: GestureState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn hold_delay(&self) -> Duration {
        self.hold_delay
    }

    fn tap(&self) -> Option<GestureAction> {
        self.bindings.tap.then_some(GestureAction::Tap)
    }

    pub fn handle(&mut self, input: GestureInput) -> GestureStep {
        match input {
            GestureInput::PointerDown { button, on_control } => {
                if on_control || button != 0 {
                    return GestureStep::none();
                }
                if !self.bindings.hold {
                    self.state = GestureState::Idle;
                    return GestureStep::cancel();
                }
                self.generation += 1;
                self.state = GestureState::Armed {
                    generation: self.generation,
                };
                GestureStep {
                    fire: None,
                    timer: TimerCommand::Start {
                        generation: self.generation,
                        delay: self.hold_delay,
                    },
                }
            }
            GestureInput::HoldElapsed { generation } => match self.state {
                GestureState::Armed { generation: armed } if armed == generation => {
                    self.state = GestureState::FiredHold;
                    GestureStep {
                        fire: Some(GestureAction::Hold),
                        timer: TimerCommand::Keep,
                    }
                }
                _ => {
                    debug!(generation, "docker card: ignoring stale hold timer");
                    GestureStep::none()
                }
            },
            GestureInput::PointerUp { on_control } => {
                // A fired hold stays latched so the click that follows is swallowed.
                if on_control || self.state != GestureState::FiredHold {
                    self.state = GestureState::Idle;
                }
                GestureStep::cancel()
            }
            GestureInput::PointerCancel | GestureInput::PointerLeave | GestureInput::Blur => {
                self.state = GestureState::Idle;
                GestureStep::cancel()
            }
            GestureInput::Click { on_control: true } => GestureStep::none(),
            GestureInput::Click { on_control: false } => match self.state {
                GestureState::SuppressedTap | GestureState::FiredHold => {
                    self.state = GestureState::Idle;
                    GestureStep::none()
                }
                GestureState::Armed { .. } => {
                    self.state = GestureState::Idle;
                    GestureStep {
                        fire: self.tap(),
                        timer: TimerCommand::Cancel,
                    }
                }
                GestureState::Idle => GestureStep {
                    fire: self.tap(),
                    timer: TimerCommand::Keep,
                },
            },
            GestureInput::KeyDown(Key::Enter) => {
                self.state = GestureState::SuppressedTap;
                GestureStep {
                    fire: self.tap(),
                    timer: TimerCommand::Cancel,
                }
            }
            GestureInput::KeyDown(Key::Space) if self.bindings.hold => {
                self.state = GestureState::SuppressedTap;
                GestureStep {
                    fire: Some(GestureAction::Hold),
                    timer: TimerCommand::Cancel,
                }
            }
            GestureInput::KeyDown(_) | GestureInput::KeyUp(_) => GestureStep::none(),
        }
    }
}

struct DriverState {
    machine: GestureMachine,
    timer: Option<JoinHandle<()>>,
}

impl DriverState {
    fn abort_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

/// Runs a [`GestureMachine`] against real time. Must be used inside a tokio
/// runtime.
pub struct GestureDriver {
    state: Arc<Mutex<DriverState>>,
    actions: mpsc::UnboundedSender<GestureAction>,
}

impl GestureDriver {
    pub fn new(
        bindings: GestureBindings,
        hold_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<GestureAction>) {
        let (actions, rx) = mpsc::unbounded_channel();
        let state = DriverState {
            machine: GestureMachine::new(bindings, hold_delay),
            timer: None,
        };
        (
            Self {
                state: Arc::new(Mutex::new(state)),
                actions,
            },
            rx,
        )
    }

    pub fn state(&self) -> GestureState {
        match self.state.lock() {
            Ok(guard) => guard.machine.state(),
            Err(poisoned) => poisoned.into_inner().machine.state(),
        }
    }

    pub fn handle(&self, input: GestureInput) {
        Self::apply(&self.state, &self.actions, input);
    }

    fn apply(
        state: &Arc<Mutex<DriverState>>,
        actions: &mpsc::UnboundedSender<GestureAction>,
        input: GestureInput,
    ) {
        let mut guard = match state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let step = guard.machine.handle(input);
        match step.timer {
            TimerCommand::Keep => {}
            TimerCommand::Cancel => guard.abort_timer(),
            TimerCommand::Start { generation, delay } => {
                guard.abort_timer();
                let timer_state = Arc::clone(state);
                let timer_actions = actions.clone();
                guard.timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    Self::apply(
                        &timer_state,
                        &timer_actions,
                        GestureInput::HoldElapsed { generation },
                    );
                }));
            }
        }
        drop(guard);

        if let Some(action) = step.fire {
            if actions.send(action).is_err() {
                debug!(?action, "docker card: gesture receiver dropped");
            }
        }
    }
}

impl Drop for GestureDriver {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.state.lock() {
            guard.abort_timer();
        }
    }
}

#[cfg(test)]
#[path = "tests/gesture_tests.rs"]
mod tests;
