use super::*;

use tokio::{sync::mpsc::error::TryRecvError, time::Instant};

const BOTH: GestureBindings = GestureBindings {
    tap: true,
    hold: true,
};

fn down() -> GestureInput {
    GestureInput::PointerDown {
        button: 0,
        on_control: false,
    }
}

fn up() -> GestureInput {
    GestureInput::PointerUp { on_control: false }
}

fn click() -> GestureInput {
    GestureInput::Click { on_control: false }
}

#[test]
fn short_press_then_click_fires_tap() {
    let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
    let step = machine.handle(down());
    assert_eq!(
        step.timer,
        TimerCommand::Start {
            generation: 1,
            delay: Duration::from_millis(500)
        }
    );
    assert_eq!(machine.state(), GestureState::Armed { generation: 1 });

    assert_eq!(machine.handle(up()).timer, TimerCommand::Cancel);
    assert_eq!(machine.state(), GestureState::Idle);
    assert_eq!(machine.handle(click()).fire, Some(GestureAction::Tap));
}

#[test]
fn elapsed_hold_fires_once_and_swallows_click() {
    let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
    machine.handle(down());
    let step = machine.handle(GestureInput::HoldElapsed { generation: 1 });
    assert_eq!(step.fire, Some(GestureAction::Hold));
    assert_eq!(machine.state(), GestureState::FiredHold);

    assert_eq!(machine.handle(up()).fire, None);
    assert_eq!(machine.state(), GestureState::FiredHold);
    assert_eq!(machine.handle(click()).fire, None);
    assert_eq!(machine.state(), GestureState::Idle);
    assert_eq!(machine.handle(click()).fire, Some(GestureAction::Tap));
}

#[test]
fn stale_timer_generation_is_ignored() {
    let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
    machine.handle(down());
    machine.handle(up());
    machine.handle(down());
    let stale = machine.handle(GestureInput::HoldElapsed { generation: 1 });
    assert_eq!(stale.fire, None);
    assert_eq!(machine.state(), GestureState::Armed { generation: 2 });
}

#[test]
fn cancel_leave_and_blur_reset_without_firing() {
    for reset in [
        GestureInput::PointerCancel,
        GestureInput::PointerLeave,
        GestureInput::Blur,
    ] {
        let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
        machine.handle(down());
        let step = machine.handle(reset);
        assert_eq!(step, GestureStep::cancel());
        assert_eq!(machine.state(), GestureState::Idle);
        assert_eq!(
            machine.handle(GestureInput::HoldElapsed { generation: 1 }).fire,
            None
        );
    }
}

#[test]
fn blur_clears_suppressed_state() {
    let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
    machine.handle(GestureInput::KeyDown(Key::Space));
    assert_eq!(machine.state(), GestureState::SuppressedTap);
    assert_eq!(machine.handle(GestureInput::Blur), GestureStep::cancel());
    assert_eq!(machine.state(), GestureState::Idle);
}

#[test]
fn secondary_buttons_and_inner_controls_are_ignored() {
    let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
    let step = machine.handle(GestureInput::PointerDown {
        button: 2,
        on_control: false,
    });
    assert_eq!(step, GestureStep::none());
    let step = machine.handle(GestureInput::PointerDown {
        button: 0,
        on_control: true,
    });
    assert_eq!(step, GestureStep::none());
    assert_eq!(
        machine.handle(GestureInput::Click { on_control: true }).fire,
        None
    );
    assert_eq!(machine.state(), GestureState::Idle);
}

#[test]
fn enter_taps_and_suppresses_synthesized_click() {
    let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
    assert_eq!(
        machine.handle(GestureInput::KeyDown(Key::Enter)).fire,
        Some(GestureAction::Tap)
    );
    assert_eq!(machine.state(), GestureState::SuppressedTap);
    assert_eq!(machine.handle(click()).fire, None);
    assert_eq!(machine.state(), GestureState::Idle);
}

#[test]
fn space_holds_only_when_hold_is_bound() {
    let mut machine = GestureMachine::new(BOTH, Duration::from_millis(500));
    assert_eq!(
        machine.handle(GestureInput::KeyDown(Key::from_name(" "))).fire,
        Some(GestureAction::Hold)
    );
    assert_eq!(machine.handle(click()).fire, None);

    let tap_only = GestureBindings {
        tap: true,
        hold: false,
    };
    let mut machine = GestureMachine::new(tap_only, Duration::from_millis(500));
    assert_eq!(machine.handle(GestureInput::KeyDown(Key::Space)).fire, None);
    assert_eq!(machine.handle(down()).timer, TimerCommand::Cancel);
    assert_eq!(machine.handle(click()).fire, Some(GestureAction::Tap));
}

#[test]
fn hold_only_rows_never_tap() {
    let hold_only = GestureBindings {
        tap: false,
        hold: true,
    };
    let mut machine = GestureMachine::new(hold_only, Duration::from_millis(500));
    machine.handle(down());
    machine.handle(up());
    assert_eq!(machine.handle(click()).fire, None);
}

#[tokio::test(start_paused = true)]
async fn driver_fires_hold_after_delay() {
    let (driver, mut rx) = GestureDriver::new(BOTH, Duration::from_millis(500));
    let started = Instant::now();
    driver.handle(down());

    let action = rx.recv().await.expect("hold action");
    assert_eq!(action, GestureAction::Hold);
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(driver.state(), GestureState::FiredHold);

    driver.handle(up());
    driver.handle(click());
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn driver_release_before_delay_taps_and_aborts_timer() {
    let (driver, mut rx) = GestureDriver::new(BOTH, Duration::from_millis(500));
    driver.handle(down());
    tokio::time::advance(Duration::from_millis(200)).await;
    driver.handle(up());
    driver.handle(click());
    assert_eq!(rx.recv().await, Some(GestureAction::Tap));

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(driver.state(), GestureState::Idle);
}

#[tokio::test(start_paused = true)]
async fn driver_honors_configured_delay() {
    let (driver, mut rx) = GestureDriver::new(BOTH, Duration::from_millis(1200));
    driver.handle(down());
    tokio::time::advance(Duration::from_millis(700)).await;
    tokio::task::yield_now().await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    tokio::time::advance(Duration::from_millis(600)).await;
    assert_eq!(rx.recv().await, Some(GestureAction::Hold));
}

#[tokio::test(start_paused = true)]
async fn driver_blur_aborts_armed_hold() {
    let (driver, mut rx) = GestureDriver::new(BOTH, Duration::from_millis(500));
    driver.handle(down());
    tokio::time::advance(Duration::from_millis(300)).await;
    driver.handle(GestureInput::Blur);
    assert_eq!(driver.state(), GestureState::Idle);

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(driver.state(), GestureState::Idle);
}
