use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{ContainerKey, PendingAction, ServiceCall};
use thiserror::Error;

mod controller;
pub mod events;
pub mod gesture;
pub mod i18n;
pub mod view;

pub use controller::ContainerController;
pub use events::{CardEvent, Notification, NotificationLevel};
pub use gesture::{GestureAction, GestureBindings, GestureDriver, GestureInput, GestureMachine};
pub use i18n::{CatalogError, Localizer};
pub use view::{CardView, ContainerView, OverviewItemView, StatusPillView, UsageBar, UsageKind};

/// The host's remote-invocation function.
#[async_trait]
pub trait ServiceCaller: Send + Sync {
    async fn call_service(&self, call: &ServiceCall) -> Result<()>;
}

/// Stand-in used until a host connection exists; every call fails.
pub struct MissingServiceCaller;

#[async_trait]
impl ServiceCaller for MissingServiceCaller {
    async fn call_service(&self, call: &ServiceCall) -> Result<()> {
        Err(anyhow!(
            "no host connection available for {}",
            call.qualified_name()
        ))
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("unknown container {0}")]
    UnknownContainer(String),
    #[error("{action} already in progress for {key}")]
    Busy {
        key: ContainerKey,
        action: PendingAction,
    },
    #[error("no service configured to {action} {key}")]
    Unavailable {
        key: ContainerKey,
        action: PendingAction,
    },
    #[error("failed to {action} {key}: {source}")]
    CallFailed {
        key: ContainerKey,
        action: PendingAction,
        source: anyhow::Error,
    },
    #[error("{gesture:?} action for {key} failed: {source}")]
    ActionFailed {
        key: ContainerKey,
        gesture: GestureAction,
        source: anyhow::Error,
    },
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
