//! Events the controller publishes for the host to act on.

use serde_json::Value;
use shared::domain::{ContainerKey, PendingAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardEvent {
    Notification(Notification),
    /// `action` is `None` once the in-flight call has settled.
    PendingChanged {
        key: ContainerKey,
        action: Option<PendingAction>,
    },
    MoreInfo {
        entity_id: String,
    },
    Navigate {
        path: String,
    },
    OpenUrl {
        url: String,
        new_tab: bool,
    },
    FireEvent {
        name: String,
        detail: Value,
    },
}
