//! Status & action resolution for docker card containers.
//!
//! Every function here is a synchronous read over host-owned data
//! (`CardConfig`, `EntitySnapshot`). Configuration mistakes resolve to
//! `None` plus a `tracing` diagnostic; nothing in this crate panics or
//! returns a hard error for bad config.

pub mod action;
pub mod capability;
pub mod overview;
pub mod service;
pub mod status;
pub mod values;

pub use action::{plan_effect, resolve_action, ActionEffect, ActionKind, NormalizedAction, UnsupportedAction};
pub use capability::{restart_capability, toggle_capability, RestartCapability, ToggleCapability};
pub use overview::{overall_status, overview_items, OverallStatus, OverviewItem, OverviewKind, Tone};
pub use service::{normalize_service, resolve_restart_call, resolve_toggle_call};
pub use status::{resolve_display_name, resolve_status, StatusKind, StatusLabel, StatusResult};
pub use values::{parse_int_state, parse_usage_percentage, ResourceUsage, UsageLevel};

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
