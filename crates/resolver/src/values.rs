//! Lenient parsing and formatting of raw entity state strings.
//!
//! Host sensors report numbers as free-form strings ("42%", "12.5 %",
//! "unavailable"). Anything that cannot be read yields `None`, which the
//! display layer renders as a placeholder glyph.

use shared::{config::ContainerConfig, domain::EntitySnapshot};

pub const PLACEHOLDER: &str = "—";

const UNAVAILABLE_TOKENS: &[&str] = &["unknown", "unavailable", "none"];

/// Mirrors a leading-number parse: "12.5abc" reads as 12.5.
fn parse_leading_float(input: &str) -> Option<f64> {
    let bytes = input.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    input[..end].parse().ok()
}

pub fn parse_usage_percentage(value: Option<&str>) -> Option<f64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if UNAVAILABLE_TOKENS.contains(&lowered.as_str()) {
        return None;
    }
    let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    parse_leading_float(numeric)
}

/// Exact integer first, then the first signed digit run in the text.
pub fn parse_int_state(value: Option<&str>) -> Option<i64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<f64>() {
        if parsed.is_finite() && parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
            return Some(parsed as i64);
        }
    }

    let bytes = trimmed.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let signed_start = if start > 0 && bytes[start - 1] == b'-' {
        start - 1
    } else {
        start
    };
    trimmed[signed_start..end].parse().ok()
}

pub fn format_state_value(value: Option<&str>) -> String {
    match value {
        None | Some("unknown") | Some("unavailable") => PLACEHOLDER.to_string(),
        Some(value) => value.to_string(),
    }
}

/// True when the text carries nothing but placeholder glyphs and separators.
pub fn is_placeholder_value(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == PLACEHOLDER {
        return true;
    }
    if trimmed.eq_ignore_ascii_case("unknown") || trimmed.eq_ignore_ascii_case("unavailable") {
        return true;
    }
    trimmed
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '—' | '/' | '·'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Low,
    Medium,
    High,
}

impl UsageLevel {
    pub fn for_percentage(value: f64) -> Self {
        let clamped = clamp_percentage(value);
        if clamped < 50.0 {
            Self::Low
        } else if clamped < 80.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "var(--docker-card-usage-low, var(--state-success-color, #2e8f57))",
            Self::Medium => "var(--docker-card-usage-medium, var(--state-warning-color, #dfa000))",
            Self::High => "var(--docker-card-usage-high, var(--state-error-color, #c22040))",
        }
    }
}

pub fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// CPU and memory readings for one container, `None` when not configured or unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
}

impl ResourceUsage {
    pub fn resolve(config: &ContainerConfig, snapshot: &EntitySnapshot) -> Self {
        let read = |entity: Option<&str>| {
            parse_usage_percentage(entity.and_then(|id| snapshot.state_of(id)))
        };
        Self {
            cpu: read(config.cpu_entity()),
            memory: read(config.memory_entity()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.memory.is_none()
    }
}
