//! The desired-configuration record and its validation rules.

use std::fmt;

use crate::error::{ConduitError, ConduitResult};

pub const DEFAULT_MAX_CLIENTS: u32 = 200;
pub const DEFAULT_BANDWIDTH_MBPS: f64 = 5.0;

pub const MAX_CLIENTS_RANGE: (u32, u32) = (1, 1000);
pub const BANDWIDTH_RANGE: (f64, f64) = (1.0, 40.0);

/// Smallest memory limit docker accepts.
pub const MIN_MEMORY_BYTES: u64 = 6 * 1024 * 1024;

/// Sentinel the workload binary understands as "no bandwidth cap".
pub const UNLIMITED_SENTINEL: &str = "-1";

/// Per-client bandwidth cap in Mbps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bandwidth {
    Limited(f64),
    Unlimited,
}

impl Bandwidth {
    /// The value passed to `--bandwidth` and stored in the settings file.
    pub fn as_flag(&self) -> String {
        match self {
            Bandwidth::Limited(mbps) => format!("{mbps}"),
            Bandwidth::Unlimited => UNLIMITED_SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bandwidth::Limited(mbps) => write!(f, "{mbps} Mbps"),
            Bandwidth::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Single authoritative source of desired state.
///
/// Every field is always within its documented range. New records are only
/// built through [`SettingsUpdate::apply_to`] or the store's loader, which
/// substitutes defaults for invalid values.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRecord {
    pub max_clients: u32,
    pub bandwidth: Bandwidth,
    pub cpu_limit: Option<f64>,
    pub memory_limit: Option<u64>,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            bandwidth: Bandwidth::Limited(DEFAULT_BANDWIDTH_MBPS),
            cpu_limit: None,
            memory_limit: None,
        }
    }
}

/// Raw operator input for a settings change. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub max_clients: Option<String>,
    pub bandwidth: Option<String>,
    pub cpus: Option<String>,
    pub memory: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.max_clients.is_none()
            && self.bandwidth.is_none()
            && self.cpus.is_none()
            && self.memory.is_none()
    }

    /// Build the next record from `current`.
    ///
    /// Invalid inputs keep the current value for that field and are returned
    /// as `ConfigInvalid` warnings; they never abort the update.
    pub fn apply_to(&self, current: &SettingsRecord) -> (SettingsRecord, Vec<ConduitError>) {
        let mut next = current.clone();
        let mut warnings = Vec::new();

        if let Some(input) = &self.max_clients {
            match parse_max_clients(input) {
                Ok(value) => next.max_clients = value,
                Err(e) => warnings.push(e),
            }
        }
        if let Some(input) = &self.bandwidth {
            match parse_bandwidth(input) {
                Ok(value) => next.bandwidth = value,
                Err(e) => warnings.push(e),
            }
        }
        if let Some(input) = &self.cpus {
            match parse_cpus(input) {
                Ok(value) => next.cpu_limit = value,
                Err(e) => warnings.push(e),
            }
        }
        if let Some(input) = &self.memory {
            match parse_memory(input) {
                Ok(value) => next.memory_limit = value,
                Err(e) => warnings.push(e),
            }
        }

        (next, warnings)
    }
}

fn invalid(field: &'static str, value: &str, reason: impl Into<String>) -> ConduitError {
    ConduitError::ConfigInvalid {
        field,
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn parse_max_clients(input: &str) -> ConduitResult<u32> {
    let trimmed = input.trim();
    let (min, max) = MAX_CLIENTS_RANGE;
    let value: i64 = trimmed
        .parse()
        .map_err(|_| invalid("max-clients", trimmed, "not a whole number"))?;
    if value < i64::from(min) || value > i64::from(max) {
        return Err(invalid(
            "max-clients",
            trimmed,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(value as u32)
}

pub fn parse_bandwidth(input: &str) -> ConduitResult<Bandwidth> {
    let trimmed = input.trim();
    if trimmed == UNLIMITED_SENTINEL || trimmed.eq_ignore_ascii_case("unlimited") {
        return Ok(Bandwidth::Unlimited);
    }
    let (min, max) = BANDWIDTH_RANGE;
    let value: f64 = trimmed
        .parse()
        .map_err(|_| invalid("bandwidth", trimmed, "not a number"))?;
    if !value.is_finite() || value < min || value > max {
        return Err(invalid(
            "bandwidth",
            trimmed,
            format!("must be between {min} and {max} Mbps, or -1 for unlimited"),
        ));
    }
    Ok(Bandwidth::Limited(value))
}

/// `none` or `0` clears the limit.
pub fn parse_cpus(input: &str) -> ConduitResult<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("none") || trimmed == "0" {
        return Ok(None);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| invalid("cpus", trimmed, "not a number"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("cpus", trimmed, "must be a positive number of cores"));
    }
    Ok(Some(value))
}

/// Accepts plain bytes or a `k`/`m`/`g` suffix; `none` or `0` clears the limit.
pub fn parse_memory(input: &str) -> ConduitResult<Option<u64>> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("none") || trimmed == "0" {
        return Ok(None);
    }
    let lower = trimmed.to_ascii_lowercase();
    let (digits, multiplier) = match lower.chars().last() {
        Some('k') => (&lower[..lower.len() - 1], 1024),
        Some('m') => (&lower[..lower.len() - 1], 1024 * 1024),
        Some('g') => (&lower[..lower.len() - 1], 1024 * 1024 * 1024),
        _ => (lower.as_str(), 1),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| invalid("memory", trimmed, "expected bytes or a k/m/g suffix"))?;
    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("memory", trimmed, "value too large"))?;
    if bytes < MIN_MEMORY_BYTES {
        return Err(invalid("memory", trimmed, "must be at least 6m"));
    }
    Ok(Some(bytes))
}

/// Compact docker-style rendering of a byte count (`512m`, `1g`).
pub fn format_memory(bytes: u64) -> String {
    const GIB: u64 = 1024 * 1024 * 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes % GIB == 0 {
        format!("{}g", bytes / GIB)
    } else if bytes % MIB == 0 {
        format!("{}m", bytes / MIB)
    } else if bytes % 1024 == 0 {
        format!("{}k", bytes / 1024)
    } else {
        bytes.to_string()
    }
}
