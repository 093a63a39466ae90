//! Output parsing: free-text CLI output to structured values.
//!
//! Parsing is a strategy: each platform carries a [`VendorParser`] that
//! knows its own text patterns. The device layer only sends commands and
//! hands the raw output to the parser.

pub mod boot;
pub mod uptime;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ParseError;

/// Values extracted from a version listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionFacts {
    pub hostname: String,
    pub os_version: String,
    pub model: String,
    pub serial_number: String,
    /// Uptime in seconds.
    pub uptime: u64,
    /// Uptime as `DD:HH:MM:SS`.
    pub uptime_string: String,
    /// Platform-specific values, in the order they were found.
    pub extensions: IndexMap<String, String>,
}

/// Where a boot query's output comes from, which decides how it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    /// A boot variable listing (`BOOT variable = ...`).
    Variables,
    /// Boot statements from the running configuration.
    RunningConfig,
}

/// One show command that can reveal the next-boot image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootQuery {
    pub command: &'static str,
    pub source: BootSource,
}

/// High-availability role of one processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RedundancyState {
    Active,
    StandbyHot,
    Disabled,
    /// Any other state the device reports, lower-cased.
    Other(String),
}

impl RedundancyState {
    /// Interpret a device-reported state, case-insensitively.
    pub fn from_reported(state: &str) -> Self {
        let state = state.trim().to_lowercase();
        match state.as_str() {
            "active" => Self::Active,
            "standby hot" => Self::StandbyHot,
            "disabled" => Self::Disabled,
            _ => Self::Other(state),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for RedundancyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::StandbyHot => f.write_str("standby hot"),
            Self::Disabled => f.write_str("disabled"),
            Self::Other(state) => f.write_str(state),
        }
    }
}

/// Everything one redundancy listing says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundancyReport {
    /// Operating redundancy mode, lower-cased.
    pub mode: Option<String>,
    /// State of the processor this session is on.
    pub local: RedundancyState,
    /// State of the peer processor; `Disabled` when there is none.
    pub peer: RedundancyState,
}

/// Vendor-specific text patterns.
///
/// Every method is pure: raw command output in, structured value out.
pub trait VendorParser: Send + Sync {
    /// Identity, version and uptime from the version listing.
    fn version(&self, output: &str) -> Result<VersionFacts, ParseError>;

    /// Interface names, in listing order.
    fn interfaces(&self, output: &str) -> Vec<String>;

    /// VLAN ids, in listing order.
    fn vlans(&self, output: &str) -> Vec<u16>;

    /// Boot queries in the order they should be tried.
    fn boot_queries(&self) -> &[BootQuery];

    /// Raw boot path named by one boot query's output, if any.
    fn boot_path(&self, query: &BootQuery, output: &str) -> Option<String>;

    /// File system root (e.g. `flash:`) from a directory listing.
    fn file_system(&self, output: &str) -> Option<String>;

    /// Parse a redundancy listing.
    fn redundancy(&self, output: &str) -> Result<RedundancyReport, ParseError>;

    /// Whether the version listing shows `image` as the running image.
    fn image_booted(&self, show_version: &str, image: &str) -> bool {
        !image.is_empty() && show_version.contains(image)
    }
}
