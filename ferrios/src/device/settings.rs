//! Device behavior settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and retry knobs for device workflows.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```rust
/// use ferrios::DeviceSettings;
///
/// let settings: DeviceSettings = serde_json::from_str(r#"{"file_system_attempts": 3}"#).unwrap();
/// assert_eq!(settings.file_system_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Upper bound for a single command.
    pub command_timeout: Duration,

    /// Silence that ends a command's output in timing mode.
    pub quiet_period: Duration,

    /// How many `dir` attempts file-system resolution makes.
    pub file_system_attempts: usize,

    /// Bound on the reload confirmation exchange.
    pub reload_confirm_timeout: Duration,

    /// How long to wait for a rebooting device to come back.
    pub reboot_timeout: Duration,

    /// Delay between reconnect attempts while waiting for a reboot.
    pub reboot_poll_interval: Duration,

    /// Refuse sessions on a standby unit when opening.
    pub confirm_active_on_open: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            quiet_period: Duration::from_secs(2),
            file_system_attempts: 5,
            reload_confirm_timeout: Duration::from_secs(10),
            reboot_timeout: Duration::from_secs(3600),
            reboot_poll_interval: Duration::from_secs(10),
            confirm_active_on_open: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DeviceSettings::default();
        assert_eq!(settings.file_system_attempts, 5);
        assert_eq!(settings.reload_confirm_timeout, Duration::from_secs(10));
        assert!(settings.confirm_active_on_open);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: DeviceSettings =
            serde_json::from_str(r#"{"confirm_active_on_open": false}"#).unwrap();
        assert!(!settings.confirm_active_on_open);
        assert_eq!(settings.reboot_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = DeviceSettings {
            reboot_poll_interval: Duration::from_millis(250),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: DeviceSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
