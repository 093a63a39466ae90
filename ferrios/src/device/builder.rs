//! Builder for SSH-backed devices.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::{Device, DeviceSettings};
use crate::error::{ChannelError, PlatformError, Result};
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig, SshTransport};

/// Builder for [`Device`]s that talk SSH.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use ferrios::DeviceBuilder;
///
/// # fn example() -> Result<(), ferrios::Error> {
/// let device = DeviceBuilder::new("192.0.2.10")
///     .username("admin")
///     .password("secret")
///     .enable_secret("enable-secret")
///     .platform("cisco_ios")
///     .timeout(Duration::from_secs(60))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    enable_secret: Option<SecretString>,
    platform_name: Option<String>,
    custom_platform: Option<PlatformDefinition>,
    settings: DeviceSettings,
    terminal_size: Option<(u32, u32)>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DeviceBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            enable_secret: None,
            platform_name: None,
            custom_platform: None,
            settings: DeviceSettings::default(),
            terminal_size: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Secret sent when `enable` asks for a password.
    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the platform name (e.g. "cisco_ios").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Connection and per-command timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.command_timeout = timeout;
        self
    }

    /// Replace all device settings at once.
    pub fn settings(mut self, settings: DeviceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the platform's terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_size = Some((width, height));
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a known_hosts file other than `~/.ssh/known_hosts`.
    pub fn known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the device.
    ///
    /// Nothing is connected yet; call [`Device::open`].
    pub fn build(self) -> Result<Device<SshTransport>> {
        let username = self.username.ok_or_else(|| PlatformError::InvalidDefinition {
            message: "Username is required".to_string(),
        })?;

        let platform = match (self.custom_platform, self.platform_name) {
            (Some(custom), _) => custom,
            (None, Some(name)) => PlatformRegistry::lookup(&name)?,
            (None, None) => {
                return Err(PlatformError::InvalidDefinition {
                    message: "Platform must be specified".to_string(),
                }
                .into());
            }
        };

        let prompt = platform
            .prompt_pattern()
            .map_err(ChannelError::InvalidPattern)?;
        let (terminal_width, terminal_height) = self
            .terminal_size
            .unwrap_or((platform.terminal_width, platform.terminal_height));

        let ssh_config = SshConfig {
            host: self.host.clone(),
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.settings.command_timeout,
            quiet_period: self.settings.quiet_period,
            terminal_width,
            terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        let transport = SshTransport::new(ssh_config, prompt)
            .with_on_open_commands(platform.on_open_commands.clone());

        let mut device = Device::with_transport(self.host, transport, platform, self.settings);
        if let Some(secret) = self.enable_secret {
            device = device.with_enable_secret(secret);
        }
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_build_requires_username() {
        let result = DeviceBuilder::new("192.0.2.1").platform("cisco_ios").build();
        assert!(matches!(
            result,
            Err(Error::Platform(PlatformError::InvalidDefinition { .. }))
        ));
    }

    #[test]
    fn test_build_requires_known_platform() {
        let result = DeviceBuilder::new("192.0.2.1")
            .username("admin")
            .platform("no_such_os")
            .build();
        assert!(matches!(
            result,
            Err(Error::Platform(PlatformError::UnknownPlatform { .. }))
        ));
    }

    #[test]
    fn test_build_applies_settings() {
        let device = DeviceBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .platform("cisco_ios")
            .port(2222)
            .timeout(Duration::from_secs(90))
            .terminal_size(200, 50)
            .build()
            .unwrap();

        assert!(!device.connected());
        assert_eq!(device.settings().command_timeout, Duration::from_secs(90));

        let config = device.transport().config();
        assert_eq!(config.socket_addr(), "192.0.2.1:2222");
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!((config.terminal_width, config.terminal_height), (200, 50));
    }
}
