//! Device session and command-execution core.
//!
//! A [`Device`] owns one [`Transport`] exclusively and layers the
//! device workflows on top of it:
//!
//! - command execution with error classification ([`Device::show`],
//!   [`Device::execute_batch`], ...)
//! - cached facts ([`Device::facts`])
//! - boot options and OS installation ([`Device::install_os`])
//! - HA awareness ([`Device::confirm_is_active`], gating [`Device::open`])
//! - verified file transfer ([`Device::file_copy`])
//! - configuration management ([`Device::save`], [`Device::rollback`])
//!
//! # Example
//!
//! ```rust,no_run
//! use ferrios::DeviceBuilder;
//!
//! # async fn example() -> Result<(), ferrios::Error> {
//! let mut device = DeviceBuilder::new("192.0.2.10")
//!     .username("admin")
//!     .password("secret")
//!     .platform("cisco_ios")
//!     .build()?;
//!
//! device.open().await?;
//! let facts = device.facts().await?;
//! println!("{} runs {}", facts.hostname, facts.os_version);
//! device.close().await?;
//! # Ok(())
//! # }
//! ```

mod boot;
mod builder;
mod config;
mod executor;
mod facts;
mod redundancy;
mod settings;
mod transfer;


pub use boot::{BootOptions, InstallPhase};
pub use builder::DeviceBuilder;
pub use facts::{Facts, FactsCache};
pub use settings::DeviceSettings;
pub use transfer::CopyOutcome;

use log::{debug, info, trace};
use secrecy::SecretString;

use crate::error::Result;
use crate::platform::PlatformDefinition;
use crate::transport::{SshTransport, Transport};

/// One session with one network device.
pub struct Device<T: Transport = SshTransport> {
    host: String,
    transport: T,
    platform: PlatformDefinition,
    settings: DeviceSettings,
    enable_secret: Option<SecretString>,
    connected: bool,
    facts: FactsCache,
}

impl<T: Transport> Device<T> {
    /// Wrap an existing transport.
    ///
    /// The session counts as connected if the transport already is.
    pub fn with_transport(
        host: impl Into<String>,
        transport: T,
        platform: PlatformDefinition,
        settings: DeviceSettings,
    ) -> Self {
        Self {
            host: host.into(),
            connected: transport.is_connected(),
            transport,
            platform,
            settings,
            enable_secret: None,
            facts: FactsCache::default(),
        }
    }

    /// Secret answered when escalating asks for a password.
    pub fn with_enable_secret(mut self, secret: SecretString) -> Self {
        self.enable_secret = Some(secret);
        self
    }

    /// Address this device was created for.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Whether the session is believed to be usable.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Override the connected flag; `false` forces a full reconnect on the
    /// next [`open`](Self::open).
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Make sure there is a live session on the active unit.
    ///
    /// A connected session is probed first; if the probe fails the session
    /// is stale and is fully re-established. Unless disabled in
    /// [`DeviceSettings`], the session is then checked to be on the active
    /// unit, and closed again if it is not.
    pub async fn open(&mut self) -> Result<()> {
        if self.connected {
            match self.transport.probe_prompt().await {
                Ok(prompt) => trace!("{} alive at '{}'", self.host, prompt),
                Err(e) => {
                    debug!("session to {} is stale: {}", self.host, e);
                    self.connected = false;
                }
            }
        }

        if !self.connected {
            self.transport.close().await?;
            self.transport.connect().await?;
            self.connected = true;
            info!("connected to {}", self.host);
        }

        if self.settings.confirm_active_on_open {
            if let Err(e) = self.confirm_is_active().await {
                if self.connected {
                    self.close_quietly().await;
                }
                return Err(e);
            }
        }

        Ok(())
    }

    /// Close the transport and mark the session disconnected.
    pub async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.transport.close().await
    }

    async fn close_quietly(&mut self) {
        if let Err(e) = self.close().await {
            debug!("ignoring error closing {}: {}", self.host, e);
        }
    }

    /// Best name for error messages without querying the device.
    fn hostname_hint(&self) -> String {
        self.facts
            .get()
            .map(|facts| facts.hostname.clone())
            .unwrap_or_else(|| self.host.clone())
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("host", &self.host)
            .field("platform", &self.platform.name)
            .field("connected", &self.connected)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
