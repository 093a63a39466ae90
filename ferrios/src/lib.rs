//! # Ferrios
//!
//! Async automation for Cisco IOS devices over SSH.
//!
//! Ferrios drives one device session at a time and builds the usual
//! operational workflows on top of it:
//!
//! - command dispatch with rejection detection (`% Invalid input`, ...)
//! - device facts parsed from `show` output, cached per session
//! - boot variable management, reload and OS installation
//! - HA awareness: sessions on a standby supervisor are refused
//! - SCP file copy verified by MD5 checksum
//! - configuration save, checkpoint, rollback and backup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrios::DeviceBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrios::Error> {
//!     let mut device = DeviceBuilder::new("192.0.2.10")
//!         .username("admin")
//!         .password("secret")
//!         .platform("cisco_ios")
//!         .build()?;
//!
//!     device.open().await?;
//!
//!     let output = device.show("show ip interface brief").await?;
//!     println!("{}", output);
//!
//!     if device.install_os("c2800nm-adventerprisek9-mz.152-4.M7.bin").await? {
//!         println!("upgraded");
//!     }
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod device;
pub mod error;
pub mod parse;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use device::{BootOptions, CopyOutcome, Device, DeviceBuilder, DeviceSettings, Facts, InstallPhase};
pub use error::{Error, Result};
pub use parse::{RedundancyReport, RedundancyState, VendorParser};
pub use platform::{PlatformDefinition, PlatformRegistry, PrivilegeLevel};
pub use transport::{
    AuthMethod, FileTransfer, HostKeyVerification, SshConfig, SshTransport, TransferError,
    TransferRequest, Transport,
};
