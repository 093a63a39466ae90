//! Boot options, reload and OS installation.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::time::Instant;

use super::Device;
use crate::error::{DeviceError, Error, Result, TransportError};
use crate::parse::boot::normalize_boot_image;
use crate::transport::Transport;

/// The device's configured next-boot image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootOptions {
    /// Image name without file system, `None` if no image is configured.
    pub sys: Option<String>,
}

/// Phases of [`Device::install_os`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    CheckingImage,
    SettingBootOptions,
    Rebooting,
    AwaitingReboot,
    Verifying,
    Installed,
    AlreadyInstalled,
}

impl<T: Transport> Device<T> {
    /// Resolve the device's default file system (e.g. `flash:`).
    ///
    /// Retries `dir` up to `file_system_attempts` times.
    pub async fn file_system(&mut self) -> Result<String> {
        let parser = Arc::clone(&self.platform.parser);

        for attempt in 1..=self.settings.file_system_attempts {
            match self.show("dir").await {
                Ok(output) => match parser.file_system(&output) {
                    Some(file_system) => return Ok(file_system),
                    None => debug!("{}: no file system in dir output (attempt {})", self.host, attempt),
                },
                Err(e) if e.is_command_rejection() => {
                    debug!("{}: dir rejected (attempt {})", self.host, attempt);
                }
                Err(e) => return Err(e),
            }
        }

        Err(DeviceError::FileSystemNotFound {
            hostname: self.hostname_hint(),
            command: "dir".to_string(),
        }
        .into())
    }

    /// Read the next-boot image.
    ///
    /// Boot queries are tried in the parser's order; the first one the
    /// device accepts decides the answer. If every query is rejected, the
    /// last rejection is returned.
    pub async fn boot_options(&mut self) -> Result<BootOptions> {
        let parser = Arc::clone(&self.platform.parser);
        let mut last_error = None;

        for query in parser.boot_queries() {
            match self.show(query.command).await {
                Ok(output) => {
                    let Some(path) = parser.boot_path(query, &output) else {
                        return Ok(BootOptions { sys: None });
                    };
                    let file_system = self.file_system().await?;
                    return Ok(BootOptions {
                        sys: Some(normalize_boot_image(&path, &file_system)),
                    });
                }
                Err(e) if e.is_command_rejection() => {
                    debug!("{}: '{}' rejected, trying next", self.host, query.command);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DeviceError::CommandFailed {
                command: "boot options".to_string(),
                message: "platform defines no boot queries".to_string(),
            }
            .into()
        }))
    }

    /// Point the next boot at `image`, save, and verify.
    ///
    /// The image must already be on the file system; this is checked
    /// before anything is changed.
    pub async fn set_boot_options(&mut self, image: &str, file_system: Option<&str>) -> Result<()> {
        let file_system = match file_system {
            Some(file_system) => file_system.to_string(),
            None => self.file_system().await?,
        };

        let listing = self.show(&format!("dir {}", file_system)).await?;
        if !listing.contains(image) {
            return Err(DeviceError::FileNotFound {
                hostname: self.hostname_hint(),
                file: image.to_string(),
                dir: file_system,
            }
            .into());
        }

        if self.boot_options().await?.sys.as_deref() == Some(image) {
            info!("{}: boot image already {}", self.host, image);
            return Ok(());
        }

        let mut command = format!("boot system {}/{}", file_system, image);
        match self.execute_batch(&["no boot system", &command]).await {
            Ok(_) => {}
            Err(e) if e.is_command_rejection() => {
                // Older releases want the file system as a separate token
                command = format!("boot system {} {}", file_system.trim_end_matches(':'), image);
                debug!("{}: retrying with '{}'", self.host, command);
                self.execute_batch(&["no boot system", &command]).await?;
            }
            Err(e) => return Err(e),
        }

        self.save().await?;

        let found = self.boot_options().await?.sys;
        if found.as_deref() != Some(image) {
            return Err(DeviceError::CommandFailed {
                command,
                message: format!(
                    "boot options did not take effect, found {}",
                    found.as_deref().unwrap_or("no boot image")
                ),
            }
            .into());
        }

        info!("{}: boot image set to {}", self.host, image);
        Ok(())
    }

    /// Reload the device.
    ///
    /// Without `confirm` nothing is sent. With a `timer` (minutes) the
    /// reload is scheduled and the session stays up; an immediate reload
    /// drops the session, which is expected and not an error.
    pub async fn reboot(&mut self, confirm: bool, timer: Option<u32>) -> Result<()> {
        if !confirm {
            warn!("{}: reboot requested without confirmation, not reloading", self.host);
            return Ok(());
        }

        let command = match timer {
            Some(minutes) if minutes > 0 => format!("reload in {}", minutes),
            _ => "reload".to_string(),
        };
        let immediate = command == "reload";
        let limit = self.settings.reload_confirm_timeout;

        let transport = &mut self.transport;
        let exchange = async {
            let first = transport.send(&command).await?;
            let answered = if first.contains("System configuration") {
                transport.send("no").await?
            } else {
                String::new()
            };
            transport.send("").await?;
            Ok::<_, Error>((first, answered))
        };

        match tokio::time::timeout(limit, exchange).await {
            Ok(Ok((first, answered))) => {
                self.classify(&command, first)?;
                self.classify(&command, answered)?;
            }
            Ok(Err(e)) if immediate => debug!("{}: session dropped during reload: {}", self.host, e),
            Ok(Err(e)) => return Err(e),
            Err(_) if immediate => debug!("{}: reload confirmation timed out", self.host),
            Err(_) => {
                return Err(TransportError::Timeout(limit).into());
            }
        }

        info!("{}: {}", self.host, command);
        if immediate {
            self.close_quietly().await;
        }
        Ok(())
    }

    /// Reconnect to a reloading device, polling until it answers.
    ///
    /// Fails with [`DeviceError::RebootTimeout`] once `reboot_timeout`
    /// has passed.
    pub async fn wait_for_reboot(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.settings.reboot_timeout;

        loop {
            tokio::time::sleep(self.settings.reboot_poll_interval).await;

            self.connected = false;
            match self.open().await {
                Ok(()) => {
                    info!("{}: back after reload", self.host);
                    return Ok(());
                }
                Err(e) => debug!("{}: not back yet: {}", self.host, e),
            }

            if Instant::now() >= deadline {
                return Err(DeviceError::RebootTimeout {
                    hostname: self.hostname_hint(),
                    wait_time: self.settings.reboot_timeout,
                }
                .into());
            }
        }
    }

    /// Whether the device is running `image`.
    pub async fn image_booted(&mut self, image: &str) -> Result<bool> {
        let version = self.show("show version").await?;
        Ok(self.platform.parser.image_booted(&version, image))
    }

    /// Install `image` (already on the device) and boot into it.
    ///
    /// Returns `false` without changing anything when the device already
    /// runs the image. Any failure closes the session.
    pub async fn install_os(&mut self, image: &str) -> Result<bool> {
        match self.run_install(image).await {
            Ok(installed) => Ok(installed),
            Err(e) => {
                warn!("{}: install of {} failed: {}", self.host, image, e);
                self.close_quietly().await;
                Err(e)
            }
        }
    }

    async fn run_install(&mut self, image: &str) -> Result<bool> {
        let mut phase = InstallPhase::CheckingImage;

        loop {
            debug!("{}: install {}: {:?}", self.host, image, phase);
            phase = match phase {
                InstallPhase::CheckingImage => {
                    if self.image_booted(image).await? {
                        InstallPhase::AlreadyInstalled
                    } else {
                        InstallPhase::SettingBootOptions
                    }
                }
                InstallPhase::SettingBootOptions => {
                    self.set_boot_options(image, None).await?;
                    InstallPhase::Rebooting
                }
                InstallPhase::Rebooting => {
                    self.reboot(true, None).await?;
                    InstallPhase::AwaitingReboot
                }
                InstallPhase::AwaitingReboot => {
                    self.wait_for_reboot().await?;
                    self.facts.invalidate();
                    InstallPhase::Verifying
                }
                InstallPhase::Verifying => {
                    if !self.image_booted(image).await? {
                        return Err(DeviceError::OsInstall {
                            hostname: self.hostname_hint(),
                            desired_boot: image.to_string(),
                        }
                        .into());
                    }
                    InstallPhase::Installed
                }
                InstallPhase::Installed => {
                    info!("{}: now running {}", self.host, image);
                    return Ok(true);
                }
                InstallPhase::AlreadyInstalled => {
                    info!("{}: already running {}", self.host, image);
                    return Ok(false);
                }
            };
        }
    }
}
