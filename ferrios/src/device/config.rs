//! Saving, checkpointing and restoring the configuration.

use std::path::Path;

use log::info;

use super::Device;
use crate::error::{DeviceError, Error, Result};
use crate::transport::Transport;

impl<T: Transport> Device<T> {
    /// Save the running configuration to startup.
    pub async fn save(&mut self) -> Result<bool> {
        self.copy_running_config("startup-config").await?;
        info!("{}: configuration saved", self.host);
        Ok(true)
    }

    /// Save the running configuration as `name` on the default file system.
    pub async fn checkpoint(&mut self, name: &str) -> Result<()> {
        self.copy_running_config(name).await?;
        info!("{}: checkpoint {} written", self.host, name);
        Ok(())
    }

    /// Replace the running configuration with checkpoint `name`.
    pub async fn rollback(&mut self, name: &str) -> Result<()> {
        let file_system = self.file_system().await?;
        let command = format!("configure replace {}{} force", file_system, name);
        match self.show(&command).await {
            Ok(_) => {
                info!("{}: rolled back to {}", self.host, name);
                Ok(())
            }
            Err(e) if e.is_command_rejection() => Err(DeviceError::Rollback {
                message: format!("rollback to {} unsuccessful: {}", name, rejection_text(&e)),
            }
            .into()),
            Err(e) => Err(e),
        }
    }

    pub async fn running_config(&mut self) -> Result<String> {
        self.show("show running-config").await
    }

    pub async fn startup_config(&mut self) -> Result<String> {
        self.show("show startup-config").await
    }

    /// Write the running configuration to a local file.
    pub async fn backup_running_config(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let config = self.running_config().await?;
        tokio::fs::write(path.as_ref(), config.as_bytes()).await?;
        info!("{}: running config backed up to {}", self.host, path.as_ref().display());
        Ok(())
    }

    /// `copy running-config <dest>`, accepting the destination prompt.
    async fn copy_running_config(&mut self, dest: &str) -> Result<()> {
        let command = format!("copy running-config {}", dest);
        self.enable().await?;
        self.send_command(&command).await?;
        let confirmed = self.transport.send("").await?;
        self.classify(&command, confirmed)?;
        self.transport.probe_prompt().await?;
        Ok(())
    }
}

fn rejection_text(error: &Error) -> &str {
    match error {
        Error::Device(DeviceError::CommandFailed { message, .. }) => message.trim(),
        _ => "",
    }
}
