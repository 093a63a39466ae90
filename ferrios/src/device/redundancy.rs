//! High-availability role of the connected processor.

use std::sync::Arc;

use log::{debug, warn};

use super::Device;
use crate::error::{DeviceError, Result};
use crate::parse::{RedundancyReport, RedundancyState};
use crate::transport::Transport;

impl<T: Transport> Device<T> {
    /// Parsed redundancy listing, `None` when the device has no redundancy
    /// support.
    pub async fn show_redundancy(&mut self) -> Result<Option<RedundancyReport>> {
        let parser = Arc::clone(&self.platform.parser);
        match self.show("show redundancy").await {
            Ok(output) => Ok(Some(parser.redundancy(&output)?)),
            Err(e) if e.is_command_rejection() => {
                debug!("{}: redundancy not supported", self.host);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// State of the processor this session is on.
    pub async fn redundancy_state(&mut self) -> Result<Option<RedundancyState>> {
        Ok(self.show_redundancy().await?.map(|report| report.local))
    }

    /// State of the peer processor.
    pub async fn peer_redundancy_state(&mut self) -> Result<Option<RedundancyState>> {
        Ok(self.show_redundancy().await?.map(|report| report.peer))
    }

    /// Operating redundancy mode, e.g. `stateful switchover`.
    pub async fn redundancy_mode(&mut self) -> Result<Option<String>> {
        Ok(self.show_redundancy().await?.and_then(|report| report.mode))
    }

    /// Whether this session is on the active processor.
    ///
    /// Devices without redundancy support count as active.
    pub async fn is_active(&mut self) -> Result<bool> {
        Ok(self
            .redundancy_state()
            .await?
            .is_none_or(|state| state.is_active()))
    }

    /// `true` on the active processor; otherwise fails with
    /// [`DeviceError::DeviceNotActive`]. The session is closed before
    /// failing.
    pub async fn confirm_is_active(&mut self) -> Result<bool> {
        let local = self.redundancy_state().await?;
        if local.as_ref().is_none_or(RedundancyState::is_active) {
            return Ok(true);
        }

        let peer = self.peer_redundancy_state().await?;
        let describe = |state: Option<RedundancyState>| {
            state.map_or_else(|| "unknown".to_string(), |s| s.to_string())
        };
        let error = DeviceError::DeviceNotActive {
            hostname: self.hostname_hint(),
            redundancy_state: describe(local),
            peer_redundancy_state: describe(peer),
        };

        warn!("{}: {}", self.host, error);
        self.close_quietly().await;
        Err(error.into())
    }
}
