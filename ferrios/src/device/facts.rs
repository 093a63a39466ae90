//! Device facts and their per-session cache.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use super::Device;
use crate::error::Result;
use crate::transport::Transport;

/// Snapshot of device identity and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facts {
    pub hostname: String,
    /// Always `"N/A"`; IOS does not report a domain in its version output.
    pub fqdn: String,
    pub vendor: String,
    pub os_version: String,
    /// Uptime in seconds when the facts were gathered.
    pub uptime: u64,
    /// Uptime as `DD:HH:MM:SS`.
    pub uptime_string: String,
    pub serial_number: String,
    pub model: String,
    pub interfaces: Vec<String>,
    pub vlans: Vec<u16>,
    /// Platform name the device was driven with.
    pub platform: String,
    /// Platform-specific values (IOS: `config_register`).
    pub extensions: IndexMap<String, String>,
}

/// Versioned cache cell for [`Facts`].
///
/// Filled on first access and kept until explicitly invalidated; there is
/// no expiry. The generation counter moves on every store and every
/// invalidation, so holders of an old `Arc<Facts>` can tell it is stale.
#[derive(Debug, Default)]
pub struct FactsCache {
    slot: Option<Arc<Facts>>,
    generation: u64,
}

impl FactsCache {
    pub fn get(&self) -> Option<Arc<Facts>> {
        self.slot.clone()
    }

    pub fn store(&mut self, facts: Facts) -> Arc<Facts> {
        let facts = Arc::new(facts);
        self.slot = Some(Arc::clone(&facts));
        self.generation += 1;
        facts
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T: Transport> Device<T> {
    /// Facts for this session, gathered on first call and cached.
    pub async fn facts(&mut self) -> Result<Arc<Facts>> {
        if let Some(facts) = self.facts.get() {
            return Ok(facts);
        }
        let facts = self.gather_facts().await?;
        Ok(self.facts.store(facts))
    }

    /// Drop the cached facts and gather them again.
    pub async fn refresh_facts(&mut self) -> Result<Arc<Facts>> {
        self.facts.invalidate();
        self.facts().await
    }

    /// The facts cache, for inspecting its generation.
    pub fn facts_cache(&self) -> &FactsCache {
        &self.facts
    }

    async fn gather_facts(&mut self) -> Result<Facts> {
        let parser = Arc::clone(&self.platform.parser);

        let version = parser.version(&self.show("show version").await?)?;
        let interfaces = parser.interfaces(&self.show("show interfaces").await?);

        let vlans = match self.show("show vlan").await {
            Ok(output) => parser.vlans(&output),
            Err(e) if e.is_command_rejection() => {
                debug!("{}: no vlan support", self.host);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Facts {
            hostname: version.hostname,
            fqdn: "N/A".to_string(),
            vendor: self.platform.vendor.clone(),
            os_version: version.os_version,
            uptime: version.uptime,
            uptime_string: version.uptime_string,
            serial_number: version.serial_number,
            model: version.model,
            interfaces,
            vlans,
            platform: self.platform.name.clone(),
            extensions: version.extensions,
        })
    }
}
