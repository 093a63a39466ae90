//! Platform definition for vendor-specific configurations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use super::privilege_level::PrivilegeLevel;
use crate::parse::VendorParser;

/// One step between adjacent privilege levels.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Command to send.
    pub command: String,
    /// Level reached once the command succeeds.
    pub target: String,
    /// Password prompt that may appear (escalation only).
    pub auth_prompt: Option<regex::bytes::Regex>,
}

/// Everything vendor-specific about a device family: prompts, privilege
/// levels, error signatures, session setup and the output parser.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g. "cisco_ios").
    pub name: String,

    /// Vendor reported in facts.
    pub vendor: String,

    /// Privilege levels for this platform, root first.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Level commands run at; `enable` moves the session here.
    pub default_privilege: String,

    /// Level configuration commands run at.
    pub config_privilege: String,

    /// A response matching any of these was rejected by the device.
    pub error_signatures: Vec<Regex>,

    /// Commands to run when a connection is established.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Output parsing strategy.
    pub parser: Arc<dyn VendorParser>,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(
        name: impl Into<String>,
        vendor: impl Into<String>,
        parser: Arc<dyn VendorParser>,
    ) -> Self {
        Self {
            name: name.into(),
            vendor: vendor.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            config_privilege: String::new(),
            error_signatures: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
            parser,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    /// Set the configuration privilege level.
    pub fn with_config_privilege(mut self, name: impl Into<String>) -> Self {
        self.config_privilege = name.into();
        self
    }

    /// Add an error signature regex.
    pub fn with_error_signature(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.error_signatures.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Get a privilege level by name.
    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// Privilege level a prompt belongs to.
    pub fn determine_privilege(&self, prompt: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels
            .values()
            .find(|level| level.matches(prompt))
    }

    /// Regex matching the prompt of any privilege level.
    pub fn prompt_pattern(&self) -> Result<regex::bytes::Regex, regex::Error> {
        let combined = self
            .privilege_levels
            .values()
            .map(|level| format!("(?:{})", level.pattern.as_str()))
            .collect::<Vec<_>>()
            .join("|");

        if combined.is_empty() {
            regex::bytes::Regex::new(r"[>#$]\s*$")
        } else {
            regex::bytes::Regex::new(&combined)
        }
    }

    /// The line of `output` that marks it as rejected, if any.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        let found = self
            .error_signatures
            .iter()
            .find_map(|signature| signature.find(output))?;

        let start = output[..found.start()].rfind('\n').map_or(0, |pos| pos + 1);
        let end = output[found.end()..]
            .find('\n')
            .map_or(output.len(), |pos| found.end() + pos);
        Some(output[start..end].trim().to_string())
    }

    /// Steps from one privilege level to another, walking through their
    /// closest common ancestor.
    ///
    /// Returns `None` if either level is unknown or a needed command is
    /// missing.
    pub fn transitions(&self, from: &str, to: &str) -> Option<Vec<Transition>> {
        let up = self.lineage(from)?;
        let down = self.lineage(to)?;

        let pivot_up = up.iter().position(|name| down.contains(name))?;
        let pivot_down = down.iter().position(|name| *name == up[pivot_up])?;

        let mut steps = Vec::new();

        for name in &up[..pivot_up] {
            let level = self.get_privilege(name)?;
            steps.push(Transition {
                command: level.deescalate.clone()?,
                target: level.parent.clone()?,
                auth_prompt: None,
            });
        }

        for name in down[..pivot_down].iter().rev() {
            let level = self.get_privilege(name)?;
            steps.push(Transition {
                command: level.escalate.clone()?,
                target: level.name.clone(),
                auth_prompt: level.auth_prompt.clone(),
            });
        }

        Some(steps)
    }

    /// `name` followed by its ancestors up to the root.
    fn lineage<'a>(&'a self, name: &'a str) -> Option<Vec<&'a str>> {
        let mut chain = vec![];
        let mut current = Some(name);

        while let Some(level_name) = current {
            // Guard against a cyclic definition
            if chain.len() > self.privilege_levels.len() {
                return None;
            }
            let level = self.get_privilege(level_name)?;
            chain.push(level.name.as_str());
            current = level.parent.as_deref();
        }

        Some(chain)
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("vendor", &self.vendor)
            .field("privilege_levels", &self.privilege_levels)
            .field("default_privilege", &self.default_privilege)
            .field("config_privilege", &self.config_privilege)
            .field("error_signatures", &self.error_signatures)
            .field("on_open_commands", &self.on_open_commands)
            .field("terminal_width", &self.terminal_width)
            .field("terminal_height", &self.terminal_height)
            .field("parser", &"<VendorParser>")
            .finish()
    }
}
