//! Privilege level definition.

use regex::bytes::Regex;

/// A CLI privilege level (exec, privileged exec, configuration, ...).
///
/// Levels form a tree through `parent`; moving between levels walks the
/// tree, escalating with the child's `escalate` command and de-escalating
/// with the child's `deescalate` command.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this privilege level (e.g. "exec", "privilege_exec").
    pub name: String,

    /// Regex matching the prompt at this level.
    pub pattern: Regex,

    /// Parent level (None for the root).
    pub parent: Option<String>,

    /// Command that enters this level from the parent.
    pub escalate: Option<String>,

    /// Command that leaves this level for the parent.
    pub deescalate: Option<String>,

    /// Password prompt that may follow the escalate command.
    pub auth_prompt: Option<Regex>,

    /// Substrings that rule this level out even when `pattern` matches.
    /// `#` ends both privileged and configuration prompts.
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    /// Create a root privilege level.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            parent: None,
            escalate: None,
            deescalate: None,
            auth_prompt: None,
            not_contains: vec![],
        })
    }

    /// Set the parent privilege level.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the escalation command.
    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate = Some(command.into());
        self
    }

    /// Set the de-escalation command.
    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate = Some(command.into());
        self
    }

    /// Escalation may ask for a password matching `prompt_pattern`.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.auth_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    /// Add a not_contains pattern.
    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Check if this privilege level matches a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_contains_rules_out_match() {
        let level = PrivilegeLevel::new("privileged", r"#\s?$")
            .unwrap()
            .with_not_contains("(config");
        assert!(level.matches("router#"));
        assert!(!level.matches("router(config)#"));
    }

    #[test]
    fn test_auth_prompt() {
        let level = PrivilegeLevel::new("privileged", r"#\s?$")
            .unwrap()
            .with_auth(r"(?i)password:\s?$")
            .unwrap();
        assert!(level.auth_prompt.unwrap().is_match(b"Password: "));
    }
}
