//! Command execution and response classification.

use log::{debug, trace, warn};
use secrecy::ExposeSecret;

use super::Device;
use crate::error::{ChannelError, DeviceError, Error, Result};
use crate::transport::Transport;

impl<T: Transport> Device<T> {
    /// Send one command, waiting for the output to go quiet.
    ///
    /// Fails with [`DeviceError::CommandFailed`] when the response matches
    /// one of the platform's error signatures.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        trace!("{}: sending '{}'", self.host, command);
        let output = self.transport.send(command).await?;
        self.classify(command, output)
    }

    /// Send one command and wait for `pattern` instead of going quiet.
    ///
    /// For commands that end at a confirmation prompt rather than the
    /// device prompt.
    pub async fn send_command_expect(&mut self, command: &str, pattern: &str) -> Result<String> {
        trace!("{}: sending '{}', expecting '{}'", self.host, command, pattern);
        let output = self.transport.send_expecting(command, pattern).await?;
        self.classify(command, output)
    }

    pub(super) fn classify(&self, command: &str, output: String) -> Result<String> {
        match self.platform.detect_failure(&output) {
            Some(line) => {
                debug!("{}: '{}' rejected: {}", self.host, command, line);
                Err(DeviceError::CommandFailed {
                    command: command.to_string(),
                    message: output,
                }
                .into())
            }
            None => Ok(output),
        }
    }

    /// Run a read-only command at the default privilege level.
    pub async fn show(&mut self, command: &str) -> Result<String> {
        self.enable().await?;
        self.send_command(command).await
    }

    /// Run read-only commands in order, stopping at the first rejection.
    pub async fn show_batch(&mut self, commands: &[&str]) -> Result<Vec<String>> {
        self.enable().await?;

        let mut outputs = Vec::with_capacity(commands.len());
        for (index, command) in commands.iter().enumerate() {
            match self.send_command(command).await {
                Ok(output) => outputs.push(output),
                Err(e) => return Err(list_failure(e, commands, index)),
            }
        }
        Ok(outputs)
    }

    /// Run one configuration command.
    ///
    /// Configuration mode is always left afterwards, even when the
    /// command is rejected.
    pub async fn execute(&mut self, command: &str) -> Result<String> {
        self.enter_config().await?;
        let result = self.send_command(command).await;
        let left = self.leave_config().await;
        let output = result?;
        left?;
        Ok(output)
    }

    /// Run configuration commands in order, stopping at the first rejection.
    ///
    /// Not atomic: commands applied before the rejected one stay applied.
    pub async fn execute_batch(&mut self, commands: &[&str]) -> Result<Vec<String>> {
        self.enter_config().await?;

        let mut outputs = Vec::with_capacity(commands.len());
        let mut failure = None;
        for (index, command) in commands.iter().enumerate() {
            match self.send_command(command).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    if index > 0 {
                        warn!(
                            "{}: '{}' rejected after {} configuration command(s) were applied; \
                             they are not rolled back",
                            self.host, command, index
                        );
                    }
                    failure = Some(list_failure(e, commands, index));
                    break;
                }
            }
        }

        let left = self.leave_config().await;
        if let Some(e) = failure {
            return Err(e);
        }
        left?;
        Ok(outputs)
    }

    /// Move the session to the platform's default privilege level.
    ///
    /// Escalates (answering a password prompt with the enable secret) or
    /// de-escalates as needed, then verifies the new prompt.
    pub async fn enable(&mut self) -> Result<()> {
        let target = self.platform.default_privilege.clone();
        let prompt = self.transport.probe_prompt().await?;
        let current = self.privilege_of(&prompt)?;
        if current == target {
            return Ok(());
        }

        debug!("{}: moving from {} to {}", self.host, current, target);
        let steps = self
            .platform
            .transitions(&current, &target)
            .ok_or_else(|| DeviceError::PrivilegeAcquisitionFailed {
                target: target.clone(),
            })?;

        for step in steps {
            match &step.auth_prompt {
                Some(auth) => {
                    let prompt = self
                        .platform
                        .prompt_pattern()
                        .map_err(ChannelError::InvalidPattern)?;
                    let pattern = format!("(?:{})|(?:{})", auth.as_str(), prompt.as_str());
                    let output = self.transport.send_expecting(&step.command, &pattern).await?;
                    if auth.is_match(output.trim_end().as_bytes()) {
                        self.answer_password(&step.target).await?;
                    }
                }
                None => {
                    self.transport.send(&step.command).await?;
                }
            }
        }

        let prompt = self.transport.probe_prompt().await?;
        if self.privilege_of(&prompt)? != target {
            return Err(DeviceError::PrivilegeAcquisitionFailed { target }.into());
        }
        Ok(())
    }

    async fn answer_password(&mut self, target: &str) -> Result<()> {
        match &self.enable_secret {
            Some(secret) => {
                let secret = secret.expose_secret().to_string();
                self.transport.send(&secret).await?;
                Ok(())
            }
            None => {
                // Abandon the password prompt
                self.transport.send("").await?;
                Err(DeviceError::PrivilegeAcquisitionFailed {
                    target: target.to_string(),
                }
                .into())
            }
        }
    }

    fn privilege_of(&self, prompt: &str) -> Result<String> {
        self.platform
            .determine_privilege(prompt)
            .map(|level| level.name.clone())
            .ok_or_else(|| {
                DeviceError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    async fn enter_config(&mut self) -> Result<()> {
        self.enable().await?;
        let (from, to) = (
            self.platform.default_privilege.clone(),
            self.platform.config_privilege.clone(),
        );
        self.walk(&from, &to).await
    }

    async fn leave_config(&mut self) -> Result<()> {
        let (from, to) = (
            self.platform.config_privilege.clone(),
            self.platform.default_privilege.clone(),
        );
        self.walk(&from, &to).await
    }

    async fn walk(&mut self, from: &str, to: &str) -> Result<()> {
        let steps = self.platform.transitions(from, to).ok_or_else(|| {
            DeviceError::PrivilegeAcquisitionFailed {
                target: to.to_string(),
            }
        })?;
        for step in steps {
            self.send_command(&step.command).await?;
        }
        Ok(())
    }
}

/// Turn a single-command rejection inside a batch into a list failure.
fn list_failure(error: Error, commands: &[&str], index: usize) -> Error {
    match error {
        Error::Device(DeviceError::CommandFailed { command, message }) => {
            DeviceError::CommandListFailed {
                commands: commands.iter().map(|c| c.to_string()).collect(),
                failed_index: index,
                command,
                message,
            }
            .into()
        }
        other => other,
    }
}
