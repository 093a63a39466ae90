//! Scripted transport for device-layer tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::{FileTransfer, TransferError, TransferRequest, Transport};
use crate::error::{ChannelError, Result, TransportError};

/// One scripted answer to a command.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Output(String),
    /// The connection drops while the command runs.
    Drop,
}

/// Queue where the last entry repeats forever.
#[derive(Debug, Clone)]
pub(crate) struct Script<T: Clone> {
    items: VecDeque<T>,
    fallback: T,
}

impl<T: Clone> Script<T> {
    fn new(fallback: T) -> Self {
        Self {
            items: VecDeque::new(),
            fallback,
        }
    }

    pub(crate) fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    fn next(&mut self) -> T {
        match self.items.len() {
            0 => self.fallback.clone(),
            1 => self.items[0].clone(),
            _ => self.items.pop_front().unwrap_or_else(|| self.fallback.clone()),
        }
    }
}

/// Everything the file transfer double is told to do, and what it saw.
#[derive(Debug)]
pub(crate) struct TransferScript {
    pub exists: Script<bool>,
    pub checksum: Script<bool>,
    pub transfer_error: Option<TransferError>,
    pub calls: Vec<&'static str>,
    pub requests: Vec<TransferRequest>,
}

impl Default for TransferScript {
    fn default() -> Self {
        Self {
            exists: Script::new(false),
            checksum: Script::new(false),
            transfer_error: None,
            calls: Vec::new(),
            requests: Vec::new(),
        }
    }
}

impl TransferScript {
    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

/// A [`Transport`] answering from per-command scripts.
///
/// Unknown commands answer with empty output, like a device acknowledging
/// a configuration line.
#[derive(Debug)]
pub(crate) struct MockTransport {
    replies: HashMap<String, Script<Reply>>,
    probes: Script<String>,
    pub sent: Vec<String>,
    pub expected_patterns: Vec<(String, String)>,
    pub connected: bool,
    pub connect_calls: usize,
    pub close_calls: usize,
    pub probe_calls: usize,
    pub connect_failures: usize,
    /// Number of upcoming probes that time out.
    pub probe_failures: usize,
    pub transfer: TransferScript,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            replies: HashMap::new(),
            probes: Script::new("rtr2811#".to_string()),
            sent: Vec::new(),
            expected_patterns: Vec::new(),
            connected: true,
            connect_calls: 0,
            close_calls: 0,
            probe_calls: 0,
            connect_failures: 0,
            probe_failures: 0,
            transfer: TransferScript::default(),
        }
    }

    /// Queue `output` as the next answer to `command`.
    pub(crate) fn reply(&mut self, command: &str, output: &str) -> &mut Self {
        self.script(command).push(Reply::Output(output.to_string()));
        self
    }

    /// Queue a rejection (an IOS `% Invalid input` marker) for `command`.
    pub(crate) fn reject(&mut self, command: &str) -> &mut Self {
        self.reply(
            command,
            "                ^\n% Invalid input detected at '^' marker.",
        )
    }

    /// Queue a dropped connection for `command`.
    pub(crate) fn drop_on(&mut self, command: &str) -> &mut Self {
        self.script(command).push(Reply::Drop);
        self
    }

    /// Queue the prompt returned by the next probe.
    pub(crate) fn prompt(&mut self, prompt: &str) -> &mut Self {
        self.probes.push(prompt.to_string());
        self
    }

    /// Number of times `command` was sent.
    pub(crate) fn count(&self, command: &str) -> usize {
        self.sent.iter().filter(|c| *c == command).count()
    }

    fn script(&mut self, command: &str) -> &mut Script<Reply> {
        self.replies
            .entry(command.to_string())
            .or_insert_with(|| Script::new(Reply::Output(String::new())))
    }

    fn answer(&mut self, command: &str) -> Result<String> {
        if !self.connected {
            return Err(TransportError::NotConnected.into());
        }
        self.sent.push(command.to_string());
        let reply = match self.replies.get_mut(command) {
            Some(script) => script.next(),
            None => Reply::Output(String::new()),
        };
        match reply {
            Reply::Output(text) => Ok(text),
            Reply::Drop => {
                self.connected = false;
                Err(TransportError::Disconnected.into())
            }
        }
    }
}

impl Transport for MockTransport {
    type Transfer<'a> = MockTransfer<'a>;

    async fn connect(&mut self) -> Result<()> {
        self.connect_calls += 1;
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(TransportError::Timeout(Duration::from_secs(1)).into());
        }
        self.connected = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, command: &str) -> Result<String> {
        self.answer(command)
    }

    async fn send_expecting(&mut self, command: &str, pattern: &str) -> Result<String> {
        self.expected_patterns
            .push((command.to_string(), pattern.to_string()));
        self.answer(command)
    }

    async fn probe_prompt(&mut self) -> Result<String> {
        self.probe_calls += 1;
        if !self.connected {
            return Err(ChannelError::PatternTimeout(Duration::from_secs(1)).into());
        }
        if self.probe_failures > 0 {
            self.probe_failures -= 1;
            return Err(ChannelError::PatternTimeout(Duration::from_secs(1)).into());
        }
        Ok(self.probes.next())
    }

    fn file_transfer(&mut self, request: TransferRequest) -> MockTransfer<'_> {
        self.transfer.requests.push(request);
        MockTransfer {
            script: &mut self.transfer,
        }
    }
}

/// File transfer double driven by a [`TransferScript`].
#[derive(Debug)]
pub(crate) struct MockTransfer<'a> {
    script: &'a mut TransferScript,
}

impl FileTransfer for MockTransfer<'_> {
    async fn exists(&mut self) -> Result<bool> {
        self.script.calls.push("exists");
        Ok(self.script.exists.next())
    }

    async fn checksum_matches(&mut self) -> Result<bool> {
        self.script.calls.push("checksum");
        Ok(self.script.checksum.next())
    }

    async fn enable_secure_mode(&mut self) -> Result<()> {
        self.script.calls.push("enable_secure_mode");
        Ok(())
    }

    async fn establish_channel(&mut self) -> Result<()> {
        self.script.calls.push("establish_channel");
        Ok(())
    }

    async fn transfer(&mut self) -> std::result::Result<(), TransferError> {
        self.script.calls.push("transfer");
        match self.script.transfer_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn close_channel(&mut self) -> Result<()> {
        self.script.calls.push("close_channel");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_last_entry_repeats() {
        let mut script = Script::new(0);
        assert_eq!(script.next(), 0);
        script.push(1);
        script.push(2);
        assert_eq!(script.next(), 1);
        assert_eq!(script.next(), 2);
        assert_eq!(script.next(), 2);
    }
}
