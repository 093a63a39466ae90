//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result, TransportError};

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Upper bound for any single read operation.
    pub timeout: Duration,

    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// Timing mode: output is complete once the channel has been silent
    /// this long.
    pub quiet_period: Duration,

    /// Timing mode: shorter silence window used once the prompt is visible.
    pub settle_period: Duration,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
            quiet_period: Duration::from_secs(2),
            settle_period: Duration::from_millis(100),
        }
    }
}

/// High-level PTY channel for interactive device sessions.
///
/// Wraps the russh shell channel and provides the two completion
/// strategies the device layer relies on: timing-based (read until the
/// device goes quiet) and pattern-based (read until a regex matches).
pub struct PtyChannel {
    channel: Channel<Msg>,
    config: PtyConfig,
    buffer: PatternBuffer,
}

impl PtyChannel {
    /// Wrap an already opened shell channel.
    pub fn new(channel: Channel<Msg>, config: PtyConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            channel,
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PtyConfig {
        &self.config
    }

    /// Write a line (command plus newline) to the channel.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let data = format!("{}\n", line);
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `pattern` matches in the tail of the buffer.
    pub async fn read_until_prompt(&mut self, pattern: &Regex) -> Result<Vec<u8>> {
        self.read_until(pattern, false).await
    }

    /// Read until `pattern` matches anywhere in the accumulated output.
    pub async fn read_until_match(&mut self, pattern: &Regex) -> Result<Vec<u8>> {
        self.read_until(pattern, true).await
    }

    async fn read_until(&mut self, pattern: &Regex, full: bool) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.config.timeout;

        loop {
            let found = if full {
                self.buffer.search_full(pattern).is_some()
            } else {
                self.buffer.tail_contains(pattern)
            };
            if found {
                return Ok(self.buffer.take());
            }

            match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Err(_) => {
                    self.buffer.clear();
                    return Err(ChannelError::PatternTimeout(self.config.timeout).into());
                }
                Ok(msg) => self.absorb(msg)?,
            }
        }
    }

    /// Timing-based read: collect output until the channel goes quiet.
    ///
    /// Fails with [`TransportError::Timeout`] if output is still arriving
    /// when the overall timeout expires; the partial output is discarded.
    pub async fn read_until_quiet(&mut self, prompt: &Regex) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.config.timeout;

        loop {
            let window = if self.buffer.tail_contains(prompt) {
                self.config.settle_period
            } else {
                self.config.quiet_period
            };
            let (wake, at_deadline) = next_wake(Instant::now(), window, deadline);

            match tokio::time::timeout_at(wake, self.channel.wait()).await {
                Err(_) if at_deadline => {
                    trace!("timing read still receiving at overall timeout");
                    self.buffer.clear();
                    return Err(TransportError::Timeout(self.config.timeout).into());
                }
                Err(_) => return Ok(self.buffer.take()),
                Ok(msg) => self.absorb(msg)?,
            }
        }
    }

    fn absorb(&mut self, msg: Option<ChannelMsg>) -> Result<()> {
        match msg {
            Some(ChannelMsg::Data { data }) => {
                trace!("read {} bytes", data.len());
                self.buffer.extend(&data);
                Ok(())
            }
            Some(ChannelMsg::ExtendedData { data, .. }) => {
                self.buffer.extend(&data);
                Ok(())
            }
            Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                Err(ChannelError::Closed.into())
            }
            Some(_) => Ok(()),
        }
    }

    /// Close the channel.
    pub async fn close(self) -> Result<()> {
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}

/// When a timing read should next give up waiting, and whether that
/// wake-up is the overall deadline rather than the end of a quiet window.
fn next_wake(now: Instant, window: Duration, deadline: Instant) -> (Instant, bool) {
    let quiet_at = now + window;
    if quiet_at > deadline {
        (deadline, true)
    } else {
        (quiet_at, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wake_quiet_window() {
        let now = Instant::now();
        let deadline = now + Duration::from_secs(30);

        let (wake, at_deadline) = next_wake(now, Duration::from_secs(2), deadline);
        assert_eq!(wake, now + Duration::from_secs(2));
        assert!(!at_deadline);
    }

    #[test]
    fn test_next_wake_clamped_to_deadline() {
        // Output kept arriving for 29s of a 30s budget
        let start = Instant::now();
        let deadline = start + Duration::from_secs(30);
        let now = start + Duration::from_secs(29);

        let (wake, at_deadline) = next_wake(now, Duration::from_secs(2), deadline);
        assert_eq!(wake, deadline);
        assert!(at_deadline);
    }

    #[test]
    fn test_next_wake_window_ending_at_deadline_is_quiet() {
        let now = Instant::now();
        let deadline = now + Duration::from_secs(2);

        let (wake, at_deadline) = next_wake(now, Duration::from_secs(2), deadline);
        assert_eq!(wake, deadline);
        assert!(!at_deadline);
    }

    #[test]
    fn test_deadline_timeout_is_retryable() {
        let err: crate::Error = TransportError::Timeout(Duration::from_secs(30)).into();
        assert!(err.is_retryable());
    }
}
