//! Transport layer: the command/response channel to a device.
//!
//! The device layer only talks to a [`Transport`], which hides how bytes
//! reach the device. [`SshTransport`] is the russh-backed implementation;
//! file copies go through the transport's [`FileTransfer`] collaborator
//! ([`ScpTransfer`] for SSH).

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod scp;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use scp::ScpTransfer;
pub use ssh::SshTransport;

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::Result;

/// A prompt-aware command/response channel to one device.
///
/// Implementations are not expected to be shared: the owning device holds
/// it exclusively and issues one command at a time.
pub trait Transport: Send {
    /// File transfer collaborator bound to this transport.
    type Transfer<'a>: FileTransfer
    where
        Self: 'a;

    /// Establish the connection and leave it sitting at a prompt.
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Tear down the connection. Closing a closed transport is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Whether the underlying connection is believed to be up.
    fn is_connected(&self) -> bool;

    /// Send a command and wait for output to complete (timing based).
    ///
    /// Returns the normalized output: command echo and trailing prompt
    /// removed.
    fn send(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Send a command and wait until `pattern` (a regex) appears.
    fn send_expecting(
        &mut self,
        command: &str,
        pattern: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Send an empty line and return the prompt the device answers with.
    ///
    /// Fails if no prompt shows up, which marks the session as stale.
    fn probe_prompt(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Create the file transfer collaborator for one file.
    fn file_transfer(&mut self, request: TransferRequest) -> Self::Transfer<'_>;
}

/// Per-file secure copy collaborator.
pub trait FileTransfer: Send {
    /// Whether the destination file exists on the device.
    fn exists(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Whether the remote file's checksum matches the local source.
    fn checksum_matches(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Enable the device side of the secure copy protocol.
    fn enable_secure_mode(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Open the data channel used by [`transfer`](Self::transfer).
    fn establish_channel(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Push the file over the established channel.
    fn transfer(
        &mut self,
    ) -> impl Future<Output = std::result::Result<(), TransferError>> + Send;

    /// Close the data channel. Safe to call when no channel is open.
    fn close_channel(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// What to copy and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Local source file.
    pub source: PathBuf,
    /// Destination file name on the device.
    pub dest: String,
    /// Destination file system, including the trailing colon.
    pub file_system: String,
}

impl TransferRequest {
    /// Build a request; `dest` defaults to the source's file name.
    pub fn new(source: impl AsRef<Path>, dest: Option<&str>, file_system: impl Into<String>) -> Self {
        let source = source.as_ref().to_path_buf();
        let dest = dest.map(str::to_string).unwrap_or_else(|| {
            source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        Self {
            source,
            dest,
            file_system: file_system.into(),
        }
    }

    /// Device path of the destination, e.g. `flash:image.bin`.
    pub fn remote_path(&self) -> String {
        format!("{}{}", self.file_system, self.dest)
    }
}

/// Failure of the data transfer itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The channel dropped; the data may still have landed.
    #[error("socket closed: {0}")]
    SocketClosed(String),

    /// Any other transfer failure.
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_dest_to_basename() {
        let request = TransferRequest::new("path/to/source_file", None, "flash:");
        assert_eq!(request.dest, "source_file");
        assert_eq!(request.remote_path(), "flash:source_file");
    }

    #[test]
    fn test_request_explicit_dest() {
        let request = TransferRequest::new("source_file", Some("dest_file"), "bootflash:");
        assert_eq!(request.source, PathBuf::from("source_file"));
        assert_eq!(request.remote_path(), "bootflash:dest_file");
    }
}
