//! Error types for ferrios.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferrios operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Device-level errors (command rejection, install, HA, transfer)
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Output could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Local I/O errors (config backups, transfer sources)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True when the device rejected a command (single or batch).
    ///
    /// This is the condition the fallback paths (boot variable commands,
    /// boot system syntax, unsupported features) key on.
    pub fn is_command_rejection(&self) -> bool {
        matches!(
            self,
            Error::Device(DeviceError::CommandFailed { .. })
                | Error::Device(DeviceError::CommandListFailed { .. })
        )
    }

    /// True for failures that may succeed when the operation is retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::Timeout(_))
                | Error::Transport(TransportError::Disconnected)
                | Error::Channel(ChannelError::PatternTimeout(_))
                | Error::Channel(ChannelError::Closed)
                | Error::Device(DeviceError::RebootTimeout { .. })
                | Error::Device(DeviceError::SocketClosed { .. })
        )
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Transport not connected
    #[error("Transport not connected - call open() first")]
    NotConnected,

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Device layer errors.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device rejected a single command
    #[error("Command '{command}' was not successful: {message}")]
    CommandFailed { command: String, message: String },

    /// A command in a batch was rejected; earlier commands were applied
    #[error(
        "Command '{command}' failed at position {failed_index} of {total}: {message}",
        total = .commands.len()
    )]
    CommandListFailed {
        commands: Vec<String>,
        failed_index: usize,
        command: String,
        message: String,
    },

    /// No file system could be determined from the device
    #[error("Unable to determine file system on {hostname} using '{command}'")]
    FileSystemNotFound { hostname: String, command: String },

    /// A referenced file does not exist on the device
    #[error("{file} was not found in {dir} on {hostname}")]
    FileNotFound {
        hostname: String,
        file: String,
        dir: String,
    },

    /// File transfer failed
    #[error("File transfer failed: {message}")]
    FileTransfer { message: String },

    /// Transfer socket closed and the remote copy could not be verified
    #[error("Transfer socket closed: {message}")]
    SocketClosed { message: String },

    /// Rollback was executed but the device reported a failure
    #[error("Rollback failed: {message}")]
    Rollback { message: String },

    /// Device did not boot the requested image
    #[error("{hostname} was unable to boot into {desired_boot}")]
    OsInstall {
        hostname: String,
        desired_boot: String,
    },

    /// Device is not the active unit of its redundancy pair
    #[error(
        "{hostname} is not the active device (redundancy state: {redundancy_state}, peer: {peer_redundancy_state})"
    )]
    DeviceNotActive {
        hostname: String,
        redundancy_state: String,
        peer_redundancy_state: String,
    },

    /// Device did not come back within the reboot window
    #[error("{hostname} did not reboot within {wait_time:?}")]
    RebootTimeout { hostname: String, wait_time: Duration },

    /// Failed to reach the target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Prompt did not match any privilege level
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },
}

/// Output parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to parse {target}: {message}")]
pub struct ParseError {
    /// What was being extracted (e.g. "show version").
    pub target: String,
    /// Why it failed.
    pub message: String,
}

impl ParseError {
    /// Create a parse error for the given extraction target.
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// Platform name not registered
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// Platform name already registered
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Result type alias using ferrios's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_list_display_names_failed_command() {
        let err = DeviceError::CommandListFailed {
            commands: vec!["interface Fa0/1".into(), "apons".into()],
            failed_index: 1,
            command: "apons".into(),
            message: "Error: apons".into(),
        };
        let text = err.to_string();
        assert!(text.contains("apons"));
        assert!(text.contains("position 1 of 2"));
    }

    #[test]
    fn test_command_rejection_classification() {
        let single: Error = DeviceError::CommandFailed {
            command: "show bootvar".into(),
            message: "% Invalid input".into(),
        }
        .into();
        assert!(single.is_command_rejection());

        let transfer: Error = DeviceError::FileTransfer {
            message: "boom".into(),
        }
        .into();
        assert!(!transfer.is_command_rejection());
    }

    #[test]
    fn test_retryable() {
        let timeout: Error = DeviceError::RebootTimeout {
            hostname: "rtr".into(),
            wait_time: Duration::from_secs(1),
        }
        .into();
        assert!(timeout.is_retryable());

        let install: Error = DeviceError::OsInstall {
            hostname: "rtr".into(),
            desired_boot: "image.bin".into(),
        }
        .into();
        assert!(!install.is_retryable());
    }
}
