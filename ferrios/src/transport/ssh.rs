//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};
use regex::bytes::Regex;
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use super::{ScpTransfer, TransferRequest, Transport};
use crate::channel::patterns::{last_line, normalize_output};
use crate::channel::{PtyChannel, PtyConfig};
use crate::error::{ChannelError, Result, TransportError};

/// SSH transport: an interactive PTY shell on a russh session.
pub struct SshTransport {
    config: SshConfig,
    session: Option<Handle<SshHandler>>,
    channel: Option<PtyChannel>,
    prompt: Regex,
    on_open_commands: Vec<String>,
}

impl SshTransport {
    /// Create an unconnected transport.
    ///
    /// `prompt` must match every prompt the device can show (all privilege
    /// levels); it is used to detect the end of the login banner and to
    /// strip the trailing prompt from output.
    pub fn new(config: SshConfig, prompt: Regex) -> Self {
        Self {
            config,
            session: None,
            channel: None,
            prompt,
            on_open_commands: Vec::new(),
        }
    }

    /// Commands sent right after every (re)connect, e.g. paging off.
    pub fn with_on_open_commands(mut self, commands: Vec<String>) -> Self {
        self.on_open_commands = commands;
        self
    }

    /// Configuration this transport connects with.
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    fn pty_config(&self) -> PtyConfig {
        PtyConfig {
            timeout: self.config.timeout,
            quiet_period: self.config.quiet_period,
            ..PtyConfig::default()
        }
    }

    fn channel(&mut self) -> Result<&mut PtyChannel> {
        self.channel
            .as_mut()
            .ok_or_else(|| TransportError::NotConnected.into())
    }

    async fn open_session(&self) -> Result<Handle<SshHandler>> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: self.config.host.clone(),
            port: self.config.port,
            host_key_verification: self.config.host_key_verification.clone(),
            known_hosts_path: self.config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", self.config.socket_addr());

        let mut session = tokio::time::timeout(
            self.config.timeout,
            client::connect(
                ssh_config,
                (self.config.host.as_str(), self.config.port),
                handler,
            ),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.config.timeout))?
        .map_err(|e| {
            // Prefer the detailed host-key error over russh's generic one
            let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
            stored.unwrap_or(TransportError::Ssh(e))
        })?;

        authenticate(&mut session, &self.config).await?;

        Ok(session)
    }

    async fn open_shell(&self, session: &Handle<SshHandler>) -> Result<Channel<Msg>> {
        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "xterm",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }

    /// Open a separate exec channel on the session (used for scp).
    pub(super) async fn open_exec_channel(&self, command: &str) -> Result<Channel<Msg>> {
        let session = self.session.as_ref().ok_or(TransportError::NotConnected)?;
        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .exec(true, command)
            .await
            .map_err(TransportError::Ssh)?;
        Ok(channel)
    }
}

impl Transport for SshTransport {
    type Transfer<'a> = ScpTransfer<'a>;

    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            self.close().await?;
        }

        let session = self.open_session().await?;
        let shell = self.open_shell(&session).await?;
        let mut channel = PtyChannel::new(shell, self.pty_config());

        let banner = channel.read_until_prompt(&self.prompt).await?;
        debug!(
            "connected to {}, prompt {:?}",
            self.config.host,
            last_line(&banner)
        );

        self.session = Some(session);
        self.channel = Some(channel);

        for command in self.on_open_commands.clone() {
            self.send(&command).await?;
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                trace!("ignoring error closing shell channel: {}", e);
            }
        }

        if let Some(session) = self.session.take() {
            debug!("disconnecting from {}", self.config.host);
            if let Err(e) = session
                .disconnect(russh::Disconnect::ByApplication, "", "en")
                .await
            {
                trace!("ignoring error on disconnect: {}", e);
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.channel.is_some() && self.session.as_ref().is_some_and(|s| !s.is_closed())
    }

    async fn send(&mut self, command: &str) -> Result<String> {
        trace!("send: {} bytes", command.len());
        let prompt = self.prompt.clone();
        let channel = self.channel()?;
        channel.write_line(command).await?;
        let raw = channel.read_until_quiet(&prompt).await?;
        Ok(normalize_output(&raw, command, &prompt))
    }

    async fn send_expecting(&mut self, command: &str, pattern: &str) -> Result<String> {
        trace!("send: {} bytes, expecting {}", command.len(), pattern);
        let expected = Regex::new(pattern).map_err(ChannelError::InvalidPattern)?;
        let prompt = self.prompt.clone();
        let channel = self.channel()?;
        channel.write_line(command).await?;
        let raw = channel.read_until_match(&expected).await?;
        Ok(normalize_output(&raw, command, &prompt))
    }

    async fn probe_prompt(&mut self) -> Result<String> {
        let prompt = self.prompt.clone();
        let channel = self.channel()?;
        channel.write_line("").await?;
        let raw = channel.read_until_prompt(&prompt).await?;
        Ok(last_line(&raw))
    }

    fn file_transfer(&mut self, request: TransferRequest) -> ScpTransfer<'_> {
        ScpTransfer::new(self, request)
    }
}

impl std::fmt::Debug for SshTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTransport")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .field("prompt", &self.prompt.as_str())
            .finish()
    }
}

async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
    let success = match &config.auth {
        AuthMethod::None => session
            .authenticate_none(&config.username)
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::Password(password) => session
            .authenticate_password(&config.username, password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::PrivateKey { path, passphrase } => {
            let passphrase = passphrase.as_ref().map(|p| p.expose_secret());
            let key = load_secret_key(path, passphrase)
                .map_err(|e| TransportError::Key(e.to_string()))?;

            // Best RSA hash algorithm supported by the server
            let hash_alg = session
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();

            session
                .authenticate_publickey(
                    &config.username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await
                .map_err(TransportError::Ssh)?
                .success()
        }
    };

    if !success {
        return Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into());
    }

    Ok(())
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error surfaced by connect().
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}
