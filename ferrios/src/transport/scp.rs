//! Secure copy (scp sink protocol) over an SSH exec channel.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use log::{debug, info, trace};
use md5::{Digest, Md5};
use regex::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::ssh::SshTransport;
use super::{FileTransfer, TransferError, TransferRequest, Transport};
use crate::error::{DeviceError, Result};

/// Waits for the digest (or an error) followed by the prompt.
const VERIFY_DONE: &str = r"(?s)(?:=\s*[0-9a-fA-F]{32}|%Error).*[>#]\s*$";

static RE_MD5: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\s*([0-9a-fA-F]{32})").expect("valid md5 regex"));

/// SCP upload of one file, bound to an [`SshTransport`].
pub struct ScpTransfer<'a> {
    transport: &'a mut SshTransport,
    request: TransferRequest,
    channel: Option<Channel<Msg>>,
}

impl<'a> ScpTransfer<'a> {
    pub(super) fn new(transport: &'a mut SshTransport, request: TransferRequest) -> Self {
        Self {
            transport,
            request,
            channel: None,
        }
    }

    /// What this transfer copies.
    pub fn request(&self) -> &TransferRequest {
        &self.request
    }
}

impl FileTransfer for ScpTransfer<'_> {
    async fn exists(&mut self) -> Result<bool> {
        let output = self
            .transport
            .send(&format!("dir {}", self.request.remote_path()))
            .await?;
        if output.contains("%Error") || output.contains("No such file") {
            return Ok(false);
        }
        Ok(output.contains(&self.request.dest))
    }

    async fn checksum_matches(&mut self) -> Result<bool> {
        let local = local_md5(&self.request.source).await?;
        let output = self
            .transport
            .send_expecting(
                &format!("verify /md5 {}", self.request.remote_path()),
                VERIFY_DONE,
            )
            .await?;

        let Some(remote) = RE_MD5.captures(&output).map(|c| c[1].to_ascii_lowercase()) else {
            debug!("no md5 digest in verify output for {}", self.request.dest);
            return Ok(false);
        };

        trace!("md5 local {} remote {}", local, remote);
        Ok(local == remote)
    }

    async fn enable_secure_mode(&mut self) -> Result<()> {
        for command in ["configure terminal", "ip scp server enable", "end"] {
            let output = self.transport.send(command).await?;
            if output.trim_start().starts_with('%') {
                return Err(DeviceError::FileTransfer {
                    message: format!("'{}' rejected: {}", command, output.trim()),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn establish_channel(&mut self) -> Result<()> {
        let command = format!("scp -t {}", self.request.remote_path());
        debug!("opening scp channel: {}", command);
        self.channel = Some(self.transport.open_exec_channel(&command).await?);
        Ok(())
    }

    async fn transfer(&mut self) -> std::result::Result<(), TransferError> {
        let timeout = self.transport.config().timeout;
        let data = tokio::fs::read(&self.request.source)
            .await
            .map_err(|e| TransferError::Failed(format!("{}: {}", self.request.source.display(), e)))?;
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| TransferError::Failed("scp channel not established".to_string()))?;

        info!(
            "copying {} ({} bytes) to {}",
            self.request.source.display(),
            data.len(),
            self.request.remote_path()
        );

        wait_ack(channel, timeout).await?;

        let header = format!("C0644 {} {}\n", data.len(), self.request.dest);
        send_data(channel, header.as_bytes()).await?;
        wait_ack(channel, timeout).await?;

        send_data(channel, &data).await?;
        send_data(channel, &[0]).await?;
        wait_ack(channel, timeout).await?;

        Ok(())
    }

    async fn close_channel(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.eof().await {
                trace!("ignoring scp eof error: {}", e);
            }
            if let Err(e) = channel.close().await {
                trace!("ignoring scp close error: {}", e);
            }
        }
        Ok(())
    }
}

async fn local_md5(path: &Path) -> Result<String> {
    let data = tokio::fs::read(path).await?;
    Ok(hex::encode(Md5::digest(&data)))
}

async fn send_data(channel: &Channel<Msg>, data: &[u8]) -> std::result::Result<(), TransferError> {
    channel.data(data).await.map_err(classify)
}

/// Wait for the sink's status byte: 0 is ok, 1 and 2 carry an error message.
async fn wait_ack(
    channel: &mut Channel<Msg>,
    timeout: Duration,
) -> std::result::Result<(), TransferError> {
    let wait = async {
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => match data.first().copied() {
                    Some(0) => return Ok(()),
                    Some(_) => {
                        return Err(TransferError::Failed(
                            String::from_utf8_lossy(&data[1..]).trim().to_string(),
                        ));
                    }
                    None => {}
                },
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    trace!("scp stderr: {}", String::from_utf8_lossy(&data));
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(TransferError::SocketClosed(
                        "channel closed by device".to_string(),
                    ));
                }
                Some(_) => {}
            }
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| TransferError::Failed(format!("no scp acknowledgement after {:?}", timeout)))?
}

fn classify(e: russh::Error) -> TransferError {
    match e {
        russh::Error::Disconnect | russh::Error::SendError => TransferError::SocketClosed(e.to_string()),
        other => TransferError::Failed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_capture() {
        let output = "...............Done!\nverify /md5 (flash:image.bin) = 0A1B2C3D4E5F60718293A4B5C6D7E8F9";
        let digest = RE_MD5.captures(output).map(|c| c[1].to_ascii_lowercase());
        assert_eq!(digest.as_deref(), Some("0a1b2c3d4e5f60718293a4b5c6d7e8f9"));
    }

    #[test]
    fn test_verify_done_waits_for_prompt() {
        let done = regex::bytes::Regex::new(VERIFY_DONE).unwrap();
        assert!(!done.is_match(b"verify /md5 (flash:a) = 0a1b2c3d4e5f60718293a4b5c6d7e8f9\r\n"));
        assert!(done.is_match(b"verify /md5 (flash:a) = 0a1b2c3d4e5f60718293a4b5c6d7e8f9\r\nrtr#"));
        assert!(done.is_match(b"%Error opening flash:a (No such file or directory)\r\nrtr#"));
    }

    #[tokio::test]
    async fn test_local_md5() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(
            local_md5(&path).await.unwrap(),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }
}
