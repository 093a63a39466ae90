//! Verified file copy onto the device.

use std::path::Path;

use log::{debug, info, warn};

use super::Device;
use crate::error::{DeviceError, Error, Result};
use crate::transport::{FileTransfer, TransferError, TransferRequest, Transport};

/// Result of [`Device::file_copy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The file was already on the device with a matching checksum.
    AlreadyPresent,
    /// The file was copied and verified.
    Transferred,
    /// A different file with the same name is on the device; it was left
    /// alone.
    ChecksumMismatch,
}

impl CopyOutcome {
    /// The device now holds the source file.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::AlreadyPresent | Self::Transferred)
    }
}

impl<T: Transport> Device<T> {
    /// Copy a local file to the device and verify it by checksum.
    ///
    /// `dest` defaults to the source's file name and `file_system` to the
    /// device's default file system. An existing file is never
    /// overwritten.
    pub async fn file_copy(
        &mut self,
        source: impl AsRef<Path>,
        dest: Option<&str>,
        file_system: Option<&str>,
    ) -> Result<CopyOutcome> {
        let request = self.transfer_request(source.as_ref(), dest, file_system).await?;
        let remote = request.remote_path();

        {
            let mut transfer = self.transport.file_transfer(request.clone());

            if transfer.exists().await? {
                if transfer.checksum_matches().await? {
                    info!("{}: {} already present", self.host, remote);
                    return Ok(CopyOutcome::AlreadyPresent);
                }
                warn!(
                    "{}: {} exists with a different checksum, not overwriting",
                    self.host, remote
                );
                return Ok(CopyOutcome::ChecksumMismatch);
            }

            debug!("{}: copying {} to {}", self.host, request.source.display(), remote);
            let pushed = push(&mut transfer).await;
            if let Err(e) = transfer.close_channel().await {
                debug!("{}: ignoring error closing transfer channel: {}", self.host, e);
            }
            pushed?;
        }

        // Long copies can idle out the command session
        self.open().await?;

        if !self.verify_transfer(request).await? {
            return Err(DeviceError::FileTransfer {
                message: format!("could not validate {} after transfer", remote),
            }
            .into());
        }

        info!("{}: copied {}", self.host, remote);
        Ok(CopyOutcome::Transferred)
    }

    /// Whether the device already holds `source` (same name and checksum).
    pub async fn file_copy_remote_exists(
        &mut self,
        source: impl AsRef<Path>,
        dest: Option<&str>,
        file_system: Option<&str>,
    ) -> Result<bool> {
        let request = self.transfer_request(source.as_ref(), dest, file_system).await?;
        self.verify_transfer(request).await
    }

    async fn transfer_request(
        &mut self,
        source: &Path,
        dest: Option<&str>,
        file_system: Option<&str>,
    ) -> Result<TransferRequest> {
        let file_system = match file_system {
            Some(file_system) => file_system.to_string(),
            None => self.file_system().await?,
        };
        Ok(TransferRequest::new(source, dest, file_system))
    }

    async fn verify_transfer(&mut self, request: TransferRequest) -> Result<bool> {
        let mut transfer = self.transport.file_transfer(request);
        Ok(transfer.exists().await? && transfer.checksum_matches().await?)
    }
}

/// Enable the device side, open the channel and push the data.
///
/// A dropped socket is only an error when the file did not land intact.
async fn push<F: FileTransfer>(transfer: &mut F) -> Result<()> {
    transfer.enable_secure_mode().await.map_err(as_transfer_failure)?;
    transfer.establish_channel().await.map_err(as_transfer_failure)?;

    match transfer.transfer().await {
        Ok(()) => Ok(()),
        Err(TransferError::SocketClosed(message)) => {
            if matches!(transfer.checksum_matches().await, Ok(true)) {
                debug!("socket closed after the data landed: {}", message);
                Ok(())
            } else {
                Err(DeviceError::SocketClosed { message }.into())
            }
        }
        Err(TransferError::Failed(message)) => Err(DeviceError::FileTransfer { message }.into()),
    }
}

fn as_transfer_failure(error: Error) -> Error {
    match error {
        Error::Device(DeviceError::FileTransfer { .. }) => error,
        other => DeviceError::FileTransfer {
            message: other.to_string(),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_outcome_success() {
        assert!(CopyOutcome::AlreadyPresent.is_success());
        assert!(CopyOutcome::Transferred.is_success());
        assert!(!CopyOutcome::ChecksumMismatch.is_success());
    }

    #[test]
    fn test_as_transfer_failure_keeps_transfer_errors() {
        let original: Error = DeviceError::FileTransfer {
            message: "scp server refused".into(),
        }
        .into();
        match as_transfer_failure(original) {
            Error::Device(DeviceError::FileTransfer { message }) => {
                assert_eq!(message, "scp server refused")
            }
            other => panic!("unexpected {other:?}"),
        }

        let wrapped = as_transfer_failure(crate::error::TransportError::NotConnected.into());
        assert!(matches!(wrapped, Error::Device(DeviceError::FileTransfer { .. })));
    }
}
