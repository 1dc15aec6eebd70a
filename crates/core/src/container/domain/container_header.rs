use std::path::PathBuf;

use thiserror::Error;

use crate::shared::constants::{CONTAINER_HEADER_LEN, CONTAINER_MAGIC, CONTAINER_VERSION};

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("bad magic: expected \"VID0\", found {0:?}")]
    BadMagic([u8; 4]),
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u32),
    #[error("truncated container: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },
    #[error("payload size mismatch: header declares {declared} bytes, source produced {actual}")]
    PayloadSizeMismatch { declared: u64, actual: u64 },
    #[error("output exists: {0}")]
    OutputExists(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fixed 16-byte header preceding the WebM payload of a `.video` file.
///
/// Layout (all integers little-endian):
///
/// | offset | size | field        |
/// |--------|------|--------------|
/// | 0      | 4    | magic `VID0` |
/// | 4      | 4    | version      |
/// | 8      | 8    | payload size |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    pub payload_size: u64,
}

impl ContainerHeader {
    /// Header for the current format version.
    pub fn new(payload_size: u64) -> Self {
        Self {
            version: CONTAINER_VERSION,
            payload_size,
        }
    }

    pub fn encode(&self) -> [u8; CONTAINER_HEADER_LEN] {
        let mut bytes = [0u8; CONTAINER_HEADER_LEN];
        bytes[0..4].copy_from_slice(&CONTAINER_MAGIC);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.payload_size.to_le_bytes());
        bytes
    }

    /// Parses the first 16 bytes of `bytes`. Anything after the header is ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < CONTAINER_HEADER_LEN {
            return Err(ContainerError::Truncated {
                expected: CONTAINER_HEADER_LEN as u64,
                actual: bytes.len() as u64,
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != CONTAINER_MAGIC {
            return Err(ContainerError::BadMagic(magic));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..8]);
        let version = u32::from_le_bytes(version);
        if version != CONTAINER_VERSION {
            return Err(ContainerError::UnsupportedVersion(version));
        }

        let mut size = [0u8; 8];
        size.copy_from_slice(&bytes[8..16]);

        Ok(Self {
            version,
            payload_size: u64::from_le_bytes(size),
        })
    }
}

/// Encodes a current-version header for a payload of `payload_size` bytes.
pub fn encode_header(payload_size: u64) -> [u8; CONTAINER_HEADER_LEN] {
    ContainerHeader::new(payload_size).encode()
}
