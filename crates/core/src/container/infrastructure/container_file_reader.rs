use std::fs;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::container::domain::container_header::{ContainerError, ContainerHeader};
use crate::shared::constants::CONTAINER_HEADER_LEN;

/// Reads and validates a header from `source`, returning it together with a
/// reader limited to exactly the declared payload.
///
/// Bytes after the declared payload are never yielded.
pub fn read_container<R: Read>(
    mut source: R,
) -> Result<(ContainerHeader, io::Take<R>), ContainerError> {
    let mut bytes = [0u8; CONTAINER_HEADER_LEN];
    let filled = read_fully(&mut source, &mut bytes)?;
    let header = ContainerHeader::decode(&bytes[..filled])?;
    let payload = source.take(header.payload_size);
    Ok((header, payload))
}

/// Consumer-side view of a `.video` file.
pub struct ContainerFileReader {
    header: ContainerHeader,
    payload: io::Take<BufReader<fs::File>>,
}

impl ContainerFileReader {
    pub fn open(path: &Path) -> Result<Self, ContainerError> {
        let file = fs::File::open(path)?;
        let (header, payload) = read_container(BufReader::new(file))?;
        Ok(Self { header, payload })
    }

    pub fn header(&self) -> ContainerHeader {
        self.header
    }

    /// Reads the whole payload, failing with `Truncated` if the file ends
    /// before the declared size.
    pub fn read_payload(mut self) -> Result<Vec<u8>, ContainerError> {
        let mut payload = Vec::new();
        self.payload.read_to_end(&mut payload)?;
        if payload.len() as u64 != self.header.payload_size {
            return Err(ContainerError::Truncated {
                expected: self.header.payload_size,
                actual: payload.len() as u64,
            });
        }
        Ok(payload)
    }
}

fn read_fully<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
