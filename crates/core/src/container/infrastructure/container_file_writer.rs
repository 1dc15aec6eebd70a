use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::container::domain::container_header::{encode_header, ContainerError};
use crate::shared::constants::COPY_CHUNK_SIZE;

/// Writes the 16-byte header followed by a verbatim copy of `payload`.
///
/// The payload is copied in fixed-size chunks until end of stream. If the
/// stream does not yield exactly `payload_size` bytes the header would lie
/// about its payload, so this is reported as `PayloadSizeMismatch`.
///
/// Returns the number of payload bytes written.
pub fn write_container<R: Read, W: Write>(
    mut payload: R,
    payload_size: u64,
    mut dest: W,
) -> Result<u64, ContainerError> {
    dest.write_all(&encode_header(payload_size))?;

    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    let mut copied: u64 = 0;
    loop {
        let n = match payload.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        copied += n as u64;
        if copied > payload_size {
            return Err(ContainerError::PayloadSizeMismatch {
                declared: payload_size,
                actual: copied,
            });
        }
        dest.write_all(&buf[..n])?;
    }

    if copied != payload_size {
        return Err(ContainerError::PayloadSizeMismatch {
            declared: payload_size,
            actual: copied,
        });
    }

    dest.flush()?;
    Ok(copied)
}

/// Wraps the WebM file at `webm_path` into a `.video` container at `video_path`.
///
/// Refuses to replace an existing container unless `overwrite` is set. The
/// container is written to a `.part` sibling first and renamed into place, so
/// a failed wrap never leaves a truncated `.video` behind.
pub fn wrap_file(
    webm_path: &Path,
    video_path: &Path,
    overwrite: bool,
) -> Result<u64, ContainerError> {
    if !overwrite && video_path.exists() {
        return Err(ContainerError::OutputExists(video_path.to_path_buf()));
    }

    let payload_size = fs::metadata(webm_path)?.len();
    let source = fs::File::open(webm_path)?;

    let temp_path = part_path(video_path);
    let result = write_to_temp(source, payload_size, &temp_path).and_then(|written| {
        fs::rename(&temp_path, video_path)?;
        Ok(written)
    });

    if result.is_err() {
        if let Err(e) = fs::remove_file(&temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!(
                    "Failed to remove partial container {}: {e}",
                    temp_path.display()
                );
            }
        }
    }
    result
}

fn write_to_temp(
    source: fs::File,
    payload_size: u64,
    temp_path: &Path,
) -> Result<u64, ContainerError> {
    let file = fs::File::create(temp_path)?;
    let mut writer = BufWriter::new(file);
    let written = write_container(source, payload_size, &mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(written)
}

fn part_path(video_path: &Path) -> PathBuf {
    let mut name = video_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
