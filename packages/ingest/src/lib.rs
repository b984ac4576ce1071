#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Dataset acquisition for the property map.
//!
//! Downloads the published listings archive (`.tar.zst`) with streamed
//! writes and unpacks it into the local data directory. Pure I/O — every
//! decision about the dataset's contents belongs to the store layer.

pub mod progress;

use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use progress::ProgressCallback;

/// Default published dataset archive.
pub const DEFAULT_DATASET_URL: &str =
    "https://github.com/alexmercier/property-map/releases/download/v0.1.0/listings.tar.zst";

/// Download chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Errors from dataset acquisition.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error during download or unpack.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Downloads a file from `url` to `dest` with streamed writes.
///
/// Returns the number of bytes downloaded.
///
/// # Errors
///
/// Returns [`IngestError`] if the request fails, the response is not
/// successful, or the local file cannot be written.
pub fn download_file(
    url: &str,
    dest: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<u64, IngestError> {
    log::info!("Downloading {url}");
    log::info!("  -> {}", dest.display());

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| IngestError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent("property-map/0.1")
        .build()?;

    let mut response = client.get(url).send()?;

    if !response.status().is_success() {
        return Err(IngestError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    if let Some(total) = response.content_length() {
        progress.set_total(total);
        #[allow(clippy::cast_precision_loss)]
        let mb = total as f64 / 1_048_576.0;
        log::info!("  file size: {mb:.1} MB");
    }

    let mut file = std::fs::File::create(dest).map_err(|e| IngestError::Io {
        path: dest.display().to_string(),
        source: e,
    })?;

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;

    loop {
        let read = response.read(&mut buffer).map_err(|e| IngestError::Io {
            path: url.to_string(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read]).map_err(|e| IngestError::Io {
            path: dest.display().to_string(),
            source: e,
        })?;
        downloaded += read as u64;
        progress.inc(read as u64);
    }

    file.flush().map_err(|e| IngestError::Io {
        path: dest.display().to_string(),
        source: e,
    })?;

    #[allow(clippy::cast_precision_loss)]
    let mb = downloaded as f64 / 1_048_576.0;
    progress.finish(format!("downloaded {mb:.1} MB"));
    log::info!("  download complete: {mb:.1} MB");

    Ok(downloaded)
}

/// Unpacks a `.tar.zst` archive into a directory.
///
/// The target directory is created if it does not exist. Existing
/// contents are **not** removed — the archive contents are extracted
/// on top. Returns the number of top-level entries in the destination.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the archive cannot be read or the
/// directory cannot be written.
pub fn unpack_archive(archive_path: &Path, dest_dir: &Path) -> Result<u64, IngestError> {
    log::info!(
        "Unpacking {} -> {}",
        archive_path.display(),
        dest_dir.display()
    );

    std::fs::create_dir_all(dest_dir).map_err(|e| IngestError::Io {
        path: dest_dir.display().to_string(),
        source: e,
    })?;

    let file = std::fs::File::open(archive_path).map_err(|e| IngestError::Io {
        path: archive_path.display().to_string(),
        source: e,
    })?;

    let decoder = zstd::Decoder::new(file).map_err(|e| IngestError::Io {
        path: archive_path.display().to_string(),
        source: e,
    })?;

    let mut archive = tar::Archive::new(decoder);
    archive.unpack(dest_dir).map_err(|e| IngestError::Io {
        path: dest_dir.display().to_string(),
        source: e,
    })?;

    let mut count = 0u64;
    for entry in std::fs::read_dir(dest_dir).map_err(|e| IngestError::Io {
        path: dest_dir.display().to_string(),
        source: e,
    })? {
        let _ = entry;
        count += 1;
    }

    log::info!("  extracted into {count} entries");

    Ok(count)
}

/// Downloads the dataset archive and unpacks it into `data_dir`.
///
/// Returns the archive path so the caller can keep or remove it.
///
/// # Errors
///
/// Returns [`IngestError`] if the download or unpack fails.
pub fn fetch_dataset(
    url: &str,
    data_dir: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<PathBuf, IngestError> {
    let archive_path = data_dir.join("listings.tar.zst");

    download_file(url, &archive_path, progress)?;
    unpack_archive(&archive_path, data_dir)?;

    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn unpack_extracts_archive_contents() {
        let tmp = std::env::temp_dir().join("property_map_ingest_test");
        let _ = fs::remove_dir_all(&tmp);

        let src_dir = tmp.join("source");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("listings.duckdb"), b"not a real database").unwrap();

        let archive = tmp.join("listings.tar.zst");
        let file = fs::File::create(&archive).unwrap();
        let encoder = zstd::Encoder::new(file, 3).unwrap();
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(".", &src_dir).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = tmp.join("unpacked");
        let count = unpack_archive(&archive, &dest).unwrap();
        assert!(count > 0);
        assert_eq!(
            fs::read(dest.join("listings.duckdb")).unwrap(),
            b"not a real database"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unpack_fails_on_missing_archive() {
        let tmp = std::env::temp_dir().join("property_map_ingest_missing");
        let err = unpack_archive(&tmp.join("nope.tar.zst"), &tmp).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }
}
