use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use polyver_manifest::DownloadDescriptor;

use crate::dirs::COMPLETE_MARKER;
use crate::error::ProviderError;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(750);

/// Shared download client, built once per process.
pub fn download_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("polyver/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default()
    })
}

/// Run the install pipeline for one artifact:
/// download to staging, verify the checksum when one is published, extract,
/// run the runtime-specific post-install hook, then atomically rename the
/// staged directory into `install_dir`.
///
/// Every failure before the final rename leaves the install root untouched;
/// staged artifacts are cleaned up on all exit paths. A concurrent install
/// of the same version that wins the rename race is treated as success.
///
/// # Errors
/// `ChecksumMismatch` on a failed verification, `Network` for download
/// failures, and `InstallFailed` for extraction or post-install failures.
pub async fn install_from_descriptor(
    descriptor: &DownloadDescriptor,
    install_dir: &Path,
    post_install: &(dyn Fn(&Path) -> Result<(), ProviderError> + Sync),
) -> Result<(), ProviderError> {
    let parent = install_dir
        .parent()
        .ok_or_else(|| ProviderError::install_failed("staging", "install dir has no parent"))?;
    std::fs::create_dir_all(parent)?;

    // Staging lives next to the final directory so the activating rename
    // never crosses a filesystem boundary.
    let stage = tempfile::Builder::new()
        .prefix(".polyver-stage-")
        .tempdir_in(parent)?;

    let artifact = stage.path().join(artifact_file_name(&descriptor.url));
    let actual_sha256 = download_to_file(download_client(), &descriptor.url, &artifact).await?;

    match &descriptor.sha256 {
        Some(expected) => {
            if !actual_sha256.eq_ignore_ascii_case(expected) {
                return Err(ProviderError::ChecksumMismatch {
                    url: descriptor.url.clone(),
                    expected: expected.to_ascii_lowercase(),
                    actual: actual_sha256,
                });
            }
            log::debug!("Checksum verified for {}", descriptor.url);
        }
        None => {
            log::warn!(
                "No checksum published for {}; skipping integrity verification",
                descriptor.url
            );
        }
    }

    let extract_dir = stage.path().join("extract");
    std::fs::create_dir_all(&extract_dir)?;
    extract_archive(&artifact, &extract_dir)?;
    let staged_root = flatten_single_root(&extract_dir)?;

    post_install(&staged_root)?;

    std::fs::write(staged_root.join(COMPLETE_MARKER), b"")?;
    activate(&staged_root, install_dir)?;
    Ok(())
}

fn artifact_file_name(url: &str) -> String {
    let raw = url.rsplit('/').next().unwrap_or("artifact");
    let raw = raw.split(['?', '#']).next().unwrap_or(raw);
    if raw.is_empty() || raw.contains("..") {
        "artifact".to_string()
    } else {
        raw.to_string()
    }
}

/// Download with the fixed retry budget, hashing the stream as it is
/// written so verification does not re-read the artifact.
async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<String, ProviderError> {
    let mut last_error = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match download_once(client, url, dest).await {
            Ok(digest) => return Ok(digest),
            Err(DownloadFailure { retryable, error }) => {
                if !retryable || attempt == MAX_ATTEMPTS {
                    return Err(error);
                }
                log::debug!("Download attempt {attempt} for {url} failed, retrying: {error}");
                tokio::time::sleep(BACKOFF_STEP * attempt).await;
                last_error = Some(error);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| ProviderError::network(url, "no attempts were made")))
}

struct DownloadFailure {
    retryable: bool,
    error: ProviderError,
}

async fn download_once(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<String, DownloadFailure> {
    use futures_util::StreamExt;

    let response = client.get(url).send().await.map_err(|error| DownloadFailure {
        retryable: true,
        error: ProviderError::network(url, error),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadFailure {
            retryable: status.is_server_error(),
            error: ProviderError::network(url, format!("HTTP {status}")),
        });
    }

    let mut hasher = Sha256::new();
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|error| DownloadFailure {
            retryable: false,
            error: error.into(),
        })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| DownloadFailure {
            retryable: true,
            error: ProviderError::network(url, error),
        })?;
        hasher.update(&chunk);
        file.write_all(&chunk).await.map_err(|error| DownloadFailure {
            retryable: false,
            error: error.into(),
        })?;
    }

    file.flush().await.map_err(|error| DownloadFailure {
        retryable: false,
        error: error.into(),
    })?;

    Ok(format!("{:x}", hasher.finalize()))
}

fn extract_archive(artifact: &Path, dest: &Path) -> Result<(), ProviderError> {
    let name = artifact
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or_default()
        .to_ascii_lowercase();

    if name.ends_with(".zip") {
        extract_zip(artifact, dest)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(artifact, dest)
    } else {
        Err(ProviderError::install_failed(
            "extract",
            format!("unsupported archive format: {name}"),
        ))
    }
}

fn extract_zip(zip_path: &Path, dest: &Path) -> Result<(), ProviderError> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|error| ProviderError::install_failed("extract", error.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|error| ProviderError::install_failed("extract", error.to_string()))?;
        let Some(name) = entry.enclosed_name() else {
            log::warn!("Skipping zip entry with unsafe path");
            continue;
        };
        let out_path = dest.join(name);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = std::fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    let _ =
                        std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode));
                }
            }
        }
    }
    Ok(())
}

fn extract_tar_gz(tar_path: &Path, dest: &Path) -> Result<(), ProviderError> {
    let file = std::fs::File::open(tar_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.set_preserve_permissions(true);
    archive
        .unpack(dest)
        .map_err(|error| ProviderError::install_failed("extract", error.to_string()))
}

/// Release archives usually wrap everything in a single versioned top-level
/// directory; the install root should be its contents.
fn flatten_single_root(extract_dir: &Path) -> Result<PathBuf, ProviderError> {
    let entries: Vec<_> = std::fs::read_dir(extract_dir)?
        .collect::<Result<_, _>>()
        .map_err(ProviderError::from)?;

    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        Ok(entries[0].path())
    } else {
        Ok(extract_dir.to_path_buf())
    }
}

/// The atomicity boundary. Rename the staged root into place; when a
/// concurrent install of the same version already completed, accept its
/// result instead of fighting over the directory.
fn activate(staged_root: &Path, install_dir: &Path) -> Result<(), ProviderError> {
    match std::fs::rename(staged_root, install_dir) {
        Ok(()) => Ok(()),
        Err(_) if install_dir.join(COMPLETE_MARKER).is_file() => {
            log::debug!(
                "Install directory {} already completed by another process",
                install_dir.display()
            );
            Ok(())
        }
        Err(_) if install_dir.is_dir() => {
            // A leftover partial directory from an interrupted install;
            // replace it.
            std::fs::remove_dir_all(install_dir)?;
            std::fs::rename(staged_root, install_dir)?;
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}
