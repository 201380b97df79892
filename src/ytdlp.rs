// ytdlp.rs - yt-dlp Extractor
// Runs yt-dlp as a child process and reads the final info JSON it prints
// after moving the downloaded file into place.
//
// The child is spawned with kill_on_drop, so when the fetch deadline drops
// the extraction future the download process is killed with it.

use crate::error::FetchError;
use crate::fetch::{Extracted, Extractor, FetchConstraints};
use async_trait::async_trait;
use log::{debug, error, warn};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const STDERR_TAIL_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    filepath: Option<PathBuf>,
    #[serde(rename = "_filename")]
    filename: Option<PathBuf>,
}

pub struct YtDlpExtractor {
    binary: String,
}

impl YtDlpExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// `yt-dlp --version`, for the startup banner.
    pub async fn probe_version(&self) -> Result<String, FetchError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FetchError::Exit {
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn build_args(url: &str, output_template: &Path, constraints: &FetchConstraints) -> Vec<OsString> {
    vec![
        "--no-playlist".into(),
        "--no-warnings".into(),
        "--no-progress".into(),
        "--format".into(),
        constraints.format.clone().into(),
        "--merge-output-format".into(),
        constraints.merge_format.clone().into(),
        "--output".into(),
        output_template.as_os_str().to_os_string(),
        "--no-simulate".into(),
        "--print".into(),
        "after_move:%()j".into(),
        "--".into(),
        url.into(),
    ]
}

/// The info JSON is the last non-empty stdout line.
fn parse_info(stdout: &[u8]) -> Result<Extracted, FetchError> {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or(FetchError::MissingArtifact)?;
    let info: InfoJson = serde_json::from_str(line.trim())?;
    let path = info.filepath.or(info.filename).ok_or(FetchError::MissingArtifact)?;
    Ok(Extracted { title: info.title, path })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let last = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim();
    let skip = last.chars().count().saturating_sub(STDERR_TAIL_CHARS);
    last.chars().skip(skip).collect()
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn extract(
        &self,
        url: &str,
        output_template: &Path,
        constraints: &FetchConstraints,
    ) -> Result<Extracted, FetchError> {
        let mut command = Command::new(&self.binary);
        command
            .args(build_args(url, output_template, constraints))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = output_template.parent() {
            command.current_dir(dir);
        }

        debug!("[YTDLP] Running {} for {}", self.binary, url);
        let output = command.output().await.map_err(|source| {
            error!("❌ {} is not installed or not in PATH: {}", self.binary, source);
            FetchError::Spawn {
                binary: self.binary.clone(),
                source,
            }
        })?;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            warn!("[YTDLP] {} exited with {}: {}", url, output.status, stderr);
            return Err(FetchError::Exit {
                status: output.status.to_string(),
                stderr,
            });
        }

        parse_info(&output.stdout)
    }
}
