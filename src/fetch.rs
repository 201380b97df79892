// fetch.rs - Fetch Executor
// Runs one extraction attempt for one request:
//   normalize -> classify -> scratch dir -> extract under deadline -> size check
//
// Each attempt owns a fresh scratch directory. The directory is held by a
// TempDir guard; on failure or timeout the guard is dropped before returning,
// on success it moves into the Artifact and is dropped once the artifact has
// been delivered.
//
// Used by: dispatcher.rs

use crate::config::BotConfig;
use crate::error::FetchError;
use crate::normalize::normalize;
use crate::platform::Platform;
use crate::policy::{Decision, DeliveryPolicy, SizeCeiling};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// yt-dlp output template; the title is byte-capped to stay under filename limits.
pub const OUTPUT_TEMPLATE: &str = "%(title).100B.%(ext)s";
const MERGE_FORMAT: &str = "mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConstraints {
    pub format: String,
    pub merge_format: String,
    pub soft_limit_bytes: u64,
    pub deadline: Duration,
}

impl FetchConstraints {
    /// Prefer a single file under the soft limit, otherwise best video+audio.
    pub fn new(soft_limit_bytes: u64, deadline: Duration) -> Self {
        Self {
            format: format!("best[filesize<{}]/bestvideo+bestaudio/best", soft_limit_bytes),
            merge_format: MERGE_FORMAT.to_string(),
            soft_limit_bytes,
            deadline,
        }
    }
}

/// What an extractor reports back after a successful download.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub title: Option<String>,
    pub path: PathBuf,
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Download `url`. `output_template` points inside the attempt's scratch
    /// directory. Dropping the returned future must abandon the download.
    async fn extract(
        &self,
        url: &str,
        output_template: &Path,
        constraints: &FetchConstraints,
    ) -> Result<Extracted, FetchError>;
}

/// A downloaded file. Owns the scratch directory it lives in.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    _scratch: TempDir,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Success { title: String, artifact: Artifact, size: u64 },
    Timeout,
    TooLarge { size: u64 },
    PlatformError { platform: Platform, detail: String },
    GenericError { detail: String },
}

impl FetchOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchOutcome::Success { .. } => "success",
            FetchOutcome::Timeout => "timeout",
            FetchOutcome::TooLarge { .. } => "too_large",
            FetchOutcome::PlatformError { .. } => "platform_error",
            FetchOutcome::GenericError { .. } => "generic_error",
        }
    }
}

#[derive(Debug)]
pub struct Fetched {
    pub url: String,
    pub platform: Platform,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub soft_format_bytes: u64,
    pub default_timeout: Duration,
    pub slow_platform_timeout: Duration,
    pub scratch_root: PathBuf,
}

impl From<&BotConfig> for FetchSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            soft_format_bytes: config.soft_format_bytes,
            default_timeout: config.default_timeout,
            slow_platform_timeout: config.slow_platform_timeout,
            scratch_root: config.scratch_dir.clone(),
        }
    }
}

pub struct FetchExecutor {
    extractor: Box<dyn Extractor>,
    policy: DeliveryPolicy,
    ceiling: SizeCeiling,
    settings: FetchSettings,
}

impl FetchExecutor {
    pub fn new(extractor: Box<dyn Extractor>, ceiling: SizeCeiling, settings: FetchSettings) -> Self {
        Self {
            extractor,
            policy: DeliveryPolicy::new(ceiling.clone()),
            ceiling,
            settings,
        }
    }

    pub fn deadline_for(&self, platform: Platform) -> Duration {
        if platform.is_slow() {
            self.settings.slow_platform_timeout
        } else {
            self.settings.default_timeout
        }
    }

    /// The soft hint never exceeds the hard ceiling in force right now.
    pub fn constraints_for(&self, platform: Platform) -> FetchConstraints {
        let soft_limit = self.settings.soft_format_bytes.min(self.ceiling.get());
        FetchConstraints::new(soft_limit, self.deadline_for(platform))
    }

    pub async fn execute(&self, url: &str) -> Fetched {
        let url = normalize(url);
        let platform = Platform::classify(&url);
        let constraints = self.constraints_for(platform);
        let outcome = self.execute_with(&url, platform, &constraints).await;
        Fetched { url, platform, outcome }
    }

    pub async fn execute_with(&self, url: &str, platform: Platform, constraints: &FetchConstraints) -> FetchOutcome {
        let scratch = match tempfile::Builder::new()
            .prefix("clipgrab-")
            .tempdir_in(&self.settings.scratch_root)
        {
            Ok(dir) => dir,
            Err(e) => {
                warn!("[FETCH] Could not create scratch directory in {}: {}", self.settings.scratch_root.display(), e);
                return FetchOutcome::GenericError { detail: e.to_string() };
            }
        };
        let template = scratch.path().join(OUTPUT_TEMPLATE);
        debug!("[FETCH] {} ({}) -> {}", url, platform, scratch.path().display());

        let started = Instant::now();
        let extracted = match tokio::time::timeout(
            constraints.deadline,
            self.extractor.extract(url, &template, constraints),
        )
        .await
        {
            Err(_) => {
                warn!("[FETCH] ⌛ {} timed out after {:?}", url, constraints.deadline);
                return FetchOutcome::Timeout;
            }
            Ok(Err(e)) => {
                warn!("[FETCH] ❌ {} failed after {:?}: {}", url, started.elapsed(), e);
                return classify_failure(platform, e);
            }
            Ok(Ok(extracted)) => extracted,
        };

        let size = match inspect_artifact(scratch.path(), &extracted.path).await {
            Ok(size) => size,
            Err(e) => {
                warn!("[FETCH] ❌ {} produced no usable file: {}", url, e);
                return FetchOutcome::GenericError { detail: e.to_string() };
            }
        };

        match self.policy.evaluate(size) {
            Decision::Reject { size, ceiling } => {
                info!("[FETCH] 📦 {} is {} bytes, over the {} byte ceiling", url, size, ceiling);
                FetchOutcome::TooLarge { size }
            }
            Decision::Accept => {
                info!("[FETCH] ✅ {} fetched in {:?} ({} bytes)", url, started.elapsed(), size);
                FetchOutcome::Success {
                    title: extracted.title.unwrap_or_default(),
                    artifact: Artifact {
                        path: extracted.path,
                        _scratch: scratch,
                    },
                    size,
                }
            }
        }
    }
}

/// Only a refusal reported by the extractor itself is blamed on the platform;
/// a missing binary or unreadable output is our problem, not theirs.
fn classify_failure(platform: Platform, error: FetchError) -> FetchOutcome {
    match error {
        FetchError::Exit { .. } if platform.has_dedicated_failure() => FetchOutcome::PlatformError {
            platform,
            detail: error.to_string(),
        },
        _ => FetchOutcome::GenericError { detail: error.to_string() },
    }
}

async fn inspect_artifact(scratch: &Path, path: &Path) -> Result<u64, FetchError> {
    if !path.starts_with(scratch) {
        return Err(FetchError::EscapedScratch(path.to_path_buf()));
    }
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(FetchError::MissingArtifact),
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Err(FetchError::MissingArtifact);
    }
    if metadata.len() == 0 {
        return Err(FetchError::EmptyArtifact);
    }
    Ok(metadata.len())
}
