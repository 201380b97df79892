// testing.rs - Test doubles for the chat platform and the extractor

use crate::error::{FetchError, MessengerError};
use crate::fetch::{Extracted, Extractor, FetchConstraints};
use crate::messenger::{ChatId, Messenger};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(ChatId, String),
    Video(ChatId, String),
}

/// Records everything sent. Can be told to fail text or video sends.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_text: bool,
    pub fail_video: bool,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(_, text) => Some(text),
                Sent::Video(..) => None,
            })
            .collect()
    }

    pub fn videos(&self) -> usize {
        self.sent().iter().filter(|s| matches!(s, Sent::Video(..))).count()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), MessengerError> {
        if self.fail_text {
            return Err(MessengerError::Rejected("text refused".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Text(chat, text.to_string()));
        Ok(())
    }

    async fn send_video(&self, chat: ChatId, video: &Path, caption: &str) -> Result<(), MessengerError> {
        if self.fail_video {
            return Err(MessengerError::Rejected("upload refused".to_string()));
        }
        assert!(video.is_file(), "video must exist while it is being sent");
        self.sent.lock().unwrap().push(Sent::Video(chat, caption.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Script {
    /// Write a (sparse) file of this many bytes.
    Write { bytes: u64, title: String },
    /// Sleep, then write.
    Delayed { delay: Duration, bytes: u64 },
    Fail(String),
    /// The extractor binary could not be started.
    NotInstalled,
    /// The extractor exited cleanly but printed something unparseable.
    Garbled,
    Hang,
    Empty,
    Missing,
    /// Report a path outside the scratch directory.
    Escape,
    /// Hang for URLs containing "slow", write a small file otherwise.
    PerUrl,
}

pub struct ScriptedExtractor {
    script: Script,
    calls: Arc<AtomicUsize>,
    seen_dirs: Arc<Mutex<Vec<PathBuf>>>,
    seen_urls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedExtractor {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            seen_dirs: Arc::new(Mutex::new(Vec::new())),
            seen_urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn seen_dirs(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        self.seen_dirs.clone()
    }

    pub fn seen_urls(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen_urls.clone()
    }
}

async fn write_file(dir: &Path, bytes: u64) -> Result<PathBuf, FetchError> {
    let path = dir.join("clip.mp4");
    let file = tokio::fs::File::create(&path).await?;
    file.set_len(bytes).await?;
    Ok(path)
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(
        &self,
        url: &str,
        output_template: &Path,
        _constraints: &FetchConstraints,
    ) -> Result<Extracted, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let dir = output_template.parent().expect("template has a parent").to_path_buf();
        self.seen_dirs.lock().unwrap().push(dir.clone());
        self.seen_urls.lock().unwrap().push(url.to_string());

        match &self.script {
            Script::Write { bytes, title } => Ok(Extracted {
                title: Some(title.clone()),
                path: write_file(&dir, *bytes).await?,
            }),
            Script::Delayed { delay, bytes } => {
                tokio::time::sleep(*delay).await;
                Ok(Extracted {
                    title: None,
                    path: write_file(&dir, *bytes).await?,
                })
            }
            Script::Fail(message) => Err(FetchError::Exit {
                status: "exit status: 1".to_string(),
                stderr: message.clone(),
            }),
            Script::NotInstalled => Err(FetchError::Spawn {
                binary: "yt-dlp".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            }),
            Script::Garbled => Err(serde_json::from_str::<serde_json::Value>("not json")
                .unwrap_err()
                .into()),
            Script::Hang => std::future::pending().await,
            Script::Empty => Ok(Extracted {
                title: None,
                path: write_file(&dir, 0).await?,
            }),
            Script::Missing => Ok(Extracted {
                title: None,
                path: dir.join("never-written.mp4"),
            }),
            Script::Escape => Ok(Extracted {
                title: None,
                path: PathBuf::from("/definitely/not/scratch/clip.mp4"),
            }),
            Script::PerUrl => {
                if url.contains("slow") {
                    std::future::pending::<()>().await;
                }
                Ok(Extracted {
                    title: Some(url.to_string()),
                    path: write_file(&dir, 2048).await?,
                })
            }
        }
    }
}
