// reporter.rs - Outcome Reporter
// Turns a finished fetch into chat messages. Every send is best-effort:
// failures are logged and swallowed, the pipeline is already done.

use crate::config::MB;
use crate::fetch::FetchOutcome;
use crate::messages::{format_mb, MessageCatalog};
use crate::messenger::{ChatId, Messenger};
use crate::platform::Platform;
use crate::policy::SizeCeiling;
use log::{info, warn};
use std::sync::Arc;

pub struct OutcomeReporter {
    messenger: Arc<dyn Messenger>,
    catalog: Arc<MessageCatalog>,
    ceiling: SizeCeiling,
}

impl OutcomeReporter {
    pub fn new(messenger: Arc<dyn Messenger>, catalog: Arc<MessageCatalog>, ceiling: SizeCeiling) -> Self {
        Self {
            messenger,
            catalog,
            ceiling,
        }
    }

    async fn say(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_text(chat, text).await {
            warn!("[REPORT] Failed to send message to {}: {}", chat, e);
        }
    }

    /// Consumes the outcome; a successful artifact (and its scratch
    /// directory) is released when this returns.
    pub async fn report(&self, chat: ChatId, language: &str, platform: Platform, outcome: FetchOutcome) {
        let catalog = &self.catalog;
        let max_mb = ("max_mb", (self.ceiling.get() / MB).to_string());

        match outcome {
            FetchOutcome::Success { title, artifact, size } => {
                let caption = if title.trim().is_empty() {
                    catalog.text(language, "default_caption")
                } else {
                    title
                };

                match self.messenger.send_video(chat, artifact.path(), &caption).await {
                    Ok(()) => {
                        info!("[REPORT] 🎉 Delivered {} bytes to {}", size, chat);
                        self.say(chat, &catalog.text(language, "success")).await;
                    }
                    Err(e) => {
                        warn!("[REPORT] Upload of {} bytes to {} failed: {}", size, chat, e);
                        let text = catalog.render(language, "delivery_failed", Some(platform), &[("size_mb", format_mb(size))]);
                        self.say(chat, &text).await;
                    }
                }
            }
            FetchOutcome::TooLarge { size } => {
                let text = catalog.render(language, "too_large", Some(platform), &[("size_mb", format_mb(size)), max_mb]);
                self.say(chat, &text).await;
            }
            FetchOutcome::Timeout => {
                let text = catalog.render(language, "timeout", Some(platform), &[]);
                self.say(chat, &text).await;
            }
            FetchOutcome::PlatformError { platform, detail } => {
                let text = catalog.render(language, "platform_error", Some(platform), &[("error", detail)]);
                self.say(chat, &text).await;
            }
            FetchOutcome::GenericError { detail } => {
                // never platform-flavored
                let text = catalog.render(language, "generic_error", None, &[("error", detail)]);
                self.say(chat, &text).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MB;
    use crate::fetch::{FetchExecutor, FetchSettings};
    use crate::testing::{RecordingMessenger, Script, ScriptedExtractor, Sent};
    use std::time::Duration;

    fn reporter(messenger: Arc<RecordingMessenger>) -> OutcomeReporter {
        OutcomeReporter::new(messenger, Arc::new(MessageCatalog::builtin("en")), SizeCeiling::new(50 * MB))
    }

    async fn fetch(script: Script, url: &str, root: &std::path::Path) -> crate::fetch::Fetched {
        let executor = FetchExecutor::new(
            Box::new(ScriptedExtractor::new(script)),
            SizeCeiling::new(50 * MB),
            FetchSettings {
                soft_format_bytes: 48 * MB,
                default_timeout: Duration::from_secs(5),
                slow_platform_timeout: Duration::from_millis(50),
                scratch_root: root.to_path_buf(),
            },
        );
        executor.execute(url).await
    }

    #[tokio::test]
    async fn test_success_sends_video_then_confirmation() {
        let root = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let fetched = fetch(Script::Write { bytes: 4096, title: "Cat".to_string() }, "https://www.tiktok.com/@u/video/1", root.path()).await;

        reporter(messenger.clone()).report(ChatId(7), "en", fetched.platform, fetched.outcome).await;

        let sent = messenger.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], Sent::Video(ChatId(7), "Cat".to_string()));
        assert_eq!(sent[1], Sent::Text(ChatId(7), "Boom! Video delivered 🎉".to_string()));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_untitled_video_gets_default_caption() {
        let root = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let fetched = fetch(Script::Write { bytes: 10, title: " ".to_string() }, "https://example.com/v", root.path()).await;

        reporter(messenger.clone()).report(ChatId(1), "en", fetched.platform, fetched.outcome).await;
        assert_eq!(messenger.sent()[0], Sent::Video(ChatId(1), "Your video!".to_string()));
    }

    #[tokio::test]
    async fn test_too_large_sends_one_message_and_no_video() {
        let root = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let fetched = fetch(Script::Write { bytes: 60 * MB, title: "big".to_string() }, "https://www.tiktok.com/@u/video/1", root.path()).await;

        reporter(messenger.clone()).report(ChatId(7), "en", fetched.platform, fetched.outcome).await;

        assert_eq!(messenger.videos(), 0);
        let texts = messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("60.0MB"), "{}", texts[0]);
        assert!(texts[0].contains("(Max 50MB)"), "{}", texts[0]);
        assert!(texts[0].contains("too big"));
    }

    #[tokio::test]
    async fn test_okru_timeout_uses_okru_copy() {
        let root = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let fetched = fetch(Script::Hang, "https://www.ok.ru/video/1", root.path()).await;
        assert!(matches!(fetched.outcome, FetchOutcome::Timeout));

        reporter(messenger.clone()).report(ChatId(3), "en", fetched.platform, fetched.outcome).await;
        assert_eq!(messenger.texts(), vec![
            "⌛ 🟠 OK.ru is being slow again and didn't answer in time. Try again in a bit!".to_string()
        ]);
    }

    #[tokio::test]
    async fn test_facebook_io_error_uses_generic_copy() {
        let root = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let fetched = fetch(Script::Fail("Input/output error".to_string()), "https://www.facebook.com/watch?v=1", root.path()).await;

        reporter(messenger.clone()).report(ChatId(3), "en", fetched.platform, fetched.outcome).await;
        let texts = messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Something went wrong 😢"));
        assert!(texts[0].contains("Input/output error"));
    }

    #[tokio::test]
    async fn test_platform_error_uses_platform_copy_in_language() {
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = FetchOutcome::PlatformError {
            platform: Platform::Instagram,
            detail: "login required".to_string(),
        };

        reporter(messenger.clone()).report(ChatId(3), "ru", Platform::Instagram, outcome).await;
        assert!(messenger.texts()[0].starts_with("📸 Instagram заблокировал"));
    }

    #[tokio::test]
    async fn test_failed_upload_reports_delivery_failure() {
        let root = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger {
            fail_video: true,
            ..Default::default()
        });
        let fetched = fetch(Script::Write { bytes: MB, title: "x".to_string() }, "https://example.com/v", root.path()).await;

        reporter(messenger.clone()).report(ChatId(3), "en", fetched.platform, fetched.outcome).await;
        let texts = messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("couldn't upload"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_send_failures_are_swallowed() {
        let messenger = Arc::new(RecordingMessenger {
            fail_text: true,
            fail_video: true,
            ..Default::default()
        });
        reporter(messenger.clone())
            .report(ChatId(3), "en", Platform::Generic, FetchOutcome::Timeout)
            .await;
        assert!(messenger.sent().is_empty());
    }
}
