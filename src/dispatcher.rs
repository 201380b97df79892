// dispatcher.rs - Request Dispatcher
// Entry point for every inbound text message:
//   validate -> acknowledge -> spawn (fetch + report) -> return
//
// handle() never waits for the fetch. The spawned task takes an admission
// permit first, so at most MAX_CONCURRENT_FETCHES extractions run at once;
// further requests queue inside their own tasks.
//
// Used by: main.rs (message event handler)

use crate::fetch::FetchExecutor;
use crate::messages::MessageCatalog;
use crate::messenger::{ChatId, InboundMessage, Messenger};
use crate::reporter::OutcomeReporter;
use crate::session::SessionStore;
use crate::tasks::{spawn_supervised, InFlight};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub id: Uuid,
    pub chat: ChatId,
    pub url: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum Dispatch {
    /// Not a link; the user was told and nothing was spawned.
    Rejected,
    Spawned { request_id: Uuid, task: JoinHandle<()> },
}

/// Accepts `http://` and `https://` links, case-insensitively.
pub fn looks_like_link(text: &str) -> bool {
    let lowered = text.trim().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

pub struct RequestDispatcher {
    messenger: Arc<dyn Messenger>,
    executor: Arc<FetchExecutor>,
    reporter: Arc<OutcomeReporter>,
    sessions: Arc<SessionStore>,
    catalog: Arc<MessageCatalog>,
    admission: Arc<Semaphore>,
    in_flight: InFlight,
}

impl RequestDispatcher {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        executor: Arc<FetchExecutor>,
        reporter: Arc<OutcomeReporter>,
        sessions: Arc<SessionStore>,
        catalog: Arc<MessageCatalog>,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            messenger,
            executor,
            reporter,
            sessions,
            catalog,
            admission: Arc::new(Semaphore::new(max_concurrent_fetches)),
            in_flight: InFlight::default(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn catalog(&self) -> &Arc<MessageCatalog> {
        &self.catalog
    }

    async fn language_for(&self, chat: ChatId) -> String {
        self.sessions
            .language(chat)
            .await
            .unwrap_or_else(|| self.catalog.default_language().to_string())
    }

    pub async fn handle(&self, inbound: InboundMessage) -> Dispatch {
        let language = self.language_for(inbound.chat).await;
        let text = inbound.text.trim();

        if !looks_like_link(text) {
            info!("[DISPATCH] Rejected non-link message {} from {}", inbound.message_id, inbound.chat);
            if let Err(e) = self.messenger.send_text(inbound.chat, &self.catalog.text(&language, "invalid_link")).await {
                warn!("[DISPATCH] Failed to send invalid-link reply to {}: {}", inbound.chat, e);
            }
            return Dispatch::Rejected;
        }

        let request = FetchRequest {
            id: Uuid::new_v4(),
            chat: inbound.chat,
            url: text.to_string(),
            submitted_at: Utc::now(),
        };
        self.sessions.record_request(request.chat).await;

        // The acknowledgment is awaited before spawning so it always lands
        // ahead of the outcome.
        if let Err(e) = self.messenger.send_text(request.chat, &self.catalog.text(&language, "ack")).await {
            warn!("[DISPATCH] {} acknowledgment to {} failed: {}", request.id, request.chat, e);
        }

        info!("[DISPATCH] 🆔 {} chat={} url={}", request.id, request.chat, request.url);
        let request_id = request.id;
        let task = spawn_supervised(format!("fetch {}", request_id), self.run(request, language));
        Dispatch::Spawned { request_id, task }
    }

    fn run(&self, request: FetchRequest, language: String) -> impl std::future::Future<Output = ()> + Send + 'static {
        let executor = self.executor.clone();
        let reporter = self.reporter.clone();
        let admission = self.admission.clone();
        let in_flight = self.in_flight.clone();

        async move {
            let _guard = in_flight.enter();
            let _permit = match admission.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("[DISPATCH] {} dropped, admission closed", request.id);
                    return;
                }
            };

            let fetched = executor.execute(&request.url).await;
            let waited = Utc::now().signed_duration_since(request.submitted_at);
            info!(
                "[DISPATCH] {} resolved as {} ({} {}, {}ms since submission)",
                request.id,
                fetched.outcome.kind(),
                fetched.platform,
                fetched.url,
                waited.num_milliseconds()
            );
            reporter.report(request.chat, &language, fetched.platform, fetched.outcome).await;
        }
    }
}
