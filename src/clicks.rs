use sqlx::SqlitePool;
use tokio::sync::mpsc;
use woothee::parser::Parser;

use crate::db;

/// Family reported when the User-Agent is missing or unrecognized.
pub const UNKNOWN_FAMILY: &str = "Other";

/// One click waiting to be written by the background worker.
#[derive(Debug)]
pub struct ClickMessage {
    pub code: String,
    pub browser_family: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Fire-and-forget click recording.
///
/// Redirect handlers hand clicks to a bounded queue and move on; a single
/// background worker drains the queue into the `clicks` table. A full queue
/// drops the event with a warning — losing a click is acceptable, delaying a
/// redirect is not.
#[derive(Clone)]
pub struct ClickRecorder {
    tx: mpsc::Sender<ClickMessage>,
}

impl ClickRecorder {
    /// Start the worker task and return the handle used to enqueue clicks.
    /// The worker stops once every `ClickRecorder` clone has been dropped.
    pub fn spawn(pool: SqlitePool, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        tokio::spawn(run_worker(rx, pool));
        Self { tx }
    }

    /// Enqueue a click. Never blocks and never fails the caller.
    pub fn record(
        &self,
        code: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
        referrer: Option<String>,
    ) {
        let message = ClickMessage {
            code: code.to_owned(),
            browser_family: browser_family(user_agent.as_deref()),
            ip_address,
            user_agent,
            referrer,
        };

        use mpsc::error::TrySendError;
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(m)) => {
                tracing::warn!("click queue full, dropping click for '{}'", m.code);
            }
            Err(TrySendError::Closed(m)) => {
                tracing::warn!("click worker gone, dropping click for '{}'", m.code);
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<ClickMessage>, pool: SqlitePool) {
    tracing::info!("click worker started");

    while let Some(msg) = rx.recv().await {
        let result = db::log_click(
            &pool,
            &msg.code,
            &msg.browser_family,
            msg.ip_address.as_deref(),
            msg.user_agent.as_deref(),
            msg.referrer.as_deref(),
        )
        .await;

        if let Err(e) = result {
            if e.as_database_error()
                .is_some_and(|d| d.is_foreign_key_violation())
            {
                // Orphan click: the link vanished between redirect and write.
                tracing::warn!("dropping click for unknown code '{}'", msg.code);
            } else {
                tracing::error!("failed to record click for '{}': {e:?}", msg.code);
            }
        }
    }

    tracing::info!("click worker stopped");
}

/// Map a raw User-Agent to a browser family using woothee. Anything woothee
/// cannot classify lands in [`UNKNOWN_FAMILY`] so the analytics breakdown
/// never carries empty keys.
pub fn browser_family(user_agent: Option<&str>) -> String {
    let ua = match user_agent {
        Some(s) if !s.trim().is_empty() => s,
        _ => return UNKNOWN_FAMILY.to_owned(),
    };

    match Parser::new().parse(ua) {
        Some(result) if !result.name.is_empty() && result.name != "UNKNOWN" => {
            result.name.to_owned()
        }
        _ => UNKNOWN_FAMILY.to_owned(),
    }
}
