use crate::models::{FetchSession, Query, TerminalReason};
use crate::scrapers::{PageSource, PaginationController};
use crate::sinks::Sink;
use tracing::{error, info, warn};

/// What happened to a session's records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploaded,
    NothingToUpload,
    /// Sink error text; records were fetched but not stored
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub label: String,
    pub record_count: usize,
    pub page_count: usize,
    pub terminal: TerminalReason,
    pub upload: UploadStatus,
}

/// Fetch every page for `query` and hand the records to `sink` once.
///
/// The sink is skipped when nothing was fetched. Sink failures are logged
/// and reported, never retried.
pub async fn run_session<S, K>(
    controller: &PaginationController<S>,
    sink: &K,
    query: &Query,
) -> SessionReport
where
    S: PageSource,
    K: Sink + ?Sized,
{
    let session = controller.run(query).await;
    deliver(session, sink, query.country().code()).await
}

/// Hand a finished session to `sink` under `label`
pub async fn deliver<K>(session: FetchSession, sink: &K, label: &str) -> SessionReport
where
    K: Sink + ?Sized,
{
    let record_count = session.record_count();
    let page_count = session.page_count();
    let terminal = session.terminal();
    let elapsed = session.finished_at() - session.started_at();
    info!(
        "Total records fetched: {} ({} pages, {} ms)",
        record_count,
        page_count,
        elapsed.num_milliseconds()
    );

    let upload = if session.is_empty() {
        warn!("No records found, nothing to upload");
        UploadStatus::NothingToUpload
    } else {
        let records = session.into_records();
        match sink.upload(&records, label).await {
            Ok(()) => {
                info!("Uploaded {} records under {}", record_count, label);
                UploadStatus::Uploaded
            }
            Err(e) => {
                error!("Failed to upload records under {}: {}", label, e);
                UploadStatus::Failed(e.to_string())
            }
        }
    };

    SessionReport {
        label: label.to_string(),
        record_count,
        page_count,
        terminal,
        upload,
    }
}
