use crate::config::SessionConfig;
use crate::error::FetchError;
use crate::models::{FetchSession, NormalizedRecord, PageResult, Query, TerminalReason};
use crate::scrapers::normalize::RecordNormalizer;
use crate::scrapers::traits::PageSource;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A finished fetch-and-normalize unit
#[derive(Debug)]
enum PageOutcome {
    Records(Vec<NormalizedRecord>),
    Empty,
    Failed(FetchError),
}

/// Walks results pages until one of them signals the end.
///
/// With no total-pages signal from the site, a page holding fewer than
/// `page_size` records is taken to be the last one. That rule cannot tell a
/// real last page from a full page whose listings partly failed
/// normalization; both end the session.
///
/// Up to `concurrency` pages beyond the last evaluated one are in flight.
/// Results are evaluated strictly in page order, so records from a page
/// after the stopping page are dropped even if they arrived first.
pub struct PaginationController<S: PageSource> {
    source: S,
    normalizer: RecordNormalizer,
    concurrency: usize,
    page_cap: u32,
    page_size: usize,
}

impl<S: PageSource> PaginationController<S> {
    pub fn new(source: S, config: &SessionConfig) -> Self {
        Self {
            source,
            normalizer: RecordNormalizer::new(),
            concurrency: config.concurrency.max(1),
            page_cap: config.page_cap.max(1),
            page_size: config.page_size,
        }
    }

    pub async fn run(&self, query: &Query) -> FetchSession {
        let started_at = Utc::now();
        info!(
            "Fetching up to {} pages from {} ({} at a time)",
            self.page_cap,
            self.source.source_name(),
            self.concurrency
        );

        let mut in_flight = FuturesUnordered::new();
        let mut arrived: BTreeMap<u32, PageOutcome> = BTreeMap::new();
        let mut pages: BTreeMap<u32, Vec<NormalizedRecord>> = BTreeMap::new();
        let mut next_dispatch: u32 = 1;
        let mut next_evaluate: u32 = 1;
        let mut terminal: Option<TerminalReason> = None;

        loop {
            // Window covers pages dispatched but not yet evaluated
            while terminal.is_none()
                && next_dispatch <= self.page_cap
                && ((next_dispatch - next_evaluate) as usize) < self.concurrency
            {
                in_flight.push(self.process_page(query, next_dispatch));
                next_dispatch += 1;
            }

            let Some((page, outcome)) = in_flight.next().await else {
                break;
            };

            if terminal.is_some() {
                debug!("Discarding page {} fetched past the last page", page);
                continue;
            }

            arrived.insert(page, outcome);
            while let Some(outcome) = arrived.remove(&next_evaluate) {
                let page = next_evaluate;
                next_evaluate += 1;
                if let Some(reason) = self.evaluate(page, outcome, &mut pages) {
                    terminal = Some(reason);
                    break;
                }
            }
        }

        if !arrived.is_empty() {
            debug!("Discarded {} pages past the last page", arrived.len());
        }

        let terminal = terminal.unwrap_or(TerminalReason::PageCap {
            page: self.page_cap,
        });
        let session = FetchSession::new(pages, terminal, started_at);
        info!(
            "Stopped after {}: {} records from {} pages",
            terminal,
            session.record_count(),
            session.page_count()
        );
        session
    }

    async fn process_page(&self, query: &Query, page: u32) -> (u32, PageOutcome) {
        let outcome = match self.source.fetch(query, page).await {
            PageResult::Success(payload) => PageOutcome::Records(self.normalizer.normalize(&payload)),
            PageResult::Empty => PageOutcome::Empty,
            PageResult::Failed(e) => PageOutcome::Failed(e),
        };
        (page, outcome)
    }

    /// Keep the page's records if it counts, and say whether it ends the session
    fn evaluate(
        &self,
        page: u32,
        outcome: PageOutcome,
        pages: &mut BTreeMap<u32, Vec<NormalizedRecord>>,
    ) -> Option<TerminalReason> {
        let records = match outcome {
            PageOutcome::Failed(e) => {
                warn!("Page {} failed ({}), stopping pagination", page, e);
                return Some(TerminalReason::RetryExhausted { page });
            }
            PageOutcome::Empty => {
                warn!("No data returned for page {}, stopping pagination", page);
                return Some(TerminalReason::EmptyPage { page });
            }
            PageOutcome::Records(records) => records,
        };

        let count = records.len();
        debug!("Page {} yielded {} records", page, count);
        pages.insert(page, records);

        if count < self.page_size {
            info!(
                "Less than {} records on page {}, assuming last page",
                self.page_size, page
            );
            Some(TerminalReason::ShortPage { page, count })
        } else if page >= self.page_cap {
            info!("Reached page cap {}", self.page_cap);
            Some(TerminalReason::PageCap { page })
        } else {
            None
        }
    }
}
