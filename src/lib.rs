pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod session;
pub mod sinks;

pub use config::{Cli, OutputFormat, RelayConfig, SessionConfig};
pub use models::{FetchSession, NormalizedRecord, PageResult, Query, TerminalReason};
pub use scrapers::{PageFetcher, PaginationController, RequestDecorator};
pub use session::{run_session, SessionReport, UploadStatus};
pub use sinks::{CsvFileSink, JsonFileSink, Sink};
