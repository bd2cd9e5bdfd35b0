pub mod extract;
pub mod fetcher;
pub mod nested;
pub mod normalize;
pub mod pagination;
pub mod request_mask;
pub mod retry;
pub mod traits;
pub mod types;

pub use extract::PayloadExtractor;
pub use fetcher::{HttpTransport, PageFetcher};
pub use normalize::RecordNormalizer;
pub use pagination::PaginationController;
pub use request_mask::RequestDecorator;
pub use retry::RetryPolicy;
pub use traits::{PageSource, Transport};
pub use types::{AttemptContext, DecoratedRequest};
