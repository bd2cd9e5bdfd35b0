use thiserror::Error;

/// A query code that does not belong to its option set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: String },

    #[error("location {location} is not listed for country {country}")]
    UnknownLocation { country: String, location: u32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("missing required setting: {field}")]
    Missing { field: &'static str },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A single failed GET attempt
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server returned status {status}")]
    Status { status: u16 },

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },

    #[error("could not build page URL: {0}")]
    InvalidUrl(String),
}

/// The hydration payload could not be turned into a listing array
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("listing array not found at {path}")]
    MissingPath { path: String },

    #[error("expected an array at {path}")]
    NotAnArray { path: String },
}

/// One listing that could not be flattened
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("listing is not a JSON object")]
    NotAnObject,

    #[error("missing field {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode records as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode records as CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid sink label: {0:?}")]
    InvalidLabel(String),
}
