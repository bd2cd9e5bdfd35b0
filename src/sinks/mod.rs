//! Destinations for a finished session's records.

use crate::error::SinkError;
use crate::models::NormalizedRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives the records of one session, at most once
#[async_trait]
pub trait Sink: Send + Sync {
    async fn upload(&self, records: &[NormalizedRecord], label: &str) -> Result<(), SinkError>;
}

/// Labels become file names, so keep them to a plain token
fn file_for(dir: &Path, label: &str, extension: &str) -> Result<PathBuf, SinkError> {
    let valid = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(SinkError::InvalidLabel(label.to_string()));
    }
    Ok(dir.join(format!("{}.{}", label, extension)))
}

#[derive(Serialize)]
struct JsonExport<'a> {
    label: &'a str,
    exported_at: DateTime<Utc>,
    count: usize,
    records: &'a [NormalizedRecord],
}

/// Writes `{dir}/{label}.json`, replacing any previous export
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Sink for JsonFileSink {
    async fn upload(&self, records: &[NormalizedRecord], label: &str) -> Result<(), SinkError> {
        let path = file_for(&self.dir, label, "json")?;
        let export = JsonExport {
            label,
            exported_at: Utc::now(),
            count: records.len(),
            records,
        };
        let json = serde_json::to_string_pretty(&export)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, json).await?;
        info!("💾 Saved {} records to {}", records.len(), path.display());
        Ok(())
    }
}

/// Writes `{dir}/{label}.csv` with one header row, replacing any previous export
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    dir: PathBuf,
}

impl CsvFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// CSV text for `records`, header row first
pub fn to_csv(records: &[NormalizedRecord]) -> Result<Vec<u8>, SinkError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| SinkError::Io(e.into_error()))
}

#[async_trait]
impl Sink for CsvFileSink {
    async fn upload(&self, records: &[NormalizedRecord], label: &str) -> Result<(), SinkError> {
        let path = file_for(&self.dir, label, "csv")?;
        let data = to_csv(records)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, data).await?;
        info!("💾 Saved {} records to {}", records.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, price: &str) -> NormalizedRecord {
        NormalizedRecord {
            id: Some(id.to_string()),
            price: price.to_string(),
            map_link: "https://www.google.com/maps?q=None,None".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_json_sink_overwrites_label_file() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileSink::new(dir.path());

        sink.upload(&[record("1", "10 AED / yearly")], "ae").await.unwrap();
        sink.upload(&[record("2", "20 AED / yearly"), record("3", "30 AED / yearly")], "ae")
            .await
            .unwrap();

        let text = std::fs::read_to_string(dir.path().join("ae.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["label"], "ae");
        assert_eq!(value["count"], 2);
        assert_eq!(value["records"][0]["ID"], "2");
        assert_eq!(value["records"][1]["Price"], "30 AED / yearly");
    }

    #[tokio::test]
    async fn test_csv_sink_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let sink = CsvFileSink::new(dir.path().join("nested"));

        sink.upload(&[record("1", "10 QAR / monthly")], "qa").await.unwrap();

        let text = std::fs::read_to_string(dir.path().join("nested/qa.csv")).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("ID,Title,Property Type,Price,"));
        assert!(header.ends_with("Broker Phone,Description"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,,,10 QAR / monthly,"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn test_label_with_path_separator_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileSink::new(dir.path());
        let err = sink.upload(&[record("1", "1 AED / yearly")], "../ae").await;
        assert!(matches!(err, Err(SinkError::InvalidLabel(_))));
    }
}
