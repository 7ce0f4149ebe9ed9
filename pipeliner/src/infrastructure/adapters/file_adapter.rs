// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Source Adapter
//!
//! Parses an in-memory uploaded byte stream as CSV or JSON, matching the
//! format declared on the source config (already validated against the
//! filename extension by `FileConfig::validate`).

use async_trait::async_trait;
use serde_json::{Map, Value};

use pipeliner_domain::{AdapterError, AdapterRecord, FileConfig, SourceFormat};

use super::SourceAdapter;

pub struct FileAdapter {
    config: FileConfig,
}

impl FileAdapter {
    pub fn new(config: FileConfig) -> Self {
        Self { config }
    }

    fn parse_csv(&self) -> Result<Vec<AdapterRecord>, AdapterError> {
        let mut reader = csv::Reader::from_reader(self.config.upload_bytes.as_slice());
        let headers = reader
            .headers()
            .map_err(|err| self.invalid_file("csv", err.to_string()))?
            .clone();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|err| self.invalid_file("csv", err.to_string()))?;
            let mut data = Map::new();
            for (header, value) in headers.iter().zip(row.iter()) {
                data.insert(header.to_string(), Value::String(value.to_string()));
            }
            records.push(AdapterRecord::new(&self.config.declared_filename, data));
        }
        Ok(records)
    }

    fn parse_json(&self) -> Result<Vec<AdapterRecord>, AdapterError> {
        let value: Value = serde_json::from_slice(&self.config.upload_bytes)
            .map_err(|err| self.invalid_file("json", err.to_string()))?;

        match value {
            Value::Object(map) => Ok(vec![AdapterRecord::new(&self.config.declared_filename, map)]),
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(map) => records.push(AdapterRecord::new(&self.config.declared_filename, map)),
                        _ => return Err(self.invalid_file("json", "array element is not an object".to_string())),
                    }
                }
                Ok(records)
            }
            _ => Err(self.invalid_file("json", "top-level value is not an object or array".to_string())),
        }
    }

    fn invalid_file(&self, format: &str, message: String) -> AdapterError {
        AdapterError::InvalidFile {
            filename: self.config.declared_filename.clone(),
            format: format.to_string(),
            message,
        }
    }
}

#[async_trait]
impl SourceAdapter for FileAdapter {
    #[tracing::instrument(skip(self), fields(filename = %self.config.declared_filename))]
    async fn fetch(&self) -> Result<Vec<AdapterRecord>, AdapterError> {
        match self.config.declared_format {
            SourceFormat::Csv => self.parse_csv(),
            SourceFormat::Json => self.parse_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(bytes: &str, format: SourceFormat, filename: &str) -> FileAdapter {
        FileAdapter::new(FileConfig {
            upload_bytes: bytes.as_bytes().to_vec(),
            declared_filename: filename.to_string(),
            declared_format: format,
        })
    }

    #[tokio::test]
    async fn csv_round_trips_header_keyed_rows_in_order() {
        let adapter = adapter("h1,h2\nr1,r2\nr3,r4\n", SourceFormat::Csv, "data.csv");
        let records = adapter.fetch().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data.get("h1").unwrap(), "r1");
        assert_eq!(records[0].data.get("h2").unwrap(), "r2");
        assert_eq!(records[1].data.get("h1").unwrap(), "r3");
        assert_eq!(records[1].data.get("h2").unwrap(), "r4");
        assert!(records.iter().all(|r| r.source == "data.csv"));
    }

    #[tokio::test]
    async fn json_object_becomes_single_record() {
        let adapter = adapter(r#"{"a":1}"#, SourceFormat::Json, "data.json");
        let records = adapter.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn json_array_becomes_one_record_per_element() {
        let adapter = adapter(r#"[{"a":1},{"a":2}]"#, SourceFormat::Json, "data.json");
        let records = adapter.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn malformed_json_fails_with_invalid_file() {
        let adapter = adapter("not json", SourceFormat::Json, "data.json");
        let err = adapter.fetch().await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidFile { .. }));
    }
}
