//! Tabular input: a header row plus string-valued records, the same shape
//! a browser-side CSV loader hands to its callback.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::io::{ChartError, ChartResult, Reader};

/// One input record, keyed by column name
pub type Row = HashMap<String, String>;

/// A loaded table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column names in file order
    pub columns: Vec<String>,
    /// Records in file order
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table has a column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Reader for comma-separated files with a header row
pub struct CsvReader {
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Parse CSV from any byte source
    pub fn read_from<R: std::io::Read>(&self, source: R) -> ChartResult<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::Headers)
            .from_reader(source);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Row = columns
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            rows.push(row);
        }

        debug!(rows = rows.len(), columns = columns.len(), "parsed CSV");
        Ok(Dataset { columns, rows })
    }
}

impl Reader for CsvReader {
    fn read(&self, input: &Path) -> ChartResult<Dataset> {
        let file = File::open(input)?;
        self.read_from(BufReader::new(file))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv"]
    }
}

/// Reader for a JSON array of flat objects
pub struct JsonReader;

impl Default for JsonReader {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON document already in memory
    pub fn read_str(&self, contents: &str) -> ChartResult<Dataset> {
        let value: Value = serde_json::from_str(contents)?;
        let Value::Array(items) = value else {
            return Err(ChartError::Parse(
                "expected a JSON array of records".to_string(),
            ));
        };

        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let Value::Object(fields) = item else {
                return Err(ChartError::Parse(format!(
                    "record {index} is not a JSON object"
                )));
            };

            let mut row = Row::new();
            for (key, value) in fields {
                if !columns.contains(&key) {
                    columns.push(key.clone());
                }
                let text = match value {
                    Value::Null => continue,
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(ChartError::Parse(format!(
                            "record {index} field '{key}' is not a scalar: {other}"
                        )));
                    }
                };
                row.insert(key, text);
            }
            rows.push(row);
        }

        debug!(rows = rows.len(), columns = columns.len(), "parsed JSON");
        Ok(Dataset { columns, rows })
    }
}

impl Reader for JsonReader {
    fn read(&self, input: &Path) -> ChartResult<Dataset> {
        let contents = std::fs::read_to_string(input)?;
        self.read_str(&contents)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id,flights,city,country\n\
                          LHR,1600,London,UK\n\
                          JFK,400,New York,US\n";

    #[test]
    fn csv_reads_header_and_rows() {
        let data = CsvReader::new().read_from(SAMPLE.as_bytes()).unwrap();

        assert_eq!(data.columns, vec!["id", "flights", "city", "country"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows[0]["city"], "London");
        assert_eq!(data.rows[1]["flights"], "400");
    }

    #[test]
    fn csv_keeps_quoted_commas() {
        let input = "id,flights,city,country\nX,10,\"Washington, D.C.\",US\n";
        let data = CsvReader::new().read_from(input.as_bytes()).unwrap();
        assert_eq!(data.rows[0]["city"], "Washington, D.C.");
    }

    #[test]
    fn csv_trims_header_whitespace() {
        let input = "id, flights ,city\nA,1,Paris\n";
        let data = CsvReader::new().read_from(input.as_bytes()).unwrap();
        assert!(data.has_column("flights"));
    }

    #[test]
    fn csv_rejects_ragged_rows() {
        let input = "id,flights\nA,1\nB,2,extra\n";
        let err = CsvReader::new().read_from(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ChartError::Csv(_)));
    }

    #[test]
    fn csv_header_only_is_empty() {
        let data = CsvReader::new()
            .read_from("id,flights\n".as_bytes())
            .unwrap();
        assert!(data.is_empty());
        assert_eq!(data.columns.len(), 2);
    }

    #[test]
    fn json_stringifies_scalars() {
        let input = r#"[
            {"id": "LHR", "flights": 1600, "city": "London", "hub": true},
            {"id": "CDG", "flights": 12.5, "city": null}
        ]"#;
        let data = JsonReader::new().read_str(input).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.rows[0]["flights"], "1600");
        assert_eq!(data.rows[0]["hub"], "true");
        assert_eq!(data.rows[1]["flights"], "12.5");
        assert!(!data.rows[1].contains_key("city"));
        assert!(data.has_column("hub"));
    }

    #[test]
    fn json_requires_array() {
        let err = JsonReader::new().read_str(r#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, ChartError::Parse(_)));
    }

    #[test]
    fn json_rejects_nested_values() {
        let err = JsonReader::new()
            .read_str(r#"[{"id": "x", "tags": ["a"]}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("tags"));
    }
}
