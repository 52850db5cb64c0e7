use super::{Column, Table, Value};
use crate::normalize::is_missing;
use std::io::Read;

impl Table {
    /// Reads a CSV export with a header row. Placeholder cells (blank,
    /// `Missing`, `NaN`) become [`Value::Missing`]; everything else is kept as
    /// trimmed text for the cleaning pass to interpret. Bytes that are not
    /// valid UTF-8 are decoded lossily so one bad cell cannot fail the batch.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(index, header)| header_name(index, &String::from_utf8_lossy(header)))
            .collect();

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        let mut row_count = 0;
        for record in csv_reader.byte_records() {
            let record = record?;
            for (index, values) in columns.iter_mut().enumerate() {
                let decoded = record.get(index).map(String::from_utf8_lossy);
                values.push(cell(decoded.as_deref()));
            }
            row_count += 1;
        }

        let columns = headers
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect();

        Ok(Table { columns, row_count })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, csv::Error> {
        Self::from_csv_reader(bytes)
    }
}

fn header_name(index: usize, raw: &str) -> String {
    let cleaned = raw.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        format!("column_{}", index + 1)
    } else {
        collapsed
    }
}

fn cell(raw: Option<&str>) -> Value {
    match raw {
        Some(value) if !is_missing(Some(value)) => Value::text(value),
        _ => Value::Missing,
    }
}
