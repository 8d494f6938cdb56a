use serde::Serialize;
use serde_json::Value;

use crate::store::{Collection, RecordStore, Row};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("csv import has no header row")]
    MissingHeader,
    #[error("csv import has a blank column name at position {0}")]
    BlankColumn(usize),
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Outcome of writing parsed rows to the primary table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub parsed: usize,
    pub inserted: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Parses a header row plus data rows into raw text rows keyed by header.
///
/// Quoted fields may contain commas, newlines, and doubled quotes. Short records leave the
/// remaining columns out; nothing is coerced away from text.
pub fn parse_csv(input: &str) -> Result<Vec<Row>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(ImportError::MissingHeader);
    }
    if let Some(position) = headers.iter().position(String::is_empty) {
        return Err(ImportError::BlankColumn(position + 1));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, field)| (header.clone(), Value::String(field.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Inserts rows into the primary table one by one, counting failures instead of stopping.
pub async fn insert_rows<S>(store: &S, rows: Vec<Row>) -> ImportSummary
where
    S: RecordStore + ?Sized,
{
    let mut summary = ImportSummary {
        parsed: rows.len(),
        ..ImportSummary::default()
    };

    for (index, row) in rows.into_iter().enumerate() {
        match store.insert(Collection::KycDetails, row).await {
            Ok(_) => summary.inserted += 1,
            Err(err) => {
                tracing::warn!(row = index + 1, error = %err, "csv row rejected by store");
                summary.failed += 1;
                summary.errors.push(format!("row {}: {err}", index + 1));
            }
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        failed = summary.failed,
        "csv import finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quoted_fields_keep_commas_quotes_and_text() {
        let rows = parse_csv(
            "first_name,last_name,permanent_address,monthly_income,remarks\n\
             Juan,Cruz,\"123 Main St, Brgy 1, Pasig\",055000,\"said \"\"call after 5\"\"\"\n",
        )
        .expect("csv parses");

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["permanent_address"], json!("123 Main St, Brgy 1, Pasig"));
        assert_eq!(row["monthly_income"], json!("055000"));
        assert_eq!(row["remarks"], json!("said \"call after 5\""));
    }

    #[test]
    fn blank_lines_are_skipped_and_short_rows_kept() {
        let rows = parse_csv("\u{feff}id,first_name,last_name\n1,Ana\n,,\n2,Ben,Lim\n")
            .expect("csv parses");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("last_name"), None);
        assert_eq!(rows[0]["id"], json!("1"));
        assert_eq!(rows[1]["last_name"], json!("Lim"));
    }

    #[test]
    fn header_problems_are_reported() {
        assert!(matches!(parse_csv(""), Err(ImportError::MissingHeader)));
        assert!(matches!(
            parse_csv("id,,last_name\n1,2,3\n"),
            Err(ImportError::BlankColumn(2))
        ));
    }
}
