use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A raw row as returned by the hosted store.
pub type Row = serde_json::Map<String, Value>;

/// Reads a column as text. Nulls and missing columns become empty strings; scalars are rendered.
pub fn text(row: &Row, column: &str) -> String {
    row.get(column).map(value_text).unwrap_or_default()
}

/// Reads a timestamp column, accepting RFC 3339, naive `T`/space separated, or bare dates.
pub fn timestamp(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

/// Deserializes any scalar column into text, mapping null to an empty string.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_text).unwrap_or_default())
}

/// Deserializes a scalar column into optional text, treating null and blank as absent.
pub fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .map(value_text)
        .filter(|text| !text.trim().is_empty()))
}

pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn text_renders_scalars_and_blanks_nulls() {
        let row = json!({ "id": 42, "flag": true, "name": "Ana", "missing": null });
        let row = row.as_object().expect("object").clone();
        assert_eq!(text(&row, "id"), "42");
        assert_eq!(text(&row, "flag"), "true");
        assert_eq!(text(&row, "name"), "Ana");
        assert_eq!(text(&row, "missing"), "");
        assert_eq!(text(&row, "absent"), "");
    }

    #[test]
    fn parse_timestamp_supports_store_formats() {
        let expected = Utc
            .with_ymd_and_hms(2025, 3, 4, 10, 30, 0)
            .single()
            .expect("valid");
        assert_eq!(parse_timestamp("2025-03-04T10:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T18:30:00+08:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T10:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04 10:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-04"),
            Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).single()
        );
        assert_eq!(parse_timestamp("  "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
