//! Tolerant field readers for upstream records.
//!
//! The upstream API is not consistent about scalar encodings: identifiers
//! arrive as strings or numbers, counters sometimes as numeric strings, and
//! flags as booleans, `0`/`1` or `"true"`. These helpers are used through
//! `#[serde(deserialize_with = "...")]` so that one badly-typed field does not
//! discard an otherwise usable record.

use serde::de::{Deserialize, DeserializeOwned, Deserializer, Error as _};
use serde_json::Value;

pub(crate) fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) if !text.trim().is_empty() => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a non-empty string or numeric id, found `{other}`"
        ))),
    }
}

pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => {
            let trimmed = text.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a string or numeric id, found `{other}`"
        ))),
    }
}

pub(crate) fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or_default(),
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

pub(crate) fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| *float >= 0.0)
                    .map(|float| float as u64)
            })
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative count, found {number}"))),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|err| D::Error::custom(format!("invalid count `{text}`: {err}"))),
        other => Err(D::Error::custom(format!(
            "expected a numeric count, found `{other}`"
        ))),
    }
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => matches!(text.trim(), "true" | "1" | "TRUE" | "True"),
        _ => false,
    })
}

/// Free text. Numbers and booleans are rendered as text; anything else is absent.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

/// A list whose unreadable items are skipped. `null` or a non-array reads as empty.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::id")]
        id: String,
        #[serde(default, deserialize_with = "super::optional_id")]
        parent: Option<String>,
        #[serde(default, deserialize_with = "super::integer")]
        order: i64,
        #[serde(default, deserialize_with = "super::flag")]
        active: bool,
    }

    #[test]
    fn numeric_ids_become_strings() {
        let sample: Sample = serde_json::from_value(json!({ "id": 42, "parent": 7 })).expect("sample");
        assert_eq!(sample.id, "42");
        assert_eq!(sample.parent.as_deref(), Some("7"));
    }

    #[test]
    fn blank_parent_reads_as_absent() {
        let sample: Sample =
            serde_json::from_value(json!({ "id": "a", "parent": "  " })).expect("sample");
        assert!(sample.parent.is_none());
    }

    #[test]
    fn empty_id_is_rejected() {
        let result = serde_json::from_value::<Sample>(json!({ "id": "" }));
        assert!(result.is_err());
    }

    #[test]
    fn scalars_are_coerced() {
        let sample: Sample = serde_json::from_value(json!({
            "id": "a",
            "order": "3",
            "active": 1
        }))
        .expect("sample");
        assert_eq!(sample.order, 3);
        assert!(sample.active);

        let sample: Sample =
            serde_json::from_value(json!({ "id": "a", "order": null, "active": "false" }))
                .expect("sample");
        assert_eq!(sample.order, 0);
        assert!(!sample.active);
    }

    #[derive(Debug, Deserialize)]
    struct Labelled {
        #[serde(default, deserialize_with = "super::text")]
        title: Option<String>,
        #[serde(default, deserialize_with = "super::list")]
        tags: Vec<Sample>,
    }

    #[test]
    fn text_accepts_numbers_and_drops_structures() {
        let labelled: Labelled = serde_json::from_value(json!({ "title": 2024 })).expect("labelled");
        assert_eq!(labelled.title.as_deref(), Some("2024"));

        let labelled: Labelled =
            serde_json::from_value(json!({ "title": { "vi": "Chương" } })).expect("labelled");
        assert!(labelled.title.is_none());
    }

    #[test]
    fn list_reads_null_as_empty_and_skips_bad_items() {
        let labelled: Labelled = serde_json::from_value(json!({ "tags": null })).expect("labelled");
        assert!(labelled.tags.is_empty());

        let labelled: Labelled =
            serde_json::from_value(json!({ "tags": [{ "id": "a" }, { "id": "" }, 3] }))
                .expect("labelled");
        assert_eq!(labelled.tags.len(), 1);
        assert_eq!(labelled.tags[0].id, "a");
    }
}
