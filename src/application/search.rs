//! Splits one tagged upstream search response into typed buckets.

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    content::ContentNode,
    search::{SearchKind, SearchResultSet},
};

/// The upstream tags each response with a single `type`; every record lands in
/// the matching bucket and the others stay empty.
pub fn aggregate(payload: &Value) -> SearchResultSet {
    let inner = match payload.get("data") {
        Some(data) if data.get("type").is_some() => data,
        _ => payload,
    };

    let tag = inner.get("type").and_then(Value::as_str).unwrap_or_default();
    let Some(kind) = SearchKind::from_tag(tag) else {
        debug!(tag, "search response carried no known discriminator");
        return SearchResultSet::default();
    };

    let records = records(inner.get("data"));
    let mut results = SearchResultSet::default();
    match kind {
        SearchKind::Book => results.books = records,
        SearchKind::Question => results.questions = records,
        SearchKind::MenuBook => {
            results.chapter_entries = records
                .into_iter()
                .filter_map(|record| match serde_json::from_value::<ContentNode>(record) {
                    Ok(node) => Some(node),
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable menu-book search hit");
                        None
                    }
                })
                .collect();
        }
    }
    results
}

fn records(data: Option<&Value>) -> Vec<Value> {
    match data {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::search::SearchCounts;

    #[test]
    fn question_results_land_in_their_bucket() {
        let results = aggregate(&json!({
            "data": { "type": "question", "data": [{ "id": "q1" }] }
        }));

        assert!(results.books.is_empty());
        assert!(results.chapter_entries.is_empty());
        assert_eq!(results.questions, vec![json!({ "id": "q1" })]);
        assert_eq!(
            results.counts(),
            SearchCounts {
                books: 0,
                menu_books: 0,
                questions: 1,
                total: 1
            }
        );
    }

    #[test]
    fn scalar_data_becomes_a_single_element() {
        let results = aggregate(&json!({
            "data": { "type": "book", "data": { "id": "b1", "name": "Toán 10" } }
        }));
        assert_eq!(results.books.len(), 1);
        assert_eq!(results.counts().total, 1);
    }

    #[test]
    fn menu_book_hits_are_read_as_content_nodes() {
        let results = aggregate(&json!({
            "data": {
                "type": "menu-book",
                "data": [
                    { "id": "m1", "type": "chapter", "title": "Chương 1" },
                    { "title": "no id" }
                ]
            }
        }));
        assert_eq!(results.chapter_entries.len(), 1);
        assert_eq!(results.chapter_entries[0].id, "m1");
    }

    #[test]
    fn unknown_or_missing_discriminator_yields_empty_buckets() {
        for payload in [
            json!({ "data": { "type": "video", "data": [{ "id": "v" }] } }),
            json!({ "data": [{ "id": "v" }] }),
            json!(null),
        ] {
            assert!(aggregate(&payload).is_empty(), "payload: {payload}");
        }
    }

    #[test]
    fn discriminator_may_sit_at_the_top_level() {
        let results = aggregate(&json!({ "type": "book", "data": [{ "id": "b" }] }));
        assert_eq!(results.books.len(), 1);
    }

    #[test]
    fn buckets_never_exceed_upstream_length() {
        let upstream = json!({
            "data": { "type": "book", "data": [{ "id": 1 }, { "id": 2 }, { "id": 3 }] }
        });
        let counts = aggregate(&upstream).counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.books + counts.menu_books + counts.questions, counts.total);
    }

    #[test]
    fn null_data_is_empty() {
        let results = aggregate(&json!({ "data": { "type": "question", "data": null } }));
        assert!(results.is_empty());
    }
}
