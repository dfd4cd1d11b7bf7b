//! Reconciles the list shapes the upstream API answers with.
//!
//! Known shapes, tried in order:
//!
//! - `{ pagination, data: [...] }`
//! - `{ data: { data: [...], pagination? } }`
//! - `{ data: [...] }`
//! - `[...]`
//!
//! Each is a [`ShapeStrategy`]; the first one that recognizes the payload
//! produces the canonical [`ListPage`]. A missing or unreadable pagination
//! object is replaced by a single-page one sized from the records.

use metrics::counter;
use serde_json::Value;
use tracing::warn;

use crate::domain::envelope::{ListPage, Pagination};

pub trait ShapeStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn normalize(&self, payload: &Value, take: u32) -> Option<ListPage<Value>>;
}

pub struct TopLevelPaginated;
pub struct NestedData;
pub struct BareData;
pub struct BareArray;

impl ShapeStrategy for TopLevelPaginated {
    fn name(&self) -> &'static str {
        "top_level_paginated"
    }

    fn normalize(&self, payload: &Value, take: u32) -> Option<ListPage<Value>> {
        let pagination = payload.get("pagination").filter(|value| value.is_object())?;
        let records = payload.get("data")?.as_array()?;
        Some(page(records, Some(pagination), take))
    }
}

impl ShapeStrategy for NestedData {
    fn name(&self) -> &'static str {
        "nested_data"
    }

    fn normalize(&self, payload: &Value, take: u32) -> Option<ListPage<Value>> {
        let inner = payload.get("data").filter(|value| value.is_object())?;
        let records = inner.get("data")?.as_array()?;
        Some(page(records, inner.get("pagination"), take))
    }
}

impl ShapeStrategy for BareData {
    fn name(&self) -> &'static str {
        "bare_data"
    }

    fn normalize(&self, payload: &Value, take: u32) -> Option<ListPage<Value>> {
        let records = payload.get("data")?.as_array()?;
        Some(page(records, None, take))
    }
}

impl ShapeStrategy for BareArray {
    fn name(&self) -> &'static str {
        "bare_array"
    }

    fn normalize(&self, payload: &Value, take: u32) -> Option<ListPage<Value>> {
        Some(page(payload.as_array()?, None, take))
    }
}

fn page(records: &[Value], pagination: Option<&Value>, take: u32) -> ListPage<Value> {
    let pagination = pagination
        .and_then(|raw| serde_json::from_value::<Pagination>(raw.clone()).ok())
        .unwrap_or_else(|| Pagination::single_page(take, records.len()));
    ListPage {
        pagination,
        data: records.to_vec(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Page(ListPage<Value>),
    /// No strategy matched; the payload is handed back untouched.
    Unrecognized(Value),
}

pub struct Normalizer {
    strategies: Vec<Box<dyn ShapeStrategy>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(TopLevelPaginated),
            Box::new(NestedData),
            Box::new(BareData),
            Box::new(BareArray),
        ])
    }
}

impl Normalizer {
    pub fn with_strategies(strategies: Vec<Box<dyn ShapeStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn normalize(&self, payload: Value, take: u32) -> Normalized {
        for strategy in &self.strategies {
            if let Some(page) = strategy.normalize(&payload, take) {
                return Normalized::Page(page);
            }
        }

        counter!("bookgate_unrecognized_shape_total").increment(1);
        warn!(
            target = "bookgate::normalize",
            kind = value_kind(&payload),
            "upstream list payload matched no known shape; passing through"
        );
        Normalized::Unrecognized(payload)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::envelope::Envelope;

    fn normalize(payload: Value) -> ListPage<Value> {
        match Normalizer::default().normalize(payload, 10) {
            Normalized::Page(page) => page,
            Normalized::Unrecognized(value) => panic!("unexpected fallback for {value}"),
        }
    }

    #[test]
    fn top_level_pagination_is_passed_through() {
        let page = normalize(json!({
            "pagination": { "current_page": 3, "total_pages": 7, "take": 20, "total": 131 },
            "data": [{ "id": "a" }]
        }));
        assert_eq!(page.pagination.current_page, 3);
        assert_eq!(page.pagination.total, 131);
        assert_eq!(page.data, vec![json!({ "id": "a" })]);
    }

    #[test]
    fn nested_data_with_pagination() {
        let page = normalize(json!({
            "data": {
                "data": [{ "id": "a" }, { "id": "b" }],
                "pagination": { "current_page": 1, "total_pages": 2, "take": 2, "total": 4 }
            }
        }));
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn nested_data_without_pagination_is_synthesized() {
        let page = normalize(json!({ "data": { "data": [{ "id": "a" }] } }));
        assert_eq!(page.pagination, Pagination::single_page(10, 1));
    }

    #[test]
    fn bare_data_array_gets_single_page_pagination() {
        let envelope = Envelope::success(normalize(json!({ "data": [{ "id": "x" }] })));
        assert_eq!(
            serde_json::to_value(envelope).expect("serialize"),
            json!({
                "data": {
                    "pagination": { "current_page": 1, "total_pages": 1, "take": 10, "total": 1 },
                    "data": [{ "id": "x" }]
                },
                "messages": "Success",
                "status_code": 200
            })
        );
    }

    #[test]
    fn top_level_array_is_accepted() {
        let page = normalize(json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }]));
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.take, 10);
    }

    #[test]
    fn unreadable_pagination_is_replaced() {
        let page = normalize(json!({
            "pagination": { "page": "first" },
            "data": [{ "id": "a" }, { "id": "b" }]
        }));
        assert_eq!(page.pagination, Pagination::single_page(10, 2));
    }

    #[test]
    fn unknown_shapes_fall_through_unchanged() {
        let payload = json!({ "items": [{ "id": "a" }] });
        assert_eq!(
            Normalizer::default().normalize(payload.clone(), 10),
            Normalized::Unrecognized(payload)
        );
        assert_eq!(
            Normalizer::default().normalize(json!("text"), 10),
            Normalized::Unrecognized(json!("text"))
        );
    }

    #[test]
    fn normalized_output_is_a_fixed_point() {
        let inputs = [
            json!({ "data": [{ "id": "x" }] }),
            json!([{ "id": "y" }]),
            json!({
                "pagination": { "current_page": 2, "total_pages": 3, "take": 5, "total": 12 },
                "data": [{ "id": "z" }]
            }),
        ];

        for input in inputs {
            let first = serde_json::to_value(Envelope::success(normalize(input)))
                .expect("serialize first pass");
            let second = serde_json::to_value(Envelope::success(normalize(first.clone())))
                .expect("serialize second pass");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn first_matching_strategy_wins() {
        // Matches both the top-level and bare-data shapes.
        let page = normalize(json!({
            "pagination": { "current_page": 4, "total_pages": 4, "take": 1, "total": 4 },
            "data": [{ "id": "d" }]
        }));
        assert_eq!(page.pagination.current_page, 4);
    }
}
