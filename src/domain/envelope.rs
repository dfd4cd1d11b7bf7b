//! Canonical response envelope shared by every proxy endpoint.

use serde::{Deserialize, Serialize};

use super::lenient;

/// Outcome label carried in the `messages` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Messages {
    #[serde(rename = "Success")]
    Success,
    #[serde(rename = "Error")]
    Error,
    #[serde(rename = "Server Error")]
    ServerError,
    #[serde(rename = "Unauthorized")]
    Unauthorized,
}

/// `{ messages, data, status_code }`, plus `error` on failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub messages: Messages,
    pub data: Option<T>,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            messages: Messages::Success,
            data: Some(data),
            status_code: 200,
            error: None,
        }
    }

    pub fn failure(messages: Messages, status_code: u16, error: impl Into<String>) -> Self {
        Self {
            messages,
            data: None,
            status_code,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(deserialize_with = "lenient::count")]
    pub current_page: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_pages: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub take: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub total: u64,
}

impl Pagination {
    /// Pagination for a response that arrived without one: everything is on page one.
    pub fn single_page(take: u32, total: usize) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            take: u64::from(take),
            total: total as u64,
        }
    }
}

/// The `data` member of a list envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage<T> {
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> ListPage<T> {
    pub fn map<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> ListPage<U> {
        ListPage {
            pagination: self.pagination,
            data: f(self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_envelope_omits_error() {
        let envelope = Envelope::success(ListPage {
            pagination: Pagination::single_page(10, 1),
            data: vec![json!({ "id": "x" })],
        });

        assert_eq!(
            serde_json::to_value(&envelope).expect("serialize"),
            json!({
                "messages": "Success",
                "status_code": 200,
                "data": {
                    "pagination": { "current_page": 1, "total_pages": 1, "take": 10, "total": 1 },
                    "data": [{ "id": "x" }]
                }
            })
        );
    }

    #[test]
    fn failure_envelope_carries_null_data() {
        let envelope = Envelope::<()>::failure(Messages::ServerError, 500, "boom");
        assert_eq!(
            serde_json::to_value(&envelope).expect("serialize"),
            json!({
                "messages": "Server Error",
                "data": null,
                "status_code": 500,
                "error": "boom"
            })
        );
    }

    #[test]
    fn pagination_accepts_numeric_strings() {
        let pagination: Pagination = serde_json::from_value(json!({
            "current_page": "2",
            "total_pages": 5,
            "take": "20",
            "total": 97
        }))
        .expect("pagination");
        assert_eq!(pagination.current_page, 2);
        assert_eq!(pagination.take, 20);
    }
}
