//! JSON response envelope shared by every route.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{ success, data, count?, message? }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> Envelope<Vec<T>> {
    /// Wraps a collection and reports its length as `count`.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::ok(items)
        }
    }
}

impl Envelope<()> {
    /// Success without a payload, e.g. after a delete.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            count: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::Envelope;
    use serde_json::json;

    #[test]
    fn list_envelope_carries_count() {
        let value = serde_json::to_value(Envelope::list(vec!["Douala", "Yaoundé"])).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "data": ["Douala", "Yaoundé"], "count": 2 })
        );
    }

    #[test]
    fn failure_envelope_omits_data() {
        let value = serde_json::to_value(Envelope::failure("nope")).unwrap();
        assert_eq!(value, json!({ "success": false, "message": "nope" }));
    }
}
