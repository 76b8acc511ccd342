//! The JSON envelope every API response uses, and extractors whose
//! rejections are reported through it.
//!
//! ```json
//! { "success": true, "data": { ... }, "message": "Added to cart" }
//! { "success": false, "message": "Invalid input", "error": "quantity must be positive" }
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::catalog::{Page, Pagination};
use crate::error::AppError;

/// `{success, data?, message?, error?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// A successful response with only a message.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    /// A failure response.
    pub const fn failure(message: String, error: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            error,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// A page of results: `{success, data, pagination}`.
#[derive(Debug, Serialize)]
pub struct ApiPage<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for ApiPage<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            data: page.items,
            pagination: page.pagination,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiPage<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// `axum::Json` whose rejection is an enveloped 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` whose rejection is an enveloped 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_omits_empty_fields() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_message_is_included() {
        let json =
            serde_json::to_value(ApiResponse::ok(true).with_message("Added to cart")).unwrap();
        assert_eq!(json["message"], "Added to cart");
    }

    #[test]
    fn test_page_envelope() {
        let page = Page {
            items: vec!["a"],
            pagination: Pagination {
                current_page: 2,
                total_pages: 3,
                total_items: 21,
                items_per_page: 10,
            },
        };
        let json = serde_json::to_value(ApiPage::from(page)).unwrap();
        assert_eq!(json["data"], serde_json::json!(["a"]));
        assert_eq!(json["pagination"]["totalPages"], 3);
        assert_eq!(json["pagination"]["currentPage"], 2);
    }
}
