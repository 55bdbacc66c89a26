//! REST client for the rental backend
//!
//! [`ApiClient`] speaks HTTP; [`ScreenApi`] is the narrow seam the editor
//! uses to load and persist drafts, so editors can be driven by anything
//! that stores groups and plans.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::draft::Draft;
use crate::error::{AppError, AppResult};

pub mod http;

pub use http::ApiClient;

/// Envelope wrapping every backend response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            message: None,
        }
    }

    /// Server text for a failure: `error` first, then `message`
    pub fn failure_message(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }

    /// Payload of a successful response; `what` names it when absent
    pub fn into_data(self, what: &str) -> AppResult<T> {
        if !self.success {
            return Err(AppError::Rejected(self.failure_message()));
        }
        self.data
            .ok_or_else(|| AppError::NotFound(format!("{what} missing from response")))
    }

    /// For endpoints whose success carries no payload
    pub fn into_unit(self) -> AppResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::Rejected(self.failure_message()))
        }
    }
}

/// Storage backing an editor for drafts of type `D`
#[async_trait]
pub trait ScreenApi<D: Draft>: Send + Sync {
    /// Load an existing entity as a draft
    async fn fetch(&self, id: i64) -> AppResult<D>;

    /// Create, returning the server-assigned id
    async fn create(&self, request: &D::Request) -> AppResult<i64>;

    async fn update(&self, id: i64, request: &D::Request) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_data() {
        let ok: ApiResponse<i32> = serde_json::from_str(r#"{"success": true, "data": 5}"#).unwrap();
        assert_eq!(ok.into_data("count").unwrap(), 5);

        let empty: ApiResponse<i32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(empty.into_data("count"), Err(AppError::NotFound(_))));

        let failed: ApiResponse<i32> =
            serde_json::from_str(r#"{"success": false, "message": "Cabinet offline"}"#).unwrap();
        match failed.into_data("count") {
            Err(AppError::Rejected(Some(msg))) => assert_eq!(msg, "Cabinet offline"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_error_field_wins() {
        let resp: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            error: Some("bad plan".to_string()),
            message: Some("ignored".to_string()),
        };
        assert_eq!(resp.failure_message().as_deref(), Some("bad plan"));
        assert!(resp.into_unit().is_err());
        assert!(ApiResponse::success(()).into_unit().is_ok());
        assert_eq!(
            ApiResponse::<()>::error("nope").failure_message().as_deref(),
            Some("nope")
        );
    }
}
