//! The standard response envelope wrapping every API response body.
//!
//! Successful responses carry `success: true` and a `data` payload; list
//! endpoints additionally carry `pagination` metadata. Error responses are
//! rendered by [`crate::errors::Error`] with the same shape, `success: false`
//! and an `errorCode`.

use serde::Serialize;
use utoipa::ToSchema;

use super::pagination::PaginationMeta;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T: ToSchema> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T: ToSchema> ApiEnvelope<T> {
    /// Successful response with a payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error_code: None,
            pagination: None,
        }
    }

    /// Successful response with a payload and a human-readable message.
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    /// Successful list response with pagination metadata.
    pub fn paginated(data: T, pagination: PaginationMeta) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let env = ApiEnvelope::ok(vec!["a".to_string()]);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0], "a");
        // Absent fields are omitted entirely, not serialized as null
        assert!(json.get("message").is_none());
        assert!(json.get("errorCode").is_none());
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_paginated_envelope_uses_camel_case() {
        let env = ApiEnvelope::paginated(vec![1i64, 2], PaginationMeta::new(1, 20, 2));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["pagination"]["totalCount"], 2);
        assert_eq!(json["pagination"]["totalPages"], 1);
    }
}
